//! The event envelope handed to user callbacks.

use crate::value::StructValue;

/// Opaque integral count of 100ns units since the system epoch.
pub type Timestamp = u64;

/// Well-known header field names, present on every event.
pub mod header {
    pub const OPERATION: &str = "operation";
    pub const CATEGORY: &str = "category";
    pub const PROCESS_ID: &str = "process_id";
    pub const THREAD_ID: &str = "thread_id";
    pub const PROCESSOR_NUMBER: &str = "processor_number";
}

/// A decoded event: a timestamp, a header struct, and a payload struct.
///
/// The envelope exclusively owns both value trees and is immutable after
/// construction; consumers receive them by borrow.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    timestamp: Timestamp,
    header: StructValue,
    payload: StructValue,
}

impl Event {
    pub fn new(timestamp: Timestamp, header: StructValue, payload: StructValue) -> Self {
        Self {
            timestamp,
            header,
            payload,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn header(&self) -> &StructValue {
        &self.header
    }

    pub fn payload(&self) -> &StructValue {
        &self.payload
    }
}
