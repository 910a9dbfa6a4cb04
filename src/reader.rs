//! Production trace reader binding.
//!
//! Consuming `.etl` files requires the operating system's trace consumer
//! API, which this build does not link against. [`EtlReader`] keeps the
//! command-line tool honest on unsupported platforms by failing at `open`;
//! embedders with access to a consumer implement [`TraceReader`]
//! themselves, and tests replay canned records through the same trait.

use std::path::Path;

use crate::parser::{RawRecord, ReaderError, TraceInfo, TraceReader};

#[derive(Debug, Default)]
pub struct EtlReader {
    _private: (),
}

impl EtlReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TraceReader for EtlReader {
    fn open(&mut self, path: &Path) -> Result<TraceInfo, ReaderError> {
        if !path.exists() {
            return Err(ReaderError::Open(format!(
                "no such file: {}",
                path.display()
            )));
        }
        Err(ReaderError::BackendUnavailable)
    }

    fn for_each_record(
        &mut self,
        _callback: &mut dyn FnMut(RawRecord<'_>),
    ) -> Result<(), ReaderError> {
        Err(ReaderError::BackendUnavailable)
    }
}
