//! Payload decoding for the kernel event providers.
//!
//! The registry is a closed set: every `(provider, opcode, version,
//! bitness)` combination the pipeline understands is enumerated here, one
//! module per provider. Combinations outside the set fail with
//! [`PayloadError`] and the front-end drops the event; there is no
//! best-effort prefix decoding of unknown versions.

use thiserror::Error;

use crate::decoder::{DecodeError, Decoder};
use crate::guid::Guid;
use crate::value::StructValue;

mod common;
mod disk_io;
mod event_trace;
mod file_io;
mod image;
mod page_fault;
mod perf_info;
mod process;
mod registry;
mod stack_walk;
mod tcplp;
mod thread;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("provider {0} is not in the kernel event set")]
    UnknownProvider(Guid),

    #[error("{category} opcode {opcode} version {version} has no known layout")]
    UnsupportedEvent {
        category: &'static str,
        opcode: u8,
        version: u8,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Logical event source, identified by its provider GUID.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    EventTraceEvent,
    Image,
    PerfInfo,
    Process,
    Thread,
    Tcplp,
    Registry,
    FileIo,
    DiskIo,
    StackWalk,
    PageFault,
}

pub const EVENT_TRACE_EVENT_PROVIDER: Guid = Guid::new(
    0x68FDD900,
    0x4A3E,
    0x11D1,
    [0x84, 0xF4, 0x00, 0x00, 0xF8, 0x04, 0x64, 0xE3],
);
pub const IMAGE_PROVIDER: Guid = Guid::new(
    0x2CB15D1D,
    0x5FC1,
    0x11D2,
    [0xAB, 0xE1, 0x00, 0xA0, 0xC9, 0x11, 0xF5, 0x18],
);
pub const PERF_INFO_PROVIDER: Guid = Guid::new(
    0xCE1DBFB4,
    0x137E,
    0x4DA6,
    [0x87, 0xB0, 0x3F, 0x59, 0xAA, 0x10, 0x2C, 0xBC],
);
pub const PROCESS_PROVIDER: Guid = Guid::new(
    0x3D6FA8D0,
    0xFE05,
    0x11D0,
    [0x9D, 0xDA, 0x00, 0xC0, 0x4F, 0xD7, 0xBA, 0x7C],
);
pub const THREAD_PROVIDER: Guid = Guid::new(
    0x3D6FA8D1,
    0xFE05,
    0x11D0,
    [0x9D, 0xDA, 0x00, 0xC0, 0x4F, 0xD7, 0xBA, 0x7C],
);
pub const TCPLP_PROVIDER: Guid = Guid::new(
    0x9A280AC0,
    0xC8E0,
    0x11D1,
    [0x84, 0xE2, 0x00, 0xC0, 0x4F, 0xB9, 0x98, 0xA2],
);
pub const REGISTRY_PROVIDER: Guid = Guid::new(
    0xAE53722E,
    0xC863,
    0x11D2,
    [0x86, 0x59, 0x00, 0xC0, 0x4F, 0xA3, 0x21, 0xA1],
);
pub const FILE_IO_PROVIDER: Guid = Guid::new(
    0x90CBDC39,
    0x4A3E,
    0x11D1,
    [0x84, 0xF4, 0x00, 0x00, 0xF8, 0x04, 0x64, 0xE3],
);
pub const DISK_IO_PROVIDER: Guid = Guid::new(
    0x3D6FA8D4,
    0xFE05,
    0x11D0,
    [0x9D, 0xDA, 0x00, 0xC0, 0x4F, 0xD7, 0xBA, 0x7C],
);
pub const STACK_WALK_PROVIDER: Guid = Guid::new(
    0xDEF2FE46,
    0x7BD6,
    0x4B80,
    [0xBD, 0x94, 0xF5, 0x7F, 0xE2, 0x0D, 0x0C, 0xE3],
);
pub const PAGE_FAULT_PROVIDER: Guid = Guid::new(
    0x3D6FA8D3,
    0xFE05,
    0x11D0,
    [0x9D, 0xDA, 0x00, 0xC0, 0x4F, 0xD7, 0xBA, 0x7C],
);

const PROVIDERS: [(Guid, Provider); 11] = [
    (EVENT_TRACE_EVENT_PROVIDER, Provider::EventTraceEvent),
    (IMAGE_PROVIDER, Provider::Image),
    (PERF_INFO_PROVIDER, Provider::PerfInfo),
    (PROCESS_PROVIDER, Provider::Process),
    (THREAD_PROVIDER, Provider::Thread),
    (TCPLP_PROVIDER, Provider::Tcplp),
    (REGISTRY_PROVIDER, Provider::Registry),
    (FILE_IO_PROVIDER, Provider::FileIo),
    (DISK_IO_PROVIDER, Provider::DiskIo),
    (STACK_WALK_PROVIDER, Provider::StackWalk),
    (PAGE_FAULT_PROVIDER, Provider::PageFault),
];

impl Provider {
    pub fn from_guid(guid: &Guid) -> Option<Self> {
        PROVIDERS
            .iter()
            .find(|(provider_guid, _)| provider_guid == guid)
            .map(|&(_, provider)| provider)
    }

    pub fn category(self) -> &'static str {
        match self {
            Self::EventTraceEvent => "EventTraceEvent",
            Self::Image => "Image",
            Self::PerfInfo => "PerfInfo",
            Self::Process => "Process",
            Self::Thread => "Thread",
            Self::Tcplp => "Tcplp",
            Self::Registry => "Registry",
            Self::FileIo => "FileIO",
            Self::DiskIo => "DiskIO",
            Self::StackWalk => "StackWalk",
            Self::PageFault => "PageFault",
        }
    }
}

/// A decoded payload: the category and operation names plus the field
/// tree.
#[derive(Debug, PartialEq)]
pub struct DecodedPayload {
    pub category: &'static str,
    pub operation: &'static str,
    pub fields: StructValue,
}

/// Decodes one raw payload against the registry.
pub fn decode_payload(
    provider: &Guid,
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    payload: &[u8],
) -> Result<DecodedPayload, PayloadError> {
    let provider =
        Provider::from_guid(provider).ok_or(PayloadError::UnknownProvider(*provider))?;
    let mut decoder = Decoder::new(payload);
    let (operation, fields) = match provider {
        Provider::EventTraceEvent => event_trace::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::Image => image::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::PerfInfo => perf_info::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::Process => process::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::Thread => thread::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::Tcplp => tcplp::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::Registry => registry::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::FileIo => file_io::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::DiskIo => disk_io::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::StackWalk => stack_walk::decode(opcode, version, is_64_bit, &mut decoder)?,
        Provider::PageFault => page_fault::decode(opcode, version, is_64_bit, &mut decoder)?,
    };
    Ok(DecodedPayload {
        category: provider.category(),
        operation,
        fields,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::value::{StructValue, Value};

    /// Little-endian payload builder for decoder tests.
    #[derive(Default)]
    pub struct PayloadBuilder {
        bytes: Vec<u8>,
    }

    impl PayloadBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn u8(mut self, value: u8) -> Self {
            self.bytes.push(value);
            self
        }

        pub fn i8(self, value: i8) -> Self {
            self.u8(value as u8)
        }

        pub fn u16(mut self, value: u16) -> Self {
            self.bytes.extend_from_slice(&value.to_le_bytes());
            self
        }

        pub fn i16(self, value: i16) -> Self {
            self.u16(value as u16)
        }

        pub fn u32(mut self, value: u32) -> Self {
            self.bytes.extend_from_slice(&value.to_le_bytes());
            self
        }

        pub fn i32(self, value: i32) -> Self {
            self.u32(value as u32)
        }

        pub fn u64(mut self, value: u64) -> Self {
            self.bytes.extend_from_slice(&value.to_le_bytes());
            self
        }

        pub fn i64(self, value: i64) -> Self {
            self.u64(value as u64)
        }

        /// Pointer-width integer; truncates to 32 bits when `is_64_bit` is
        /// false.
        pub fn pointer(self, is_64_bit: bool, value: u64) -> Self {
            if is_64_bit {
                self.u64(value)
            } else {
                self.u32(value as u32)
            }
        }

        pub fn bytes(mut self, bytes: &[u8]) -> Self {
            self.bytes.extend_from_slice(bytes);
            self
        }

        /// NUL-terminated UTF-16LE string.
        pub fn wstr(mut self, value: &str) -> Self {
            for unit in value.encode_utf16() {
                self.bytes.extend_from_slice(&unit.to_le_bytes());
            }
            self.bytes.extend_from_slice(&0u16.to_le_bytes());
            self
        }

        /// Fixed-size UTF-16LE field of `length` code units, NUL padded.
        pub fn fixed_wstr(mut self, value: &str, length: usize) -> Self {
            let units: Vec<u16> = value.encode_utf16().collect();
            assert!(units.len() <= length);
            for unit in &units {
                self.bytes.extend_from_slice(&unit.to_le_bytes());
            }
            for _ in units.len()..length {
                self.bytes.extend_from_slice(&0u16.to_le_bytes());
            }
            self
        }

        /// NUL-terminated narrow string.
        pub fn str(mut self, value: &str) -> Self {
            self.bytes.extend_from_slice(value.as_bytes());
            self.bytes.push(0);
            self
        }

        pub fn build(self) -> Vec<u8> {
            self.bytes
        }
    }

    /// Builds the expected struct for a decode assertion.
    pub fn structure(fields: Vec<(&str, Value)>) -> StructValue {
        let mut result = StructValue::new();
        for (name, value) in fields {
            result.add_field(name, value);
        }
        result
    }

    /// The canonical SID used across process events: revision 1, five
    /// sub-authorities, 28 bytes total.
    pub const SID_BYTES: [u8; 28] = [
        0x01, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x15, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03,
        0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x06, 0xE9, 0x03, 0x00, 0x00,
    ];

    /// The decoded form of [`SID_BYTES`] behind a `PSid`/`Attributes`
    /// header.
    pub fn sid_value(is_64_bit: bool, psid: u64, attributes: u32) -> Value {
        let mut sid = StructValue::new();
        if is_64_bit {
            sid.add_field("PSid", Value::ULong(psid));
        } else {
            sid.add_field("PSid", Value::UInt(psid as u32));
        }
        sid.add_field("Attributes", Value::UInt(attributes));
        let mut array = crate::value::ArrayValue::new();
        for byte in SID_BYTES {
            array.append(Value::UChar(byte));
        }
        sid.add_field("Sid", Value::Array(array));
        Value::Struct(sid)
    }

    /// Encodes [`SID_BYTES`] the way process payloads carry it.
    pub fn sid_payload(builder: PayloadBuilder, is_64_bit: bool, psid: u64) -> PayloadBuilder {
        let builder = builder.pointer(is_64_bit, psid).u32(0);
        let builder = if is_64_bit { builder.u32(0) } else { builder };
        builder.bytes(&SID_BYTES)
    }
}
