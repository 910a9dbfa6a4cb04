//! `DiskIO` provider: block-level transfer events.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "DiskIO";

const READ: u8 = 10;
const WRITE: u8 = 11;
const READ_INIT: u8 = 12;
const WRITE_INIT: u8 = 13;
const FLUSH_BUFFERS: u8 = 14;
const FLUSH_INIT: u8 = 15;

pub(super) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<(&'static str, StructValue), PayloadError> {
    if version != 2 && version != 3 {
        return Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        });
    }
    match opcode {
        READ => Ok(("Read", transfer(version, is_64_bit, decoder)?)),
        WRITE => Ok(("Write", transfer(version, is_64_bit, decoder)?)),
        READ_INIT => Ok(("ReadInit", init(version, is_64_bit, decoder)?)),
        WRITE_INIT => Ok(("WriteInit", init(version, is_64_bit, decoder)?)),
        FLUSH_BUFFERS => Ok(("FlushBuffers", flush_buffers(version, is_64_bit, decoder)?)),
        FLUSH_INIT => Ok(("FlushInit", init(version, is_64_bit, decoder)?)),
        _ => Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        }),
    }
}

/// Read/Write.
///
/// # Format
///
/// `| DiskNumber: u32 | IrpFlags: u32 | TransferSize: u32 | Reserved: u32 | ByteOffset: u64 | FileObject: ptr | Irp: ptr | HighResResponseTime: u64 |`,
/// v3 appends `| IssuingThreadId: u32 |`.
fn transfer(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("DiskNumber", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("IrpFlags", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("TransferSize", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Reserved", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("ByteOffset", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
    fields.add_field("Irp", common::pointer(is_64_bit, decoder)?);
    fields.add_field("HighResResponseTime", Value::ULong(decoder.decode::<u64>()?));
    if version >= 3 {
        fields.add_field("IssuingThreadId", Value::UInt(decoder.decode::<u32>()?));
    }
    Ok(fields)
}

/// ReadInit/WriteInit/FlushInit.
///
/// # Format
///
/// `| Irp: ptr |`, v3 appends `| IssuingThreadId: u32 |`.
fn init(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("Irp", common::pointer(is_64_bit, decoder)?);
    if version >= 3 {
        fields.add_field("IssuingThreadId", Value::UInt(decoder.decode::<u32>()?));
    }
    Ok(fields)
}

/// # Format
///
/// `| DiskNumber: u32 | IrpFlags: u32 | HighResResponseTime: u64 | Irp: ptr |`,
/// v3 appends `| IssuingThreadId: u32 |`.
fn flush_buffers(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("DiskNumber", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("IrpFlags", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("HighResResponseTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("Irp", common::pointer(is_64_bit, decoder)?);
    if version >= 3 {
        fields.add_field("IssuingThreadId", Value::UInt(decoder.decode::<u32>()?));
    }
    Ok(fields)
}
