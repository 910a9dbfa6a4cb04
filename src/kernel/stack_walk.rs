//! `StackWalk` provider: call-stack captures for other events.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{ArrayValue, StructValue, Value};

const CATEGORY: &str = "StackWalk";

const STACK: u8 = 32;

pub(super) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<(&'static str, StructValue), PayloadError> {
    match (opcode, version) {
        (STACK, 2) => Ok(("Stack", stack(is_64_bit, decoder)?)),
        _ => Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        }),
    }
}

/// # Format
///
/// `| EventTimeStamp: u64 | StackProcess: u32 | StackThread: u32 | Stack: ptr[] |`
///
/// The address array fills whatever remains of the payload.
fn stack(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("EventTimeStamp", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("StackProcess", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("StackThread", Value::UInt(decoder.decode::<u32>()?));

    let frame_size = if is_64_bit { 8 } else { 4 };
    let mut frames = ArrayValue::new();
    while decoder.remaining_bytes() >= frame_size {
        frames.append(common::pointer(is_64_bit, decoder)?);
    }
    fields.add_field("Stack", Value::Array(frames));
    Ok(fields)
}
