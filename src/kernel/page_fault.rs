//! `PageFault` provider: soft/hard faults and virtual memory events.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "PageFault";

const TRANSITION_FAULT: u8 = 10;
const DEMAND_ZERO_FAULT: u8 = 11;
const COPY_ON_WRITE: u8 = 12;
const GUARD_PAGE_FAULT: u8 = 13;
const HARD_PAGE_FAULT: u8 = 14;
const ACCESS_VIOLATION: u8 = 15;
const HARD_FAULT: u8 = 32;
const VIRTUAL_ALLOC: u8 = 98;
const VIRTUAL_FREE: u8 = 99;

pub(super) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<(&'static str, StructValue), PayloadError> {
    if version != 2 {
        return Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        });
    }
    match opcode {
        TRANSITION_FAULT => Ok(("TransitionFault", fault(is_64_bit, decoder)?)),
        DEMAND_ZERO_FAULT => Ok(("DemandZeroFault", fault(is_64_bit, decoder)?)),
        COPY_ON_WRITE => Ok(("CopyOnWrite", fault(is_64_bit, decoder)?)),
        GUARD_PAGE_FAULT => Ok(("GuardPageFault", fault(is_64_bit, decoder)?)),
        HARD_PAGE_FAULT => Ok(("HardPageFault", fault(is_64_bit, decoder)?)),
        ACCESS_VIOLATION => Ok(("AccessViolation", fault(is_64_bit, decoder)?)),
        HARD_FAULT => Ok(("HardFault", hard_fault(is_64_bit, decoder)?)),
        VIRTUAL_ALLOC => Ok(("VirtualAlloc", virtual_op(is_64_bit, decoder)?)),
        VIRTUAL_FREE => Ok(("VirtualFree", virtual_op(is_64_bit, decoder)?)),
        _ => Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        }),
    }
}

/// The soft-fault family.
///
/// # Format
///
/// `| VirtualAddress: ptr | ProgramCounter: ptr |`
fn fault(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("VirtualAddress", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ProgramCounter", common::pointer(is_64_bit, decoder)?);
    Ok(fields)
}

/// # Format
///
/// `| InitialTime: u64 | ReadOffset: u64 | VirtualAddress: ptr | FileObject: ptr | TThreadId: u32 | ByteCount: u32 |`
fn hard_fault(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("InitialTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("ReadOffset", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("VirtualAddress", common::pointer(is_64_bit, decoder)?);
    fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
    fields.add_field("TThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("ByteCount", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}

/// VirtualAlloc/VirtualFree.
///
/// # Format
///
/// `| BaseAddress: ptr | RegionSize: ptr | ProcessId: u32 | Flags: u32 |`
fn virtual_op(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("BaseAddress", common::pointer(is_64_bit, decoder)?);
    fields.add_field("RegionSize", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ProcessId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Flags", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}
