//! `Thread` provider: lifecycle, scheduling and lock events.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{ArrayValue, StructValue, Value};

const CATEGORY: &str = "Thread";

const START: u8 = 1;
const END: u8 = 2;
const DC_START: u8 = 3;
const DC_END: u8 = 4;
const CSWITCH: u8 = 36;
const SPIN_LOCK: u8 = 41;
const SET_PRIORITY: u8 = 48;
const SET_BASE_PRIORITY: u8 = 49;
const READY_THREAD: u8 = 50;
const SET_PAGE_PRIORITY: u8 = 51;
const SET_IO_PRIORITY: u8 = 52;
const AUTO_BOOST_SET_FLOOR: u8 = 66;
const AUTO_BOOST_CLEAR_FLOOR: u8 = 67;
const AUTO_BOOST_ENTRY_EXHAUSTION: u8 = 68;

pub(super) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<(&'static str, StructValue), PayloadError> {
    let unsupported = |version| PayloadError::UnsupportedEvent {
        category: CATEGORY,
        opcode,
        version,
    };
    match opcode {
        START => Ok(("Start", lifecycle(opcode, version, is_64_bit, decoder)?)),
        END => Ok(("End", lifecycle(opcode, version, is_64_bit, decoder)?)),
        DC_START => Ok(("DCStart", lifecycle(opcode, version, is_64_bit, decoder)?)),
        DC_END => Ok(("DCEnd", lifecycle(opcode, version, is_64_bit, decoder)?)),
        CSWITCH if version == 2 => Ok(("CSwitch", cswitch(decoder)?)),
        SPIN_LOCK if version == 2 => Ok(("SpinLock", spin_lock(is_64_bit, decoder)?)),
        SET_PRIORITY if version == 3 => Ok(("SetPriority", set_priority(decoder)?)),
        SET_BASE_PRIORITY if version == 3 => Ok(("SetBasePriority", set_priority(decoder)?)),
        READY_THREAD if version == 2 => Ok(("ReadyThread", ready_thread(decoder)?)),
        SET_PAGE_PRIORITY if version == 3 => Ok(("SetPagePriority", set_priority(decoder)?)),
        SET_IO_PRIORITY if version == 3 => Ok(("SetIoPriority", set_priority(decoder)?)),
        AUTO_BOOST_SET_FLOOR if version == 2 => {
            Ok(("AutoBoostSetFloor", auto_boost_set_floor(is_64_bit, decoder)?))
        }
        AUTO_BOOST_CLEAR_FLOOR if version == 2 => Ok((
            "AutoBoostClearFloor",
            auto_boost_clear_floor(is_64_bit, decoder)?,
        )),
        AUTO_BOOST_ENTRY_EXHAUSTION if version == 2 => Ok((
            "AutoBoostEntryExhaustion",
            auto_boost_entry_exhaustion(is_64_bit, decoder)?,
        )),
        _ => Err(unsupported(version)),
    }
}

/// Start/End/DCStart/DCEnd share one versioned layout.
///
/// # Format
///
/// v1: `| ProcessId: u32 | TThreadId: u32 |`, and for `Start`/`DCStart`
/// also `| StackBase: ptr | StackLimit: ptr | UserStackBase: ptr |
/// UserStackLimit: ptr | StartAddr: ptr | Win32StartAddr: ptr |
/// WaitMode: i8 |`.
///
/// v2: `| ProcessId: u32 | TThreadId: u32 | StackBase: ptr | StackLimit: ptr | UserStackBase: ptr | UserStackLimit: ptr | StartAddr: ptr | Win32StartAddr: ptr | TebBase: ptr | SubProcessTag: u32 |`
///
/// v3: `| ProcessId: u32 | TThreadId: u32 | StackBase: ptr | StackLimit: ptr | UserStackBase: ptr | UserStackLimit: ptr | Affinity: ptr | Win32StartAddr: ptr | TebBase: ptr | SubProcessTag: u32 | BasePriority: u8 | PagePriority: u8 | IoPriority: u8 | ThreadFlags: u8 |`
fn lifecycle(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("ProcessId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("TThreadId", Value::UInt(decoder.decode::<u32>()?));
    match version {
        1 => {
            // End events carry only the two ids.
            if opcode == START || opcode == DC_START {
                fields.add_field("StackBase", common::pointer(is_64_bit, decoder)?);
                fields.add_field("StackLimit", common::pointer(is_64_bit, decoder)?);
                fields.add_field("UserStackBase", common::pointer(is_64_bit, decoder)?);
                fields.add_field("UserStackLimit", common::pointer(is_64_bit, decoder)?);
                fields.add_field("StartAddr", common::pointer(is_64_bit, decoder)?);
                fields.add_field("Win32StartAddr", common::pointer(is_64_bit, decoder)?);
                fields.add_field("WaitMode", Value::Char(decoder.decode::<i8>()?));
            }
        }
        2 => {
            fields.add_field("StackBase", common::pointer(is_64_bit, decoder)?);
            fields.add_field("StackLimit", common::pointer(is_64_bit, decoder)?);
            fields.add_field("UserStackBase", common::pointer(is_64_bit, decoder)?);
            fields.add_field("UserStackLimit", common::pointer(is_64_bit, decoder)?);
            fields.add_field("StartAddr", common::pointer(is_64_bit, decoder)?);
            fields.add_field("Win32StartAddr", common::pointer(is_64_bit, decoder)?);
            fields.add_field("TebBase", common::pointer(is_64_bit, decoder)?);
            fields.add_field("SubProcessTag", Value::UInt(decoder.decode::<u32>()?));
        }
        3 => {
            fields.add_field("StackBase", common::pointer(is_64_bit, decoder)?);
            fields.add_field("StackLimit", common::pointer(is_64_bit, decoder)?);
            fields.add_field("UserStackBase", common::pointer(is_64_bit, decoder)?);
            fields.add_field("UserStackLimit", common::pointer(is_64_bit, decoder)?);
            fields.add_field("Affinity", common::pointer(is_64_bit, decoder)?);
            fields.add_field("Win32StartAddr", common::pointer(is_64_bit, decoder)?);
            fields.add_field("TebBase", common::pointer(is_64_bit, decoder)?);
            fields.add_field("SubProcessTag", Value::UInt(decoder.decode::<u32>()?));
            fields.add_field("BasePriority", Value::UChar(decoder.decode::<u8>()?));
            fields.add_field("PagePriority", Value::UChar(decoder.decode::<u8>()?));
            fields.add_field("IoPriority", Value::UChar(decoder.decode::<u8>()?));
            fields.add_field("ThreadFlags", Value::UChar(decoder.decode::<u8>()?));
        }
        _ => {
            return Err(PayloadError::UnsupportedEvent {
                category: CATEGORY,
                opcode,
                version,
            })
        }
    }
    Ok(fields)
}

/// # Format
///
/// `| NewThreadId: u32 | OldThreadId: u32 | NewThreadPriority: i8 | OldThreadPriority: i8 | PreviousCState: u8 | SpareByte: i8 | OldThreadWaitReason: i8 | OldThreadWaitMode: i8 | OldThreadState: i8 | OldThreadWaitIdealProcessor: i8 | NewThreadWaitTime: u32 | Reserved: u32 |`
fn cswitch(decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("NewThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("OldThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("NewThreadPriority", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("OldThreadPriority", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("PreviousCState", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("SpareByte", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("OldThreadWaitReason", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("OldThreadWaitMode", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("OldThreadState", Value::Char(decoder.decode::<i8>()?));
    fields.add_field(
        "OldThreadWaitIdealProcessor",
        Value::Char(decoder.decode::<i8>()?),
    );
    fields.add_field("NewThreadWaitTime", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Reserved", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}

/// # Format
///
/// `| SpinLockAddress: ptr | CallerAddress: ptr | AcquireTime: u64 | ReleaseTime: u64 | WaitTimeInCycles: u32 | SpinCount: u32 | ThreadId: u32 | InterruptCount: u32 | Irql: u8 | AcquireDepth: u8 | Flag: u8 | Reserved: u8[5] |`
fn spin_lock(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("SpinLockAddress", common::pointer(is_64_bit, decoder)?);
    fields.add_field("CallerAddress", common::pointer(is_64_bit, decoder)?);
    fields.add_field("AcquireTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("ReleaseTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("WaitTimeInCycles", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("SpinCount", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("ThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("InterruptCount", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Irql", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("AcquireDepth", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("Flag", Value::UChar(decoder.decode::<u8>()?));
    let mut reserved = ArrayValue::new();
    for &byte in decoder.decode_bytes(5)? {
        reserved.append(Value::UChar(byte));
    }
    fields.add_field("Reserved", Value::Array(reserved));
    Ok(fields)
}

/// Shared by the four priority-change events.
///
/// # Format
///
/// `| ThreadId: u32 | OldPriority: u8 | NewPriority: u8 | Reserved: u16 |`
fn set_priority(decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("ThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("OldPriority", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("NewPriority", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("Reserved", Value::UShort(decoder.decode::<u16>()?));
    Ok(fields)
}

/// # Format
///
/// `| TThreadId: u32 | AdjustReason: i8 | AdjustIncrement: i8 | Flag: i8 | Reserved: i8 |`
fn ready_thread(decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("TThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("AdjustReason", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("AdjustIncrement", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("Flag", Value::Char(decoder.decode::<i8>()?));
    fields.add_field("Reserved", Value::Char(decoder.decode::<i8>()?));
    Ok(fields)
}

/// # Format
///
/// `| Lock: ptr | ThreadId: u32 | NewCpuPriorityFloor: u8 | OldCpuPriority: u8 | IoPriorities: u8 | BoostFlags: u8 |`
fn auto_boost_set_floor(
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("Lock", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("NewCpuPriorityFloor", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("OldCpuPriority", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("IoPriorities", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("BoostFlags", Value::UChar(decoder.decode::<u8>()?));
    Ok(fields)
}

/// # Format
///
/// `| LockAddress: ptr | ThreadId: u32 | BoostBitmap: u16 | Reserved: u16 |`
fn auto_boost_clear_floor(
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("LockAddress", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("BoostBitmap", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("Reserved", Value::UShort(decoder.decode::<u16>()?));
    Ok(fields)
}

/// # Format
///
/// `| LockAddress: ptr | ThreadId: u32 |`
fn auto_boost_entry_exhaustion(
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("LockAddress", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ThreadId", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}
