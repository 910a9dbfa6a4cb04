//! `PerfInfo` provider: sampling, interrupt and collection-control
//! events.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "PerfInfo";

const SAMPLE_PROF: u8 = 46;
const ISR_MSI: u8 = 50;
const SYS_CL_ENTER: u8 = 51;
const SYS_CL_EXIT: u8 = 52;
const DEBUGGER_ENABLED: u8 = 58;
const THREADED_DPC: u8 = 66;
const ISR: u8 = 67;
const DPC: u8 = 68;
const TIMER_DPC: u8 = 69;
const COLLECTION_START: u8 = 73;
const COLLECTION_END: u8 = 74;
const COLLECTION_START_SECOND: u8 = 75;
const COLLECTION_END_SECOND: u8 = 76;

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
        SAMPLE_PROF if version == 2 => Ok(("SampleProf", sample_prof(is_64_bit, decoder)?)),
        ISR_MSI if version == 2 => Ok(("ISR-MSI", isr(is_64_bit, true, decoder)?)),
        ISR if version == 2 => Ok(("ISR", isr(is_64_bit, false, decoder)?)),
        SYS_CL_ENTER if version == 2 => {
            let mut fields = StructValue::new();
            fields.add_field("SysCallAddress", common::pointer(is_64_bit, decoder)?);
            Ok(("SysClEnter", fields))
        }
        SYS_CL_EXIT if version == 2 => {
            let mut fields = StructValue::new();
            fields.add_field("SysCallNtStatus", Value::UInt(decoder.decode::<u32>()?));
            Ok(("SysClExit", fields))
        }
        // The payload is empty; a zero-length buffer decodes to an empty
        // struct.
        DEBUGGER_ENABLED if version == 2 => Ok(("DebuggerEnabled", StructValue::new())),
        THREADED_DPC if version == 2 => Ok(("ThreadedDPC", dpc(is_64_bit, decoder)?)),
        DPC if version == 2 => Ok(("DPC", dpc(is_64_bit, decoder)?)),
        TIMER_DPC if version == 2 => Ok(("TimerDPC", dpc(is_64_bit, decoder)?)),
        COLLECTION_START if version == 2 || version == 3 => {
            Ok(("CollectionStart", collection(version, decoder)?))
        }
        COLLECTION_END if version == 2 || version == 3 => {
            Ok(("CollectionEnd", collection(version, decoder)?))
        }
        COLLECTION_START_SECOND if version == 3 => {
            Ok(("CollectionStart", spin_lock_collection(decoder)?))
        }
        COLLECTION_END_SECOND if version == 3 => {
            Ok(("CollectionEnd", spin_lock_collection(decoder)?))
        }
        _ => Err(unsupported(version)),
    }
}

/// # Format
///
/// `| InstructionPointer: ptr | ThreadId: u32 | Count: u16 | Reserved: u16 |`
fn sample_prof(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("InstructionPointer", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ThreadId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Count", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("Reserved", Value::UShort(decoder.decode::<u16>()?));
    Ok(fields)
}

/// # Format
///
/// `| InitialTime: u64 | Routine: ptr | ReturnValue: u8 | Vector: u16 | Reserved: u8 |`
///
/// The message-signaled variant appends `| MessageNumber: u32 |`.
fn isr(
    is_64_bit: bool,
    message_signaled: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("InitialTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("Routine", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ReturnValue", Value::UChar(decoder.decode::<u8>()?));
    fields.add_field("Vector", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("Reserved", Value::UChar(decoder.decode::<u8>()?));
    if message_signaled {
        fields.add_field("MessageNumber", Value::UInt(decoder.decode::<u32>()?));
    }
    Ok(fields)
}

/// # Format
///
/// `| InitialTime: u64 | Routine: ptr |`
fn dpc(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("InitialTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("Routine", common::pointer(is_64_bit, decoder)?);
    Ok(fields)
}

/// # Format
///
/// `| Source: u32 | NewInterval: u32 | OldInterval: u32 |`, v3 appends
/// `| SourceName: w16sz |`.
fn collection(version: u8, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("Source", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("NewInterval", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("OldInterval", Value::UInt(decoder.decode::<u32>()?));
    if version >= 3 {
        fields.add_field("SourceName", Value::WStr(decoder.decode_w16_string()?));
    }
    Ok(fields)
}

/// # Format
///
/// `| SpinLockSpinThreshold: u32 | SpinLockContentionSampleRate: u32 | SpinLockAcquireSampleRate: u32 | SpinLockHoldThreshold: u32 |`
fn spin_lock_collection(decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("SpinLockSpinThreshold", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field(
        "SpinLockContentionSampleRate",
        Value::UInt(decoder.decode::<u32>()?),
    );
    fields.add_field(
        "SpinLockAcquireSampleRate",
        Value::UInt(decoder.decode::<u32>()?),
    );
    fields.add_field("SpinLockHoldThreshold", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}
