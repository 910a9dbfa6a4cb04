//! `Registry` provider: key-access and accounting events.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "Registry";

const CREATE: u8 = 10;
const OPEN: u8 = 11;
const QUERY: u8 = 13;
const SET_VALUE: u8 = 14;
const QUERY_VALUE: u8 = 16;
const ENUMERATE_KEY: u8 = 17;
const ENUMERATE_VALUE_KEY: u8 = 18;
const QUERY_MULTIPLE_VALUE: u8 = 19;
const SET_INFORMATION: u8 = 20;
const FLUSH: u8 = 21;
const KCB_CREATE: u8 = 22;
const KCB_DELETE: u8 = 23;
const KCB_RUNDOWN_END: u8 = 25;
const CLOSE: u8 = 27;
const SET_SECURITY: u8 = 28;
const QUERY_SECURITY: u8 = 29;
const COUNTERS: u8 = 34;
const CONFIG: u8 = 35;

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
    let operation = match opcode {
        CREATE => "Create",
        OPEN => "Open",
        QUERY => "Query",
        SET_VALUE => "SetValue",
        QUERY_VALUE => "QueryValue",
        ENUMERATE_KEY => "EnumerateKey",
        ENUMERATE_VALUE_KEY => "EnumerateValueKey",
        QUERY_MULTIPLE_VALUE => "QueryMultipleValue",
        SET_INFORMATION => "SetInformation",
        FLUSH => "Flush",
        KCB_CREATE => "KCBCreate",
        KCB_DELETE => "KCBDelete",
        KCB_RUNDOWN_END => "KCBRundownEnd",
        CLOSE => "Close",
        SET_SECURITY => "SetSecurity",
        QUERY_SECURITY => "QuerySecurity",
        COUNTERS if version == 2 => return Ok(("Counters", counters(decoder)?)),
        CONFIG if version == 2 => return Ok(("Config", config(decoder)?)),
        _ => return Err(unsupported(version)),
    };
    let fields = match version {
        1 => typed_v1(is_64_bit, decoder)?,
        2 => typed_v2(is_64_bit, decoder)?,
        _ => return Err(unsupported(version)),
    };
    Ok((operation, fields))
}

/// # Format
///
/// `| Status: u32 | KeyHandle: ptr | ElapsedTime: i64 | Index: u32 | KeyName: w16sz |`
fn typed_v1(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("Status", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("KeyHandle", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ElapsedTime", Value::Long(decoder.decode::<i64>()?));
    fields.add_field("Index", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("KeyName", Value::WStr(decoder.decode_w16_string()?));
    Ok(fields)
}

/// # Format
///
/// `| InitialTime: i64 | Status: u32 | Index: u32 | KeyHandle: ptr | KeyName: w16sz |`
fn typed_v2(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("InitialTime", Value::Long(decoder.decode::<i64>()?));
    fields.add_field("Status", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Index", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("KeyHandle", common::pointer(is_64_bit, decoder)?);
    fields.add_field("KeyName", Value::WStr(decoder.decode_w16_string()?));
    Ok(fields)
}

/// # Format
///
/// `| Counter1..Counter11: u64 |` — 64-bit counters on both pointer
/// widths.
fn counters(decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    for name in [
        "Counter1", "Counter2", "Counter3", "Counter4", "Counter5", "Counter6", "Counter7",
        "Counter8", "Counter9", "Counter10", "Counter11",
    ] {
        fields.add_field(name, Value::ULong(decoder.decode::<u64>()?));
    }
    Ok(fields)
}

/// # Format
///
/// `| CurrentControlSet: u32 |`
fn config(decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("CurrentControlSet", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}
