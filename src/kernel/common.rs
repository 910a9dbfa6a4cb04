//! Composite decoders shared across event shapes.

use crate::decoder::{DecodeError, Decoder};
use crate::value::{ArrayValue, StructValue, Value};

/// Pointer-width unsigned integer: `ULong` on 64-bit payloads, `UInt` on
/// 32-bit ones.
pub(super) fn pointer(is_64_bit: bool, decoder: &mut Decoder) -> Result<Value, DecodeError> {
    Ok(if is_64_bit {
        Value::ULong(decoder.decode::<u64>()?)
    } else {
        Value::UInt(decoder.decode::<u32>()?)
    })
}

/// A `TOKEN_USER` structure followed by the variable-length SID body.
///
/// # Format
///
/// `| PSid: ptr | Attributes: u32 | pad: u32 (64-bit only) | Sid: [u8; 4 * sub_authority_count + 8] |`
///
/// `sub_authority_count` is byte 1 of the SID body, peeked before the body
/// is consumed.
pub(super) fn sid(is_64_bit: bool, decoder: &mut Decoder) -> Result<Value, DecodeError> {
    // Minimal length precheck against malformed payloads.
    if decoder.remaining_bytes() < 3 * 8 {
        return Err(DecodeError::NotEnoughBytes);
    }

    let mut sid = StructValue::new();
    sid.add_field("PSid", pointer(is_64_bit, decoder)?);
    sid.add_field("Attributes", Value::UInt(decoder.decode::<u32>()?));

    // Alignment padding before the SID body.
    if is_64_bit {
        let _padding = decoder.decode::<u32>()?;
    }

    let sub_authority_count = decoder.lookup(1).ok_or(DecodeError::NotEnoughBytes)?;
    let length = 4 * usize::from(sub_authority_count) + 8;
    let mut body = ArrayValue::new();
    for &byte in decoder.decode_bytes(length)? {
        body.append(Value::UChar(byte));
    }
    sid.add_field("Sid", Value::Array(body));

    Ok(Value::Struct(sid))
}

/// # Format
///
/// `| wYear: i16 | wMonth: i16 | wDayOfWeek: i16 | wDay: i16 | wHour: i16 | wMinute: i16 | wSecond: i16 | wMilliseconds: i16 |`
pub(super) fn system_time(decoder: &mut Decoder) -> Result<Value, DecodeError> {
    let mut time = StructValue::new();
    for name in [
        "wYear",
        "wMonth",
        "wDayOfWeek",
        "wDay",
        "wHour",
        "wMinute",
        "wSecond",
        "wMilliseconds",
    ] {
        time.add_field(name, Value::Short(decoder.decode::<i16>()?));
    }
    Ok(Value::Struct(time))
}

/// # Format
///
/// `| Bias: i32 | StandardName: w16[32] | StandardDate: SystemTime | StandardBias: i32 | DaylightName: w16[32] | DaylightDate: SystemTime | DaylightBias: i32 |`
pub(super) fn time_zone_information(decoder: &mut Decoder) -> Result<Value, DecodeError> {
    let mut zone = StructValue::new();
    zone.add_field("Bias", Value::Int(decoder.decode::<i32>()?));
    zone.add_field(
        "StandardName",
        Value::WStr(decoder.decode_fixed_w16_string(32)?),
    );
    zone.add_field("StandardDate", system_time(decoder)?);
    zone.add_field("StandardBias", Value::Int(decoder.decode::<i32>()?));
    zone.add_field(
        "DaylightName",
        Value::WStr(decoder.decode_fixed_w16_string(32)?),
    );
    zone.add_field("DaylightDate", system_time(decoder)?);
    zone.add_field("DaylightBias", Value::Int(decoder.decode::<i32>()?));
    Ok(Value::Struct(zone))
}
