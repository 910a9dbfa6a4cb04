//! `EventTraceEvent` provider: the session header and its extension.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "EventTraceEvent";

const HEADER: u8 = 0;
const EXTENSION: u8 = 5;

pub(super) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<(&'static str, StructValue), PayloadError> {
    match (opcode, version) {
        (HEADER, 2) => Ok(("Header", header(is_64_bit, decoder)?)),
        (EXTENSION, 2) => Ok(("Extension", extension(decoder)?)),
        _ => Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        }),
    }
}

/// The session header written at the front of every trace.
///
/// # Format
///
/// `| BufferSize: u32 | Version: u32 | ProviderVersion: u32 | NumberOfProcessors: u32 | EndTime: u64 | TimerResolution: u32 | MaxFileSize: u32 | LogFileMode: u32 | BuffersWritten: u32 | StartBuffers: u32 | PointerSize: u32 | EventsLost: u32 | CPUSpeed: u32 | LoggerName: ptr | LogFileName: ptr | TimeZoneInformation | Padding: u32 | BootTime: u64 | PerfFreq: u64 | StartTime: u64 | ReservedFlags: u32 | BuffersLost: u32 | SessionNameString: w16sz | LogFileNameString: w16sz |`
fn header(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("BufferSize", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Version", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("ProviderVersion", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("NumberOfProcessors", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("EndTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("TimerResolution", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("MaxFileSize", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("LogFileMode", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("BuffersWritten", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("StartBuffers", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("PointerSize", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("EventsLost", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("CPUSpeed", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("LoggerName", common::pointer(is_64_bit, decoder)?);
    fields.add_field("LogFileName", common::pointer(is_64_bit, decoder)?);
    fields.add_field("TimeZoneInformation", common::time_zone_information(decoder)?);
    fields.add_field("Padding", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("BootTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("PerfFreq", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("StartTime", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("ReservedFlags", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("BuffersLost", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field(
        "SessionNameString",
        Value::WStr(decoder.decode_w16_string()?),
    );
    fields.add_field(
        "LogFileNameString",
        Value::WStr(decoder.decode_w16_string()?),
    );
    Ok(fields)
}

/// # Format
///
/// `| GroupMask1..GroupMask8: u32 | KernelEventVersion: u32 |`
fn extension(decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    for name in [
        "GroupMask1",
        "GroupMask2",
        "GroupMask3",
        "GroupMask4",
        "GroupMask5",
        "GroupMask6",
        "GroupMask7",
        "GroupMask8",
    ] {
        fields.add_field(name, Value::UInt(decoder.decode::<u32>()?));
    }
    fields.add_field("KernelEventVersion", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{structure, PayloadBuilder};
    use super::super::{decode_payload, PayloadError, EVENT_TRACE_EVENT_PROVIDER};
    use crate::value::Value;

    fn time_zone(builder: PayloadBuilder) -> PayloadBuilder {
        builder
            .i32(300)
            .fixed_wstr("@tzres.dll,-112", 32)
            .i16(0)
            .i16(11)
            .i16(0)
            .i16(1)
            .i16(2)
            .i16(0)
            .i16(0)
            .i16(0)
            .i32(0)
            .fixed_wstr("@tzres.dll,-111", 32)
            .i16(0)
            .i16(3)
            .i16(0)
            .i16(2)
            .i16(2)
            .i16(0)
            .i16(0)
            .i16(0)
            .i32(-60)
    }

    fn expected_time_zone() -> Value {
        let date = |month: i16, day: i16| {
            Value::Struct(structure(vec![
                ("wYear", Value::Short(0)),
                ("wMonth", Value::Short(month)),
                ("wDayOfWeek", Value::Short(0)),
                ("wDay", Value::Short(day)),
                ("wHour", Value::Short(2)),
                ("wMinute", Value::Short(0)),
                ("wSecond", Value::Short(0)),
                ("wMilliseconds", Value::Short(0)),
            ]))
        };
        Value::Struct(structure(vec![
            ("Bias", Value::Int(300)),
            ("StandardName", Value::WStr("@tzres.dll,-112".into())),
            ("StandardDate", date(11, 1)),
            ("StandardBias", Value::Int(0)),
            ("DaylightName", Value::WStr("@tzres.dll,-111".into())),
            ("DaylightDate", date(3, 2)),
            ("DaylightBias", Value::Int(-60)),
        ]))
    }

    #[test]
    fn header_v2_64bit() {
        let builder = PayloadBuilder::new()
            .u32(65_536)
            .u32(83_951_878)
            .u32(7601)
            .u32(4)
            .u64(130_371_671_034_768_955)
            .u32(156_001)
            .u32(0)
            .u32(0x1_0001)
            .u32(438)
            .u32(1)
            .u32(8)
            .u32(31)
            .u32(1696)
            .u64(0)
            .u64(0);
        let payload = time_zone(builder)
            .u32(0)
            .u64(130_371_020_571_099_993)
            .u64(1_656_445)
            .u64(130_371_670_762_939_437)
            .u32(1)
            .u32(0)
            .wstr("Relogger")
            .wstr("C:\\kernel.etl")
            .build();

        let decoded =
            decode_payload(&EVENT_TRACE_EVENT_PROVIDER, super::HEADER, 2, true, &payload).unwrap();
        assert_eq!(decoded.category, "EventTraceEvent");
        assert_eq!(decoded.operation, "Header");
        assert_eq!(
            decoded.fields,
            structure(vec![
                ("BufferSize", Value::UInt(65_536)),
                ("Version", Value::UInt(83_951_878)),
                ("ProviderVersion", Value::UInt(7601)),
                ("NumberOfProcessors", Value::UInt(4)),
                ("EndTime", Value::ULong(130_371_671_034_768_955)),
                ("TimerResolution", Value::UInt(156_001)),
                ("MaxFileSize", Value::UInt(0)),
                ("LogFileMode", Value::UInt(0x1_0001)),
                ("BuffersWritten", Value::UInt(438)),
                ("StartBuffers", Value::UInt(1)),
                ("PointerSize", Value::UInt(8)),
                ("EventsLost", Value::UInt(31)),
                ("CPUSpeed", Value::UInt(1696)),
                ("LoggerName", Value::ULong(0)),
                ("LogFileName", Value::ULong(0)),
                ("TimeZoneInformation", expected_time_zone()),
                ("Padding", Value::UInt(0)),
                ("BootTime", Value::ULong(130_371_020_571_099_993)),
                ("PerfFreq", Value::ULong(1_656_445)),
                ("StartTime", Value::ULong(130_371_670_762_939_437)),
                ("ReservedFlags", Value::UInt(1)),
                ("BuffersLost", Value::UInt(0)),
                ("SessionNameString", Value::WStr("Relogger".into())),
                ("LogFileNameString", Value::WStr("C:\\kernel.etl".into())),
            ])
        );
    }

    #[test]
    fn header_v2_32bit_narrows_the_name_pointers() {
        let builder = PayloadBuilder::new()
            .u32(65_536)
            .u32(83_951_878)
            .u32(7600)
            .u32(16)
            .u64(129_488_146_014_743_569)
            .u32(156_001)
            .u32(100)
            .u32(1)
            .u32(3)
            .u32(1)
            .u32(4)
            .u32(0)
            .u32(2394)
            .u32(5)
            .u32(6);
        let payload = time_zone(builder)
            .u32(0)
            .u64(129_484_742_215_811_967)
            .u64(2_337_949)
            .u64(129_488_145_994_691_628)
            .u32(1)
            .u32(0)
            .wstr("Make Test Data Session")
            .wstr("c:\\src\\test_data\\image_data_32_v0.etl")
            .build();

        let decoded =
            decode_payload(&EVENT_TRACE_EVENT_PROVIDER, super::HEADER, 2, false, &payload)
                .unwrap();
        assert_eq!(decoded.fields.field("LoggerName"), Some(&Value::UInt(5)));
        assert_eq!(decoded.fields.field("LogFileName"), Some(&Value::UInt(6)));
        assert_eq!(decoded.fields.field("PointerSize"), Some(&Value::UInt(4)));
        assert_eq!(
            decoded.fields.field_as_wstr("SessionNameString"),
            Some("Make Test Data Session")
        );
        assert_eq!(
            decoded.fields.field("TimeZoneInformation"),
            Some(&expected_time_zone())
        );
    }

    #[test]
    fn extension_v2_is_bitness_independent() {
        for is_64_bit in [false, true] {
            let mut builder = PayloadBuilder::new();
            for _ in 0..8 {
                builder = builder.u32(0);
            }
            let payload = builder.u32(25).build();
            let decoded = decode_payload(
                &EVENT_TRACE_EVENT_PROVIDER,
                super::EXTENSION,
                2,
                is_64_bit,
                &payload,
            )
            .unwrap();
            assert_eq!(decoded.operation, "Extension");
            assert_eq!(
                decoded.fields.field("KernelEventVersion"),
                Some(&Value::UInt(25))
            );
            assert_eq!(decoded.fields.len(), 9);
        }
    }

    #[test]
    fn header_v1_is_not_a_layout() {
        assert!(matches!(
            decode_payload(&EVENT_TRACE_EVENT_PROVIDER, super::HEADER, 1, true, &[]),
            Err(PayloadError::UnsupportedEvent { version: 1, .. })
        ));
    }
}
