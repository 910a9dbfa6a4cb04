//! `Process` provider: lifecycle and resource-counter events.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "Process";

const START: u8 = 1;
const END: u8 = 2;
const DC_START: u8 = 3;
const DC_END: u8 = 4;
const TERMINATE: u8 = 11;
const PERF_CTR: u8 = 32;
const PERF_CTR_RUNDOWN: u8 = 33;
const DEFUNCT: u8 = 39;

pub(super) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<(&'static str, StructValue), PayloadError> {
    match opcode {
        START => Ok(("Start", lifecycle(opcode, version, is_64_bit, decoder)?)),
        END => Ok(("End", lifecycle(opcode, version, is_64_bit, decoder)?)),
        DC_START => Ok(("DCStart", lifecycle(opcode, version, is_64_bit, decoder)?)),
        DC_END => Ok(("DCEnd", lifecycle(opcode, version, is_64_bit, decoder)?)),
        DEFUNCT => Ok(("Defunct", lifecycle(opcode, version, is_64_bit, decoder)?)),
        TERMINATE => Ok(("Terminate", terminate(opcode, version, decoder)?)),
        PERF_CTR => Ok(("PerfCtr", perf_ctr(opcode, version, is_64_bit, decoder)?)),
        PERF_CTR_RUNDOWN => Ok((
            "PerfCtrRundown",
            perf_ctr(opcode, version, is_64_bit, decoder)?,
        )),
        _ => Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        }),
    }
}

/// Start/End/DCStart/DCEnd/Defunct share one versioned layout.
///
/// # Format
///
/// v1: `| PageDirectoryBase: ptr | ProcessId: u32 | ParentId: u32 | SessionId: u32 | ExitStatus: i32 | UserSID | ImageFileName: sz |`
///
/// v2: `| UniqueProcessKey: ptr | ProcessId: u32 | ParentId: u32 | SessionId: u32 | ExitStatus: i32 | UserSID | ImageFileName: sz | CommandLine: w16sz |`
///
/// v3: v2 with `DirectoryTableBase: ptr` after `ExitStatus`.
///
/// v4+: v3 with `Flags: u32` after `DirectoryTableBase` and
/// `PackageFullName: w16sz | ApplicationId: w16sz` at the tail. v5
/// (`Defunct` only) appends `ExitTime: u64`.
fn lifecycle(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    if version < 1 || version > 5 || (version == 5 && opcode != DEFUNCT) {
        return Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        });
    }

    let mut fields = StructValue::new();
    if version == 1 {
        fields.add_field("PageDirectoryBase", common::pointer(is_64_bit, decoder)?);
    } else {
        fields.add_field("UniqueProcessKey", common::pointer(is_64_bit, decoder)?);
    }
    fields.add_field("ProcessId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("ParentId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("SessionId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("ExitStatus", Value::Int(decoder.decode::<i32>()?));
    if version >= 3 {
        fields.add_field("DirectoryTableBase", common::pointer(is_64_bit, decoder)?);
    }
    if version >= 4 {
        fields.add_field("Flags", Value::UInt(decoder.decode::<u32>()?));
    }
    fields.add_field("UserSID", common::sid(is_64_bit, decoder)?);
    fields.add_field("ImageFileName", Value::Str(decoder.decode_string()?));
    if version >= 2 {
        fields.add_field("CommandLine", Value::WStr(decoder.decode_w16_string()?));
    }
    if version >= 4 {
        fields.add_field("PackageFullName", Value::WStr(decoder.decode_w16_string()?));
        fields.add_field("ApplicationId", Value::WStr(decoder.decode_w16_string()?));
    }
    if version >= 5 {
        fields.add_field("ExitTime", Value::ULong(decoder.decode::<u64>()?));
    }
    Ok(fields)
}

/// # Format
///
/// `| ProcessId: u32 |`
fn terminate(opcode: u8, version: u8, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    if version != 2 {
        return Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        });
    }
    let mut fields = StructValue::new();
    fields.add_field("ProcessId", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}

/// # Format
///
/// `| ProcessId: u32 | PageFaultCount: u32 | HandleCount: u32 | Reserved: u32 | PeakVirtualSize: ptr | PeakWorkingSetSize: ptr | PeakPagefileUsage: ptr | QuotaPeakPagedPoolUsage: ptr | QuotaPeakNonPagedPoolUsage: ptr | VirtualSize: ptr | WorkingSetSize: ptr | PagefileUsage: ptr | QuotaPagedPoolUsage: ptr | QuotaNonPagedPoolUsage: ptr | PrivatePageCount: ptr |`
fn perf_ctr(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    if version != 2 {
        return Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        });
    }
    let mut fields = StructValue::new();
    fields.add_field("ProcessId", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("PageFaultCount", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("HandleCount", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("Reserved", Value::UInt(decoder.decode::<u32>()?));
    for name in [
        "PeakVirtualSize",
        "PeakWorkingSetSize",
        "PeakPagefileUsage",
        "QuotaPeakPagedPoolUsage",
        "QuotaPeakNonPagedPoolUsage",
        "VirtualSize",
        "WorkingSetSize",
        "PagefileUsage",
        "QuotaPagedPoolUsage",
        "QuotaNonPagedPoolUsage",
        "PrivatePageCount",
    ] {
        fields.add_field(name, common::pointer(is_64_bit, decoder)?);
    }
    Ok(fields)
}
