//! `Image` provider: module load and unload notifications.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "Image";

const UNLOAD: u8 = 2;
const DC_START: u8 = 3;
const DC_END: u8 = 4;
const LOAD: u8 = 10;
const KERNEL_BASE: u8 = 33;

pub(super) fn decode(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<(&'static str, StructValue), PayloadError> {
    match opcode {
        LOAD => Ok(("Load", load_unload(opcode, version, is_64_bit, decoder)?)),
        UNLOAD => Ok(("Unload", load_unload(opcode, version, is_64_bit, decoder)?)),
        DC_START => Ok(("DCStart", load_unload(opcode, version, is_64_bit, decoder)?)),
        DC_END => Ok(("DCEnd", load_unload(opcode, version, is_64_bit, decoder)?)),
        KERNEL_BASE => Ok(("KernelBase", kernel_base(opcode, version, is_64_bit, decoder)?)),
        _ => Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        }),
    }
}

/// Load/Unload/DCStart/DCEnd share one versioned layout.
///
/// # Format
///
/// v0: `| BaseAddress: ptr | ModuleSize: u32 | ImageFileName: w16sz |`
///
/// v1: `| BaseAddress: ptr | ModuleSize: ptr | ProcessId: u32 | ImageFileName: w16sz |`
///
/// v2: `| BaseAddress: ptr | ModuleSize: ptr | ProcessId: u32 | ImageCheckSum: u32 | TimeDateStamp: u32 | Reserved0: u32 | DefaultBase: ptr | Reserved1..4: u32 | ImageFileName: w16sz |`
///
/// v3: as v2, with `Reserved0` split into `SignatureLevel: u8 |
/// SignatureType: u8 | Reserved0: u16`.
fn load_unload(
    opcode: u8,
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    match version {
        0 => {
            fields.add_field("BaseAddress", common::pointer(is_64_bit, decoder)?);
            fields.add_field("ModuleSize", Value::UInt(decoder.decode::<u32>()?));
        }
        1 => {
            fields.add_field("BaseAddress", common::pointer(is_64_bit, decoder)?);
            fields.add_field("ModuleSize", common::pointer(is_64_bit, decoder)?);
            fields.add_field("ProcessId", Value::UInt(decoder.decode::<u32>()?));
        }
        2 | 3 => {
            fields.add_field("BaseAddress", common::pointer(is_64_bit, decoder)?);
            fields.add_field("ModuleSize", common::pointer(is_64_bit, decoder)?);
            fields.add_field("ProcessId", Value::UInt(decoder.decode::<u32>()?));
            fields.add_field("ImageCheckSum", Value::UInt(decoder.decode::<u32>()?));
            fields.add_field("TimeDateStamp", Value::UInt(decoder.decode::<u32>()?));
            if version == 2 {
                fields.add_field("Reserved0", Value::UInt(decoder.decode::<u32>()?));
            } else {
                fields.add_field("SignatureLevel", Value::UChar(decoder.decode::<u8>()?));
                fields.add_field("SignatureType", Value::UChar(decoder.decode::<u8>()?));
                fields.add_field("Reserved0", Value::UShort(decoder.decode::<u16>()?));
            }
            fields.add_field("DefaultBase", common::pointer(is_64_bit, decoder)?);
            fields.add_field("Reserved1", Value::UInt(decoder.decode::<u32>()?));
            fields.add_field("Reserved2", Value::UInt(decoder.decode::<u32>()?));
            fields.add_field("Reserved3", Value::UInt(decoder.decode::<u32>()?));
            fields.add_field("Reserved4", Value::UInt(decoder.decode::<u32>()?));
        }
        _ => {
            return Err(PayloadError::UnsupportedEvent {
                category: CATEGORY,
                opcode,
                version,
            })
        }
    }
    fields.add_field("ImageFileName", Value::WStr(decoder.decode_w16_string()?));
    Ok(fields)
}

/// # Format
///
/// `| BaseAddress: ptr |`
fn kernel_base(
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
    fields.add_field("BaseAddress", common::pointer(is_64_bit, decoder)?);
    Ok(fields)
}
