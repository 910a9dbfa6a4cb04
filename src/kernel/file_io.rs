//! `FileIO` provider: file-object name events and the IRP-tracked
//! operation family.

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "FileIO";

const FILE_CREATE: u8 = 32;
const FILE_DELETE: u8 = 35;
const FILE_RUNDOWN: u8 = 36;
const CREATE: u8 = 64;
const CLEANUP: u8 = 65;
const CLOSE: u8 = 66;
const READ: u8 = 67;
const WRITE: u8 = 68;
const SET_INFO: u8 = 69;
const DELETE: u8 = 70;
const RENAME: u8 = 71;
const DIR_ENUM: u8 = 72;
const FLUSH: u8 = 73;
const QUERY_INFO: u8 = 74;
const FS_CONTROL: u8 = 75;
const OPERATION_END: u8 = 76;
const DIR_NOTIFY: u8 = 77;
const DELETE_PATH: u8 = 79;
const RENAME_PATH: u8 = 80;

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
    match (opcode, version) {
        (FILE_CREATE, 2) => Ok(("FileCreate", file_name(is_64_bit, decoder)?)),
        (FILE_DELETE, 2) => Ok(("FileDelete", file_name(is_64_bit, decoder)?)),
        (FILE_RUNDOWN, 2) => Ok(("FileRundown", file_name(is_64_bit, decoder)?)),
        (CREATE, 2 | 3) => Ok(("Create", create(version, is_64_bit, decoder)?)),
        (CLEANUP, 2 | 3) => Ok(("Cleanup", simple_op(version, is_64_bit, decoder)?)),
        (CLOSE, 2 | 3) => Ok(("Close", simple_op(version, is_64_bit, decoder)?)),
        (FLUSH, 2 | 3) => Ok(("Flush", simple_op(version, is_64_bit, decoder)?)),
        (READ, 2 | 3) => Ok(("Read", read_write(version, is_64_bit, decoder)?)),
        (WRITE, 2 | 3) => Ok(("Write", read_write(version, is_64_bit, decoder)?)),
        (SET_INFO, 2 | 3) => Ok(("SetInfo", info(version, is_64_bit, decoder)?)),
        (DELETE, 2 | 3) => Ok(("Delete", info(version, is_64_bit, decoder)?)),
        (RENAME, 2 | 3) => Ok(("Rename", info(version, is_64_bit, decoder)?)),
        (QUERY_INFO, 2 | 3) => Ok(("QueryInfo", info(version, is_64_bit, decoder)?)),
        (FS_CONTROL, 2 | 3) => Ok(("FSControl", info(version, is_64_bit, decoder)?)),
        (DIR_ENUM, 2 | 3) => Ok(("DirEnum", directory(version, is_64_bit, decoder)?)),
        (DIR_NOTIFY, 2 | 3) => Ok(("DirNotify", directory(version, is_64_bit, decoder)?)),
        (OPERATION_END, 2 | 3) => Ok(("OperationEnd", operation_end(is_64_bit, decoder)?)),
        (DELETE_PATH, 3) => Ok(("DeletePath", info_path(is_64_bit, decoder)?)),
        (RENAME_PATH, 3) => Ok(("RenamePath", info_path(is_64_bit, decoder)?)),
        _ => Err(unsupported(version)),
    }
}

/// FileCreate/FileDelete/FileRundown.
///
/// # Format
///
/// `| FileObject: ptr | FileName: w16sz |`
fn file_name(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
    fields.add_field("FileName", Value::WStr(decoder.decode_w16_string()?));
    Ok(fields)
}

/// In v2 the thread id is a pointer-width field right after `IrpPtr`; v3
/// moves it to a `u32` after the object pointers.
///
/// # Format
///
/// v2: `| IrpPtr: ptr | TTID: ptr | FileObject: ptr | CreateOptions: u32 | FileAttributes: u32 | ShareAccess: u32 | OpenPath: w16sz |`
///
/// v3: `| IrpPtr: ptr | FileObject: ptr | TTID: u32 | CreateOptions: u32 | FileAttributes: u32 | ShareAccess: u32 | OpenPath: w16sz |`
fn create(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("IrpPtr", common::pointer(is_64_bit, decoder)?);
    if version == 2 {
        fields.add_field("TTID", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
    } else {
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("TTID", Value::UInt(decoder.decode::<u32>()?));
    }
    fields.add_field("CreateOptions", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("FileAttributes", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("ShareAccess", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("OpenPath", Value::WStr(decoder.decode_w16_string()?));
    Ok(fields)
}

/// Cleanup/Close/Flush.
///
/// # Format
///
/// v2: `| IrpPtr: ptr | TTID: ptr | FileObject: ptr | FileKey: ptr |`
///
/// v3: `| IrpPtr: ptr | FileObject: ptr | FileKey: ptr | TTID: u32 |`
fn simple_op(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("IrpPtr", common::pointer(is_64_bit, decoder)?);
    if version == 2 {
        fields.add_field("TTID", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
    } else {
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
        fields.add_field("TTID", Value::UInt(decoder.decode::<u32>()?));
    }
    Ok(fields)
}

/// Read/Write.
///
/// # Format
///
/// v2: `| Offset: u64 | IrpPtr: ptr | TTID: ptr | FileObject: ptr | FileKey: ptr | IoSize: u32 | IoFlags: u32 |`
///
/// v3: `| Offset: u64 | IrpPtr: ptr | FileObject: ptr | FileKey: ptr | TTID: u32 | IoSize: u32 | IoFlags: u32 |`
fn read_write(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("Offset", Value::ULong(decoder.decode::<u64>()?));
    fields.add_field("IrpPtr", common::pointer(is_64_bit, decoder)?);
    if version == 2 {
        fields.add_field("TTID", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
    } else {
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
        fields.add_field("TTID", Value::UInt(decoder.decode::<u32>()?));
    }
    fields.add_field("IoSize", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("IoFlags", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}

/// SetInfo/Delete/Rename/QueryInfo/FSControl.
///
/// # Format
///
/// v2: `| IrpPtr: ptr | TTID: ptr | FileObject: ptr | FileKey: ptr | ExtraInfo: ptr | InfoClass: u32 |`
///
/// v3: `| IrpPtr: ptr | FileObject: ptr | FileKey: ptr | ExtraInfo: ptr | TTID: u32 | InfoClass: u32 |`
fn info(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("IrpPtr", common::pointer(is_64_bit, decoder)?);
    if version == 2 {
        fields.add_field("TTID", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
        fields.add_field("ExtraInfo", common::pointer(is_64_bit, decoder)?);
    } else {
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
        fields.add_field("ExtraInfo", common::pointer(is_64_bit, decoder)?);
        fields.add_field("TTID", Value::UInt(decoder.decode::<u32>()?));
    }
    fields.add_field("InfoClass", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}

/// DeletePath/RenamePath: the v3 info layout plus the affected path.
///
/// # Format
///
/// `| IrpPtr: ptr | FileObject: ptr | FileKey: ptr | ExtraInfo: ptr | TTID: u32 | InfoClass: u32 | FileName: w16sz |`
fn info_path(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = info(3, is_64_bit, decoder)?;
    fields.add_field("FileName", Value::WStr(decoder.decode_w16_string()?));
    Ok(fields)
}

/// DirEnum/DirNotify.
///
/// # Format
///
/// v2: `| IrpPtr: ptr | TTID: ptr | FileObject: ptr | FileKey: ptr | Length: u32 | InfoClass: u32 | FileIndex: u32 | FileName: w16sz |`
///
/// v3: `| IrpPtr: ptr | FileObject: ptr | FileKey: ptr | TTID: u32 | Length: u32 | InfoClass: u32 | FileIndex: u32 | FileName: w16sz |`
fn directory(
    version: u8,
    is_64_bit: bool,
    decoder: &mut Decoder,
) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("IrpPtr", common::pointer(is_64_bit, decoder)?);
    if version == 2 {
        fields.add_field("TTID", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
    } else {
        fields.add_field("FileObject", common::pointer(is_64_bit, decoder)?);
        fields.add_field("FileKey", common::pointer(is_64_bit, decoder)?);
        fields.add_field("TTID", Value::UInt(decoder.decode::<u32>()?));
    }
    fields.add_field("Length", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("InfoClass", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("FileIndex", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("FileName", Value::WStr(decoder.decode_w16_string()?));
    Ok(fields)
}

/// # Format
///
/// `| IrpPtr: ptr | ExtraInfo: ptr | NtStatus: u32 |`
fn operation_end(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    fields.add_field("IrpPtr", common::pointer(is_64_bit, decoder)?);
    fields.add_field("ExtraInfo", common::pointer(is_64_bit, decoder)?);
    fields.add_field("NtStatus", Value::UInt(decoder.decode::<u32>()?));
    Ok(fields)
}
