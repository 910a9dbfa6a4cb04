//! `Tcplp` provider: TCP/IP transport events (IPv4 shapes).

use super::common;
use super::PayloadError;
use crate::decoder::Decoder;
use crate::value::{StructValue, Value};

const CATEGORY: &str = "Tcplp";

const SEND_IPV4: u8 = 10;
const RECV_IPV4: u8 = 11;
const CONNECT_IPV4: u8 = 12;
const DISCONNECT_IPV4: u8 = 13;
const RETRANSMIT_IPV4: u8 = 14;
const TCP_COPY_IPV4: u8 = 18;

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
        SEND_IPV4 => Ok(("SendIPV4", send(is_64_bit, decoder)?)),
        RECV_IPV4 => Ok(("RecvIPV4", transfer(is_64_bit, decoder)?)),
        CONNECT_IPV4 => Ok(("ConnectIPV4", connect(is_64_bit, decoder)?)),
        DISCONNECT_IPV4 => Ok(("DisconnectIPV4", transfer(is_64_bit, decoder)?)),
        RETRANSMIT_IPV4 => Ok(("RetransmitIPV4", transfer(is_64_bit, decoder)?)),
        TCP_COPY_IPV4 => Ok(("TCPCopyIPV4", transfer(is_64_bit, decoder)?)),
        _ => Err(PayloadError::UnsupportedEvent {
            category: CATEGORY,
            opcode,
            version,
        }),
    }
}

fn endpoints(decoder: &mut Decoder, fields: &mut StructValue) -> Result<(), PayloadError> {
    fields.add_field("PID", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("size", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("daddr", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("saddr", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("dport", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("sport", Value::UShort(decoder.decode::<u16>()?));
    Ok(())
}

/// # Format
///
/// `| PID: u32 | size: u32 | daddr: u32 | saddr: u32 | dport: u16 | sport: u16 | startime: u32 | endtime: u32 | seqnum: u32 | connid: ptr |`
fn send(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    endpoints(decoder, &mut fields)?;
    fields.add_field("startime", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("endtime", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("seqnum", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("connid", common::pointer(is_64_bit, decoder)?);
    Ok(fields)
}

/// Receive, copy, disconnect and retransmit events.
///
/// # Format
///
/// `| PID: u32 | size: u32 | daddr: u32 | saddr: u32 | dport: u16 | sport: u16 | seqnum: u32 | connid: ptr |`
fn transfer(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    endpoints(decoder, &mut fields)?;
    fields.add_field("seqnum", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("connid", common::pointer(is_64_bit, decoder)?);
    Ok(fields)
}

/// # Format
///
/// `| PID: u32 | size: u32 | daddr: u32 | saddr: u32 | dport: u16 | sport: u16 | mss: u16 | sackopt: u16 | tsopt: u16 | wsopt: u16 | rcvwin: u32 | rcvwinscale: i16 | sndwinscale: i16 | seqnum: u32 | connid: ptr |`
fn connect(is_64_bit: bool, decoder: &mut Decoder) -> Result<StructValue, PayloadError> {
    let mut fields = StructValue::new();
    endpoints(decoder, &mut fields)?;
    fields.add_field("mss", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("sackopt", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("tsopt", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("wsopt", Value::UShort(decoder.decode::<u16>()?));
    fields.add_field("rcvwin", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("rcvwinscale", Value::Short(decoder.decode::<i16>()?));
    fields.add_field("sndwinscale", Value::Short(decoder.decode::<i16>()?));
    fields.add_field("seqnum", Value::UInt(decoder.decode::<u32>()?));
    fields.add_field("connid", common::pointer(is_64_bit, decoder)?);
    Ok(fields)
}
