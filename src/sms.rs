//! SMS (TPDU) records from EF-SMS.
//!
//! Every record in EF-SMS is exactly 176 bytes: a status byte, the service
//! centre address, and the TPDU itself (3GPP TS 23.040). The parser walks
//! the record through a bounds-checked cursor, so a corrupted record can
//! misparse but never read outside the buffer.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bcd::packed_bcd_to_ascii;
use crate::charset::gsm_text;
use crate::error::{Error, Result};

/// Length of an EF-SMS record, in bytes
pub const SMS_RECORD_LEN: usize = 176;
/// Maximum service centre address length, TON/NPI disregarded
pub const MAX_SMSC_LEN: usize = 10;
/// Minimum length of TP-OA / TP-DA, in bytes
pub const MIN_ADDRESS_LEN: usize = 2;
/// Maximum length of TP-OA / TP-DA, in bytes
pub const MAX_ADDRESS_LEN: usize = 12;

bitfield! {
    /// First TPDU octet; only the message-type bits matter here.
    struct TpduType(u8);
    u8;
    message_type, _: 1, 0;
}

bitfield! {
    /// TON/NPI address-type octet.
    struct TypeOfAddress(u8);
    u8;
    numbering_plan, _: 3, 0;
    type_of_number, _: 6, 4;
}

impl TypeOfAddress {
    /// Type-of-number 0b101 marks a GSM 7-bit alphanumeric address instead
    /// of packed BCD digits.
    fn is_alphanumeric(&self) -> bool {
        self.type_of_number() == 0b101
    }
}

/// Record status from the first byte of an EF-SMS record
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum SmsStatus {
    Unused,
    ReceivedRead,
    ReceivedUnread,
    Sent,
    NotSent,
    Undefined,
}

impl SmsStatus {
    /// Map the status byte; values above 7 are invalid.
    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Unused),
            1 => Ok(Self::ReceivedRead),
            3 => Ok(Self::ReceivedUnread),
            5 => Ok(Self::Sent),
            7 => Ok(Self::NotSent),
            2 | 4 | 6 => Ok(Self::Undefined),
            _ => Err(Error::SmsInvalidStatus),
        }
    }
}

impl From<SmsStatus> for &'static str {
    fn from(status: SmsStatus) -> Self {
        match status {
            SmsStatus::Unused => "Unused space",
            SmsStatus::ReceivedRead => "Message received and read",
            SmsStatus::ReceivedUnread => "Message received but unread",
            SmsStatus::Sent => "Message sent",
            SmsStatus::NotSent => "Message not sent",
            SmsStatus::Undefined => "[Undefined]",
        }
    }
}

impl fmt::Display for SmsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(*self))
    }
}

/// TPDU kind from the low two bits of the type octet
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum SmsKind {
    /// Incoming message (SMS-DELIVER)
    Deliver,
    /// Outgoing message (SMS-SUBMIT)
    Submit,
    /// SMS-COMMAND / SMS-STATUS-REPORT, not decoded
    Command,
    /// Reserved for future use
    Reserved,
}

impl From<u8> for SmsKind {
    fn from(b: u8) -> Self {
        match b & 0x03 {
            0 => Self::Deliver,
            1 => Self::Submit,
            2 => Self::Command,
            _ => Self::Reserved,
        }
    }
}

/// Character set from bits 3..2 of TP-DCS
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum SmsCharset {
    Gsm7,
    EightBit,
    Ucs2,
    Reserved,
}

impl From<u8> for SmsCharset {
    fn from(dcs: u8) -> Self {
        match (dcs >> 2) & 0x03 {
            0 => Self::Gsm7,
            1 => Self::EightBit,
            2 => Self::Ucs2,
            _ => Self::Reserved,
        }
    }
}

/// Service-centre timestamp of an SMS-DELIVER
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SmsTimestamp {
    /// `MM/DD/20YY`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
    /// Raw timezone byte, nibble-swapped decimal; the signed quarter-hour
    /// encoding is not decoded
    pub timezone: u8,
}

impl fmt::Display for SmsTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (TZ {:02})", self.date, self.time, self.timezone)
    }
}

/// The decoded transfer layer of a deliver or submit record
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SmsTpdu {
    pub kind: SmsKind,
    /// Sender (deliver) or recipient (submit) address
    pub address: String,
    /// Only present for deliver records
    pub timestamp: Option<SmsTimestamp>,
    pub charset: SmsCharset,
    /// Decoded message text; `None` when the charset is unsupported
    pub text: Option<String>,
}

/// One parsed EF-SMS record
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SmsMessage {
    pub status: SmsStatus,
    /// Service centre number
    pub smsc: String,
    /// `None` for TPDU kinds this parser does not decode
    pub tpdu: Option<SmsTpdu>,
}

// Bounds-checked reader over one SMS record.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take_u8(&mut self) -> Result<u8> {
        let byte = *self.buf.get(self.pos).ok_or(Error::InvalidParam)?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(Error::InvalidParam)?;
        let bytes = self.buf.get(self.pos..end).ok_or(Error::InvalidParam)?;
        self.pos = end;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

// Decodes one nibble-swapped timestamp byte to its two human digits.
fn timestamp_digits(byte: u8) -> String {
    packed_bcd_to_ascii(&[byte], true, false, false)
}

/// Parse a raw EF-SMS record.
///
/// `record` must be exactly [`SMS_RECORD_LEN`] bytes. Unused records
/// typically fail with [`Error::SmsInvalidSmsc`] once the all-`0xff` service
/// centre field is hit; callers walking a whole file should treat per-record
/// errors as skippable.
pub fn parse_sms(record: &[u8]) -> Result<SmsMessage> {
    if record.len() != SMS_RECORD_LEN {
        debug!("invalid SMS record length ({} bytes)", record.len());
        return Err(Error::InvalidParam);
    }

    let mut cursor = Cursor::new(record);

    let status = SmsStatus::from_byte(cursor.take_u8()?)?;

    // Service centre length counts the TON/NPI octet, which we skip.
    let mut smsc_len = cursor.take_u8()? as i32 - 1;
    if smsc_len <= 0 || smsc_len > MAX_SMSC_LEN as i32 {
        // The record is probably free space, but press on a bit more.
        debug!("invalid SMS Center length {smsc_len}, forcing to {MAX_SMSC_LEN}");
        smsc_len = MAX_SMSC_LEN as i32;
    }
    cursor.skip(1)?;

    let smsc_digits = cursor.take(smsc_len as usize)?;
    if smsc_digits[0] == 0xff {
        debug!("invalid SMS Center number, aborting parse for this record");
        return Err(Error::SmsInvalidSmsc);
    }
    let smsc = packed_bcd_to_ascii(smsc_digits, true, true, false);

    let kind = SmsKind::from(TpduType(cursor.take_u8()?).message_type());

    match kind {
        SmsKind::Deliver | SmsKind::Submit => {}
        SmsKind::Command | SmsKind::Reserved => {
            return Ok(SmsMessage {
                status,
                smsc,
                tpdu: None,
            });
        }
    }

    if kind == SmsKind::Submit {
        // TP-MR (message reference)
        cursor.skip(1)?;
    }

    // TP-OA / TP-DA length arrives in nibbles.
    let address_nibbles = cursor.take_u8()? as usize;
    let address_len = (address_nibbles + 1) / 2;
    if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address_len) {
        debug!("invalid address length ({address_len} bytes)");
        return Err(Error::SmsInvalidAddress);
    }

    let toa = TypeOfAddress(cursor.take_u8()?);
    debug!(
        "address TON {:#05b}, NPI {:#06b}",
        toa.type_of_number(),
        toa.numbering_plan()
    );
    let address_bytes = cursor.take(address_len)?;

    let address = if toa.is_alphanumeric() {
        gsm_text(address_bytes, address_len * 8 / 7)
    } else {
        packed_bcd_to_ascii(address_bytes, true, true, false)
    };

    // TP-PID (protocol identifier)
    cursor.skip(1)?;

    let charset = SmsCharset::from(cursor.take_u8()?);

    let timestamp = if kind == SmsKind::Submit {
        // TP-VP (validity period, relative form)
        cursor.skip(1)?;
        None
    } else {
        let year = cursor.take_u8()?;
        let month = cursor.take_u8()?;
        let day = cursor.take_u8()?;
        let hours = cursor.take_u8()?;
        let minutes = cursor.take_u8()?;
        let seconds = cursor.take_u8()?;
        let timezone = cursor.take_u8()?;

        Some(SmsTimestamp {
            date: format!(
                "{}/{}/20{}",
                timestamp_digits(month),
                timestamp_digits(day),
                timestamp_digits(year)
            ),
            time: format!(
                "{}:{}:{}",
                timestamp_digits(hours),
                timestamp_digits(minutes),
                timestamp_digits(seconds)
            ),
            timezone,
        })
    };

    let num_septets = cursor.take_u8()? as usize;
    let mut msg_len = (num_septets * 7).div_ceil(8);

    let bytes_remaining = cursor.remaining();
    debug!(
        "at offset {} in record, {bytes_remaining} bytes remaining",
        cursor.position()
    );

    let text = if msg_len == 0 {
        Some(String::new())
    } else {
        if msg_len > bytes_remaining {
            // Only happens on corrupted cards; never walk off the record.
            warn!(
                "message length ({msg_len} bytes) exceeds bytes remaining in record, \
                 truncating to {bytes_remaining}"
            );
            msg_len = bytes_remaining;
        }

        let user_data = cursor.take(msg_len)?;

        match charset {
            SmsCharset::Gsm7 => Some(gsm_text(user_data, num_septets)),
            SmsCharset::EightBit | SmsCharset::Ucs2 | SmsCharset::Reserved => {
                debug!("unsupported character set {charset:?}");
                None
            }
        }
    };

    Ok(SmsMessage {
        status,
        smsc,
        tpdu: Some(SmsTpdu {
            kind,
            address,
            timestamp,
            charset,
            text,
        }),
    })
}
