//! # GSM SIM access over SCSI-generic
//!
//! This crate drives a GSM SIM card through a USB card reader that presents
//! itself as a SCSI-generic (`/dev/sgX`) block device. SIM file-system
//! commands from GSM 11.11 / TS 100 977 are wrapped in vendor-specific SCSI
//! Command Descriptor Blocks, the SCSI sense bytes coming back carry the GSM
//! status words SW1/SW2, and the record payloads use the card's on-disk
//! formats: packed BCD digit strings, packed septets, and the GSM 7-bit
//! default alphabet.
//!
//! The crate splits into three layers:
//!
//! - pure codecs over byte buffers ([`bcd`], [`charset`]) and the record
//!   parsers built on them ([`adn`], [`sms`], [`response`]),
//! - the sense-byte translator ([`sense`]) mapping SCSI ASC/ASCQ to GSM
//!   status semantics,
//! - the command engine ([`sim`]) that fills per-reader CDB templates
//!   ([`device`]) and hands them to a [`scsi::ScsiTransport`].
//!
//! A typical session selects a file, asks the card how many response bytes
//! are pending, fetches them with GET RESPONSE, and then reads records or
//! binary data out of the selected file:
//!
//! ```no_run
//! use sgsim::{file_id, response::SelectTarget, sim::SimReader};
//!
//! # fn main() -> sgsim::Result<()> {
//! let mut reader = SimReader::open("sg1")?;
//! reader.init()?;
//!
//! let resp = reader.select_file_and_get_response(
//!     file_id::EF_ICCID,
//!     0x80,
//!     SelectTarget::Ef,
//! )?;
//! let ef = resp.as_ef().unwrap();
//!
//! let mut data = vec![0u8; ef.file_size as usize];
//! reader.read_binary(0, &mut data)?;
//! println!("ICCID: {}", sgsim::bcd::packed_bcd_to_ascii(&data, true, true, false));
//! reader.close()
//! # }
//! ```
//!
//! Commands issued on one reader are strictly ordered; the SIM is a serial
//! state machine with a single selected-file slot, so a reader handle must
//! not be shared between concurrent callers.

#[macro_use(bitfield)]
extern crate bitfield;

/// ADN (abbreviated dialling number) record parsing
pub mod adn;
/// Packed BCD digit strings
pub mod bcd;
/// GSM 7-bit default alphabet and septet unpacking
pub mod charset;
/// Per-reader CDB templates and the supported-reader table
pub mod device;
/// Library error types
pub mod error;
/// GSM file identifiers for SELECT
pub mod file_id;
/// Logging convenience helpers
pub mod logging;
/// SELECT response descriptors returned by GET RESPONSE
pub mod response;
/// SCSI command transport and the SCSI-generic ioctl binding
pub mod scsi;
/// SCSI sense data to GSM status word translation
pub mod sense;
/// The SIM command engine
pub mod sim;
/// SMS (TPDU) record parsing
pub mod sms;
/// USB vendor/product discovery through sysfs
pub mod usb;

pub use adn::*;
pub use bcd::*;
pub use charset::*;
pub use device::*;
pub use logging::*;
pub use response::*;
pub use scsi::*;
pub use sense::*;
pub use sim::*;
pub use sms::*;
pub use usb::*;

pub use crate::error::{Error, Result};

/// Class byte for every GSM 11.11 command APDU
pub const GSM_CLASS: u8 = 0xa0;

/// Instruction bytes for the GSM commands the engine knows how to build.
///
/// Anything else goes through [`sim::SimReader::send_raw_command`].
pub mod ins {
    pub const SELECT: u8 = 0xa4;
    pub const GET_RESPONSE: u8 = 0xc0;
    pub const READ_BINARY: u8 = 0xb0;
    pub const READ_RECORD: u8 = 0xb2;
    pub const UPDATE_BINARY: u8 = 0xd6;
    pub const UPDATE_RECORD: u8 = 0xdc;
    pub const VERIFY_CHV: u8 = 0x20;
}

/// Data length of a SELECT command (the two-byte file ID)
pub const SELECT_DATA_LEN: usize = 2;
/// Data length of a VERIFY CHV command (PIN padded with `0xff`)
pub const VERIFY_CHV_DATA_LEN: usize = 8;
