//! SCSI sense data to GSM status word translation.
//!
//! The card readers smuggle the GSM status words out of the card inside
//! standard SCSI sense data: the additional sense code (ASC) carries SW1 and
//! the qualifier (ASCQ) carries SW2 (GSM 11.11, section 9.4). Most SW1
//! families translate to a plain success or one of the `Gsm*` error codes;
//! the `0x91`/`0x9e`/`0x9f` family instead reports how many response bytes
//! are waiting for a GET RESPONSE.

use log::debug;

use crate::device::SenseLayout;
use crate::error::{Error, Result};

/// Sense response code for fixed-format, current sense
pub const SENSE_CURRENT_FIXED: u8 = 0x70;

/// Successful outcome of a sense translation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SenseStatus {
    /// Command finished; nothing further to fetch
    Complete,
    /// The card holds this many response bytes for GET RESPONSE
    Pending(u8),
}

impl SenseStatus {
    /// Bytes waiting for GET RESPONSE, zero when complete
    pub fn pending(&self) -> u8 {
        match self {
            Self::Complete => 0,
            Self::Pending(n) => *n,
        }
    }
}

/// Translate a sense buffer into a GSM-level outcome.
///
/// The buffer must reach past the ASCQ offset of the reader's sense layout
/// ([`Error::NoSenseData`] otherwise) and must be fixed-format current sense
/// ([`Error::UnknownSenseData`] otherwise).
pub fn translate_sense(sense: &[u8], layout: &SenseLayout) -> Result<SenseStatus> {
    if sense.len() < layout.ascq + 1 {
        return Err(Error::NoSenseData);
    }

    if sense[layout.response_code] != SENSE_CURRENT_FIXED {
        return Err(Error::UnknownSenseData);
    }

    let asc = sense[layout.asc];
    let ascq = sense[layout.ascq];

    // ASC carries SW1.
    match asc {
        0x67 => Err(Error::GsmErrorParam3),
        0x6b => Err(Error::GsmErrorParam1Or2),
        0x6d => Err(Error::GsmUnknownInstruction),
        0x6e => Err(Error::GsmWrongInstructionClass),
        0x6f => Err(Error::GsmTechnicalProblem),
        // Responses to commands which are correctly executed
        0x90 => match ascq {
            0x00 => Ok(SenseStatus::Complete),
            _ => Err(Error::GsmUnknownSw2),
        },
        // Memory management
        0x92 => match ascq {
            0x40 => Err(Error::GsmMemoryError),
            // Command successful but after an internal update retry
            _ => Ok(SenseStatus::Complete),
        },
        // Responses to commands which are postponed
        0x93 => Err(Error::GsmBusy),
        // Referencing management
        0x94 => match ascq {
            0x00 => Err(Error::GsmNoEfSelected),
            0x02 => Err(Error::GsmInvalidAddress),
            0x04 => Err(Error::GsmFileNotFound),
            0x08 => Err(Error::GsmFileInconsistent),
            _ => Err(Error::GsmUnknownSw2),
        },
        // Security management
        0x98 => match ascq {
            0x02 => Err(Error::GsmNoChvInitialized),
            0x04 => Err(Error::GsmChvVerificationFailed),
            0x08 => Err(Error::GsmChvStatusContradiction),
            0x10 => Err(Error::GsmInvalidationStatusContradiction),
            0x40 => Err(Error::GsmChvBlocked),
            0x50 => Err(Error::GsmIncreaseFailed),
            _ => Err(Error::GsmSecurityError),
        },
        // Command for ME, SIM data download error, or normal response data:
        // ASCQ is the byte count for GET RESPONSE.
        0x91 | 0x9e | 0x9f => Ok(SenseStatus::Pending(ascq)),
        _ => {
            debug!("unknown GSM status word 1 ({asc:#04x}); status word 2 = {ascq:#04x}");
            Err(Error::GsmUnknownSw1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: SenseLayout = SenseLayout {
        response_code: 0,
        asc: 12,
        ascq: 13,
    };

    fn sense(asc: u8, ascq: u8) -> [u8; 18] {
        let mut buf = [0u8; 18];
        buf[0] = SENSE_CURRENT_FIXED;
        buf[12] = asc;
        buf[13] = ascq;
        buf
    }

    #[test]
    fn test_pending_response_data() {
        assert_eq!(
            translate_sense(&sense(0x9f, 0x16), &LAYOUT),
            Ok(SenseStatus::Pending(22))
        );
        assert_eq!(
            translate_sense(&sense(0x91, 0x0f), &LAYOUT),
            Ok(SenseStatus::Pending(15))
        );
        assert_eq!(
            translate_sense(&sense(0x9e, 0x20), &LAYOUT),
            Ok(SenseStatus::Pending(32))
        );
        assert_eq!(SenseStatus::Pending(22).pending(), 22);
    }

    #[test]
    fn test_ok_family() {
        assert_eq!(
            translate_sense(&sense(0x90, 0x00), &LAYOUT),
            Ok(SenseStatus::Complete)
        );
        assert_eq!(
            translate_sense(&sense(0x90, 0x01), &LAYOUT),
            Err(Error::GsmUnknownSw2)
        );
    }

    #[test]
    fn test_memory_management_family() {
        assert_eq!(
            translate_sense(&sense(0x92, 0x40), &LAYOUT),
            Err(Error::GsmMemoryError)
        );
        // internal retry still counts as success
        assert_eq!(
            translate_sense(&sense(0x92, 0x03), &LAYOUT),
            Ok(SenseStatus::Complete)
        );
    }

    #[test]
    fn test_referencing_family() {
        assert_eq!(
            translate_sense(&sense(0x94, 0x00), &LAYOUT),
            Err(Error::GsmNoEfSelected)
        );
        assert_eq!(
            translate_sense(&sense(0x94, 0x02), &LAYOUT),
            Err(Error::GsmInvalidAddress)
        );
        assert_eq!(
            translate_sense(&sense(0x94, 0x04), &LAYOUT),
            Err(Error::GsmFileNotFound)
        );
        assert_eq!(
            translate_sense(&sense(0x94, 0x08), &LAYOUT),
            Err(Error::GsmFileInconsistent)
        );
        assert_eq!(
            translate_sense(&sense(0x94, 0x33), &LAYOUT),
            Err(Error::GsmUnknownSw2)
        );
    }

    #[test]
    fn test_security_family() {
        assert_eq!(
            translate_sense(&sense(0x98, 0x04), &LAYOUT),
            Err(Error::GsmChvVerificationFailed)
        );
        assert_eq!(
            translate_sense(&sense(0x98, 0x40), &LAYOUT),
            Err(Error::GsmChvBlocked)
        );
        assert_eq!(
            translate_sense(&sense(0x98, 0x77), &LAYOUT),
            Err(Error::GsmSecurityError)
        );
    }

    #[test]
    fn test_parameter_errors() {
        assert_eq!(
            translate_sense(&sense(0x67, 0x00), &LAYOUT),
            Err(Error::GsmErrorParam3)
        );
        assert_eq!(
            translate_sense(&sense(0x6b, 0x00), &LAYOUT),
            Err(Error::GsmErrorParam1Or2)
        );
        assert_eq!(
            translate_sense(&sense(0x6d, 0x00), &LAYOUT),
            Err(Error::GsmUnknownInstruction)
        );
    }

    #[test]
    fn test_unknown_sw1() {
        assert_eq!(
            translate_sense(&sense(0x42, 0x00), &LAYOUT),
            Err(Error::GsmUnknownSw1)
        );
    }

    #[test]
    fn test_malformed_sense_data() {
        // Too short to reach the ASCQ byte
        assert_eq!(
            translate_sense(&[0x70; 13], &LAYOUT),
            Err(Error::NoSenseData)
        );
        assert_eq!(translate_sense(&[], &LAYOUT), Err(Error::NoSenseData));

        // Wrong response code
        let mut buf = sense(0x90, 0x00);
        buf[0] = 0x71;
        assert_eq!(
            translate_sense(&buf, &LAYOUT),
            Err(Error::UnknownSenseData)
        );
    }
}
