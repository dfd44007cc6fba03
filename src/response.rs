//! Descriptors returned by GET RESPONSE after a SELECT.
//!
//! Selecting a master or dedicated file and selecting an elementary file
//! return different fixed-offset layouts (GSM 11.11, section 9.2.1). The
//! caller declares which one it asked for with [`SelectTarget`], and
//! [`parse_response`] yields the matching arm of [`SelectResponse`] — a
//! mismatched read of the other layout is unrepresentable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum GET RESPONSE length after selecting an EF
pub const MIN_EF_RESPONSE_LEN: usize = 15;
/// Minimum GET RESPONSE length after selecting an MF or DF
pub const MIN_MF_DF_RESPONSE_LEN: usize = 22;

bitfield! {
    /// CHV state byte from the MF/DF response: initialization flag in the
    /// high bit, remaining attempts in the low nibble.
    struct ChvState(u8);
    u8;
    attempts_remaining, _: 3, 0;
    initialized, _: 7, 7;
}

/// Which SELECT the pending GET RESPONSE answers
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum SelectTarget {
    /// A master or dedicated file was selected
    MfDf,
    /// An elementary file was selected
    Ef,
}

/// File type code from byte 6 of the response
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum FileType {
    Reserved = 0,
    Mf = 1,
    Df = 2,
    Ef = 4,
    Undefined = 0xff,
}

impl From<u8> for FileType {
    fn from(b: u8) -> Self {
        match b {
            0 => Self::Reserved,
            1 => Self::Mf,
            2 => Self::Df,
            4 => Self::Ef,
            _ => Self::Undefined,
        }
    }
}

impl From<FileType> for &'static str {
    fn from(t: FileType) -> Self {
        match t {
            FileType::Reserved => "Reserved",
            FileType::Mf => "MF",
            FileType::Df => "DF",
            FileType::Ef => "EF",
            FileType::Undefined => "[Undefined]",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(*self))
    }
}

/// Elementary file structure code from byte 13 of the EF response
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum EfStructure {
    Transparent = 0,
    LinearFixed = 1,
    Cyclic = 3,
    Undefined = 0xff,
}

impl From<u8> for EfStructure {
    fn from(b: u8) -> Self {
        match b {
            0 => Self::Transparent,
            1 => Self::LinearFixed,
            3 => Self::Cyclic,
            _ => Self::Undefined,
        }
    }
}

impl From<EfStructure> for &'static str {
    fn from(s: EfStructure) -> Self {
        match s {
            EfStructure::Transparent => "Transparent",
            EfStructure::LinearFixed => "Linear fixed",
            EfStructure::Cyclic => "Cyclic",
            EfStructure::Undefined => "[Undefined]",
        }
    }
}

impl fmt::Display for EfStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(*self))
    }
}

/// Master/dedicated file descriptor
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct MfDfResponse {
    /// Free memory under the selected directory, in bytes
    pub file_memory: u16,
    pub file_id: u16,
    pub file_type: FileType,
    pub characteristics: u8,
    /// CHV1 is enabled when bit 7 of the characteristics byte is *clear*
    pub chv1_enabled: bool,
    pub df_children: u8,
    pub ef_children: u8,
    pub num_chvs: u8,
    pub chv1_initialized: bool,
    pub chv1_attempts_remaining: u8,
    pub chv1_unblock_attempts_remaining: u8,
    pub chv2_initialized: bool,
    pub chv2_attempts_remaining: u8,
    pub chv2_unblock_attempts_remaining: u8,
}

impl fmt::Display for MfDfResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        write!(f, r#""file_id": "{:04x}", "#, self.file_id)?;
        write!(f, r#""file_type": "{}", "#, self.file_type)?;
        write!(f, r#""free_memory": {}, "#, self.file_memory)?;
        write!(f, r#""chv1_enabled": {}, "#, self.chv1_enabled)?;
        write!(f, r#""df_children": {}, "#, self.df_children)?;
        write!(f, r#""ef_children": {}, "#, self.ef_children)?;
        write!(f, r#""chv1_attempts_remaining": {}"#, self.chv1_attempts_remaining)?;
        write!(f, "}}")
    }
}

/// Elementary file descriptor
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct EfResponse {
    /// File size in bytes
    pub file_size: u16,
    pub file_id: u16,
    pub file_type: FileType,
    pub status: u8,
    pub structure: EfStructure,
    /// Record length in bytes; zero for transparent files
    pub record_len: u8,
}

impl fmt::Display for EfResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        write!(f, r#""file_id": "{:04x}", "#, self.file_id)?;
        write!(f, r#""file_type": "{}", "#, self.file_type)?;
        write!(f, r#""file_size": {}, "#, self.file_size)?;
        write!(f, r#""structure": "{}", "#, self.structure)?;
        write!(f, r#""record_len": {}"#, self.record_len)?;
        write!(f, "}}")
    }
}

/// Parsed GET RESPONSE data, tagged by the [`SelectTarget`] the caller
/// declared.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum SelectResponse {
    MfDf(MfDfResponse),
    Ef(EfResponse),
}

impl SelectResponse {
    pub fn as_mf_df(&self) -> Option<&MfDfResponse> {
        match self {
            Self::MfDf(resp) => Some(resp),
            Self::Ef(_) => None,
        }
    }

    pub fn as_ef(&self) -> Option<&EfResponse> {
        match self {
            Self::Ef(resp) => Some(resp),
            Self::MfDf(_) => None,
        }
    }
}

impl fmt::Display for SelectResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MfDf(resp) => write!(f, "{resp}"),
            Self::Ef(resp) => write!(f, "{resp}"),
        }
    }
}

/// Parse raw GET RESPONSE data into the descriptor for `target`.
///
/// Returns [`Error::InvalidGsmResponse`] when the buffer is shorter than the
/// fixed layout requires.
pub fn parse_response(response: &[u8], target: SelectTarget) -> Result<SelectResponse> {
    match target {
        SelectTarget::Ef => {
            if response.len() < MIN_EF_RESPONSE_LEN {
                return Err(Error::InvalidGsmResponse);
            }

            // Bytes 0-1 reserved, bytes 8-10 access conditions (unparsed),
            // byte 12 reserved.
            Ok(SelectResponse::Ef(EfResponse {
                file_size: u16::from_be_bytes([response[2], response[3]]),
                file_id: u16::from_be_bytes([response[4], response[5]]),
                file_type: response[6].into(),
                status: response[11],
                structure: response[13].into(),
                record_len: response[14],
            }))
        }
        SelectTarget::MfDf => {
            if response.len() < MIN_MF_DF_RESPONSE_LEN {
                return Err(Error::InvalidGsmResponse);
            }

            let chv1 = ChvState(response[18]);
            let chv2 = ChvState(response[20]);

            Ok(SelectResponse::MfDf(MfDfResponse {
                file_memory: u16::from_be_bytes([response[2], response[3]]),
                file_id: u16::from_be_bytes([response[4], response[5]]),
                file_type: response[6].into(),
                characteristics: response[13],
                chv1_enabled: response[13] & 0x80 == 0,
                df_children: response[14],
                ef_children: response[15],
                num_chvs: response[16],
                chv1_initialized: chv1.initialized() != 0,
                chv1_attempts_remaining: chv1.attempts_remaining(),
                chv1_unblock_attempts_remaining: ChvState(response[19]).attempts_remaining(),
                chv2_initialized: chv2.initialized() != 0,
                chv2_attempts_remaining: chv2.attempts_remaining(),
                chv2_unblock_attempts_remaining: ChvState(response[21]).attempts_remaining(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[rustfmt::skip]
    fn test_parse_ef_response() -> Result<()> {
        let response = [
            // RFU | file size | file ID
            0x00, 0x00, 0x00, 0xb0, 0x6f, 0x3a,
            // type | RFU | access conditions | status
            0x04, 0x00, 0x00, 0x00, 0x00, 0x01,
            // RFU | structure | record length
            0x02, 0x01, 0x1c,
        ];

        let resp = parse_response(&response, SelectTarget::Ef)?;
        let ef = resp.as_ef().expect("EF arm");

        assert_eq!(ef.file_size, 0x00b0);
        assert_eq!(ef.file_id, 0x6f3a);
        assert_eq!(ef.file_type, FileType::Ef);
        assert_eq!(ef.status, 0x01);
        assert_eq!(ef.structure, EfStructure::LinearFixed);
        assert_eq!(ef.record_len, 28);
        assert!(resp.as_mf_df().is_none());

        Ok(())
    }

    #[test]
    #[rustfmt::skip]
    fn test_parse_mf_df_response() -> Result<()> {
        let response = [
            // RFU | free memory | file ID
            0x00, 0x00, 0x02, 0x4f, 0x3f, 0x00,
            // type | RFU x6
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // characteristics | DF children | EF children | CHV count | RFU
            0x80, 0x02, 0x05, 0x02, 0x00,
            // CHV1 status | CHV1 unblock | CHV2 status | CHV2 unblock
            0x83, 0x8a, 0x03, 0x0a,
        ];

        let resp = parse_response(&response, SelectTarget::MfDf)?;
        let mf = resp.as_mf_df().expect("MF/DF arm");

        assert_eq!(mf.file_memory, 0x024f);
        assert_eq!(mf.file_id, 0x3f00);
        assert_eq!(mf.file_type, FileType::Mf);
        // bit 7 of the characteristics byte set means CHV1 is *disabled*
        assert!(!mf.chv1_enabled);
        assert_eq!(mf.df_children, 2);
        assert_eq!(mf.ef_children, 5);
        assert_eq!(mf.num_chvs, 2);
        assert!(mf.chv1_initialized);
        assert_eq!(mf.chv1_attempts_remaining, 3);
        assert_eq!(mf.chv1_unblock_attempts_remaining, 10);
        assert!(!mf.chv2_initialized);
        assert_eq!(mf.chv2_attempts_remaining, 3);
        assert_eq!(mf.chv2_unblock_attempts_remaining, 10);

        Ok(())
    }

    #[test]
    fn test_short_responses_are_rejected() {
        let buf = [0u8; 32];

        assert_eq!(
            parse_response(&buf[..14], SelectTarget::Ef),
            Err(Error::InvalidGsmResponse)
        );
        assert_eq!(
            parse_response(&buf[..21], SelectTarget::MfDf),
            Err(Error::InvalidGsmResponse)
        );
        assert!(parse_response(&buf[..15], SelectTarget::Ef).is_ok());
        assert!(parse_response(&buf[..22], SelectTarget::MfDf).is_ok());
    }

    #[test]
    fn test_file_type_codes() {
        assert_eq!(FileType::from(1), FileType::Mf);
        assert_eq!(FileType::from(2), FileType::Df);
        assert_eq!(FileType::from(4), FileType::Ef);
        assert_eq!(FileType::from(9), FileType::Undefined);
        assert_eq!(EfStructure::from(0), EfStructure::Transparent);
        assert_eq!(EfStructure::from(3), EfStructure::Cyclic);
        assert_eq!(EfStructure::from(2), EfStructure::Undefined);
    }
}
