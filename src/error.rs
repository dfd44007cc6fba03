use std::fmt;

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

/// Error codes returned across the library boundary.
///
/// The discriminants are stable integer identifiers carried over from the
/// original C API, so callers that pass codes across a wire or FFI boundary
/// can keep matching on the numeric values. Three families share the one
/// enum: library-layer validation errors, transport-layer failures, and the
/// GSM status words reported by the card itself (the `Gsm*` variants, which
/// mirror the sense-byte translation table in [`sense`](crate::sense)).
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Error {
    DeviceOpenFailed = -1,
    DeviceCloseFailed = -2,
    DeviceNotSupported = -3,
    InvalidFileDescriptor = -4,
    SysfsWalkFailed = -5,
    UsbVendorOpenFailed = -6,
    UsbProductOpenFailed = -7,
    ScsiSendError = -8,
    NoSenseData = -9,
    UnknownSenseData = -10,
    InvalidPin = -11,
    /// Retained for code-table compatibility; Rust allocation failure aborts
    /// instead of reporting this.
    AllocationFailed = -12,
    InvalidParam = -13,
    InvalidGsmResponse = -14,
    InvalidDeviceName = -15,
    SmsInvalidStatus = -16,
    SmsInvalidSmsc = -17,
    SmsInvalidAddress = -18,
    GsmErrorParam3 = -20,
    GsmErrorParam1Or2 = -21,
    GsmUnknownInstruction = -22,
    GsmWrongInstructionClass = -23,
    GsmTechnicalProblem = -24,
    GsmMemoryError = -25,
    GsmBusy = -26,
    GsmNoEfSelected = -27,
    GsmInvalidAddress = -28,
    GsmFileNotFound = -29,
    GsmFileInconsistent = -30,
    GsmUnknownSw1 = -31,
    GsmUnknownSw2 = -32,
    GsmNoChvInitialized = -33,
    GsmChvVerificationFailed = -34,
    GsmChvStatusContradiction = -35,
    GsmInvalidationStatusContradiction = -36,
    GsmChvBlocked = -37,
    GsmIncreaseFailed = -38,
    GsmSecurityError = -39,
    GsmInvalidAdnRecord = -40,
}

impl Error {
    /// Get the stable integer identifier for this error
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<Error> for &'static str {
    fn from(err: Error) -> Self {
        match err {
            Error::DeviceOpenFailed => "Device open failed",
            Error::DeviceCloseFailed => "Device close failed",
            Error::DeviceNotSupported => "Device not supported",
            Error::InvalidFileDescriptor => "Invalid file descriptor",
            Error::SysfsWalkFailed => "sysfs directory traversal failed",
            Error::UsbVendorOpenFailed => "USB vendor file open failed",
            Error::UsbProductOpenFailed => "USB product file open failed",
            Error::ScsiSendError => "ioctl() for SCSI send failed",
            Error::NoSenseData => "No SCSI sense data",
            Error::UnknownSenseData => "Unknown SCSI sense data",
            Error::InvalidPin => "Invalid PIN",
            Error::AllocationFailed => "Memory allocation error",
            Error::InvalidParam => "Invalid parameter",
            Error::InvalidGsmResponse => "Invalid GSM response",
            Error::InvalidDeviceName => "Invalid device name",
            Error::SmsInvalidStatus => "Invalid SMS status",
            Error::SmsInvalidSmsc => "Invalid SMS Center number",
            Error::SmsInvalidAddress => "Invalid SMS address",
            Error::GsmErrorParam3 => "GSM: Incorrect parameter P3",
            Error::GsmErrorParam1Or2 => "GSM: Incorrect parameter P1 or P2",
            Error::GsmUnknownInstruction => "GSM: Unknown instruction code in command",
            Error::GsmWrongInstructionClass => "GSM: Wrong instruction class in command",
            Error::GsmTechnicalProblem => "GSM: Technical problem with no diagnostic given",
            Error::GsmMemoryError => "GSM: Memory problem",
            Error::GsmBusy => "GSM: SIM Application Toolkit busy",
            Error::GsmNoEfSelected => "GSM: No EF selected",
            Error::GsmInvalidAddress => "GSM: Out of range (invalid address)",
            Error::GsmFileNotFound => "GSM: File ID or pattern not found",
            Error::GsmFileInconsistent => "GSM: File inconsistent with command",
            Error::GsmUnknownSw1 => "GSM: Unknown status word SW1",
            Error::GsmUnknownSw2 => "GSM: Unknown status word SW2",
            Error::GsmNoChvInitialized => "GSM: No CHV initialized",
            Error::GsmChvVerificationFailed => "GSM: CHV verification failed",
            Error::GsmChvStatusContradiction => "GSM: CHV status contradiction",
            Error::GsmInvalidationStatusContradiction => "GSM: Invalidation status contradiction",
            Error::GsmChvBlocked => "GSM: CHV blocked",
            Error::GsmIncreaseFailed => "GSM: Increase cannot be performed (max value reached)",
            Error::GsmSecurityError => "GSM: Security error",
            Error::GsmInvalidAdnRecord => "GSM: Invalid ADN record",
        }
    }
}

impl From<&Error> for &'static str {
    fn from(err: &Error) -> Self {
        (*err).into()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", <&'static str>::from(self), self.code())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::DeviceOpenFailed.code(), -1);
        assert_eq!(Error::ScsiSendError.code(), -8);
        assert_eq!(Error::InvalidParam.code(), -13);
        assert_eq!(Error::SmsInvalidAddress.code(), -18);
        assert_eq!(Error::GsmErrorParam3.code(), -20);
        assert_eq!(Error::GsmChvBlocked.code(), -37);
        assert_eq!(Error::GsmInvalidAdnRecord.code(), -40);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", Error::GsmFileNotFound),
            "GSM: File ID or pattern not found (-29)"
        );
        assert_eq!(format!("{}", Error::NoSenseData), "No SCSI sense data (-9)");
    }
}
