//! SCSI command transport and the Linux SCSI-generic binding.
//!
//! The engine talks to a reader through the [`ScsiTransport`] trait: one
//! operation that executes a single CDB with a data buffer and a sense
//! buffer and reports how many bytes moved through each. [`SgDevice`] is the
//! production implementation on top of the `SG_IO` ioctl of the `sg` kernel
//! driver; tests and adapters substitute their own transport.

use std::fs::{File, OpenOptions};
use std::os::fd::{AsRawFd, IntoRawFd};
use std::os::raw::{c_int, c_uchar, c_uint, c_ushort, c_void};
use std::path::Path;
use std::ptr;

use log::{log_enabled, trace, Level};
use nix::ioctl_readwrite_bad;

use crate::error::{Error, Result};
use crate::logging::hex_dump;

/// Per-command transport timeout, in milliseconds
pub const SCSI_TIMEOUT_MS: u32 = 1000;

const SG_INTERFACE_ID: c_int = b'S' as c_int;
const SG_DXFER_NONE: c_int = -1;
const SG_DXFER_TO_DEV: c_int = -2;
const SG_DXFER_FROM_DEV: c_int = -3;

/// Transfer direction of one SCSI command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Direction {
    None,
    Write,
    Read,
}

impl From<Direction> for c_int {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::None => SG_DXFER_NONE,
            Direction::Write => SG_DXFER_TO_DEV,
            Direction::Read => SG_DXFER_FROM_DEV,
        }
    }
}

/// Everything needed to execute one CDB, plus the transfer counts reported
/// back by the transport.
#[derive(Debug)]
pub struct ScsiCommand<'a> {
    pub direction: Direction,
    pub cdb: &'a [u8],
    pub data: &'a mut [u8],
    pub sense: &'a mut [u8],
    /// Bytes moved through the data buffer
    pub data_xfered: usize,
    /// Bytes written to the sense buffer
    pub sense_xfered: usize,
}

impl<'a> ScsiCommand<'a> {
    pub fn new(
        direction: Direction,
        cdb: &'a [u8],
        data: &'a mut [u8],
        sense: &'a mut [u8],
    ) -> Self {
        Self {
            direction,
            cdb,
            data,
            sense,
            data_xfered: 0,
            sense_xfered: 0,
        }
    }
}

/// A transport that can execute one SCSI command against a reader.
///
/// Commands on one transport are strictly ordered by invocation; the SIM
/// behind it is a serial state machine.
pub trait ScsiTransport {
    /// Execute one command, filling in the transfer counts on return
    fn send_cdb(&self, cmd: &mut ScsiCommand<'_>) -> Result<()>;

    /// Release the underlying device
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Mirror of `struct sg_io_hdr` from `<scsi/sg.h>`; field order and types
/// must match the kernel exactly.
#[repr(C)]
pub struct SgIoHdr {
    interface_id: c_int,
    dxfer_direction: c_int,
    cmd_len: c_uchar,
    mx_sb_len: c_uchar,
    iovec_count: c_ushort,
    dxfer_len: c_uint,
    dxferp: *mut c_void,
    cmdp: *mut c_uchar,
    sbp: *mut c_uchar,
    timeout: c_uint,
    flags: c_uint,
    pack_id: c_int,
    usr_ptr: *mut c_void,
    status: c_uchar,
    masked_status: c_uchar,
    msg_status: c_uchar,
    sb_len_wr: c_uchar,
    host_status: c_ushort,
    driver_status: c_ushort,
    resid: c_int,
    duration: c_uint,
    info: c_uint,
}

impl SgIoHdr {
    fn new() -> Self {
        Self {
            interface_id: SG_INTERFACE_ID,
            dxfer_direction: SG_DXFER_NONE,
            cmd_len: 0,
            mx_sb_len: 0,
            iovec_count: 0,
            dxfer_len: 0,
            dxferp: ptr::null_mut(),
            cmdp: ptr::null_mut(),
            sbp: ptr::null_mut(),
            timeout: SCSI_TIMEOUT_MS,
            flags: 0,
            pack_id: 0,
            usr_ptr: ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        }
    }
}

ioctl_readwrite_bad!(sg_io, 0x2285, SgIoHdr);

/// An opened `/dev/sgX` device
#[derive(Debug)]
pub struct SgDevice {
    file: File,
}

impl SgDevice {
    /// Open a SCSI-generic device node read-write
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|_| Error::DeviceOpenFailed)?;

        Ok(Self { file })
    }
}

impl ScsiTransport for SgDevice {
    fn send_cdb(&self, cmd: &mut ScsiCommand<'_>) -> Result<()> {
        let mut hdr = SgIoHdr::new();

        hdr.dxfer_direction = cmd.direction.into();
        hdr.cmdp = cmd.cdb.as_ptr() as *mut c_uchar;
        hdr.cmd_len = cmd.cdb.len() as c_uchar;
        hdr.dxferp = cmd.data.as_mut_ptr() as *mut c_void;
        hdr.dxfer_len = cmd.data.len() as c_uint;
        hdr.sbp = cmd.sense.as_mut_ptr();
        hdr.mx_sb_len = cmd.sense.len() as c_uchar;

        if log_enabled!(Level::Trace) {
            trace!(">>> sending command >>>\n{}", hex_dump(cmd.cdb));
            if cmd.direction == Direction::Write {
                trace!(">>> sending data >>>\n{}", hex_dump(cmd.data));
            }
        }

        unsafe { sg_io(self.file.as_raw_fd(), &mut hdr) }.map_err(|_| Error::ScsiSendError)?;

        cmd.data_xfered = (hdr.dxfer_len as i64 - hdr.resid as i64).max(0) as usize;
        cmd.sense_xfered = hdr.sb_len_wr as usize;

        if log_enabled!(Level::Trace) {
            trace!("scsi status {}, {} data bytes transferred", hdr.status, cmd.data_xfered);
            if cmd.direction == Direction::Read && cmd.data_xfered > 0 {
                trace!("<<< received data <<<\n{}", hex_dump(&cmd.data[..cmd.data_xfered]));
            }
            if cmd.sense_xfered > 0 {
                trace!(
                    "received {} bytes of sense data\n{}",
                    cmd.sense_xfered,
                    hex_dump(&cmd.sense[..cmd.sense_xfered])
                );
            }
        }

        Ok(())
    }

    fn close(self) -> Result<()> {
        nix::unistd::close(self.file.into_raw_fd()).map_err(|_| Error::DeviceCloseFailed)
    }
}
