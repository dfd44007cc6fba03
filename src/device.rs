//! Per-reader CDB templates and the supported-reader table.
//!
//! Every supported reader model wraps GSM command APDUs in its own
//! vendor-specific CDB layout. A [`DeviceProfile`] captures that layout as
//! read-only data: the base CDB for each command, the offsets the engine
//! patches before sending, the bytes that select transfer direction, the
//! sense-buffer geometry, and the initialization sequence the reader wants
//! after power-up. Profiles are compile-time data; a reader handle stores
//! only its index into [`PROFILES`].

use crate::scsi::Direction;

/// Offsets of the interesting bytes inside a reader's sense buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SenseLayout {
    /// Sense response-code byte (must read `0x70`)
    pub response_code: usize,
    /// Additional sense code, carrying GSM SW1
    pub asc: usize,
    /// Additional sense code qualifier, carrying GSM SW2
    pub ascq: usize,
}

/// One command of a reader's initialization sequence
#[derive(Clone, Copy, Debug)]
pub struct InitCmd {
    pub direction: Direction,
    pub cdb: &'static [u8],
    /// Payload for write commands, empty for reads
    pub data: &'static [u8],
    /// Transfer length; scratch-buffer size for read commands
    pub data_len: usize,
}

/// SELECT: no patching, the file ID travels in the data block
#[derive(Clone, Copy, Debug)]
pub struct SelectCdb {
    pub template: &'static [u8],
}

/// GET RESPONSE: patch the requested length
#[derive(Clone, Copy, Debug)]
pub struct GetResponseCdb {
    pub template: &'static [u8],
    pub len_offset: usize,
}

/// READ RECORD / UPDATE RECORD: patch record number and length
#[derive(Clone, Copy, Debug)]
pub struct RecordCdb {
    pub template: &'static [u8],
    pub rec_offset: usize,
    pub len_offset: usize,
}

/// READ BINARY / UPDATE BINARY: patch the two offset bytes and the length
#[derive(Clone, Copy, Debug)]
pub struct BinaryCdb {
    pub template: &'static [u8],
    pub hi_offset: usize,
    pub lo_offset: usize,
    pub len_offset: usize,
}

/// VERIFY CHV: patch the CHV number
#[derive(Clone, Copy, Debug)]
pub struct ChvCdb {
    pub template: &'static [u8],
    pub chv_offset: usize,
}

/// Raw pass-through: patch direction opcode, instruction, and P1..P3
#[derive(Clone, Copy, Debug)]
pub struct RawCdb {
    pub template: &'static [u8],
    pub dir_offset: usize,
    pub ins_offset: usize,
    pub p1_offset: usize,
    pub p2_offset: usize,
    pub p3_offset: usize,
}

/// Read-only description of one supported reader model
#[derive(Clone, Copy, Debug)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub cdb_len: usize,
    pub sense_len: usize,
    pub sense: SenseLayout,
    /// Vendor opcode selecting a device-to-host transfer
    pub read_op: u8,
    /// Vendor opcode selecting a host-to-device transfer
    pub write_op: u8,
    pub init: &'static [InitCmd],
    pub select: SelectCdb,
    pub get_response: GetResponseCdb,
    pub read_record: RecordCdb,
    pub read_binary: BinaryCdb,
    pub update_record: RecordCdb,
    pub update_binary: BinaryCdb,
    pub verify_chv: ChvCdb,
    pub raw: RawCdb,
}

/// A supported USB reader: vendor ID, product ID, profile index
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UsbId {
    pub vendor: u16,
    pub product: u16,
    pub profile: u8,
}

// Profile 0: 12-byte vendor CDBs with the GSM APDU header at bytes 5..10.
mod usbest {
    use super::*;

    pub(super) const READ_OP: u8 = 0xd5;
    pub(super) const WRITE_OP: u8 = 0xd4;

    pub(super) const INIT: &[InitCmd] = &[
        // Wake the card interface
        InitCmd {
            direction: Direction::Write,
            cdb: &[0xd4, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
            data: &[0x01],
            data_len: 1,
        },
        // Fetch the ATR the reader cached at insertion
        InitCmd {
            direction: Direction::Read,
            cdb: &[0xd5, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00],
            data: &[],
            data_len: 16,
        },
    ];

    pub(super) const SELECT: &[u8] =
        &[0xd4, 0x00, 0x00, 0x00, 0x00, 0xa0, 0xa4, 0x00, 0x00, 0x02, 0x00, 0x00];
    pub(super) const GET_RESPONSE: &[u8] =
        &[0xd5, 0x00, 0x00, 0x00, 0x00, 0xa0, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const READ_RECORD: &[u8] =
        &[0xd5, 0x00, 0x00, 0x00, 0x00, 0xa0, 0xb2, 0x00, 0x04, 0x00, 0x00, 0x00];
    pub(super) const READ_BINARY: &[u8] =
        &[0xd5, 0x00, 0x00, 0x00, 0x00, 0xa0, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const UPDATE_RECORD: &[u8] =
        &[0xd4, 0x00, 0x00, 0x00, 0x00, 0xa0, 0xdc, 0x00, 0x04, 0x00, 0x00, 0x00];
    pub(super) const UPDATE_BINARY: &[u8] =
        &[0xd4, 0x00, 0x00, 0x00, 0x00, 0xa0, 0xd6, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const VERIFY_CHV: &[u8] =
        &[0xd4, 0x00, 0x00, 0x00, 0x00, 0xa0, 0x20, 0x00, 0x00, 0x08, 0x00, 0x00];
    pub(super) const RAW: &[u8] =
        &[0x00, 0x00, 0x00, 0x00, 0x00, 0xa0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
}

// Profile 1: 10-byte vendor CDBs with the APDU header right after the opcode.
mod megawin {
    use super::*;

    pub(super) const READ_OP: u8 = 0xe7;
    pub(super) const WRITE_OP: u8 = 0xe6;

    pub(super) const INIT: &[InitCmd] = &[InitCmd {
        direction: Direction::Read,
        cdb: &[0xe7, 0x00, 0x00, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00],
        data: &[],
        data_len: 32,
    }];

    pub(super) const SELECT: &[u8] = &[0xe6, 0xa0, 0xa4, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00];
    pub(super) const GET_RESPONSE: &[u8] =
        &[0xe7, 0xa0, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const READ_RECORD: &[u8] =
        &[0xe7, 0xa0, 0xb2, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const READ_BINARY: &[u8] =
        &[0xe7, 0xa0, 0xb0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const UPDATE_RECORD: &[u8] =
        &[0xe6, 0xa0, 0xdc, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const UPDATE_BINARY: &[u8] =
        &[0xe6, 0xa0, 0xd6, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    pub(super) const VERIFY_CHV: &[u8] =
        &[0xe6, 0xa0, 0x20, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00];
    pub(super) const RAW: &[u8] = &[0x00, 0xa0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
}

/// The profile table. Indexed by [`UsbId::profile`]; read-only after
/// registration here.
pub const PROFILES: &[DeviceProfile] = &[
    DeviceProfile {
        name: "USBest USB2.0 SIM reader",
        cdb_len: 12,
        sense_len: 18,
        sense: SenseLayout {
            response_code: 0,
            asc: 12,
            ascq: 13,
        },
        read_op: usbest::READ_OP,
        write_op: usbest::WRITE_OP,
        init: usbest::INIT,
        select: SelectCdb {
            template: usbest::SELECT,
        },
        get_response: GetResponseCdb {
            template: usbest::GET_RESPONSE,
            len_offset: 9,
        },
        read_record: RecordCdb {
            template: usbest::READ_RECORD,
            rec_offset: 7,
            len_offset: 9,
        },
        read_binary: BinaryCdb {
            template: usbest::READ_BINARY,
            hi_offset: 7,
            lo_offset: 8,
            len_offset: 9,
        },
        update_record: RecordCdb {
            template: usbest::UPDATE_RECORD,
            rec_offset: 7,
            len_offset: 9,
        },
        update_binary: BinaryCdb {
            template: usbest::UPDATE_BINARY,
            hi_offset: 7,
            lo_offset: 8,
            len_offset: 9,
        },
        verify_chv: ChvCdb {
            template: usbest::VERIFY_CHV,
            chv_offset: 8,
        },
        raw: RawCdb {
            template: usbest::RAW,
            dir_offset: 0,
            ins_offset: 6,
            p1_offset: 7,
            p2_offset: 8,
            p3_offset: 9,
        },
    },
    DeviceProfile {
        name: "Megawin SIM dongle",
        cdb_len: 10,
        sense_len: 32,
        sense: SenseLayout {
            response_code: 0,
            asc: 12,
            ascq: 13,
        },
        read_op: megawin::READ_OP,
        write_op: megawin::WRITE_OP,
        init: megawin::INIT,
        select: SelectCdb {
            template: megawin::SELECT,
        },
        get_response: GetResponseCdb {
            template: megawin::GET_RESPONSE,
            len_offset: 5,
        },
        read_record: RecordCdb {
            template: megawin::READ_RECORD,
            rec_offset: 3,
            len_offset: 5,
        },
        read_binary: BinaryCdb {
            template: megawin::READ_BINARY,
            hi_offset: 3,
            lo_offset: 4,
            len_offset: 5,
        },
        update_record: RecordCdb {
            template: megawin::UPDATE_RECORD,
            rec_offset: 3,
            len_offset: 5,
        },
        update_binary: BinaryCdb {
            template: megawin::UPDATE_BINARY,
            hi_offset: 3,
            lo_offset: 4,
            len_offset: 5,
        },
        verify_chv: ChvCdb {
            template: megawin::VERIFY_CHV,
            chv_offset: 4,
        },
        raw: RawCdb {
            template: megawin::RAW,
            dir_offset: 0,
            ins_offset: 2,
            p1_offset: 3,
            p2_offset: 4,
            p3_offset: 5,
        },
    },
];

/// Readers the library knows how to talk to. Matching is by USB vendor and
/// product ID read out of sysfs.
pub const SUPPORTED_READERS: &[UsbId] = &[
    UsbId {
        vendor: 0x1307,
        product: 0x0361,
        profile: 0,
    },
    UsbId {
        vendor: 0x0e6a,
        product: 0x0317,
        profile: 1,
    },
];

/// Look up the profile index for a USB vendor/product pair
pub fn profile_for(vendor: u16, product: u16) -> Option<u8> {
    SUPPORTED_READERS
        .iter()
        .find(|id| id.vendor == vendor && id.product == product)
        .map(|id| id.profile)
}

/// Get a profile by index
pub fn profile(index: u8) -> Option<&'static DeviceProfile> {
    PROFILES.get(index as usize)
}
