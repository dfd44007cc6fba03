//! The SIM command engine.
//!
//! [`SimReader`] wraps a [`ScsiTransport`] together with the index of the
//! reader's [`DeviceProfile`]. Every operation copies the profile's CDB
//! template, patches the command-specific bytes in, runs the transport, and
//! feeds any returned sense bytes through the translator — whose verdict
//! replaces the transport result. SELECT is the one command whose success
//! path *is* a sense code: the `0x9f` family reports how many response bytes
//! the follow-up GET RESPONSE should ask for.

use std::path::Path;

use log::debug;

use crate::device::{self, DeviceProfile};
use crate::error::{Error, Result};
use crate::response::{parse_response, SelectResponse, SelectTarget};
use crate::scsi::{Direction, ScsiCommand, ScsiTransport, SgDevice};
use crate::sense::{translate_sense, SenseStatus};
use crate::usb;
use crate::VERIFY_CHV_DATA_LEN;

/// Handle to one opened SIM card reader
#[derive(Debug)]
pub struct SimReader<T = SgDevice> {
    transport: T,
    profile_index: u8,
    name: String,
}

impl SimReader<SgDevice> {
    /// Open the SCSI-generic device for a name like `sg1`.
    ///
    /// The handle starts out with the default profile; call [`init`] to
    /// match the attached reader against the supported-device table and run
    /// its initialization sequence.
    ///
    /// [`init`]: SimReader::init
    pub fn open(dev_name: &str) -> Result<Self> {
        // Name must be at least three bytes long (e.g. 'sg1') and name a
        // SCSI-generic node.
        if dev_name.len() < 3 || !dev_name.starts_with("sg") {
            return Err(Error::InvalidDeviceName);
        }

        let path = Path::new("/dev").join(dev_name);
        debug!("ready to open {}", path.display());

        let transport = SgDevice::open(&path)?;
        debug!("device opened, name = {dev_name}");

        Ok(Self {
            transport,
            profile_index: 0,
            name: dev_name.into(),
        })
    }

    /// Check that the attached USB device is a supported reader and replay
    /// its initialization command sequence.
    ///
    /// Errors with [`Error::DeviceNotSupported`] for unknown hardware — we
    /// do not want to write vendor CDBs to some random, hapless device.
    pub fn init(&mut self) -> Result<()> {
        let (vendor, product) = usb::vendor_product(&self.name)?;
        self.profile_index = usb::find_profile(vendor, product)?;

        let profile = self.profile();
        debug!("initializing {}", profile.name);

        for init in profile.init {
            let mut data = if init.direction == Direction::Write {
                init.data.to_vec()
            } else {
                vec![0u8; init.data_len]
            };
            let mut sense = vec![0u8; profile.sense_len];

            let mut cmd = ScsiCommand::new(init.direction, init.cdb, &mut data, &mut sense);
            self.transport.send_cdb(&mut cmd)?;
        }

        Ok(())
    }
}

impl<T: ScsiTransport> SimReader<T> {
    /// Build a reader on an already-open transport with a known profile.
    ///
    /// This is the seam adapters and tests use instead of [`SimReader::open`].
    pub fn with_transport(transport: T, profile_index: u8, name: &str) -> Result<Self> {
        if device::profile(profile_index).is_none() {
            return Err(Error::InvalidParam);
        }

        Ok(Self {
            transport,
            profile_index,
            name: name.into(),
        })
    }

    /// Device name this handle was opened with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The active device profile
    pub fn profile(&self) -> &'static DeviceProfile {
        // The index is validated wherever it is set.
        device::profile(self.profile_index).unwrap_or(&device::PROFILES[0])
    }

    /// Close the underlying device
    pub fn close(self) -> Result<()> {
        self.transport.close()
    }

    // Runs one command and folds any sense data into the result. The sense
    // translation, when present, replaces the transport outcome.
    fn dispatch(
        &self,
        direction: Direction,
        cdb: &[u8],
        data: &mut [u8],
    ) -> Result<(usize, Option<SenseStatus>)> {
        let profile = self.profile();
        let mut sense = vec![0u8; profile.sense_len];

        let (data_xfered, sense_xfered) = {
            let mut cmd = ScsiCommand::new(direction, cdb, data, &mut sense);
            self.transport.send_cdb(&mut cmd)?;
            (cmd.data_xfered, cmd.sense_xfered)
        };

        if data_xfered != data.len() {
            debug!(
                "bytes transferred ({data_xfered}) is less than data buffer length ({})",
                data.len()
            );
        }

        let status = if sense_xfered > 0 {
            Some(translate_sense(&sense[..sense_xfered], &profile.sense)?)
        } else {
            None
        };

        Ok((data_xfered, status))
    }

    /// Run the GSM SELECT command on a file ID.
    ///
    /// Returns the number of response bytes the card is holding for GET
    /// RESPONSE. A successful SELECT always produces sense data; its absence
    /// is [`Error::NoSenseData`].
    pub fn select_file(&self, file: u16) -> Result<u8> {
        let profile = self.profile();
        let cdb = profile.select.template.to_vec();

        // The file ID travels in the data block, big-endian.
        let mut data = file.to_be_bytes();

        let (_, status) = self.dispatch(Direction::Write, &cdb, &mut data)?;

        match status {
            Some(status) => Ok(status.pending()),
            None => Err(Error::NoSenseData),
        }
    }

    /// Run the GSM GET RESPONSE command and parse the result for the
    /// declared SELECT target.
    pub fn get_response(&self, len: u8, target: SelectTarget) -> Result<SelectResponse> {
        if len == 0 {
            return Err(Error::InvalidParam);
        }

        let profile = self.profile();
        let mut cdb = profile.get_response.template.to_vec();
        cdb[profile.get_response.len_offset] = len;

        let mut data = vec![0u8; len as usize];

        // Sense errors take precedence over the payload; a failed command
        // must not hand back a half-parsed descriptor.
        self.dispatch(Direction::Read, &cdb, &mut data)?;

        parse_response(&data, target)
    }

    /// SELECT a file and fetch its descriptor in one call.
    ///
    /// The GET RESPONSE length is the card's pending-byte count capped at
    /// `max_len`.
    pub fn select_file_and_get_response(
        &self,
        file: u16,
        max_len: u8,
        target: SelectTarget,
    ) -> Result<SelectResponse> {
        let pending = self.select_file(file)?;
        if pending == 0 {
            return Err(Error::InvalidGsmResponse);
        }

        self.get_response(pending.min(max_len), target)
    }

    /// Run the GSM READ RECORD command on the currently selected file.
    ///
    /// Records are one-indexed; `recno` zero is invalid. Reads
    /// `data.len()` bytes (at most 255) and returns the count transferred.
    pub fn read_record(&self, recno: u8, data: &mut [u8]) -> Result<usize> {
        if recno == 0 || data.is_empty() || data.len() > u8::MAX as usize {
            return Err(Error::InvalidParam);
        }

        let profile = self.profile();
        let mut cdb = profile.read_record.template.to_vec();
        cdb[profile.read_record.rec_offset] = recno;
        cdb[profile.read_record.len_offset] = data.len() as u8;

        let (data_xfered, _) = self.dispatch(Direction::Read, &cdb, data)?;

        Ok(data_xfered)
    }

    /// Run the GSM READ BINARY command on the currently selected
    /// transparent file, starting at a zero-based offset.
    pub fn read_binary(&self, offset: u16, data: &mut [u8]) -> Result<usize> {
        if data.is_empty() || data.len() > u8::MAX as usize {
            return Err(Error::InvalidParam);
        }

        let profile = self.profile();
        let mut cdb = profile.read_binary.template.to_vec();
        cdb[profile.read_binary.hi_offset] = (offset >> 8) as u8;
        cdb[profile.read_binary.lo_offset] = (offset & 0xff) as u8;
        cdb[profile.read_binary.len_offset] = data.len() as u8;

        let (data_xfered, _) = self.dispatch(Direction::Read, &cdb, data)?;

        Ok(data_xfered)
    }

    /// Run the GSM UPDATE RECORD command on the currently selected file.
    /// Records are one-indexed, like [`read_record`](SimReader::read_record).
    pub fn update_record(&self, recno: u8, data: &[u8]) -> Result<()> {
        if recno == 0 || data.is_empty() || data.len() > u8::MAX as usize {
            return Err(Error::InvalidParam);
        }

        let profile = self.profile();
        let mut cdb = profile.update_record.template.to_vec();
        cdb[profile.update_record.rec_offset] = recno;
        cdb[profile.update_record.len_offset] = data.len() as u8;

        let mut data = data.to_vec();
        self.dispatch(Direction::Write, &cdb, &mut data)?;

        Ok(())
    }

    /// Run the GSM UPDATE BINARY command on the currently selected
    /// transparent file, starting at a zero-based offset.
    pub fn update_binary(&self, offset: u16, data: &[u8]) -> Result<()> {
        if data.is_empty() || data.len() > u8::MAX as usize {
            return Err(Error::InvalidParam);
        }

        let profile = self.profile();
        let mut cdb = profile.update_binary.template.to_vec();
        cdb[profile.update_binary.hi_offset] = (offset >> 8) as u8;
        cdb[profile.update_binary.lo_offset] = (offset & 0xff) as u8;
        cdb[profile.update_binary.len_offset] = data.len() as u8;

        let mut data = data.to_vec();
        self.dispatch(Direction::Write, &cdb, &mut data)?;

        Ok(())
    }

    /// Run the GSM VERIFY CHV command.
    ///
    /// The PIN must be ASCII decimal digits, at most eight of them; the
    /// card receives the digit codepoints in an 8-byte block padded with
    /// `0xff`, not BCD.
    pub fn verify_chv(&self, chv: u8, pin: &str) -> Result<()> {
        if !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidPin);
        }
        if pin.len() > VERIFY_CHV_DATA_LEN {
            return Err(Error::GsmErrorParam3);
        }

        let profile = self.profile();
        let mut cdb = profile.verify_chv.template.to_vec();
        cdb[profile.verify_chv.chv_offset] = chv;

        let mut data = [0xffu8; VERIFY_CHV_DATA_LEN];
        data[..pin.len()].copy_from_slice(pin.as_bytes());

        // No sense data at all means the verification went through.
        self.dispatch(Direction::Write, &cdb, &mut data)?;

        Ok(())
    }

    /// Run an arbitrary GSM command through the reader's raw pass-through
    /// CDB. No semantic checking: this assumes you know what you are doing,
    /// as arbitrary commands can mess up a SIM card pretty thoroughly.
    pub fn send_raw_command(
        &self,
        direction: Direction,
        command: u8,
        p1: u8,
        p2: u8,
        p3: u8,
        data: &mut [u8],
    ) -> Result<SenseStatus> {
        let profile = self.profile();
        let mut cdb = profile.raw.template.to_vec();

        cdb[profile.raw.dir_offset] = if direction == Direction::Write {
            profile.write_op
        } else {
            profile.read_op
        };
        cdb[profile.raw.ins_offset] = command;
        cdb[profile.raw.p1_offset] = p1;
        cdb[profile.raw.p2_offset] = p2;
        cdb[profile.raw.p3_offset] = p3;

        let (_, status) = self.dispatch(direction, &cdb, data)?;

        Ok(status.unwrap_or(SenseStatus::Complete))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::ins;

    #[derive(Default, Debug)]
    struct MockReply {
        data: Vec<u8>,
        sense: Vec<u8>,
    }

    #[derive(Default, Debug)]
    struct MockTransport {
        replies: RefCell<VecDeque<MockReply>>,
        cdbs: RefCell<Vec<Vec<u8>>>,
        data_blocks: RefCell<Vec<Vec<u8>>>,
    }

    impl MockTransport {
        fn reply(self, data: &[u8], sense: &[u8]) -> Self {
            self.replies.borrow_mut().push_back(MockReply {
                data: data.to_vec(),
                sense: sense.to_vec(),
            });
            self
        }

        fn cdb(&self, i: usize) -> Vec<u8> {
            self.cdbs.borrow()[i].clone()
        }

        fn data_block(&self, i: usize) -> Vec<u8> {
            self.data_blocks.borrow()[i].clone()
        }
    }

    impl ScsiTransport for MockTransport {
        fn send_cdb(&self, cmd: &mut ScsiCommand<'_>) -> Result<()> {
            self.cdbs.borrow_mut().push(cmd.cdb.to_vec());
            self.data_blocks.borrow_mut().push(cmd.data.to_vec());

            let reply = self.replies.borrow_mut().pop_front().unwrap_or_default();

            let n = reply.data.len().min(cmd.data.len());
            cmd.data[..n].copy_from_slice(&reply.data[..n]);
            cmd.data_xfered = n;

            let s = reply.sense.len().min(cmd.sense.len());
            cmd.sense[..s].copy_from_slice(&reply.sense[..s]);
            cmd.sense_xfered = s;

            Ok(())
        }

        fn close(self) -> Result<()> {
            Ok(())
        }
    }

    fn sense(asc: u8, ascq: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 18];
        buf[0] = 0x70;
        buf[12] = asc;
        buf[13] = ascq;
        buf
    }

    fn reader(transport: MockTransport) -> SimReader<MockTransport> {
        SimReader::with_transport(transport, 0, "sg9").expect("valid profile")
    }

    #[test]
    fn test_open_rejects_bad_device_names() {
        assert_eq!(
            SimReader::open("hda1").unwrap_err(),
            Error::InvalidDeviceName
        );
        assert_eq!(SimReader::open("sg").unwrap_err(), Error::InvalidDeviceName);
        assert_eq!(SimReader::open("").unwrap_err(), Error::InvalidDeviceName);
    }

    #[test]
    fn test_with_transport_rejects_unknown_profile() {
        let err = SimReader::with_transport(MockTransport::default(), 0xff, "sg9").unwrap_err();

        assert_eq!(err, Error::InvalidParam);
    }

    #[test]
    fn test_select_file_reports_pending_bytes() -> Result<()> {
        let sim = reader(MockTransport::default().reply(&[], &sense(0x9f, 0x0f)));

        assert_eq!(sim.select_file(0x3f00)?, 15);

        // SELECT carries the file ID big-endian in the data block.
        assert_eq!(sim.transport.data_block(0), vec![0x3f, 0x00]);

        Ok(())
    }

    #[test]
    fn test_select_file_without_sense_data() {
        let sim = reader(MockTransport::default());

        assert_eq!(sim.select_file(0x3f00), Err(Error::NoSenseData));
    }

    #[test]
    fn test_select_file_not_found() {
        let sim = reader(MockTransport::default().reply(&[], &sense(0x94, 0x04)));

        assert_eq!(sim.select_file(0x6f3a), Err(Error::GsmFileNotFound));
    }

    #[test]
    #[rustfmt::skip]
    fn test_select_and_get_response_flow() -> Result<()> {
        let ef_response = [
            0x00, 0x00, 0x00, 0xb0, 0x6f, 0x3c,
            0x04, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x01, 0xb0,
        ];

        let sim = reader(
            MockTransport::default()
                .reply(&[], &sense(0x9f, 0x0f))
                .reply(&ef_response, &sense(0x90, 0x00)),
        );

        let resp = sim.select_file_and_get_response(0x6f3c, 0x80, SelectTarget::Ef)?;
        let ef = resp.as_ef().expect("EF arm");

        assert_eq!(ef.file_id, 0x6f3c);
        assert_eq!(ef.file_size, 0xb0);
        assert_eq!(ef.record_len, 0xb0);

        // GET RESPONSE asked for exactly the pending count.
        let profile = sim.profile();
        assert_eq!(sim.transport.cdb(1)[profile.get_response.len_offset], 15);

        Ok(())
    }

    #[test]
    fn test_get_response_zero_length() {
        let sim = reader(MockTransport::default());

        assert_eq!(
            sim.get_response(0, SelectTarget::Ef).unwrap_err(),
            Error::InvalidParam
        );
    }

    #[test]
    fn test_read_record_patches_cdb() -> Result<()> {
        let record = vec![0xaau8; 28];
        let sim = reader(MockTransport::default().reply(&record, &sense(0x90, 0x00)));

        let mut data = vec![0u8; 28];
        assert_eq!(sim.read_record(3, &mut data)?, 28);
        assert_eq!(data, record);

        let profile = sim.profile();
        let cdb = sim.transport.cdb(0);
        assert_eq!(cdb[profile.read_record.rec_offset], 3);
        assert_eq!(cdb[profile.read_record.len_offset], 28);

        Ok(())
    }

    #[test]
    fn test_read_record_validations() {
        let sim = reader(MockTransport::default());
        let mut data = [0u8; 16];

        assert_eq!(sim.read_record(0, &mut data), Err(Error::InvalidParam));
        assert_eq!(sim.read_record(1, &mut []), Err(Error::InvalidParam));
    }

    #[test]
    fn test_read_binary_patches_offsets() -> Result<()> {
        let sim = reader(MockTransport::default().reply(&[0u8; 10], &sense(0x90, 0x00)));

        let mut data = [0u8; 10];
        sim.read_binary(0x0102, &mut data)?;

        let profile = sim.profile();
        let cdb = sim.transport.cdb(0);
        assert_eq!(cdb[profile.read_binary.hi_offset], 0x01);
        assert_eq!(cdb[profile.read_binary.lo_offset], 0x02);
        assert_eq!(cdb[profile.read_binary.len_offset], 10);

        Ok(())
    }

    #[test]
    fn test_update_record_sends_payload() -> Result<()> {
        let sim = reader(MockTransport::default().reply(&[], &sense(0x90, 0x00)));

        let payload = [0x11u8; 28];
        sim.update_record(2, &payload)?;

        assert_eq!(sim.transport.data_block(0), payload.to_vec());

        Ok(())
    }

    #[test]
    fn test_verify_chv_pin_validation() {
        let sim = reader(MockTransport::default());

        assert_eq!(sim.verify_chv(1, "12a4"), Err(Error::InvalidPin));
        assert_eq!(sim.verify_chv(1, "123456789"), Err(Error::GsmErrorParam3));
    }

    #[test]
    fn test_verify_chv_builds_padded_block() -> Result<()> {
        let sim = reader(MockTransport::default().reply(&[], &[]));

        sim.verify_chv(1, "1234")?;

        // The SIM expects ASCII codepoints padded with 0xff, not BCD.
        assert_eq!(
            sim.transport.data_block(0),
            vec![b'1', b'2', b'3', b'4', 0xff, 0xff, 0xff, 0xff]
        );

        let profile = sim.profile();
        assert_eq!(sim.transport.cdb(0)[profile.verify_chv.chv_offset], 1);

        Ok(())
    }

    #[test]
    fn test_verify_chv_blocked() {
        let sim = reader(MockTransport::default().reply(&[], &sense(0x98, 0x40)));

        assert_eq!(sim.verify_chv(1, "0000"), Err(Error::GsmChvBlocked));
    }

    #[test]
    fn test_raw_command_patches_all_fields() -> Result<()> {
        let sim = reader(MockTransport::default().reply(&[0u8; 4], &sense(0x90, 0x00)));

        let mut data = [0u8; 4];
        let status =
            sim.send_raw_command(Direction::Read, ins::READ_BINARY, 0x00, 0x02, 0x04, &mut data)?;

        assert_eq!(status, SenseStatus::Complete);

        let profile = sim.profile();
        let cdb = sim.transport.cdb(0);
        assert_eq!(cdb[profile.raw.dir_offset], profile.read_op);
        assert_eq!(cdb[profile.raw.ins_offset], ins::READ_BINARY);
        assert_eq!(cdb[profile.raw.p1_offset], 0x00);
        assert_eq!(cdb[profile.raw.p2_offset], 0x02);
        assert_eq!(cdb[profile.raw.p3_offset], 0x04);

        Ok(())
    }

    #[test]
    fn test_second_profile_offsets() -> Result<()> {
        let transport = MockTransport::default().reply(&[0u8; 16], &sense(0x90, 0x00));
        let sim = SimReader::with_transport(transport, 1, "sg9")?;

        let mut data = [0u8; 16];
        sim.read_record(5, &mut data)?;

        let profile = sim.profile();
        assert_eq!(profile.cdb_len, 10);

        let cdb = sim.transport.cdb(0);
        assert_eq!(cdb.len(), 10);
        assert_eq!(cdb[profile.read_record.rec_offset], 5);
        assert_eq!(cdb[profile.read_record.len_offset], 16);

        Ok(())
    }
}
