//! Dump the interesting contents of a SIM card: ICCID, service provider
//! name, the phonebook, and stored SMS messages.
//!
//! ```text
//! simdump sg1 -p 1234 -vv
//! ```

use std::process;

use log::{error, info, warn};
use serde::Serialize;
use structopt::StructOpt;

use sgsim::adn::{parse_adn, AdnEntry, AdnRecord};
use sgsim::bcd::packed_bcd_to_ascii;
use sgsim::charset::map_gsm_chars;
use sgsim::error::Result;
use sgsim::file_id;
use sgsim::logging::LogLevel;
use sgsim::response::{EfResponse, SelectTarget};
use sgsim::sim::SimReader;
use sgsim::sms::{parse_sms, SmsMessage};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "simdump",
    about = "Dump SIM card contents through a SCSI-generic card reader"
)]
struct Opt {
    /// SCSI generic device name, e.g. 'sg1'
    device: String,

    /// PIN (CHV1) to unlock the card with
    #[structopt(short = "p", long)]
    pin: Option<String>,

    /// Verbose output; repeat for more detail
    #[structopt(short = "v", long, parse(from_occurrences))]
    verbose: u32,

    /// Emit the card contents as JSON instead of text
    #[structopt(long)]
    json: bool,
}

/// Everything the demo collects off the card
#[derive(Debug, Default, Serialize)]
struct CardContents {
    iccid: Option<String>,
    service_provider: Option<String>,
    contacts: Vec<AdnEntry>,
    messages: Vec<SmsMessage>,
}

fn main() {
    let opt = Opt::from_args();

    pretty_env_logger::formatted_builder()
        .filter_level(LogLevel::from(opt.verbose + 2).into())
        .init();

    if let Err(err) = run(&opt) {
        error!("{err}");
        process::exit(1);
    }
}

fn run(opt: &Opt) -> Result<()> {
    let mut reader = SimReader::open(&opt.device)?;

    if let Err(err) = reader.init() {
        let _ = reader.close();
        return Err(err);
    }

    let contents = dump_card(&reader, opt);
    reader.close()?;

    let contents = contents?;
    if opt.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&contents).unwrap_or_default()
        );
    }

    Ok(())
}

// Response buffer cap handed to SELECT + GET RESPONSE.
const RESPONSE_LEN: u8 = 0x80;

fn dump_card<T: sgsim::scsi::ScsiTransport>(
    reader: &SimReader<T>,
    opt: &Opt,
) -> Result<CardContents> {
    let mut contents = CardContents::default();

    // Select the master file first: its descriptor says whether the card
    // wants a PIN before it will show us anything useful.
    let mf = reader.select_file_and_get_response(file_id::MF, RESPONSE_LEN, SelectTarget::MfDf)?;
    let mf = *mf.as_mf_df().ok_or(sgsim::Error::InvalidGsmResponse)?;

    if mf.chv1_enabled {
        if mf.chv1_attempts_remaining == 0 {
            warn!(
                "PIN blocked; {} PIN unblock attempts remaining",
                mf.chv1_unblock_attempts_remaining
            );
        } else if let Some(pin) = &opt.pin {
            info!(
                "PIN enabled on card; {} attempts remaining",
                mf.chv1_attempts_remaining
            );
            reader.verify_chv(1, pin)?;
            info!("PIN verification successful");
        } else {
            warn!("PIN enabled on card, but no PIN specified; some files will be unreadable");
        }
    }

    // ICCID lives directly under the master file as packed BCD.
    match read_transparent(reader, file_id::EF_ICCID) {
        Ok(data) => {
            let iccid = packed_bcd_to_ascii(&data, true, true, false);
            if !opt.json {
                println!("ICCID:\t{iccid}");
            }
            contents.iccid = Some(iccid);
        }
        Err(err) => error!("read EF-ICCID failed: {err}"),
    }

    // Service provider name is in the GSM directory; the first byte is
    // display condition flags, the rest GSM alphabet codes.
    reader.select_file_and_get_response(file_id::DF_GSM, RESPONSE_LEN, SelectTarget::MfDf)?;
    match read_transparent(reader, file_id::EF_SPN) {
        Ok(data) if data.len() > 1 => {
            let spn = map_gsm_chars(&data[1..]);
            if !opt.json {
                println!("SPN:\t{spn}");
            }
            contents.service_provider = Some(spn);
        }
        Ok(_) => warn!("EF-SPN is empty"),
        Err(err) => error!("read EF-SPN failed: {err}"),
    }

    // Back to the root, then into the telecom directory for the phonebook
    // and message store.
    reader.select_file_and_get_response(file_id::MF, RESPONSE_LEN, SelectTarget::MfDf)?;
    reader.select_file_and_get_response(file_id::DF_TELECOM, RESPONSE_LEN, SelectTarget::MfDf)?;

    match select_ef(reader, file_id::EF_ADN) {
        Ok(ef) => dump_contacts(reader, &ef, opt, &mut contents),
        Err(err) => error!("select EF-ADN failed: {err}"),
    }

    match select_ef(reader, file_id::EF_SMS) {
        Ok(ef) => dump_messages(reader, &ef, opt, &mut contents),
        Err(err) => error!("select EF-SMS failed: {err}"),
    }

    Ok(contents)
}

fn select_ef<T: sgsim::scsi::ScsiTransport>(
    reader: &SimReader<T>,
    file: u16,
) -> Result<EfResponse> {
    let resp = reader.select_file_and_get_response(file, RESPONSE_LEN, SelectTarget::Ef)?;

    resp.as_ef().copied().ok_or(sgsim::Error::InvalidGsmResponse)
}

// Selects a transparent EF and reads its whole body.
fn read_transparent<T: sgsim::scsi::ScsiTransport>(
    reader: &SimReader<T>,
    file: u16,
) -> Result<Vec<u8>> {
    let ef = select_ef(reader, file)?;

    let len = ef.file_size.min(u8::MAX as u16) as usize;
    let mut data = vec![0u8; len];
    let got = reader.read_binary(0, &mut data)?;
    data.truncate(got);

    Ok(data)
}

fn dump_contacts<T: sgsim::scsi::ScsiTransport>(
    reader: &SimReader<T>,
    ef: &EfResponse,
    opt: &Opt,
    contents: &mut CardContents,
) {
    if ef.record_len == 0 {
        warn!("EF-ADN has no record structure");
        return;
    }

    // Record count varies by SIM card manufacturer.
    let num_records = ef.file_size / ef.record_len as u16;
    let mut record = vec![0u8; ef.record_len as usize];

    for recno in 1..=num_records as u8 {
        if let Err(err) = reader.read_record(recno, &mut record) {
            error!("read ADN record {recno} failed: {err}");
            continue;
        }

        match parse_adn(&record) {
            Ok(AdnRecord::Entry(entry)) => {
                if !opt.json {
                    println!("Contact:\t{}\t{}", entry.name, entry.number);
                }
                contents.contacts.push(entry);
            }
            Ok(AdnRecord::Unused) => {}
            Err(err) => error!("ADN record {recno} parse failed: {err}"),
        }
    }
}

fn dump_messages<T: sgsim::scsi::ScsiTransport>(
    reader: &SimReader<T>,
    ef: &EfResponse,
    opt: &Opt,
    contents: &mut CardContents,
) {
    if ef.record_len == 0 {
        warn!("EF-SMS has no record structure");
        return;
    }

    let num_records = ef.file_size / ef.record_len as u16;
    let mut record = vec![0u8; ef.record_len as usize];

    for recno in 1..=num_records as u8 {
        if let Err(err) = reader.read_record(recno, &mut record) {
            error!("read SMS record {recno} failed: {err}");
            continue;
        }

        // Free-space records fail with an invalid-SMSC error; everything
        // else is worth reporting.
        match parse_sms(&record) {
            Ok(msg) => {
                if !opt.json {
                    print_message(recno, &msg);
                }
                contents.messages.push(msg);
            }
            Err(sgsim::Error::SmsInvalidSmsc) => {}
            Err(err) => error!("SMS record {recno} parse failed: {err}"),
        }
    }
}

fn print_message(recno: u8, msg: &SmsMessage) {
    println!("==================== SMS record #{recno}");
    println!("Status:\t{}", msg.status);
    println!("SMSC:\t{}", msg.smsc);

    if let Some(tpdu) = &msg.tpdu {
        match tpdu.kind {
            sgsim::sms::SmsKind::Submit => println!("Recipient:\t{}", tpdu.address),
            _ => println!("Sender:\t{}", tpdu.address),
        }

        if let Some(ts) = &tpdu.timestamp {
            println!("Date:\t{}", ts.date);
            println!("Time:\t{}", ts.time);
            println!("Timezone: {:02}", ts.timezone);
        }

        match &tpdu.text {
            Some(text) if text.is_empty() => println!("Message is empty"),
            Some(text) => println!("Message: {text}"),
            None => println!("Message: [Unsupported character set]"),
        }
    }
}
