#![no_main]

use libfuzzer_sys::fuzz_target;

use sgsim::sms::{parse_sms, SMS_RECORD_LEN};

fuzz_target!(|data: &[u8]| {
    if data.len() < SMS_RECORD_LEN {
        return;
    }

    // Whatever the record holds, the parser must stay inside its 176 bytes.
    let _ = parse_sms(&data[..SMS_RECORD_LEN]);
});
