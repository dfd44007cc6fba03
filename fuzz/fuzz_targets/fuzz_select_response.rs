#![no_main]

use libfuzzer_sys::fuzz_target;

use sgsim::response::{parse_response, SelectTarget};

fuzz_target!(|data: &[u8]| {
    let _ = parse_response(data, SelectTarget::Ef);
    let _ = parse_response(data, SelectTarget::MfDf);
});
