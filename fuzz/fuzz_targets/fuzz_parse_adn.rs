#![no_main]

use libfuzzer_sys::fuzz_target;

use sgsim::adn::parse_adn;

fuzz_target!(|data: &[u8]| {
    let _ = parse_adn(data);
});
