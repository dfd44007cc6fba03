//! Packed BCD digit strings.
//!
//! SIM files store phone numbers and identifiers as packed BCD: two decimal
//! digits per byte, one per nibble. Dialling-number fields additionally use
//! the "telecom" digit set where the values `0xa..=0xe` stand for `*`, `#`,
//! pause and wild characters, and `0xf` is the fill/sign nibble that pads an
//! odd-length number.

const BCD_BASIC_DIGITS: &[u8; 16] = b"0123456789abcdef";
const BCD_TELECOM_DIGITS: &[u8; 16] = b"0123456789*#,--f";

/// Convert a packed BCD buffer to an ASCII string.
///
/// Each input byte contributes two output characters, low nibble first when
/// `little_endian` is set (the GSM on-card order), high nibble first
/// otherwise. With `strip_sign_flag`, a trailing `'f'` produced by the fill
/// nibble of an odd-length number is dropped; only the final character is
/// ever stripped. `use_telecom_digits` selects the telecom digit table.
pub fn packed_bcd_to_ascii(
    bcd: &[u8],
    little_endian: bool,
    strip_sign_flag: bool,
    use_telecom_digits: bool,
) -> String {
    let digits = if use_telecom_digits {
        BCD_TELECOM_DIGITS
    } else {
        BCD_BASIC_DIGITS
    };

    let mut ascii = String::with_capacity(bcd.len() * 2);

    for &byte in bcd {
        let lo = digits[(byte & 0xf) as usize] as char;
        let hi = digits[(byte >> 4) as usize] as char;

        if little_endian {
            ascii.push(lo);
            ascii.push(hi);
        } else {
            ascii.push(hi);
            ascii.push(lo);
        }
    }

    if strip_sign_flag && ascii.ends_with('f') {
        ascii.pop();
    }

    ascii
}
