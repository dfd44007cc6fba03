//! The GSM 7-bit default alphabet (GSM 03.38) and septet unpacking.
//!
//! SMS text and alphanumeric addresses arrive as septets packed eight to
//! seven bytes. [`unpack_septets`] restores one 7-bit value per byte and
//! [`map_gsm_chars`] maps those values through the default alphabet,
//! honouring the `0x1b` escape into the extension table. [`gsm_text`]
//! composes the two.

use log::debug;

/// Escape code selecting the extension table for the next septet
pub const GSM_ESCAPE: u8 = 0x1b;

/// GSM 03.38 basic character set. The `0x1b` slot is the escape code and is
/// never looked up directly.
const GSM_BASIC_CHARSET: [&str; 128] = [
    // 0x00 to 0x07:
    "@", "\u{a3}", "$", "\u{a5}", "\u{e8}", "\u{e9}", "\u{f9}", "\u{ec}",
    // 0x08 to 0x0f:
    "\u{f2}", "\u{c7}", "\n", "\u{d8}", "\u{f8}", "\r", "\u{c5}", "\u{e5}",
    // 0x10 to 0x17:
    "\u{394}", "_", "\u{3a6}", "\u{393}", "\u{39b}", "\u{3a9}", "\u{3a0}", "\u{3a8}",
    // 0x18 to 0x1f:
    "\u{3a3}", "\u{398}", "\u{39e}", "\u{fffd}", "\u{c6}", "\u{e6}", "\u{df}", "\u{c9}",
    // 0x20 to 0x27:
    " ", "!", "\"", "#", "\u{a4}", "%", "&", "'",
    // 0x28 to 0x2f:
    "(", ")", "*", "+", ",", "-", ".", "/",
    // 0x30 to 0x37:
    "0", "1", "2", "3", "4", "5", "6", "7",
    // 0x38 to 0x3f:
    "8", "9", ":", ";", "<", "=", ">", "?",
    // 0x40 to 0x47:
    "\u{a1}", "A", "B", "C", "D", "E", "F", "G",
    // 0x48 to 0x4f:
    "H", "I", "J", "K", "L", "M", "N", "O",
    // 0x50 to 0x57:
    "P", "Q", "R", "S", "T", "U", "V", "W",
    // 0x58 to 0x5f:
    "X", "Y", "Z", "\u{c4}", "\u{d6}", "\u{d1}", "\u{dc}", "\u{a7}",
    // 0x60 to 0x67:
    "\u{bf}", "a", "b", "c", "d", "e", "f", "g",
    // 0x68 to 0x6f:
    "h", "i", "j", "k", "l", "m", "n", "o",
    // 0x70 to 0x77:
    "p", "q", "r", "s", "t", "u", "v", "w",
    // 0x78 to 0x7f:
    "x", "y", "z", "\u{e4}", "\u{f6}", "\u{f1}", "\u{fc}", "\u{e0}",
];

/// GSM 03.38 extension table, reached through [`GSM_ESCAPE`]. Slots the
/// standard leaves unassigned render as a space.
const GSM_EXTENSION_CHARSET: [&str; 128] = [
    // 0x00 to 0x07:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x08 to 0x0f:
    " ", " ", "\u{c}", " ", " ", " ", " ", " ",
    // 0x10 to 0x17:
    " ", " ", " ", " ", "^", " ", " ", " ",
    // 0x18 to 0x1f:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x20 to 0x27:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x28 to 0x2f:
    "{", "}", " ", " ", " ", " ", " ", "\\",
    // 0x30 to 0x37:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x38 to 0x3f:
    " ", " ", " ", " ", "[", "~", "]", " ",
    // 0x40 to 0x47:
    "|", " ", " ", " ", " ", " ", " ", " ",
    // 0x48 to 0x4f:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x50 to 0x57:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x58 to 0x5f:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x60 to 0x67:
    " ", " ", " ", " ", " ", "\u{20ac}", " ", " ",
    // 0x68 to 0x6f:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x70 to 0x77:
    " ", " ", " ", " ", " ", " ", " ", " ",
    // 0x78 to 0x7f:
    " ", " ", " ", " ", " ", " ", " ", " ",
];

/// Map a buffer of unpacked GSM character codes to a string.
///
/// Handles the `0x1b` escape into the extension table. Mapping stops at the
/// first byte above `0x7f`: `0xff` marks unused space in fixed-size fields
/// and terminates the string without complaint, anything else is logged as
/// an invalid code.
pub fn map_gsm_chars(src: &[u8]) -> String {
    let mut result = String::with_capacity(src.len());
    let mut escape = false;

    for (i, &code) in src.iter().enumerate() {
        if code > 0x7f {
            // 0xff marks unused bytes and isn't really "invalid"
            if code != 0xff {
                debug!(
                    "invalid GSM character code {code}, {} unmapped characters remaining",
                    src.len() - i
                );
            }
            break;
        }

        if code == GSM_ESCAPE {
            escape = true;
            continue;
        }

        let mapped = if escape {
            GSM_EXTENSION_CHARSET[code as usize]
        } else {
            GSM_BASIC_CHARSET[code as usize]
        };
        escape = false;

        result.push_str(mapped);
    }

    result
}

/// Unpack a buffer of packed septets into one 7-bit value per byte.
///
/// The raw unpacked length is `packed.len() * 8 / 7`; when that overshoots
/// `num_septets` (the last packed byte was only partially used) the output
/// is truncated to `num_septets`.
pub fn unpack_septets(num_septets: usize, packed: &[u8]) -> Vec<u8> {
    if num_septets == 0 || packed.is_empty() {
        return Vec::new();
    }

    let mut unpacked = Vec::with_capacity(packed.len() * 8 / 7 + 1);

    for (i, &byte) in packed.iter().enumerate() {
        let pos = i % 7;

        // The first septet in a 7-byte group needs no shifting; the rest
        // borrow their low bits from the previous byte.
        let septet = if pos == 0 {
            byte & 0x7f
        } else {
            ((byte << pos) | (packed[i - 1] >> (8 - pos))) & 0x7f
        };
        unpacked.push(septet);

        // The seventh packed byte fully contains an eighth septet.
        if pos == 6 {
            unpacked.push(byte >> 1);
        }
    }

    if unpacked.len() > num_septets {
        debug!(
            "truncating {} unpacked septets to the claimed {num_septets}",
            unpacked.len()
        );
        unpacked.truncate(num_septets);
    }

    unpacked
}

/// Unpack `num_septets` septets from `packed` and map them through the GSM
/// default alphabet.
pub fn gsm_text(packed: &[u8], num_septets: usize) -> String {
    map_gsm_chars(&unpack_septets(num_septets, packed))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Packs septets eight-per-seven-bytes, the inverse of unpack_septets.
    fn pack_septets(septets: &[u8]) -> Vec<u8> {
        let mut packed = Vec::new();
        for (i, &s) in septets.iter().enumerate() {
            let pos = i % 8;
            if pos == 0 {
                packed.push(s & 0x7f);
            } else {
                let last = packed.last_mut().unwrap();
                *last |= ((s as u16) << (8 - pos)) as u8;
                if pos < 7 {
                    packed.push((s & 0x7f) >> pos);
                }
            }
        }
        packed
    }

    #[test]
    fn test_basic_charset_spots() {
        assert_eq!(map_gsm_chars(&[0x00]), "@");
        assert_eq!(map_gsm_chars(&[0x02]), "$");
        assert_eq!(map_gsm_chars(&[0x24]), "\u{a4}");
        assert_eq!(map_gsm_chars(&[0x40]), "\u{a1}");
        assert_eq!(map_gsm_chars(&[0x5b]), "\u{c4}");
        assert_eq!(map_gsm_chars(&[0x7f]), "\u{e0}");
        assert_eq!(map_gsm_chars(&[0x0a]), "\n");
        assert_eq!(map_gsm_chars(&[0x0d]), "\r");
    }

    #[test]
    fn test_extension_escape() {
        assert_eq!(map_gsm_chars(&[0x1b, 0x65]), "\u{20ac}");
        assert_eq!(map_gsm_chars(&[0x1b, 0x28, 0x1b, 0x29]), "{}");
        assert_eq!(map_gsm_chars(&[0x1b, 0x3c, 0x1b, 0x3e]), "[]");
        assert_eq!(map_gsm_chars(&[0x1b, 0x40]), "|");
    }

    #[test]
    fn test_every_basic_code_maps_to_its_table_entry() {
        for code in 0u8..0x80 {
            if code == GSM_ESCAPE {
                continue;
            }
            assert_eq!(map_gsm_chars(&[code]), GSM_BASIC_CHARSET[code as usize]);
        }
    }

    #[test]
    fn test_every_escaped_code_maps_to_its_extension_entry() {
        for code in 0u8..0x80 {
            if code == GSM_ESCAPE {
                continue;
            }
            assert_eq!(
                map_gsm_chars(&[GSM_ESCAPE, code]),
                GSM_EXTENSION_CHARSET[code as usize]
            );
        }
    }

    #[test]
    fn test_unassigned_extension_slot_is_space() {
        assert_eq!(map_gsm_chars(&[0x1b, 0x41]), " ");
    }

    #[test]
    fn test_map_stops_at_high_byte() {
        assert_eq!(map_gsm_chars(&[0x48, 0x69, 0xff, 0x48]), "Hi");
        assert_eq!(map_gsm_chars(&[0x48, 0x69, 0x80, 0x48]), "Hi");
    }

    #[test]
    fn test_unpack_hello() {
        let packed = [0xc8, 0x32, 0x9b, 0xfd, 0x06];

        let unpacked = unpack_septets(5, &packed);
        assert_eq!(unpacked, [0x48, 0x65, 0x6c, 0x6c, 0x6f]);

        assert_eq!(gsm_text(&packed, 5), "Hello");
    }

    #[test]
    fn test_unpack_eighth_septet() {
        // Eight septets pack into exactly seven bytes
        let septets = [0x4f, 0x70, 0x65, 0x72, 0x61, 0x74, 0x6f, 0x72];
        let packed = pack_septets(&septets);

        assert_eq!(packed.len(), 7);
        assert_eq!(unpack_septets(8, &packed), septets);
        assert_eq!(gsm_text(&packed, 8), "Operator");
    }

    #[test]
    fn test_unpack_round_trip() {
        let septets: Vec<u8> = (1..=20).map(|i| (i * 5) & 0x7f).collect();
        let packed = pack_septets(&septets);

        for n in 1..=septets.len() {
            assert_eq!(unpack_septets(n, &packed), &septets[..n]);
        }
    }

    #[test]
    fn test_unpack_truncates_to_claimed_count() {
        let packed = [0xc8, 0x32, 0x9b, 0xfd, 0x06];

        // 5 * 8 / 7 = 5, but claim fewer
        assert_eq!(unpack_septets(3, &packed).len(), 3);
    }

    #[test]
    fn test_unpack_empty() {
        assert!(unpack_septets(0, &[0x01]).is_empty());
        assert!(unpack_septets(5, &[]).is_empty());
    }
}
