//! Logging convenience helpers.

/// Number of bytes per hex-dump row
const ROW_SIZE: usize = 16;

#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    Off = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<u32> for LogLevel {
    fn from(level: u32) -> Self {
        match level {
            0 => Self::Off,
            1 => Self::Error,
            2 => Self::Warn,
            3 => Self::Info,
            4 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Format a binary buffer as `hexdump -C`-style rows: sixteen space-separated
/// hex bytes, then a printable-ASCII gutter with `.` standing in for
/// non-printable bytes. Short final rows are padded so the gutter aligns.
pub fn hex_dump(buf: &[u8]) -> String {
    let mut out = String::with_capacity(buf.len() * 4);

    for chunk in buf.chunks(ROW_SIZE) {
        for byte in chunk {
            out.push_str(&format!("{byte:02x} "));
        }
        for _ in chunk.len()..ROW_SIZE {
            out.push_str("   ");
        }

        out.push('\t');
        for &byte in chunk {
            out.push(if (0x20..0x7f).contains(&byte) {
                byte as char
            } else {
                '.'
            });
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_occurrences() {
        assert_eq!(LogLevel::from(0), LogLevel::Off);
        assert_eq!(LogLevel::from(3), LogLevel::Info);
        assert_eq!(LogLevel::from(9), LogLevel::Trace);
    }

    #[test]
    fn test_hex_dump_single_row() {
        let dump = hex_dump(b"ABC\x00");

        // Four hex columns, twelve columns of padding, then the gutter.
        let expected = format!("41 42 43 00 {}\tABC.\n", " ".repeat(12 * 3));
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_hex_dump_full_rows() {
        let buf: Vec<u8> = (0x41..0x61).collect();
        let dump = hex_dump(&buf);

        let mut lines = dump.lines();
        assert_eq!(
            lines.next().unwrap(),
            "41 42 43 44 45 46 47 48 49 4a 4b 4c 4d 4e 4f 50 \tABCDEFGHIJKLMNOP"
        );
        assert_eq!(
            lines.next().unwrap(),
            "51 52 53 54 55 56 57 58 59 5a 5b 5c 5d 5e 5f 60 \tQRSTUVWXYZ[\\]^_`"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_hex_dump_empty() {
        assert_eq!(hex_dump(&[]), "");
    }
}
