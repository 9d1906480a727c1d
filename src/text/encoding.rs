//! Encoding detection and decoding (C3).
//!
//! The teacher crate assumes UTF-8 throughout (`io/reader.rs` errors on
//! invalid UTF-8); this module implements the detection cascade
//! SPEC_FULL.md §4.3 requires instead, authored directly from the spec
//! since no corpus file performs multi-encoding detection.

use crate::error::{Error, Result, TextError};

/// A detected text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8, with or without a byte-order mark.
    Utf8,
    /// UTF-16, little-endian.
    Utf16Le,
    /// UTF-16, big-endian.
    Utf16Be,
    /// Windows code page 1251 (Cyrillic).
    Windows1251,
    /// Windows code page 1252 (Western European).
    Windows1252,
    /// ISO-8859-1 (Latin-1).
    Iso8859_1,
    /// Raw bytes interpreted lossily as UTF-8; the decode could not be
    /// confidently attributed to any known encoding.
    Utf8Fallback,
}

impl Encoding {
    /// The canonical name reported on [`Document::encoding`](crate::core::Document::encoding).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Windows1251 => "Windows-1251",
            Self::Windows1252 => "Windows-1252",
            Self::Iso8859_1 => "ISO-8859-1",
            Self::Utf8Fallback => "UTF-8-fallback",
        }
    }
}

/// Detects the encoding of `bytes` and decodes to a canonical `String`.
///
/// Detection order: UTF-8 BOM, UTF-16 BOM, valid-UTF-8 heuristic,
/// Windows-1251 (Cyrillic-share heuristic), Windows-1252, ISO-8859-1, then
/// a raw-bytes fallback tagged `UTF-8-fallback`. This function never fails:
/// the fallback path always succeeds via `String::from_utf8_lossy`.
#[must_use]
pub fn decode(bytes: &[u8]) -> (String, Encoding) {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        if let Ok(s) = std::str::from_utf8(rest) {
            return (s.to_string(), Encoding::Utf8);
        }
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return (decode_utf16(rest, false), Encoding::Utf16Le);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return (decode_utf16(rest, true), Encoding::Utf16Be);
    }

    if is_mostly_valid_utf8(bytes) {
        return (String::from_utf8_lossy(bytes).into_owned(), Encoding::Utf8);
    }

    let win1251 = decode_single_byte(bytes, windows_1251_char);
    if cyrillic_share(&win1251) > 0.33 {
        return (win1251, Encoding::Windows1251);
    }

    let win1252 = decode_single_byte(bytes, windows_1252_char);
    if is_printable_enough(&win1252) {
        return (win1252, Encoding::Windows1252);
    }

    let latin1 = decode_single_byte(bytes, char::from);
    if is_printable_enough(&latin1) {
        return (latin1, Encoding::Iso8859_1);
    }

    (String::from_utf8_lossy(bytes).into_owned(), Encoding::Utf8Fallback)
}

/// True if fewer than 5% of characters are non-whitespace control
/// characters, used to reject single-byte decodes of genuinely binary data.
fn is_printable_enough(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    let control = s
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count();
    (control as f64 / s.chars().count() as f64) <= 0.05
}

/// Reads a file from disk and detects/decodes it per [`decode`].
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read.
pub fn decode_file(path: &std::path::Path) -> Result<(String, Encoding)> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::Io(crate::error::IoError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    })?;
    Ok(decode(&bytes))
}

/// Returns an `Unsupported` error for extensionless files outside the
/// small whitelist of recognized names (`Dockerfile`, `Makefile`, etc.).
///
/// # Errors
///
/// Returns [`TextError::Unsupported`] if `path` has no extension and its
/// file name (case-insensitively) is not on the whitelist.
pub fn check_extensionless_whitelist(path: &std::path::Path) -> std::result::Result<(), TextError> {
    const WHITELIST: [&str; 8] = [
        "dockerfile",
        "makefile",
        "readme",
        "license",
        "changelog",
        "authors",
        "contributors",
        "cmakelists.txt",
    ];
    if path.extension().is_some() {
        return Ok(());
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if WHITELIST.contains(&name.as_str()) {
        Ok(())
    } else {
        Err(TextError::Unsupported {
            path: path.display().to_string(),
        })
    }
}

fn is_mostly_valid_utf8(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => {
            let valid = e.valid_up_to();
            let ratio_invalid = 1.0 - (valid as f64 / bytes.len() as f64);
            ratio_invalid <= 0.05
        }
    }
}

fn decode_utf16(rest: &[u8], big_endian: bool) -> String {
    let units: Vec<u16> = rest
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_single_byte(bytes: &[u8], map: impl Fn(u8) -> char) -> String {
    bytes.iter().map(|&b| map(b)).collect()
}

fn cyrillic_share(s: &str) -> f64 {
    let letters: Vec<char> = s.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 10 {
        return 0.0;
    }
    let cyrillic = letters
        .iter()
        .filter(|c| matches!(**c, '\u{0400}'..='\u{04FF}'))
        .count();
    cyrillic as f64 / letters.len() as f64
}

/// Maps a single byte to its Windows-1251 Unicode code point, covering the
/// 0x80-0xFF upper half relevant to Cyrillic text; the lower half is ASCII.
fn windows_1251_char(b: u8) -> char {
    if b < 0x80 {
        return char::from(b);
    }
    const TABLE: [u16; 128] = [
        0x0402, 0x0403, 0x201A, 0x0453, 0x201E, 0x2026, 0x2020, 0x2021, 0x20AC, 0x2030, 0x0409,
        0x2039, 0x040A, 0x040C, 0x040B, 0x040F, 0x0452, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022,
        0x2013, 0x2014, 0x0098, 0x2122, 0x0459, 0x203A, 0x045A, 0x045C, 0x045B, 0x045F, 0x00A0,
        0x040E, 0x045E, 0x0408, 0x00A4, 0x0490, 0x00A6, 0x00A7, 0x0401, 0x00A9, 0x0404, 0x00AB,
        0x00AC, 0x00AD, 0x00AE, 0x0407, 0x00B0, 0x00B1, 0x0406, 0x0456, 0x0491, 0x00B5, 0x00B6,
        0x00B7, 0x0451, 0x2116, 0x0454, 0x00BB, 0x0458, 0x0405, 0x0455, 0x0457, 0x0410, 0x0411,
        0x0412, 0x0413, 0x0414, 0x0415, 0x0416, 0x0417, 0x0418, 0x0419, 0x041A, 0x041B, 0x041C,
        0x041D, 0x041E, 0x041F, 0x0420, 0x0421, 0x0422, 0x0423, 0x0424, 0x0425, 0x0426, 0x0427,
        0x0428, 0x0429, 0x042A, 0x042B, 0x042C, 0x042D, 0x042E, 0x042F, 0x0430, 0x0431, 0x0432,
        0x0433, 0x0434, 0x0435, 0x0436, 0x0437, 0x0438, 0x0439, 0x043A, 0x043B, 0x043C, 0x043D,
        0x043E, 0x043F, 0x0440, 0x0441, 0x0442, 0x0443, 0x0444, 0x0445, 0x0446, 0x0447, 0x0448,
        0x0449, 0x044A, 0x044B, 0x044C, 0x044D, 0x044E, 0x044F,
    ];
    char::from_u32(u32::from(TABLE[(b - 0x80) as usize])).unwrap_or('\u{FFFD}')
}

/// Maps a single byte to its Windows-1252 Unicode code point.
fn windows_1252_char(b: u8) -> char {
    if b < 0x80 || b >= 0xA0 {
        return char::from(b);
    }
    const TABLE: [u16; 32] = [
        0x20AC, 0x0081, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160,
        0x2039, 0x0152, 0x008D, 0x017D, 0x008F, 0x0090, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022,
        0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0x009D, 0x017E, 0x0178,
    ];
    char::from_u32(u32::from(TABLE[(b - 0x80) as usize])).unwrap_or('\u{FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_bom_is_stripped_and_detected() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("hello".as_bytes());
        let (text, enc) = decode(&bytes);
        assert_eq!(text, "hello");
        assert_eq!(enc, Encoding::Utf8);
    }

    #[test]
    fn test_plain_ascii_detected_as_utf8() {
        let (text, enc) = decode(b"the quick brown fox");
        assert_eq!(text, "the quick brown fox");
        assert_eq!(enc, Encoding::Utf8);
    }

    #[test]
    fn test_utf16_le_bom_decodes() {
        let mut bytes = vec![0xFF, 0xFE];
        for u in "hi".encode_utf16() {
            bytes.extend_from_slice(&u.to_le_bytes());
        }
        let (text, enc) = decode(&bytes);
        assert_eq!(text, "hi");
        assert_eq!(enc, Encoding::Utf16Le);
    }

    #[test]
    fn test_windows_1251_cyrillic_detected() {
        // "Привет мир как дела сегодня" encoded as Windows-1251 bytes.
        let sample = "Привет мир как дела сегодня у тебя";
        let bytes: Vec<u8> = sample
            .chars()
            .map(|c| {
                let cp = c as u32;
                if cp < 0x80 {
                    cp as u8
                } else {
                    // Reverse-map via the same table used for decoding.
                    (0x80..=0xFF)
                        .find(|&b| windows_1251_char(b) == c)
                        .unwrap_or(b'?')
                }
            })
            .collect();
        let (text, enc) = decode(&bytes);
        assert_eq!(enc, Encoding::Windows1251);
        assert!(text.contains("Привет"));
    }

    #[test]
    fn test_extensionless_whitelist() {
        assert!(check_extensionless_whitelist(std::path::Path::new("Dockerfile")).is_ok());
        assert!(check_extensionless_whitelist(std::path::Path::new("README")).is_ok());
        assert!(check_extensionless_whitelist(std::path::Path::new("mystery")).is_err());
        assert!(check_extensionless_whitelist(std::path::Path::new("notes.txt")).is_ok());
    }

    #[test]
    fn test_binary_garbage_falls_back_without_panicking() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let (text, enc) = decode(&bytes);
        assert!(!text.is_empty() || bytes.is_empty());
        assert_eq!(enc, Encoding::Utf8Fallback);
    }
}
