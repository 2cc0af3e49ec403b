//! Byte-to-text decoding with encoding inference.
//!
//! Broker exports arrive either as UTF-8 or as Shift_JIS. The decoder tries
//! UTF-8 first and only reaches for Shift_JIS when UTF-8 produces
//! replacement characters, keeping whichever candidate produced fewer.

use encoding_rs::SHIFT_JIS;
use tracing::debug;

const REPLACEMENT: char = '\u{FFFD}';

/// Encoding chosen for a decoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Valid UTF-8.
    Utf8,
    /// Shift_JIS (Windows-31J) with fewer replacements than UTF-8.
    ShiftJis,
    /// UTF-8 with invalid sequences replaced.
    Utf8Lossy,
}

/// Decoded text with the encoding it was decoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: SourceEncoding,
    /// Replacement characters present in `text`.
    pub replacements: usize,
}

fn count_replacements(text: &str) -> usize {
    text.chars().filter(|&c| c == REPLACEMENT).count()
}

/// Decode a byte buffer, reporting the chosen encoding.
///
/// Never fails: the worst case is UTF-8 text containing U+FFFD.
pub fn detect_and_decode(bytes: &[u8]) -> DecodedText {
    if bytes.is_empty() {
        return DecodedText {
            text: String::new(),
            encoding: SourceEncoding::Utf8,
            replacements: 0,
        };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_owned(),
            encoding: SourceEncoding::Utf8,
            replacements: 0,
        };
    }

    let utf8_text = String::from_utf8_lossy(bytes).into_owned();
    let utf8_replacements = count_replacements(&utf8_text);

    let (sjis_text, _) = SHIFT_JIS.decode_without_bom_handling(bytes);
    let sjis_replacements = count_replacements(&sjis_text);
    if sjis_replacements == 0 || sjis_replacements < utf8_replacements {
        debug!(
            utf8_replacements,
            sjis_replacements, "decoded trade CSV as Shift_JIS"
        );
        return DecodedText {
            text: sjis_text.into_owned(),
            encoding: SourceEncoding::ShiftJis,
            replacements: sjis_replacements,
        };
    }

    debug!(
        utf8_replacements,
        sjis_replacements, "Shift_JIS decode was no better; keeping lossy UTF-8"
    );
    DecodedText {
        text: utf8_text,
        encoding: SourceEncoding::Utf8Lossy,
        replacements: utf8_replacements,
    }
}

/// Decode a byte buffer into the best-guess text.
pub fn decode_csv_bytes(bytes: &[u8]) -> String {
    detect_and_decode(bytes).text
}
