// 🔤 Text Decoding - ordered fallback chain for contract/plan extracts
// CMS publishes some months in UTF-8 and others in legacy code pages.
// Strategies are tried in order; the first that decodes cleanly wins.

use encoding_rs::{UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodingStrategy {
    Utf8,
    Windows1252,
    Latin1,
}

/// Contract/plan files: universal encoding first, then the two legacy fallbacks
pub const CONTRACT_INFO_CHAIN: [DecodingStrategy; 3] = [
    DecodingStrategy::Utf8,
    DecodingStrategy::Windows1252,
    DecodingStrategy::Latin1,
];

/// Enrollment and service-area files are read as UTF-8 only
pub const DEFAULT_CHAIN: [DecodingStrategy; 1] = [DecodingStrategy::Utf8];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Byte values windows-1252 leaves unassigned
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

impl DecodingStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            DecodingStrategy::Utf8 => "utf-8",
            DecodingStrategy::Windows1252 => "windows-1252",
            DecodingStrategy::Latin1 => "iso-8859-1",
        }
    }

    /// Decode without replacement characters; None on any malformed byte
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            DecodingStrategy::Utf8 => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                UTF_8.decode_without_bom_handling_and_without_replacement(body)
            }
            DecodingStrategy::Windows1252 => {
                if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                    return None;
                }
                WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
            }
            // every byte is its own code point
            DecodingStrategy::Latin1 => Some(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
        }
    }
}

/// Decoded - Text plus the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub strategy: DecodingStrategy,
}

impl Decoded {
    /// True when something other than the first strategy in the chain was needed
    pub fn used_fallback(&self, chain: &[DecodingStrategy]) -> bool {
        chain.first() != Some(&self.strategy)
    }
}

/// Try each strategy in order. On exhaustion, returns the labels attempted.
pub fn decode_with_fallback(
    bytes: &[u8],
    chain: &[DecodingStrategy],
) -> Result<Decoded, Vec<&'static str>> {
    let mut attempted = Vec::with_capacity(chain.len());

    for strategy in chain {
        attempted.push(strategy.label());
        if let Some(text) = strategy.decode(bytes) {
            return Ok(Decoded {
                text: text.into_owned(),
                strategy: *strategy,
            });
        }
    }

    Err(attempted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_wins_first() {
        let decoded = decode_with_fallback("Plan Type\nHMO/HMOPOS".as_bytes(), &CONTRACT_INFO_CHAIN)
            .unwrap();
        assert_eq!(decoded.strategy, DecodingStrategy::Utf8);
        assert!(!decoded.used_fallback(&CONTRACT_INFO_CHAIN));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let bytes = b"\xEF\xBB\xBFContract ID,Plan ID\n";
        let decoded = decode_with_fallback(bytes, &DEFAULT_CHAIN).unwrap();
        assert!(decoded.text.starts_with("Contract ID"));
    }

    #[test]
    fn test_windows1252_fallback() {
        // 0x96 is an en dash in windows-1252 and invalid as a UTF-8 start byte
        let bytes = b"Org Name\nBlue Cross \x96 North\n";
        let decoded = decode_with_fallback(bytes, &CONTRACT_INFO_CHAIN).unwrap();
        assert_eq!(decoded.strategy, DecodingStrategy::Windows1252);
        assert!(decoded.text.contains("Blue Cross \u{2013} North"));
        assert!(decoded.used_fallback(&CONTRACT_INFO_CHAIN));
    }

    #[test]
    fn test_latin1_last_resort() {
        // 0x81 is unassigned in windows-1252
        let bytes = b"Org\nA\x81B\n";
        let decoded = decode_with_fallback(bytes, &CONTRACT_INFO_CHAIN).unwrap();
        assert_eq!(decoded.strategy, DecodingStrategy::Latin1);
        assert!(decoded.text.contains("A\u{81}B"));
    }

    #[test]
    fn test_exhausted_chain_reports_attempts() {
        let bytes = b"caf\xE9";
        let err = decode_with_fallback(bytes, &DEFAULT_CHAIN).unwrap_err();
        assert_eq!(err, vec!["utf-8"]);
    }
}
