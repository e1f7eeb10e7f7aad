// Byte-to-text decoding for platform CSV exports.
//
// Ad platforms are inconsistent about encodings: Google/Meta exports are
// usually UTF-8 (often with a BOM), while Yahoo!/LINE exports downloaded
// from Japanese consoles can be Shift_JIS or EUC-JP. We try a fixed
// priority list and take the first full decode; there is no best-effort
// fallback with replacement characters.
use crate::error::{ReportError, Result};
use encoding_rs::{EUC_JP, SHIFT_JIS};
use std::path::Path;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decode raw file bytes into text.
///
/// Priority: UTF-8 with BOM stripped, plain UTF-8, Shift_JIS, EUC-JP.
/// Returns `ReportError::Decoding` when no encoding in the list produces a
/// clean decode.
pub fn decode_text(bytes: &[u8], path: &Path) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&UTF8_BOM) {
        if let Ok(s) = std::str::from_utf8(rest) {
            return Ok(s.to_string());
        }
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }
    for encoding in [SHIFT_JIS, EUC_JP] {
        if let Some(decoded) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return Ok(decoded.into_owned());
        }
    }
    Err(ReportError::Decoding {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("test.csv")
    }

    #[test]
    fn test_decode_plain_utf8() {
        let text = "日付,費用\n2024/03/01,100\n";
        let decoded = decode_text(text.as_bytes(), &path()).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("日付,費用".as_bytes());
        let decoded = decode_text(&bytes, &path()).unwrap();
        assert_eq!(decoded, "日付,費用");
    }

    #[test]
    fn test_decode_shift_jis() {
        // "日付" in Shift_JIS.
        let bytes = [0x93, 0xFA, 0x95, 0x74];
        let decoded = decode_text(&bytes, &path()).unwrap();
        assert_eq!(decoded, "日付");
    }

    #[test]
    fn test_decode_failure() {
        // Invalid in UTF-8 (bare continuation byte), Shift_JIS (0xFF is
        // never a valid byte) and EUC-JP (0x80 is never a valid byte).
        let bytes = [0x80, 0x00, 0xFF, 0xFF];
        let err = decode_text(&bytes, &path()).unwrap_err();
        assert!(matches!(err, ReportError::Decoding { .. }));
    }
}
