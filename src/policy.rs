//! Input Policy - Safe Identifiers and English-Only Text
//!
//! `safe_id` never fails; callers compare its output against the raw value
//! to decide whether it was already safe. The English check is a
//! Unicode-block heuristic (Cyrillic/CJK/Kana/Hangul), not language
//! detection: accented Latin outside those blocks passes. Known
//! limitation, kept deliberately.

use crate::error::{Error, Result};

fn is_safe_id_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Normalize a raw identifier into a filesystem-safe token.
///
/// Trims surrounding whitespace, replaces internal spaces with `_`, then
/// drops every character outside `[A-Za-z0-9_-]`. Total and idempotent.
pub fn safe_id(raw: &str) -> String {
    raw.trim()
        .replace(' ', "_")
        .chars()
        .filter(|ch| is_safe_id_char(*ch))
        .collect()
}

/// True if any character falls in a script block the English-only policy
/// rejects.
pub fn contains_disallowed_scripts(text: &str) -> bool {
    text.chars().any(|ch| {
        matches!(
            u32::from(ch),
            0x0400..=0x04FF   // Cyrillic
            | 0x4E00..=0x9FFF // CJK Unified Ideographs
            | 0x3040..=0x30FF // Hiragana + Katakana
            | 0xAC00..=0xD7AF // Hangul Syllables
        )
    })
}

/// Require a non-empty, English-only text field; returns the trimmed value.
///
/// Control characters below U+0020 other than newline/tab are rejected.
pub fn require_english_text(field_name: &str, value: &str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(Error::validation(format!(
            "Missing required English text: {field_name}"
        )));
    }
    if contains_disallowed_scripts(v) {
        return Err(Error::validation(format!(
            "Field '{field_name}' contains non-English characters (Cyrillic/CJK detected)."
        )));
    }
    for ch in v.chars() {
        if ch == '\n' || ch == '\t' {
            continue;
        }
        if u32::from(ch) < 0x20 {
            return Err(Error::validation(format!(
                "Field '{field_name}' contains control characters."
            )));
        }
    }
    Ok(v.to_string())
}

/// Trim an optional free-text field; empty collapses to `None`. No script
/// filter — used for manager-facing fields that may be any language.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_id_replaces_spaces_and_drops_unsafe() {
        assert_eq!(safe_id("  SKU 123  "), "SKU_123");
        assert_eq!(safe_id("a/b\\c:d"), "abcd");
        assert_eq!(safe_id("../BAD"), "BAD");
        assert_eq!(safe_id("ok-id_9"), "ok-id_9");
    }

    #[test]
    fn safe_id_is_idempotent() {
        for raw in ["SKU 123", "../x", "тест", "日本語", "", "a b c!"] {
            let once = safe_id(raw);
            assert_eq!(safe_id(&once), once);
        }
    }

    #[test]
    fn safe_id_output_stays_in_charset() {
        let out = safe_id("we?ird id*&^%$#@!");
        assert!(out.chars().all(is_safe_id_char));
    }

    #[test]
    fn english_check_trims_and_returns() {
        assert_eq!(
            require_english_text("name", "  Tumbler  ").unwrap(),
            "Tumbler"
        );
    }

    #[test]
    fn english_check_rejects_empty() {
        let err = require_english_text("name", "   ").unwrap_err();
        assert!(err.to_string().contains("Missing required English text: name"));
    }

    #[test]
    fn english_check_rejects_script_blocks() {
        for bad in ["Кружка", "保温杯", "タンブラー", "텀블러"] {
            let err = require_english_text("name", bad).unwrap_err();
            assert!(err.to_string().contains("non-English"));
        }
    }

    #[test]
    fn english_check_allows_accented_latin() {
        // Heuristic filter: Latin-1 accents are outside the rejected blocks.
        assert!(require_english_text("name", "Café Tumbler").is_ok());
    }

    #[test]
    fn english_check_rejects_control_chars_but_keeps_newline_tab() {
        assert!(require_english_text("f", "line1\nline2\ttab").is_ok());
        let err = require_english_text("f", "bad\u{0};").unwrap_err();
        assert!(err.to_string().contains("control characters"));
    }

    #[test]
    fn optional_text_collapses_blank_to_none() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("   ")), None);
        assert_eq!(optional_text(Some(" note ")), Some("note".to_string()));
    }
}
