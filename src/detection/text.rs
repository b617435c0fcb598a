//! Input text normalization and length checks.

/// Trimmed text plus the counts reported back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub trimmed: String,
    /// UTF-16 code units in `trimmed`, so characters outside the BMP count twice.
    pub char_count: usize,
    /// Whitespace-delimited, non-empty tokens.
    pub word_count: usize,
}

pub fn normalize(text: &str) -> NormalizedText {
    let trimmed = text.trim();
    NormalizedText {
        char_count: trimmed.encode_utf16().count(),
        word_count: trimmed.split_whitespace().count(),
        trimmed: trimmed.to_string(),
    }
}

/// Check a normalized text against the character ceiling.
/// Returns the user-facing message on failure.
pub fn validate(text: &NormalizedText, max_chars: usize) -> Result<(), String> {
    if text.trimmed.is_empty() {
        return Err("Text input is required".to_string());
    }
    if text.char_count > max_chars {
        return Err(too_long_message(max_chars, Some(text.char_count)));
    }
    Ok(())
}

/// Length-limit message. `provided` is omitted when the text was too large to read.
pub fn too_long_message(max_chars: usize, provided: Option<usize>) -> String {
    match provided {
        Some(count) => format!(
            "Text exceeds maximum length of {} characters ({} provided)",
            group_thousands(max_chars),
            count
        ),
        None => format!(
            "Text exceeds maximum length of {} characters",
            group_thousands(max_chars)
        ),
    }
}

/// Format with comma thousands separators: 50000 → "50,000".
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let t = normalize("  Hello   world\n\tagain  ");
        assert_eq!(t.trimmed, "Hello   world\n\tagain");
        assert_eq!(t.char_count, 20);
        assert_eq!(t.word_count, 3);
    }

    #[test]
    fn test_bmp_chars_count_once() {
        let t = normalize("héllo wörld");
        assert_eq!(t.char_count, 11);
        assert_eq!(t.word_count, 2);
    }

    #[test]
    fn test_astral_chars_count_as_two_units() {
        let t = normalize("😀😀😀");
        assert_eq!(t.char_count, 6);
        assert_eq!(t.word_count, 1);
        assert_eq!(
            validate(&t, 4).unwrap_err(),
            "Text exceeds maximum length of 4 characters (6 provided)"
        );
        assert!(validate(&t, 6).is_ok());
    }

    #[test]
    fn test_empty_rejected() {
        let t = normalize(" \n\t ");
        assert_eq!(t.word_count, 0);
        assert_eq!(validate(&t, 100).unwrap_err(), "Text input is required");
    }

    #[test]
    fn test_length_ceiling() {
        let at_limit = normalize(&"a".repeat(10));
        assert!(validate(&at_limit, 10).is_ok());

        let over = normalize(&"a".repeat(50_001));
        let msg = validate(&over, 50_000).unwrap_err();
        assert_eq!(
            msg,
            "Text exceeds maximum length of 50,000 characters (50001 provided)"
        );
    }

    #[test]
    fn test_unread_length_message() {
        assert_eq!(
            too_long_message(400_000, None),
            "Text exceeds maximum length of 400,000 characters"
        );
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(50_000), "50,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
