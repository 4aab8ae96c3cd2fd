//! Sanitizing and bounding of user-supplied text.
//!
//! Every topic and question passes through [`validate_input`] before it reaches
//! discovery, the store or the language model.

use crate::error::{Result, TubechatError};

/// Default maximum length (in characters) for topics and questions.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 500;

/// Validate and sanitize a piece of user input.
///
/// Strips non-printable characters, truncates to `max_length` characters and
/// trims surrounding whitespace. Fails when the input is missing or nothing
/// printable is left.
pub fn validate_input<'a>(text: impl Into<Option<&'a str>>, max_length: usize) -> Result<String> {
    let text = text
        .into()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TubechatError::InvalidInput("Input must be a non-empty string".to_string()))?;

    let sanitized: String = text
        .chars()
        .filter(|c| is_printable(*c))
        .take(max_length)
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        return Err(TubechatError::InvalidInput(
            "Input contains no printable text".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Printable means visible glyphs plus the plain ASCII space. Separators,
/// control and format characters (zero-width space, BOM, bidi marks) and
/// private-use code points are dropped.
fn is_printable(c: char) -> bool {
    c == ' '
        || !(c.is_control() || c.is_whitespace() || is_format(c) || is_private_use(c))
}

/// Unicode general category Cf.
fn is_format(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{0600}'..='\u{0605}'
            | '\u{061C}'
            | '\u{06DD}'
            | '\u{070F}'
            | '\u{0890}'..='\u{0891}'
            | '\u{08E2}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{110BD}'
            | '\u{110CD}'
            | '\u{13430}'..='\u{1343F}'
            | '\u{1BCA0}'..='\u{1BCA3}'
            | '\u{1D173}'..='\u{1D17A}'
            | '\u{E0001}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// Unicode general category Co.
fn is_private_use(c: char) -> bool {
    matches!(
        c,
        '\u{E000}'..='\u{F8FF}' | '\u{F0000}'..='\u{FFFFD}' | '\u{100000}'..='\u{10FFFD}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_and_blank_input() {
        assert!(matches!(
            validate_input("", DEFAULT_MAX_INPUT_LENGTH),
            Err(TubechatError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_input(None, DEFAULT_MAX_INPUT_LENGTH),
            Err(TubechatError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_input("   ", DEFAULT_MAX_INPUT_LENGTH),
            Err(TubechatError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_input("\n\t\u{7}", DEFAULT_MAX_INPUT_LENGTH),
            Err(TubechatError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_truncates_to_max_length() {
        let long = "a".repeat(600);
        let result = validate_input(long.as_str(), 500).unwrap();
        assert_eq!(result.chars().count(), 500);
    }

    #[test]
    fn test_strips_control_characters_and_trims() {
        let result = validate_input("  how do\n cats\u{0} purr?\t ", 500).unwrap();
        assert_eq!(result, "how do cats purr?");
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let result = validate_input("ééééé", 3).unwrap();
        assert_eq!(result, "ééé");
    }

    #[test]
    fn test_strips_invisible_format_characters() {
        assert!(matches!(
            validate_input("\u{200B}", DEFAULT_MAX_INPUT_LENGTH),
            Err(TubechatError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_input("\u{FEFF}\u{200E}\u{E000}", DEFAULT_MAX_INPUT_LENGTH),
            Err(TubechatError::InvalidInput(_))
        ));

        let result = validate_input("\u{FEFF}ca\u{200B}ts\u{E000} purr", 500).unwrap();
        assert_eq!(result, "cats purr");
    }

    #[test]
    fn test_keeps_visible_non_ascii_text() {
        assert_eq!(validate_input("chats é 猫 🐱", 500).unwrap(), "chats é 猫 🐱");
    }
}
