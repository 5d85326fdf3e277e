//! Partition and row key rules.
//!
//! The store limits keys to 1024 bytes and forbids `/ \ # ? TAB LF CR` and
//! control characters. [`sanitize`] makes a best effort to turn arbitrary
//! text into a usable key; [`validate`] reports the first rule a key breaks.
//!
//! **Known quirk**: [`validate`] also treats `-` as reserved while
//! [`sanitize`] leaves it in place, so a sanitized key containing a hyphen
//! still fails validation.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// Maximum key size in UTF-8 bytes.
pub const MAX_KEY_BYTES: usize = 1024;

/// Maximum key length kept by [`sanitize`], in characters.
pub const MAX_KEY_CHARS: usize = 1024;

/// Characters [`sanitize`] replaces.
pub const SANITIZED_CHARACTERS: [char; 7] = ['/', '\\', '#', '?', '\t', '\n', '\r'];

/// Characters [`validate`] rejects, in the order they are checked.
pub const VALIDATED_CHARACTERS: [char; 8] = ['/', '\\', '#', '?', '\t', '\n', '\r', '-'];

/// The first rule a key violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValidationFailure {
    /// No key was supplied.
    Null,
    /// The key is the empty string.
    Empty,
    /// The key is larger than [`MAX_KEY_BYTES`].
    TooLarge {
        /// Actual size in UTF-8 bytes.
        size: usize,
    },
    /// The key contains a reserved character.
    ReservedCharacter {
        /// The reserved character found.
        character: char,
        /// Character index of its first occurrence.
        index: usize,
    },
    /// The key contains a control character.
    ControlCharacter {
        /// Character index of the first control character.
        index: usize,
    },
}

impl fmt::Display for KeyValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValidationFailure::Null => f.write_str("key is null"),
            KeyValidationFailure::Empty => f.write_str("key is an empty string"),
            KeyValidationFailure::TooLarge { size } => write!(
                f,
                "key is {size} bytes, larger than the {MAX_KEY_BYTES} byte limit"
            ),
            KeyValidationFailure::ReservedCharacter { character, index } => write!(
                f,
                "key contains reserved character {character:?} at index {index}"
            ),
            KeyValidationFailure::ControlCharacter { index } => {
                write!(f, "key contains a control character at index {index}")
            }
        }
    }
}

/// Turns arbitrary text into a usable key.
///
/// Each of `/ \ # ? TAB LF CR` is replaced by `replacement`, remaining
/// control characters are dropped, and the result is truncated to
/// [`MAX_KEY_CHARS`] characters. `None` is treated as the empty string.
///
/// Truncation counts characters, not bytes, so multi-byte text can still
/// exceed [`MAX_KEY_BYTES`]. `-` is left untouched (see the module docs).
///
/// ```
/// use tablestore_core::keys::sanitize;
///
/// assert_eq!(sanitize(Some("a/b#c"), ""), "abc");
/// assert_eq!(sanitize(Some("a/b"), "_"), "a_b");
/// ```
pub fn sanitize(raw: Option<&str>, replacement: &str) -> String {
    let raw = raw.unwrap_or_default();

    let mut replaced = String::with_capacity(raw.len());
    for c in raw.chars() {
        if SANITIZED_CHARACTERS.contains(&c) {
            replaced.push_str(replacement);
        } else {
            replaced.push(c);
        }
    }

    replaced
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_KEY_CHARS)
        .collect()
}

/// Sanitizes with the default empty replacement.
pub fn sanitize_default(raw: Option<&str>) -> String {
    sanitize(raw, "")
}

/// Returns the first rule `raw` violates, or `None` if it is a valid key.
///
/// Rules are checked in order: null, empty, size, reserved characters
/// (in the order of [`VALIDATED_CHARACTERS`]), control characters.
pub fn validate(raw: Option<&str>) -> Option<KeyValidationFailure> {
    let Some(key) = raw else {
        return Some(KeyValidationFailure::Null);
    };
    if key.is_empty() {
        return Some(KeyValidationFailure::Empty);
    }
    if key.len() > MAX_KEY_BYTES {
        return Some(KeyValidationFailure::TooLarge { size: key.len() });
    }
    for character in VALIDATED_CHARACTERS {
        if let Some(index) = key.chars().position(|c| c == character) {
            return Some(KeyValidationFailure::ReservedCharacter { character, index });
        }
    }
    key.chars()
        .position(char::is_control)
        .map(|index| KeyValidationFailure::ControlCharacter { index })
}

/// Validates a key, converting a failure into [`CoreError::InvalidKey`].
///
/// # Errors
///
/// Returns the first violated rule as an error.
pub fn validate_or_err(raw: Option<&str>) -> CoreResult<()> {
    match validate(raw) {
        Some(failure) => Err(CoreError::InvalidKey { failure }),
        None => Ok(()),
    }
}

/// Returns true if the key is empty or whitespace only.
pub(crate) fn is_blank(key: &str) -> bool {
    key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tablestore_testkit::{any_key_strategy, hyphen_free_key_strategy, valid_key_strategy};

    #[test]
    fn sanitize_strips_reserved() {
        assert_eq!(sanitize(Some("a/b#c"), ""), "abc");
        assert_eq!(sanitize(Some("x\\y?z"), ""), "xyz");
        assert_eq!(sanitize(Some("tab\there\nline\r"), ""), "tabhereline");
    }

    #[test]
    fn sanitize_replaces_reserved_but_drops_controls() {
        assert_eq!(sanitize(Some("a/b\u{7}c"), "_"), "a_bc");
        assert_eq!(sanitize(Some("a\tb"), "-"), "a-b");
    }

    #[test]
    fn sanitize_null_is_empty() {
        assert_eq!(sanitize(None, "_"), "");
    }

    #[test]
    fn sanitize_keeps_hyphen() {
        assert_eq!(sanitize_default(Some("2024-01-01")), "2024-01-01");
    }

    #[test]
    fn sanitize_truncates_by_characters() {
        let long = "é".repeat(2000);
        let sanitized = sanitize_default(Some(&long));
        assert_eq!(sanitized.chars().count(), MAX_KEY_CHARS);
        // Two bytes per character: still over the byte limit.
        assert_eq!(
            validate(Some(&sanitized)),
            Some(KeyValidationFailure::TooLarge { size: 2048 })
        );
    }

    #[test]
    fn validate_order() {
        assert_eq!(validate(None), Some(KeyValidationFailure::Null));
        assert_eq!(validate(Some("")), Some(KeyValidationFailure::Empty));
        assert_eq!(
            validate(Some(&"a".repeat(1025))),
            Some(KeyValidationFailure::TooLarge { size: 1025 })
        );
        assert_eq!(validate(Some(&"a".repeat(1024))), None);
    }

    #[test]
    fn validate_reports_reserved_in_fixed_order() {
        // '#' appears first in the key but '/' is checked first.
        assert_eq!(
            validate(Some("a#b/c")),
            Some(KeyValidationFailure::ReservedCharacter {
                character: '/',
                index: 3
            })
        );
        assert_eq!(
            validate(Some("plate-no")),
            Some(KeyValidationFailure::ReservedCharacter {
                character: '-',
                index: 5
            })
        );
    }

    #[test]
    fn validate_control_character() {
        assert_eq!(
            validate(Some("ab\u{1b}c")),
            Some(KeyValidationFailure::ControlCharacter { index: 2 })
        );
        assert_eq!(validate(Some("Westview")), None);
    }

    #[test]
    fn hyphen_asymmetry_is_preserved() {
        let key = sanitize_default(Some("a-b"));
        assert_eq!(key, "a-b");
        assert!(validate(Some(&key)).is_some());
    }

    #[test]
    fn validate_or_err_wraps_failure() {
        let err = validate_or_err(Some("")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidKey {
                failure: KeyValidationFailure::Empty
            }
        ));
        assert_eq!(err.to_string(), "invalid key: key is an empty string");
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(!is_blank(" a "));
    }

    proptest! {
        #[test]
        fn sanitized_keys_have_no_forbidden_characters(raw in any_key_strategy()) {
            let key = sanitize_default(Some(&raw));
            prop_assert!(key.chars().count() <= MAX_KEY_CHARS);
            prop_assert!(!key.chars().any(|c| SANITIZED_CHARACTERS.contains(&c)));
            prop_assert!(!key.chars().any(char::is_control));
        }

        #[test]
        fn sanitized_hyphen_free_keys_validate(raw in hyphen_free_key_strategy()) {
            let key = sanitize_default(Some(&raw));
            prop_assume!(!key.is_empty());
            prop_assert_eq!(validate(Some(&key)), None);
        }

        #[test]
        fn valid_keys_survive_sanitizing(key in valid_key_strategy()) {
            prop_assert_eq!(validate(Some(&key)), None);
            prop_assert_eq!(sanitize_default(Some(&key)), key);
        }
    }
}
