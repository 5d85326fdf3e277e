//! Property-based test generators using proptest.

use proptest::prelude::*;

/// Strategy for arbitrary key text, including reserved and control
/// characters.
pub fn any_key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            3 => any::<char>(),
            1 => prop::sample::select(vec!['/', '\\', '#', '?', '\t', '\n', '\r', '-', '\u{7}']),
        ],
        0..1500,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for key text without hyphens, short enough to stay within the
/// byte limit.
pub fn hyphen_free_key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        any::<char>().prop_filter("no hyphen", |c| *c != '-'),
        0..200,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for keys that are already valid.
pub fn valid_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9_.]{1,64}").expect("Invalid regex")
}
