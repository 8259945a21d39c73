// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destination phone number normalization.

use std::sync::LazyLock;

use envia_core::EnviaError;
use regex::Regex;

static E164_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{10,15}$").expect("phone pattern is valid"));

/// Keep digits and `+`. A number without a leading `+` gets one, plus the
/// default country code unless it already starts with it.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if cleaned.starts_with('+') {
        cleaned
    } else if cleaned.starts_with(default_country_code) {
        format!("+{cleaned}")
    } else {
        format!("+{default_country_code}{cleaned}")
    }
}

pub fn is_valid_phone(normalized: &str) -> bool {
    E164_LIKE.is_match(normalized)
}

/// Normalize and validate a destination, or fail with a validation error.
pub fn prepare_destination(raw: &str, default_country_code: &str) -> Result<String, EnviaError> {
    let normalized = normalize_phone(raw, default_country_code);
    if is_valid_phone(&normalized) {
        Ok(normalized)
    } else {
        Err(EnviaError::Validation(
            "invalid phone number, use the format +5511999999999".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn formatted_local_number_gets_country_code() {
        assert_eq!(normalize_phone("(11) 99999-9999", "55"), "+5511999999999");
    }

    #[test]
    fn number_with_country_code_gets_plus_only() {
        assert_eq!(normalize_phone("5511999999999", "55"), "+5511999999999");
    }

    #[test]
    fn plus_prefixed_number_is_kept() {
        assert_eq!(normalize_phone("+1 (415) 555-0100", "55"), "+14155550100");
    }

    #[test]
    fn validation_bounds() {
        assert!(is_valid_phone("+5511999999999"));
        assert!(is_valid_phone("+1234567890"));
        assert!(!is_valid_phone("+123456789"));
        assert!(!is_valid_phone("+1234567890123456"));
        assert!(!is_valid_phone("+55+11999999999"));
    }

    #[test]
    fn short_input_is_rejected() {
        let err = prepare_destination("123", "55").unwrap_err();
        assert!(matches!(err, EnviaError::Validation(_)));
    }

    #[test]
    fn prepared_destinations() {
        let cases = [
            ("11999999999", Some("+5511999999999")),
            ("+5511999999999", Some("+5511999999999")),
            ("(11) 99999-9999", Some("+5511999999999")),
            ("abc", None),
            ("", None),
        ];
        for (raw, expected) in cases {
            let prepared = prepare_destination(raw, "55").ok();
            assert_eq!(prepared.as_deref(), expected, "{raw:?}");
        }
    }

    #[test]
    fn other_default_country_code() {
        assert_eq!(normalize_phone("4155550100", "1"), "+14155550100");
        assert_eq!(normalize_phone("912345678", "351"), "+351912345678");
    }

    proptest! {
        #[test]
        fn normalized_is_plus_then_digits_or_plus(raw in "\\PC{0,30}") {
            let n = normalize_phone(&raw, "55");
            prop_assert!(n.starts_with('+'));
            prop_assert!(n.chars().all(|c| c == '+' || c.is_ascii_digit()));
        }

        #[test]
        fn normalization_is_idempotent(raw in "[-+() 0-9a-z]{0,25}") {
            let once = normalize_phone(&raw, "55");
            prop_assert_eq!(normalize_phone(&once, "55"), once.clone());
        }

        #[test]
        fn formatted_brazilian_mobiles_validate(ddd in 11u32..99, number in 900_000_000u64..999_999_999) {
            let raw = format!("({ddd}) {}-{}", number / 10_000, number % 10_000);
            let prepared = prepare_destination(&raw, "55");
            prop_assert!(prepared.is_ok(), "{raw}");
        }
    }
}
