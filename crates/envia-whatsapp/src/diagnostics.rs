// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error codes and remediation hints for configuration tests.

pub const CONFIG_NOT_FOUND: &str = "CONFIG_NOT_FOUND";
pub const INVALID_TOKEN_FORMAT: &str = "INVALID_TOKEN_FORMAT";
pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
pub const INSUFFICIENT_PERMISSIONS: &str = "INSUFFICIENT_PERMISSIONS";
pub const PHONE_NUMBER_NOT_FOUND: &str = "PHONE_NUMBER_NOT_FOUND";
pub const RATE_LIMITED: &str = "RATE_LIMITED";
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";

pub fn config_not_found() -> Vec<&'static str> {
    vec![
        "Configure your WhatsApp Business API credentials",
        "Check that both the access token and the phone number ID were provided",
    ]
}

pub fn invalid_token_format(prefixes: &[String]) -> Vec<String> {
    vec![
        format!("The access token must start with one of: {}", prefixes.join(", ")),
        "Make sure you copied the complete token from Meta for Developers".to_string(),
    ]
}

pub fn connected() -> Vec<&'static str> {
    vec![
        "Configuration is valid and working",
        "You can send codes via WhatsApp",
    ]
}

pub fn connection_error() -> Vec<&'static str> {
    vec![
        "Check your internet connection",
        "Confirm that Meta services are up",
        "Try again in a few minutes",
    ]
}

/// Map a failed lookup status to an error code and its suggestions.
pub fn for_status(status: u16) -> (&'static str, Vec<&'static str>) {
    match status {
        401 => (
            INVALID_TOKEN,
            vec![
                "Access token is invalid or expired",
                "Generate a new token in Meta for Developers",
                "Check that the token has the required permissions",
            ],
        ),
        403 => (
            INSUFFICIENT_PERMISSIONS,
            vec![
                "The token lacks the required permissions",
                "Review the app permissions in Meta for Developers",
                "Add the whatsapp_business_messaging permission",
            ],
        ),
        404 => (
            PHONE_NUMBER_NOT_FOUND,
            vec![
                "Phone number ID not found",
                "Check the ID in Meta for Developers",
                "Confirm the number is linked to your app",
            ],
        ),
        429 => (
            RATE_LIMITED,
            vec![
                "Too many test attempts",
                "Wait a few minutes before testing again",
            ],
        ),
        _ => (
            UNKNOWN_ERROR,
            vec![
                "WhatsApp API error",
                "Check your credentials",
                "Try again in a few minutes",
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_codes_for_known_statuses() {
        assert_eq!(for_status(401).0, INVALID_TOKEN);
        assert_eq!(for_status(403).0, INSUFFICIENT_PERMISSIONS);
        assert_eq!(for_status(404).0, PHONE_NUMBER_NOT_FOUND);
        assert_eq!(for_status(429).0, RATE_LIMITED);
        assert_eq!(for_status(500).0, UNKNOWN_ERROR);
        for status in [401, 403, 404, 429, 500] {
            assert!(!for_status(status).1.is_empty());
        }
    }
}
