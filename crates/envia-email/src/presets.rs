// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Well-known mail providers, detected by hostname substring.

use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderPreset {
    Gmail,
    Outlook,
    Yahoo,
    Generic,
}

impl ProviderPreset {
    pub fn detect(host: &str) -> Self {
        let host = host.to_ascii_lowercase();
        if host.contains("gmail.com") {
            Self::Gmail
        } else if host.contains("outlook.com") || host.contains("hotmail.com") {
            Self::Outlook
        } else if host.contains("yahoo.com") {
            Self::Yahoo
        } else {
            Self::Generic
        }
    }

    /// Canonical SMTP relay of the provider. `None` keeps the configured host.
    pub fn relay_host(self) -> Option<&'static str> {
        match self {
            Self::Gmail => Some("smtp.gmail.com"),
            Self::Outlook => Some("smtp-mail.outlook.com"),
            Self::Yahoo => Some("smtp.mail.yahoo.com"),
            Self::Generic => None,
        }
    }

    /// Submission port used when none is configured.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::Gmail | Self::Outlook | Self::Yahoo => Some(587),
            Self::Generic => None,
        }
    }

    /// Extra remediation hint shown when authentication fails.
    pub fn auth_hint(self) -> Option<&'static str> {
        match self {
            Self::Gmail => Some("For Gmail, use an App Password instead of your account password"),
            Self::Outlook => Some("For Outlook, make sure SMTP AUTH is enabled for the mailbox"),
            Self::Yahoo => Some("For Yahoo, generate an app password in the account security page"),
            Self::Generic => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_by_substring() {
        assert_eq!(ProviderPreset::detect("smtp.gmail.com"), ProviderPreset::Gmail);
        assert_eq!(ProviderPreset::detect("SMTP.Gmail.com"), ProviderPreset::Gmail);
        assert_eq!(ProviderPreset::detect("smtp-mail.outlook.com"), ProviderPreset::Outlook);
        assert_eq!(ProviderPreset::detect("smtp.live.hotmail.com"), ProviderPreset::Outlook);
        assert_eq!(ProviderPreset::detect("smtp.mail.yahoo.com"), ProviderPreset::Yahoo);
        assert_eq!(ProviderPreset::detect("mail.example.org"), ProviderPreset::Generic);
    }

    #[test]
    fn generic_keeps_host() {
        assert_eq!(ProviderPreset::Generic.relay_host(), None);
        assert_eq!(ProviderPreset::Generic.default_port(), None);
        assert_eq!(ProviderPreset::Yahoo.default_port(), Some(587));
        assert_eq!(ProviderPreset::Gmail.to_string(), "gmail");
    }
}
