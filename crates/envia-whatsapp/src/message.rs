// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text body for a code batch.

use envia_core::Code;

pub const DEFAULT_HEADER: &str = "🎯 *Your Codes*\n\n";

/// Built-in footer naming the sending service.
pub fn default_footer(service_name: &str) -> String {
    format!("📱 *{service_name}* - Code Distribution System")
}

/// One message for the whole batch: header, numbered bold codes, footer.
pub fn format_message(codes: &[Code], custom_header: Option<&str>, footer: &str) -> String {
    let mut message = match custom_header.filter(|h| !h.trim().is_empty()) {
        Some(header) if header.ends_with('\n') => header.to_string(),
        Some(header) => format!("{header}\n\n"),
        None => DEFAULT_HEADER.to_string(),
    };

    for (index, code) in codes.iter().enumerate() {
        message.push_str(&format!("{}. *{}*", index + 1, code.combined_code));
        if let Some(description) = code.description() {
            message.push_str(&format!(" - {description}"));
        }
        message.push('\n');
    }

    message.push('\n');
    message.push_str(footer);
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use envia_core::CodeStatus;

    fn code(combined: &str, column_a: Option<&str>) -> Code {
        Code {
            id: format!("id-{combined}"),
            session_id: "s1".to_string(),
            column_a_value: column_a.map(str::to_string),
            column_d_value: None,
            combined_code: combined.to_string(),
            row_number: 1,
            status: CodeStatus::Available,
            sent_at: None,
            archived_at: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn numbered_bold_lines_with_descriptions() {
        let codes = [
            code("ABC123", Some("R$ 10")),
            code("DEF456", Some("DEF456")),
            code("GHI789", None),
        ];
        let msg = format_message(&codes, None, &default_footer("EnviaCodigo"));
        assert_eq!(
            msg,
            "🎯 *Your Codes*\n\n\
             1. *ABC123* - R$ 10\n\
             2. *DEF456*\n\
             3. *GHI789*\n\
             \n📱 *EnviaCodigo* - Code Distribution System"
        );
    }

    #[test]
    fn custom_header_replaces_default() {
        let msg = format_message(&[code("X1", None)], Some("Hello!"), "--");
        assert!(msg.starts_with("Hello!\n\n1. *X1*\n"));
        assert!(!msg.contains("Your Codes"));
        assert!(msg.ends_with("\n--"));
    }

    #[test]
    fn blank_custom_header_falls_back() {
        let msg = format_message(&[code("X1", None)], Some("   "), "--");
        assert!(msg.starts_with(DEFAULT_HEADER));
    }
}
