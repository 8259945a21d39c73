// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML and plain-text renderings of a code batch.

use chrono::{DateTime, Utc};
use envia_core::Code;

pub const DEFAULT_HEADING: &str = "Your Codes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailBody {
    pub html: String,
    pub text: String,
}

pub fn default_subject(now: DateTime<Utc>) -> String {
    format!("Your Codes - {}", now.format("%d/%m/%Y"))
}

pub fn default_footer(service_name: &str) -> String {
    format!("{service_name} - Code Distribution System")
}

/// Minimal escaping for text placed in HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(
    codes: &[Code],
    heading: Option<&str>,
    footer: &str,
    sent_at: DateTime<Utc>,
) -> EmailBody {
    let heading = heading.filter(|h| !h.trim().is_empty()).unwrap_or(DEFAULT_HEADING);
    let stamp = sent_at.format("%d/%m/%Y %H:%M:%S UTC").to_string();
    EmailBody {
        html: render_html(codes, heading, footer, &stamp),
        text: render_text(codes, heading, footer, &stamp),
    }
}

fn render_text(codes: &[Code], heading: &str, footer: &str, stamp: &str) -> String {
    let mut text = format!("{heading}\n\n");
    for (index, code) in codes.iter().enumerate() {
        text.push_str(&format!("{}. {}", index + 1, code.combined_code));
        if let Some(description) = code.description() {
            text.push_str(&format!(" - {description}"));
        }
        text.push('\n');
    }
    text.push_str(&format!("\n{footer}\nSent at {stamp}"));
    text
}

fn render_html(codes: &[Code], heading: &str, footer: &str, stamp: &str) -> String {
    let heading = escape_html(heading);
    let plural = if codes.len() == 1 { "" } else { "s" };
    let mut items = String::new();
    for code in codes {
        items.push_str("      <li class=\"code-item\">\n");
        items.push_str(&format!(
            "        <div class=\"code-number\">{}</div>\n",
            escape_html(&code.combined_code)
        ));
        if let Some(description) = code.description() {
            items.push_str(&format!(
                "        <div class=\"code-description\">{}</div>\n",
                escape_html(description)
            ));
        }
        items.push_str("      </li>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{heading}</title>
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: #4f46e5; color: white; padding: 20px; border-radius: 8px; text-align: center; margin-bottom: 20px; }}
    .code-item {{ background: #f8f9fa; border: 1px solid #e9ecef; border-radius: 6px; padding: 15px; margin-bottom: 10px; }}
    .code-number {{ font-weight: bold; color: #495057; font-size: 18px; }}
    .code-description {{ color: #6c757d; margin-top: 5px; }}
    .footer {{ text-align: center; margin-top: 30px; padding-top: 20px; border-top: 1px solid #e9ecef; color: #6c757d; }}
  </style>
</head>
<body>
  <div class="header">
    <h1>{heading}</h1>
    <span class="count">{count} code{plural}</span>
  </div>
  <div class="content">
    <ol>
{items}    </ol>
  </div>
  <div class="footer">
    <p><strong>{footer}</strong></p>
    <p>Sent at {stamp}</p>
  </div>
</body>
</html>
"#,
        count = codes.len(),
        footer = escape_html(footer),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
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

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn text_lists_codes_in_order() {
        let body = render(
            &[code("ABC123", Some("R$ 10")), code("DEF456", None)],
            None,
            "EnviaCodigo - Code Distribution System",
            at(),
        );
        assert_eq!(
            body.text,
            "Your Codes\n\n1. ABC123 - R$ 10\n2. DEF456\n\n\
             EnviaCodigo - Code Distribution System\nSent at 09/03/2026 14:05:00 UTC"
        );
    }

    #[test]
    fn html_is_ordered_list_and_escaped() {
        let body = render(
            &[code("<b>X</b>", Some("Tom & Jerry"))],
            Some("Hi \"there\""),
            "f",
            at(),
        );
        assert!(body.html.contains("<ol>"));
        assert!(body.html.contains("&lt;b&gt;X&lt;/b&gt;"));
        assert!(body.html.contains("Tom &amp; Jerry"));
        assert!(body.html.contains("<h1>Hi &quot;there&quot;</h1>"));
        assert!(body.html.contains("1 code</span>"));
        assert!(!body.html.contains("<b>X</b>"));
    }

    #[test]
    fn description_equal_to_code_is_omitted() {
        let body = render(&[code("SAME", Some("SAME"))], None, "f", at());
        assert!(!body.html.contains("code-description"));
        assert!(body.text.contains("1. SAME\n"));
    }

    #[test]
    fn subject_has_date() {
        assert_eq!(default_subject(at()), "Your Codes - 09/03/2026");
    }
}
