// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with "did you mean" suggestions.

#![allow(unused_assignments)] // false positive from the Diagnostic derive

use std::io::IsTerminal;

use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a known key must beat to be offered as a correction.
const MIN_SIMILARITY: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("`{key}` is not a recognized setting")]
    #[diagnostic(
        code(envia::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("unknown setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type ({detail})")]
    #[diagnostic(code(envia::config::invalid_type), help("use a {expected} here"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("required setting `{key}` is missing")]
    #[diagnostic(
        code(envia::config::missing_key),
        help("set `{key}` in envia.toml or through its ENVIA_* variable")
    )]
    MissingKey { key: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(envia::config::validation))]
    Validation { message: String },

    #[error("could not load configuration: {0}")]
    #[diagnostic(code(envia::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("perhaps `{s}`? This table accepts: {valid_keys}"),
        None => format!("this table accepts: {valid_keys}"),
    }
}

/// Convert a `figment::Error` (which may hold several errors) into diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, accepted) => {
                let (span, src) = locate_in_sources(&error, field, toml_sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, accepted),
                    valid_keys: accepted.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: qualified(&error.path, field),
            },
            Kind::InvalidType(found, wanted) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("got {found}"),
                expected: wanted.to_string(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// `vault.encryption_key` rather than a bare `encryption_key`.
fn qualified(path: &[String], field: &str) -> String {
    match path.last() {
        Some(last) if last == field => path.join("."),
        _ if path.is_empty() => field.to_string(),
        _ => format!("{}.{field}", path.join(".")),
    }
}

fn locate_in_sources(
    error: &figment::error::Error,
    field: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings have no file source; fall back to the only source given.
    let source = match source_path {
        Some(path) => sources.iter().find(|(p, _)| *p == path),
        None if sources.len() == 1 => sources.first(),
        None => None,
    };

    if let Some((path, content)) = source
        && let Some(offset) = find_key_offset(content, &error.path, field)
    {
        return (
            Some((offset, field.len()).into()),
            Some(NamedSource::new(path, content.clone())),
        );
    }

    (None, None)
}

/// Byte offset of `field` inside the TOML table named by `path`.
///
/// For `path = ["whatsapp", "send"]` the header searched for is
/// `[whatsapp.send]`. Top-level fields are searched from the start.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let table: Vec<&str> = path
        .iter()
        .map(String::as_str)
        .take_while(|segment| *segment != field)
        .collect();

    let search_start = if table.is_empty() {
        0
    } else {
        let header = format!("[{}]", table.join("."));
        content.find(&header).map(|pos| pos + header.len())?
    };

    let mut byte_offset = 0;
    for line in content[search_start..].lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && byte_offset > 0 {
            break;
        }
        if let Some(after) = trimmed.strip_prefix(field)
            && (after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t'))
        {
            let field_start_in_line = line.len() - trimmed.len();
            return Some(search_start + byte_offset + field_start_in_line);
        }
        byte_offset += line.len() + 1;
    }

    None
}

/// Best Jaro-Winkler match above the threshold.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, known: &[S]) -> Option<String> {
    let (score, best) = known
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key.as_ref()), key.as_ref()))
        .max_by(|a, b| a.0.total_cmp(&b.0))?;
    (score > MIN_SIMILARITY).then(|| best.to_string())
}

/// Print every diagnostic to stderr. Colors only when stderr is a terminal.
pub fn render_errors(errors: &[ConfigError]) {
    let theme = if std::io::stderr().is_terminal() {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("envia: {error}"),
        }
    }
    eprintln!(
        "envia: {} configuration problem{} found",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_encryption_key_for_typo() {
        let valid = &["encryption_key", "kdf_memory_cost", "kdf_iterations"];
        assert_eq!(
            suggest_key("encrpytion_key", valid),
            Some("encryption_key".to_string())
        );
    }

    #[test]
    fn unrelated_keys_get_no_suggestion() {
        let valid = &["failure_threshold", "recovery_time_ms"];
        assert_eq!(suggest_key("qqqqqq", valid), None);
    }

    #[test]
    fn missing_keys_are_reported_with_their_table() {
        let path = vec!["vault".to_string()];
        assert_eq!(qualified(&path, "encryption_key"), "vault.encryption_key");
        assert_eq!(qualified(&[], "name"), "name");
        let full = vec!["vault".to_string(), "encryption_key".to_string()];
        assert_eq!(qualified(&full, "encryption_key"), "vault.encryption_key");
    }

    #[test]
    fn find_key_offset_in_nested_table() {
        let content = "[whatsapp]\napi_base_url = \"x\"\n\n[whatsapp.send]\nmax_atempts = 3\n";
        let path = vec!["whatsapp".to_string(), "send".to_string()];
        let o = find_key_offset(content, &path, "max_atempts").unwrap();
        assert_eq!(&content[o..o + 11], "max_atempts");
    }

    #[test]
    fn find_key_offset_stops_at_next_table() {
        let content = "[vault]\nkdf_iterations = 3\n[storage]\nwal = true\n";
        let path = vec!["vault".to_string()];
        assert_eq!(find_key_offset(content, &path, "wal"), None);
    }
}
