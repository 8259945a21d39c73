// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `envia doctor` command implementation.
//!
//! Runs diagnostic checks against the local environment: database, vault
//! key, Graph API reachability and, for a given user, the stored credentials.

use std::time::{Duration, Instant};

use colored::Colorize;
use envia_config::EnviaConfig;
use envia_core::{EnviaError, ServiceType};
use envia_storage::Database;
use envia_vault::ConfigVault;
use serde::Serialize;

use crate::app::App;
use crate::output::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check and print the report. Returns whether nothing failed.
pub async fn run_doctor(
    config: &EnviaConfig,
    user: Option<&str>,
    out: Output,
) -> Result<bool, EnviaError> {
    let mut results = vec![
        CheckResult::new(
            "Configuration",
            CheckStatus::Pass,
            format!("valid (service.name={})", config.service.name),
            Instant::now(),
        ),
        check_database(&config.storage.database_path).await,
        check_vault(config).await,
        check_graph_api(&config.whatsapp.api_base_url).await,
    ];

    if let Some(user) = user {
        if results.iter().any(|r| r.status == CheckStatus::Fail) {
            results.push(CheckResult::new(
                "Credentials",
                CheckStatus::Warn,
                "skipped, fix the failures above first",
                Instant::now(),
            ));
        } else {
            results.extend(check_user(config, user).await);
        }
    }

    let failed = results.iter().any(|r| r.status == CheckStatus::Fail);
    if out.json {
        out.print_json(&results);
    } else {
        print_report(&results, out);
    }
    Ok(!failed)
}

fn print_report(results: &[CheckResult], out: Output) {
    out.heading("envia doctor");

    let mut issues = 0;
    for result in results {
        let duration_ms = result.duration.as_millis();
        let line = match (result.status, out.color()) {
            (CheckStatus::Pass, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "✓".green(),
                result.name,
                result.message
            ),
            (CheckStatus::Warn, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "!".yellow(),
                result.name,
                result.message.yellow()
            ),
            (CheckStatus::Fail, true) => format!(
                "    {} {:<20} {} ({duration_ms}ms)",
                "✗".red(),
                result.name,
                result.message.red()
            ),
            (status, false) => {
                let tag = match status {
                    CheckStatus::Pass => "[OK]  ",
                    CheckStatus::Warn => "[WARN]",
                    CheckStatus::Fail => "[FAIL]",
                };
                format!("    {tag} {:<20} {} ({duration_ms}ms)", result.name, result.message)
            }
        };
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{line}");
    }

    println!();
    if issues > 0 {
        let word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();
}

async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !std::path::Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first use)"),
            start,
        );
    }

    // Opening also applies pending migrations.
    match Database::open(db_path).await {
        Ok(db) => {
            let integrity = db
                .connection()
                .call(|conn| -> Result<String, rusqlite::Error> {
                    conn.query_row("PRAGMA quick_check", [], |row| row.get(0))
                })
                .await;
            let _ = db.close().await;
            match integrity {
                Ok(ok) if ok == "ok" => {
                    CheckResult::new("Database", CheckStatus::Pass, "connected", start)
                }
                Ok(problem) => CheckResult::new(
                    "Database",
                    CheckStatus::Fail,
                    format!("integrity check: {problem}"),
                    start,
                ),
                Err(e) => CheckResult::new(
                    "Database",
                    CheckStatus::Fail,
                    format!("query failed: {e}"),
                    start,
                ),
            }
        }
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, format!("open failed: {e}"), start),
    }
}

async fn check_vault(config: &EnviaConfig) -> CheckResult {
    let start = Instant::now();
    match ConfigVault::from_config(&config.vault).await {
        Ok(vault) => CheckResult::new(
            "Vault key",
            CheckStatus::Pass,
            format!("loaded (key id {})", vault.key_id()),
            start,
        ),
        Err(e) => CheckResult::new("Vault key", CheckStatus::Fail, e.to_string(), start),
    }
}

async fn check_graph_api(base_url: &str) -> CheckResult {
    let start = Instant::now();
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult::new(
                "WhatsApp API",
                CheckStatus::Fail,
                format!("HTTP client error: {e}"),
                start,
            );
        }
    };

    match client.head(base_url).send().await {
        Ok(_) => CheckResult::new("WhatsApp API", CheckStatus::Pass, "reachable", start),
        Err(e) => {
            let msg = if e.is_timeout() {
                "timeout (5s)".to_string()
            } else if e.is_connect() {
                "connection refused".to_string()
            } else {
                format!("error: {e}")
            };
            CheckResult::new("WhatsApp API", CheckStatus::Warn, msg, start)
        }
    }
}

/// Configured-ness and a live probe per service.
async fn check_user(config: &EnviaConfig, user: &str) -> Vec<CheckResult> {
    let start = Instant::now();
    let app = match App::open(config).await {
        Ok(app) => app,
        Err(e) => {
            return vec![CheckResult::new("Credentials", CheckStatus::Fail, e.to_string(), start)];
        }
    };

    let mut results = Vec::new();
    for service in [ServiceType::Whatsapp, ServiceType::Email] {
        let start = Instant::now();
        let name = format!("{service} ({user})");
        match app.store.is_configured(user, service).await {
            Ok(false) => results.push(CheckResult::new(
                &name,
                CheckStatus::Warn,
                "not configured",
                start,
            )),
            Ok(true) => {
                let probe = app.dispatcher.test_configuration(user, service).await;
                let status = if probe.success {
                    CheckStatus::Pass
                } else {
                    CheckStatus::Fail
                };
                results.push(CheckResult::new(&name, status, probe.message, start));
            }
            Err(e) => results.push(CheckResult::new(&name, CheckStatus::Fail, e.to_string(), start)),
        }
    }
    app.close().await;
    results
}
