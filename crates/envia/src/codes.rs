// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `envia archive`, `envia restore`, `envia history`.

use clap::{Args, ValueEnum};
use envia_core::{ArchiveOutcome, EnviaError};

use crate::app::App;
use crate::output::Output;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HistoryView {
    /// Most recent actions, newest first.
    Recent,
    /// Codes currently archived.
    Archived,
    /// Archive and restore actions.
    ArchiveLog,
    /// Totals per action and archive volume.
    Stats,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long, value_enum, default_value_t = HistoryView::Recent)]
    pub view: HistoryView,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

pub async fn run_archive(
    app: &App,
    user: &str,
    session: Option<&str>,
    code_ids: &[String],
    reason: &str,
    out: Output,
) -> Result<bool, EnviaError> {
    let outcome = match session {
        Some(session) => app.dispatcher.archive_session(user, session, reason).await?,
        None if code_ids.is_empty() => {
            return Err(EnviaError::Validation(
                "pass code ids or --session to archive".to_string(),
            ));
        }
        None => app.dispatcher.archive_codes(user, code_ids, reason).await?,
    };
    print_archive(&outcome, out);
    Ok(outcome.success)
}

fn print_archive(outcome: &ArchiveOutcome, out: Output) {
    if out.json {
        out.print_json(outcome);
        return;
    }
    if outcome.success {
        out.ok(&format!("{} code(s) archived", outcome.archived_count));
    } else {
        out.fail(&format!(
            "{} code(s) archived, {} failed",
            outcome.archived_count,
            outcome.errors.len()
        ));
    }
    for error in &outcome.errors {
        out.hint(error);
    }
}

pub async fn run_restore(app: &App, user: &str, code_id: &str, out: Output) -> Result<bool, EnviaError> {
    let outcome = app.dispatcher.restore_code(user, code_id).await;
    if out.json {
        out.print_json(&outcome);
    } else if outcome.success {
        out.ok(&outcome.message);
    } else {
        out.fail(&outcome.message);
    }
    Ok(outcome.success)
}

pub async fn run_history(app: &App, args: HistoryArgs, out: Output) -> Result<bool, EnviaError> {
    let user = args.user.as_str();
    let limit = args.limit.clamp(1, 100);
    match args.view {
        HistoryView::Recent => {
            let offset = (args.page.max(1) - 1) * limit;
            let items = app.dispatcher.history(user, limit, offset).await?;
            if out.json {
                out.print_json(&items);
                return Ok(true);
            }
            out.heading(&format!("history for {user}"));
            for item in &items {
                out.field(
                    &item.action_type.to_string(),
                    &format!(
                        "{} {} {}",
                        item.created_at,
                        item.status,
                        item.destination.as_deref().unwrap_or("-")
                    ),
                );
            }
        }
        HistoryView::Archived => {
            let page = app.dispatcher.archived_codes(user, args.page, limit).await?;
            if out.json {
                out.print_json(&page);
                return Ok(true);
            }
            out.heading(&format!(
                "archived codes (page {}/{}, {} total)",
                page.page, page.total_pages, page.total
            ));
            for archived in &page.items {
                out.field(
                    &archived.code.combined_code,
                    &format!(
                        "{} archived {}",
                        archived.filename,
                        archived.code.archived_at.as_deref().unwrap_or("-")
                    ),
                );
            }
        }
        HistoryView::ArchiveLog => {
            let page = app.dispatcher.archive_history(user, args.page, limit).await?;
            if out.json {
                out.print_json(&page);
                return Ok(true);
            }
            out.heading(&format!("archive log (page {}/{})", page.page, page.total_pages));
            for entry in &page.items {
                out.field(
                    &entry.item.action_type.to_string(),
                    &format!(
                        "{} {}",
                        entry.item.created_at,
                        entry.combined_code.as_deref().unwrap_or("(deleted code)")
                    ),
                );
            }
        }
        HistoryView::Stats => {
            let stats = app.dispatcher.history_statistics(user).await?;
            let archive = app.dispatcher.archive_stats(user).await?;
            if out.json {
                out.print_json(&serde_json::json!({ "history": stats, "archive": archive }));
                return Ok(true);
            }
            out.heading(&format!("statistics for {user}"));
            out.field("Actions", &stats.total_actions.to_string());
            out.field("WhatsApp sent", &stats.whatsapp_sent.to_string());
            out.field("Email sent", &stats.email_sent.to_string());
            out.field("Archived", &archive.total_archived.to_string());
            out.field("  today", &archive.archived_today.to_string());
            out.field("  7 days", &archive.archived_this_week.to_string());
            out.field("  30 days", &archive.archived_this_month.to_string());
        }
    }
    println!();
    Ok(true)
}
