// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envia - outbound code delivery over WhatsApp and email.
//!
//! This is the operator CLI on top of the delivery core.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod codes;
mod credentials;
mod doctor;
mod output;
mod prompt;
mod send;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use envia_core::{EnviaError, ServiceType};

/// Envia - outbound code delivery over WhatsApp and email.
#[derive(Parser, Debug)]
#[command(name = "envia", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check configuration, database, vault key, and circuit breakers.
    Doctor {
        /// Also probe the stored credentials of this user.
        #[arg(long)]
        user: Option<String>,
    },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that need the database and the vault.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Manage per-user delivery credentials.
    #[command(subcommand)]
    Credentials(CredentialsCommand),
    /// Deliver codes to a destination.
    #[command(subcommand)]
    Send(SendCommand),
    /// Probe the stored configuration of one or both services.
    Test {
        #[arg(long)]
        user: String,
        /// Only test this service (`whatsapp` or `email`).
        #[arg(long)]
        service: Option<ServiceType>,
    },
    /// Archive codes, or every sent code of a session.
    Archive {
        #[arg(long)]
        user: String,
        /// Archive every sent code of this session instead of explicit ids.
        #[arg(long, conflicts_with = "codes")]
        session: Option<String>,
        #[arg(long, default_value = "manual")]
        reason: String,
        /// Code ids to archive.
        codes: Vec<String>,
    },
    /// Move an archived code back to available.
    Restore {
        #[arg(long)]
        user: String,
        code: String,
    },
    /// Show recent history, archived codes, or archive statistics.
    History(codes::HistoryArgs),
}

#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// Store WhatsApp Business API credentials.
    SetWhatsapp {
        #[arg(long)]
        user: String,
        #[arg(long)]
        phone_number_id: String,
        #[arg(long)]
        webhook_url: Option<String>,
    },
    /// Store SMTP credentials.
    SetEmail(credentials::SetEmailArgs),
    /// Deactivate the stored credentials of one service.
    Deactivate {
        #[arg(long)]
        user: String,
        #[arg(long)]
        service: ServiceType,
    },
    /// List stored credentials with secrets masked.
    List {
        #[arg(long)]
        user: String,
    },
    /// Look up the WhatsApp number behind the stored phone number id.
    PhoneInfo {
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand, Debug)]
enum SendCommand {
    /// Send codes as one WhatsApp text message.
    Whatsapp(SendArgs),
    /// Send codes as one email.
    Email {
        #[command(flatten)]
        args: SendArgs,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Send a synthetic TEST123 code to check the SMTP setup end to end.
    TestEmail {
        #[arg(long)]
        user: String,
        #[arg(long)]
        to: String,
    },
}

#[derive(Args, Debug)]
struct SendArgs {
    #[arg(long)]
    user: String,
    /// Phone number or email address.
    #[arg(long)]
    to: String,
    /// Replaces the default message header.
    #[arg(long)]
    message: Option<String>,
    /// Code ids to send, all in one message.
    #[arg(required = true)]
    codes: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => envia_config::load_and_validate_path(path),
        None => envia_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            envia_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.service.log_level);

    let out = output::Output::new(cli.plain, cli.json);
    match run(cli.command, config, out).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            out.error(&e);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` means the command ran but what it reports failed.
async fn run(
    command: Commands,
    config: envia_config::EnviaConfig,
    out: output::Output,
) -> Result<bool, EnviaError> {
    let command = match command {
        Commands::Doctor { user } => {
            return doctor::run_doctor(&config, user.as_deref(), out).await;
        }
        Commands::Store(command) => command,
    };

    let app = app::App::open(&config).await?;
    let result = match command {
        StoreCommand::Credentials(cmd) => credentials::run(&app, cmd, out).await,
        StoreCommand::Send(cmd) => send::run(&app, cmd, out).await,
        StoreCommand::Test { user, service } => send::run_test(&app, &user, service, out).await,
        StoreCommand::Archive {
            user,
            session,
            reason,
            codes,
        } => codes::run_archive(&app, &user, session.as_deref(), &codes, &reason, out).await,
        StoreCommand::Restore { user, code } => codes::run_restore(&app, &user, &code, out).await,
        StoreCommand::History(args) => codes::run_history(&app, args, out).await,
    };
    app.close().await;
    result
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("envia={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
