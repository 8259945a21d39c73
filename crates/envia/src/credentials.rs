// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `envia credentials` subcommands.

use clap::Args;
use envia_core::{EmailCredentials, EnviaError, ServiceType, WhatsAppCredentials};
use secrecy::ExposeSecret;

use crate::app::App;
use crate::output::Output;
use crate::prompt::{read_secret, SMTP_PASSWORD_ENV_VAR, WHATSAPP_TOKEN_ENV_VAR};
use crate::CredentialsCommand;

#[derive(Args, Debug)]
pub struct SetEmailArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub host: String,
    #[arg(long, default_value_t = 587)]
    pub port: u32,
    /// SMTP login; usually the mailbox address.
    #[arg(long)]
    pub username: String,
    /// Sender address; defaults to the login.
    #[arg(long)]
    pub from_email: Option<String>,
    #[arg(long)]
    pub from_name: Option<String>,
}

pub async fn run(app: &App, command: CredentialsCommand, out: Output) -> Result<bool, EnviaError> {
    match command {
        CredentialsCommand::SetWhatsapp {
            user,
            phone_number_id,
            webhook_url,
        } => {
            let token = read_secret("WhatsApp access token", WHATSAPP_TOKEN_ENV_VAR)?;
            let creds = WhatsAppCredentials {
                access_token: token.expose_secret().trim().to_string(),
                phone_number_id: phone_number_id.trim().to_string(),
                webhook_url,
            };
            app.store.save_whatsapp(&user, &creds).await?;
            report_saved(out, ServiceType::Whatsapp, &user);
            Ok(true)
        }
        CredentialsCommand::SetEmail(args) => {
            let password = read_secret("SMTP password", SMTP_PASSWORD_ENV_VAR)?;
            let from_email = args.from_email.unwrap_or_else(|| args.username.clone());
            let creds = EmailCredentials {
                smtp_host: args.host.trim().to_string(),
                smtp_port: args.port,
                smtp_user: args.username.trim().to_string(),
                smtp_password: password.expose_secret().to_string(),
                from_email: from_email.trim().to_string(),
                from_name: args.from_name,
                use_ssl: Some(args.port == 465),
            };
            let problems = envia_email::diagnostics::validate(&creds);
            if !problems.is_empty() {
                return Err(EnviaError::Validation(problems.join("; ")));
            }
            app.store.save_email(&args.user, &creds).await?;
            report_saved(out, ServiceType::Email, &args.user);
            Ok(true)
        }
        CredentialsCommand::Deactivate { user, service } => {
            let changed = app.store.deactivate(&user, service).await?;
            if out.json {
                out.print_json(&serde_json::json!({ "success": changed, "service": service }));
            } else if changed {
                out.ok(&format!("{service} credentials deactivated for {user}"));
            } else {
                out.fail(&format!("no active {service} credentials for {user}"));
            }
            Ok(changed)
        }
        CredentialsCommand::List { user } => {
            let summaries = app.store.list(&user).await?;
            if out.json {
                out.print_json(&summaries);
                return Ok(true);
            }
            out.heading(&format!("credentials for {user}"));
            if summaries.is_empty() {
                out.field("(none)", "");
            }
            for s in &summaries {
                out.field(&s.service_type.to_string(), &format!("{} {}", s.identity, s.secret_preview));
                out.field(
                    "",
                    &format!(
                        "updated {}, last tested {}",
                        s.updated_at,
                        s.last_tested.as_deref().unwrap_or("never")
                    ),
                );
            }
            println!();
            Ok(true)
        }
        CredentialsCommand::PhoneInfo { user } => {
            let info = app.whatsapp.phone_number_info(&user).await?;
            if out.json {
                out.print_json(&info);
            } else {
                out.heading("whatsapp number");
                out.field("Number", info.display_phone_number.as_deref().unwrap_or("-"));
                out.field("Verified name", info.verified_name.as_deref().unwrap_or("-"));
                println!();
            }
            Ok(true)
        }
    }
}

fn report_saved(out: Output, service: ServiceType, user: &str) {
    if out.json {
        out.print_json(&serde_json::json!({ "success": true, "service": service }));
    } else {
        out.ok(&format!("{service} credentials saved for {user}"));
        out.hint(&format!("run `envia test --user {user} --service {service}` to verify them"));
    }
}
