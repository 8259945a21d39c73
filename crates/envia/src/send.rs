// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `envia send` and `envia test`.

use envia_core::{ConnectivityTestResult, DeliveryResult, EnviaError, SendOptions, ServiceType};

use crate::app::App;
use crate::output::Output;
use crate::{SendArgs, SendCommand};

pub async fn run(app: &App, command: SendCommand, out: Output) -> Result<bool, EnviaError> {
    let result = match command {
        SendCommand::Whatsapp(args) => send(app, ServiceType::Whatsapp, args, None).await?,
        SendCommand::Email { args, subject } => {
            send(app, ServiceType::Email, args, subject).await?
        }
        SendCommand::TestEmail { user, to } => app.email.send_test_email(&user, &to).await,
    };
    print_delivery(&result, out);
    Ok(result.success)
}

async fn send(
    app: &App,
    service: ServiceType,
    args: SendArgs,
    subject: Option<String>,
) -> Result<DeliveryResult, EnviaError> {
    let options = SendOptions {
        custom_message: args.message,
        subject,
    };
    app.dispatcher
        .send(&args.user, service, &args.codes, &args.to, &options)
        .await
}

fn print_delivery(result: &DeliveryResult, out: Output) {
    if out.json {
        out.print_json(result);
        return;
    }
    if result.success {
        let noun = if result.sent_count == 1 { "code" } else { "codes" };
        out.ok(&format!("{} {noun} sent successfully", result.sent_count));
    } else {
        out.fail(&format!("{} code(s) not sent", result.failed_count));
        for error in &result.errors {
            out.hint(error);
        }
    }
}

pub async fn run_test(
    app: &App,
    user: &str,
    service: Option<ServiceType>,
    out: Output,
) -> Result<bool, EnviaError> {
    if let Some(service) = service {
        let result = app.dispatcher.test_configuration(user, service).await;
        if out.json {
            out.print_json(&result);
        } else {
            out.heading(&format!("{service} configuration"));
            print_probe(&result, out);
            println!();
        }
        return Ok(result.success);
    }

    let report = app.dispatcher.test_connectivity(user).await;
    if out.json {
        out.print_json(&report);
    } else {
        out.heading("connectivity");
        print_probe(&report.whatsapp, out);
        print_probe(&report.email, out);
        println!();
    }
    Ok(report.whatsapp.success && report.email.success)
}

fn print_probe(result: &ConnectivityTestResult, out: Output) {
    let details = &result.details;
    let mut line = format!("{:<9} {}", details.service_type.to_string(), result.message);
    if let Some(ms) = details.response_time {
        line.push_str(&format!(" ({ms}ms)"));
    }
    if result.success {
        out.ok(&line);
    } else {
        out.fail(&line);
        if let Some(code) = &details.error_code {
            out.hint(code);
        }
        for suggestion in &details.suggestions {
            out.hint(suggestion);
        }
    }
}
