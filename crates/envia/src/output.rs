// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal output: colored, plain, or JSON.

use std::io::IsTerminal;

use colored::Colorize;
use envia_core::EnviaError;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct Output {
    color: bool,
    pub json: bool,
}

impl Output {
    pub fn new(plain: bool, json: bool) -> Self {
        Self {
            color: !plain && !json && std::io::stdout().is_terminal(),
            json,
        }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn print_json<T: Serialize>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    }

    pub fn heading(&self, title: &str) {
        println!();
        println!("  {title}");
        println!("  {}", "-".repeat(50));
    }

    pub fn ok(&self, message: &str) {
        if self.color {
            println!("    {} {message}", "✓".green());
        } else {
            println!("    [OK]   {message}");
        }
    }

    pub fn fail(&self, message: &str) {
        if self.color {
            println!("    {} {}", "✗".red(), message.red());
        } else {
            println!("    [FAIL] {message}");
        }
    }

    pub fn field(&self, name: &str, value: &str) {
        println!("    {name:<14} {value}");
    }

    pub fn hint(&self, message: &str) {
        if self.color {
            println!("      {} {}", "-".dimmed(), message.dimmed());
        } else {
            println!("      - {message}");
        }
    }

    pub fn error(&self, err: &EnviaError) {
        if self.json {
            self.print_json(&serde_json::json!({
                "success": false,
                "error": err.code(),
                "message": err.to_string(),
            }));
        } else if self.color {
            eprintln!("{} {err}", "error:".red().bold());
        } else {
            eprintln!("error: {err}");
        }
    }
}
