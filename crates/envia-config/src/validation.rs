// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation. Collects every problem instead of
//! failing on the first one.

use crate::diagnostic::ConfigError;
use crate::model::{EnviaConfig, RetryPolicyConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &EnviaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if let Some(key) = &config.vault.encryption_key
        && key.trim().is_empty()
    {
        fail("vault.encryption_key must not be blank when set".to_string());
    }
    if config.vault.kdf_memory_cost < 8192 {
        fail(format!(
            "vault.kdf_memory_cost must be at least 8192 (8 MiB), got {}",
            config.vault.kdf_memory_cost
        ));
    }
    if config.vault.kdf_iterations < 1 {
        fail("vault.kdf_iterations must be at least 1".to_string());
    }
    if config.vault.kdf_parallelism < 1 {
        fail("vault.kdf_parallelism must be at least 1".to_string());
    }

    if config.resilience.failure_threshold == 0 {
        fail("resilience.failure_threshold must be at least 1".to_string());
    }

    let base = config.whatsapp.api_base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        fail(format!(
            "whatsapp.api_base_url `{base}` must start with http:// or https://"
        ));
    }
    if config.whatsapp.token_prefixes.iter().any(|p| p.is_empty()) {
        fail("whatsapp.token_prefixes must not contain empty prefixes".to_string());
    }
    if config.whatsapp.default_country_code.is_empty()
        || !config
            .whatsapp
            .default_country_code
            .chars()
            .all(|c| c.is_ascii_digit())
    {
        fail(format!(
            "whatsapp.default_country_code `{}` must be digits only",
            config.whatsapp.default_country_code
        ));
    }

    for (name, policy) in [
        ("whatsapp.send", &config.whatsapp.send),
        ("whatsapp.test", &config.whatsapp.test),
        ("email.send", &config.email.send),
        ("email.test", &config.email.test),
    ] {
        validate_policy(name, policy, &mut fail);
    }

    if config.email.connection_timeout_ms == 0 {
        fail("email.connection_timeout_ms must be positive".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_policy(name: &str, policy: &RetryPolicyConfig, fail: &mut impl FnMut(String)) {
    if policy.max_attempts == 0 {
        fail(format!("{name}.max_attempts must be at least 1"));
    }
    if policy.max_delay_ms < policy.initial_delay_ms {
        fail(format!(
            "{name}.max_delay_ms ({}) must not be below initial_delay_ms ({})",
            policy.max_delay_ms, policy.initial_delay_ms
        ));
    }
    if !(policy.exponential_base >= 1.0) {
        fail(format!(
            "{name}.exponential_base must be at least 1.0, got {}",
            policy.exponential_base
        ));
    }
    if policy.timeout_ms == 0 {
        fail(format!("{name}.timeout_ms must be positive"));
    }
}
