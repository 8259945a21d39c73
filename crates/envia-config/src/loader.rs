// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! `./envia.toml` > `~/.config/envia/envia.toml` > `/etc/envia/envia.toml`,
//! with `ENVIA_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::EnviaConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/envia/envia.toml";
pub const LOCAL_CONFIG_PATH: &str = "envia.toml";

/// Bare variable accepted for the vault secret, for deployments that predate
/// the prefixed name.
pub const LEGACY_KEY_ENV_VAR: &str = "ENCRYPTION_KEY";

/// Path of the per-user config file, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("envia").join("envia.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/envia/envia.toml`
/// 3. `~/.config/envia/envia.toml`
/// 4. `./envia.toml`
/// 5. `ENCRYPTION_KEY`
/// 6. `ENVIA_*` environment variables
pub fn load_config() -> Result<EnviaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<EnviaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EnviaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EnviaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EnviaConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_key_provider())
        .merge(env_provider())
        .extract()
}

/// The figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(EnviaConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(legacy_key_provider())
        .merge(env_provider())
}

fn legacy_key_provider() -> Env {
    Env::raw().filter_map(|key| {
        key.as_str()
            .eq_ignore_ascii_case(LEGACY_KEY_ENV_VAR)
            .then(|| "vault.encryption_key".into())
    })
}

/// Map `ENVIA_<SECTION>_<KEY>` onto `section.key`.
///
/// Uses `Env::map` rather than `Env::split("_")`: keys contain underscores,
/// so `ENVIA_VAULT_ENCRYPTION_KEY` must become `vault.encryption_key`.
/// Retry policies nest one level deeper (`ENVIA_WHATSAPP_SEND_MAX_ATTEMPTS`).
fn env_provider() -> Env {
    Env::prefixed("ENVIA_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    const NESTED: [&str; 4] = ["whatsapp_send_", "whatsapp_test_", "email_send_", "email_test_"];
    const SECTIONS: [&str; 6] = ["service_", "storage_", "vault_", "resilience_", "whatsapp_", "email_"];

    let key = key.to_ascii_lowercase();
    for prefix in NESTED {
        if let Some(rest) = key.strip_prefix(prefix) {
            let (section, policy) = prefix.trim_end_matches('_').split_once('_').unwrap_or((prefix, ""));
            return format!("{section}.{policy}.{rest}");
        }
    }
    for prefix in SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{}.{rest}", prefix.trim_end_matches('_'));
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_section_keys_with_underscores() {
        assert_eq!(map_env_key("vault_encryption_key"), "vault.encryption_key");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(
            map_env_key("resilience_recovery_time_ms"),
            "resilience.recovery_time_ms"
        );
        assert_eq!(map_env_key("whatsapp_api_base_url"), "whatsapp.api_base_url");
    }

    #[test]
    fn maps_nested_retry_policies() {
        assert_eq!(
            map_env_key("whatsapp_send_max_attempts"),
            "whatsapp.send.max_attempts"
        );
        assert_eq!(map_env_key("email_test_timeout_ms"), "email.test.timeout_ms");
    }

    #[test]
    fn unknown_section_passes_through() {
        assert_eq!(map_env_key("bogus"), "bogus");
    }
}
