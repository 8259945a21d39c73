// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Envia configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnviaConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// SQLite database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Circuit breaker settings shared by both delivery services.
    #[serde(default)]
    pub resilience: ResilienceConfig,

    /// WhatsApp Business API adapter settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// SMTP adapter settings.
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name shown in message footers and the email sender fallback.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "EnviaCodigo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("envia").join("envia.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("envia.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Credential vault configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Process-wide secret the sealing key is derived from. Usually supplied
    /// through `ENVIA_VAULT_ENCRYPTION_KEY` or `ENCRYPTION_KEY`.
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Argon2id memory cost in KiB.
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes.
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            encryption_key: None,
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("kdf_memory_cost", &self.kdf_memory_cost)
            .field("kdf_iterations", &self.kdf_iterations)
            .field("kdf_parallelism", &self.kdf_parallelism)
            .finish()
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResilienceConfig {
    /// Consecutive failures before a service breaker opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Milliseconds after the last failure before an open breaker resets.
    #[serde(default = "default_recovery_time_ms")]
    pub recovery_time_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_time_ms: default_recovery_time_ms(),
        }
    }
}

impl ResilienceConfig {
    pub fn recovery_time(&self) -> Duration {
        Duration::from_millis(self.recovery_time_ms)
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_recovery_time_ms() -> u64 {
    30_000
}

/// Retry policy for one outbound operation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicyConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    #[serde(default = "default_exponential_base")]
    pub exponential_base: f64,
    /// Per-attempt timeout.
    pub timeout_ms: u64,
}

impl RetryPolicyConfig {
    pub fn new(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64, timeout_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            exponential_base: default_exponential_base(),
            timeout_ms,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_exponential_base() -> f64 {
    2.0
}

/// WhatsApp Business API adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API base URL, including the version segment.
    #[serde(default = "default_graph_api_base_url")]
    pub api_base_url: String,

    /// Accepted access token prefixes for the format pre-check.
    #[serde(default = "default_token_prefixes")]
    pub token_prefixes: Vec<String>,

    /// Country calling code prepended to numbers given without one.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,

    /// Footer appended to every outbound message. `None` uses the built-in footer.
    #[serde(default)]
    pub message_footer: Option<String>,

    #[serde(default = "default_whatsapp_send_policy")]
    pub send: RetryPolicyConfig,

    #[serde(default = "default_whatsapp_test_policy")]
    pub test: RetryPolicyConfig,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_graph_api_base_url(),
            token_prefixes: default_token_prefixes(),
            default_country_code: default_country_code(),
            message_footer: None,
            send: default_whatsapp_send_policy(),
            test: default_whatsapp_test_policy(),
        }
    }
}

fn default_graph_api_base_url() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

fn default_token_prefixes() -> Vec<String> {
    vec!["EAAG".to_string()]
}

fn default_country_code() -> String {
    "55".to_string()
}

fn default_whatsapp_send_policy() -> RetryPolicyConfig {
    RetryPolicyConfig::new(3, 1000, 5000, 15_000)
}

fn default_whatsapp_test_policy() -> RetryPolicyConfig {
    RetryPolicyConfig::new(2, 1000, 3000, 10_000)
}

/// SMTP adapter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// TCP connect / greeting timeout handed to the SMTP transport.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Footer line appended to the text and HTML bodies. `None` uses the built-in footer.
    #[serde(default)]
    pub message_footer: Option<String>,

    #[serde(default = "default_email_send_policy")]
    pub send: RetryPolicyConfig,

    #[serde(default = "default_email_test_policy")]
    pub test: RetryPolicyConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            connection_timeout_ms: default_connection_timeout_ms(),
            message_footer: None,
            send: default_email_send_policy(),
            test: default_email_test_policy(),
        }
    }
}

impl EmailConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

fn default_connection_timeout_ms() -> u64 {
    10_000
}

fn default_email_send_policy() -> RetryPolicyConfig {
    RetryPolicyConfig::new(3, 2000, 8000, 20_000)
}

fn default_email_test_policy() -> RetryPolicyConfig {
    RetryPolicyConfig::new(2, 2000, 5000, 15_000)
}
