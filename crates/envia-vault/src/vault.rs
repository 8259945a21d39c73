// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configuration vault: seals serializable credential structs into
//! `iv:ciphertext` tokens and opens them again.
//!
//! Key material is derived once from the process-wide secret and held only
//! in memory. Plaintext lives in zeroizing buffers and never reaches a log.

use envia_config::model::VaultConfig;
use envia_core::EnviaError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, SealingKeys};
use crate::kdf;
use crate::token::SealedToken;

pub struct ConfigVault {
    keys: SealingKeys,
    key_id: String,
}

impl std::fmt::Debug for ConfigVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigVault")
            .field("keys", &"[REDACTED]")
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl ConfigVault {
    /// Derive keys synchronously. Prefer [`ConfigVault::open`] from async code.
    pub fn new(secret: &SecretString, config: &VaultConfig) -> Result<Self, EnviaError> {
        if secret.expose_secret().is_empty() {
            return Err(EnviaError::Config("vault encryption key is empty".to_string()));
        }
        let material = kdf::derive_key_material(
            secret.expose_secret().as_bytes(),
            config.kdf_memory_cost,
            config.kdf_iterations,
            config.kdf_parallelism,
        )?;
        let keys = SealingKeys::from_material(&material);
        let key_id = keys.fingerprint();
        debug!(key_id = %key_id, "vault keys derived");
        Ok(Self { keys, key_id })
    }

    /// Derive keys on the blocking pool.
    pub async fn open(secret: SecretString, config: VaultConfig) -> Result<Self, EnviaError> {
        tokio::task::spawn_blocking(move || Self::new(&secret, &config))
            .await
            .map_err(|e| EnviaError::Internal(format!("key derivation task failed: {e}")))?
    }

    /// Build from the `[vault]` section. A missing key is a configuration error.
    pub async fn from_config(config: &VaultConfig) -> Result<Self, EnviaError> {
        let secret = config.encryption_key.clone().ok_or_else(|| {
            EnviaError::Config(
                "no vault encryption key configured (set ENCRYPTION_KEY or vault.encryption_key)"
                    .to_string(),
            )
        })?;
        Self::open(SecretString::from(secret), config.clone()).await
    }

    /// Public fingerprint of the active key. Accepted as the `kid` segment.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Seal `config` as JSON into a fresh `iv:ciphertext` token.
    pub fn encrypt<T: Serialize>(&self, config: &T) -> Result<String, EnviaError> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(config)
                .map_err(|e| EnviaError::Vault(format!("failed to serialize config: {e}")))?,
        );
        let (iv, body) = crypto::seal(&self.keys, &plaintext)?;
        Ok(SealedToken {
            key_id: None,
            iv,
            body,
        }
        .encode())
    }

    /// Open a token produced by [`ConfigVault::encrypt`].
    pub fn decrypt<T: DeserializeOwned>(&self, token: &str) -> Result<T, EnviaError> {
        let sealed = SealedToken::parse(token)?;
        if let Some(kid) = sealed.key_id
            && kid != self.key_id
        {
            debug!(token_key_id = %kid, "token sealed under a different key");
            return Err(EnviaError::Decryption);
        }
        let plaintext = crypto::open(&self.keys, &sealed.iv, &sealed.body)?;
        serde_json::from_slice(&plaintext).map_err(|_| EnviaError::Decryption)
    }
}

/// Mask a secret for display: first 4 and last 4 characters, or `****`
/// when the value is shorter than 10 characters.
pub fn mask_secret(value: &str) -> String {
    let count = value.chars().count();
    if count < 10 {
        return "****".to_string();
    }
    let prefix: String = value.chars().take(4).collect();
    let suffix: String = value.chars().skip(count - 4).collect();
    format!("{prefix}...{suffix}")
}
