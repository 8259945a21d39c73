// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user credential store: vault tokens persisted in `api_settings`.

use std::sync::Arc;

use async_trait::async_trait;
use envia_core::{
    CredentialProvider, EmailCredentials, EnviaError, ServiceType, WhatsAppCredentials,
};
use envia_storage::queries::credentials;
use envia_storage::{CredentialRecord, Database};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::vault::{mask_secret, ConfigVault};

/// Display-safe view of a stored credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialSummary {
    pub service_type: ServiceType,
    pub identity: String,
    pub secret_preview: String,
    pub last_tested: Option<String>,
    pub updated_at: String,
}

#[derive(Clone)]
pub struct CredentialStore {
    db: Database,
    vault: Arc<ConfigVault>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("vault", &self.vault)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(db: Database, vault: Arc<ConfigVault>) -> Self {
        Self { db, vault }
    }

    pub async fn save_whatsapp(
        &self,
        user_id: &str,
        creds: &WhatsAppCredentials,
    ) -> Result<CredentialRecord, EnviaError> {
        if creds.access_token.trim().is_empty() || creds.phone_number_id.trim().is_empty() {
            return Err(EnviaError::Validation(
                "access token and phone number id are required".to_string(),
            ));
        }
        self.save(user_id, ServiceType::Whatsapp, creds).await
    }

    pub async fn save_email(
        &self,
        user_id: &str,
        creds: &EmailCredentials,
    ) -> Result<CredentialRecord, EnviaError> {
        self.save(user_id, ServiceType::Email, creds).await
    }

    async fn save<T: Serialize>(
        &self,
        user_id: &str,
        service: ServiceType,
        creds: &T,
    ) -> Result<CredentialRecord, EnviaError> {
        let token = self.vault.encrypt(creds)?;
        let record = credentials::upsert(&self.db, user_id, service, &token).await?;
        info!(user_id, service = %service, "credentials saved");
        Ok(record)
    }

    async fn load<T: DeserializeOwned>(
        &self,
        user_id: &str,
        service: ServiceType,
    ) -> Result<Option<T>, EnviaError> {
        let Some(record) = credentials::find_active(&self.db, user_id, service).await? else {
            return Ok(None);
        };
        match self.vault.decrypt(&record.encrypted_config) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(user_id, service = %service, "stored credentials could not be decrypted");
                Err(e)
            }
        }
    }

    /// Soft-delete the user's credentials for `service`.
    pub async fn deactivate(&self, user_id: &str, service: ServiceType) -> Result<bool, EnviaError> {
        let changed = credentials::deactivate(&self.db, user_id, service).await?;
        if changed {
            info!(user_id, service = %service, "credentials deactivated");
        }
        Ok(changed)
    }

    /// Active credentials exist and open with the current vault key.
    pub async fn is_configured(
        &self,
        user_id: &str,
        service: ServiceType,
    ) -> Result<bool, EnviaError> {
        let loaded = match service {
            ServiceType::Whatsapp => self
                .load::<WhatsAppCredentials>(user_id, service)
                .await
                .map(|c| c.is_some()),
            ServiceType::Email => self
                .load::<EmailCredentials>(user_id, service)
                .await
                .map(|c| c.is_some()),
        };
        match loaded {
            Err(EnviaError::Decryption) => Ok(false),
            other => other,
        }
    }

    /// Masked summaries of every active credential of the user.
    pub async fn list(&self, user_id: &str) -> Result<Vec<CredentialSummary>, EnviaError> {
        let records = credentials::list_active(&self.db, user_id).await?;
        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let (identity, secret_preview) = match record.service_type {
                ServiceType::Whatsapp => {
                    match self.vault.decrypt::<WhatsAppCredentials>(&record.encrypted_config) {
                        Ok(c) => (c.phone_number_id, mask_secret(&c.access_token)),
                        Err(_) => ("<unreadable>".to_string(), "****".to_string()),
                    }
                }
                ServiceType::Email => {
                    match self.vault.decrypt::<EmailCredentials>(&record.encrypted_config) {
                        Ok(c) => (
                            format!("{}@{}:{}", c.smtp_user, c.smtp_host, c.smtp_port),
                            mask_secret(&c.smtp_password),
                        ),
                        Err(_) => ("<unreadable>".to_string(), "****".to_string()),
                    }
                }
            };
            summaries.push(CredentialSummary {
                service_type: record.service_type,
                identity,
                secret_preview,
                last_tested: record.last_tested,
                updated_at: record.updated_at,
            });
        }
        Ok(summaries)
    }
}

#[async_trait]
impl CredentialProvider for CredentialStore {
    async fn whatsapp_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<WhatsAppCredentials>, EnviaError> {
        self.load(user_id, ServiceType::Whatsapp).await
    }

    async fn email_credentials(
        &self,
        user_id: &str,
    ) -> Result<Option<EmailCredentials>, EnviaError> {
        self.load(user_id, ServiceType::Email).await
    }

    async fn mark_tested(&self, user_id: &str, service: ServiceType) -> Result<(), EnviaError> {
        credentials::mark_tested(&self.db, user_id, service).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envia_config::model::VaultConfig;
    use secrecy::SecretString;

    fn vault(secret: &str) -> Arc<ConfigVault> {
        let config = VaultConfig {
            encryption_key: None,
            kdf_memory_cost: 8192,
            kdf_iterations: 1,
            kdf_parallelism: 1,
        };
        Arc::new(ConfigVault::new(&SecretString::from(secret.to_string()), &config).unwrap())
    }

    async fn store(secret: &str) -> (CredentialStore, Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("v.db").to_str().unwrap())
            .await
            .unwrap();
        (CredentialStore::new(db.clone(), vault(secret)), db, dir)
    }

    fn whatsapp() -> WhatsAppCredentials {
        WhatsAppCredentials {
            access_token: "EAAGlongaccesstoken".to_string(),
            phone_number_id: "10987654321".to_string(),
            webhook_url: None,
        }
    }

    #[tokio::test]
    async fn save_then_load() {
        let (store, db, _dir) = store("k").await;
        let record = store.save_whatsapp("u1", &whatsapp()).await.unwrap();
        assert!(record.is_active);
        assert!(!record.encrypted_config.contains("EAAG"));

        assert_eq!(store.whatsapp_credentials("u1").await.unwrap(), Some(whatsapp()));
        assert_eq!(store.whatsapp_credentials("u2").await.unwrap(), None);
        assert_eq!(store.email_credentials("u1").await.unwrap(), None);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn blank_whatsapp_fields_rejected() {
        let (store, _db, _dir) = store("k").await;
        let mut creds = whatsapp();
        creds.access_token = "  ".to_string();
        assert!(matches!(
            store.save_whatsapp("u1", &creds).await,
            Err(EnviaError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn deactivate_hides_credentials() {
        let (store, _db, _dir) = store("k").await;
        store.save_whatsapp("u1", &whatsapp()).await.unwrap();
        assert!(store.is_configured("u1", ServiceType::Whatsapp).await.unwrap());

        assert!(store.deactivate("u1", ServiceType::Whatsapp).await.unwrap());
        assert!(!store.deactivate("u1", ServiceType::Whatsapp).await.unwrap());
        assert!(!store.is_configured("u1", ServiceType::Whatsapp).await.unwrap());
        assert_eq!(store.whatsapp_credentials("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rotated_secret_surfaces_decryption_error() {
        let (store, db, _dir) = store("old").await;
        store.save_whatsapp("u1", &whatsapp()).await.unwrap();

        let rotated = CredentialStore::new(db, vault("new"));
        assert!(matches!(
            rotated.whatsapp_credentials("u1").await,
            Err(EnviaError::Decryption)
        ));
        assert!(!rotated.is_configured("u1", ServiceType::Whatsapp).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_masked() {
        let (store, _db, _dir) = store("k").await;
        store.save_whatsapp("u1", &whatsapp()).await.unwrap();
        store
            .save_email(
                "u1",
                &EmailCredentials {
                    smtp_host: "smtp.gmail.com".to_string(),
                    smtp_port: 587,
                    smtp_user: "ops".to_string(),
                    smtp_password: "app-specific-pass".to_string(),
                    from_email: "ops@example.com".to_string(),
                    from_name: None,
                    use_ssl: None,
                },
            )
            .await
            .unwrap();

        let list = store.list("u1").await.unwrap();
        assert_eq!(list.len(), 2);
        let email = list.iter().find(|s| s.service_type == ServiceType::Email).unwrap();
        assert_eq!(email.identity, "ops@smtp.gmail.com:587");
        assert_eq!(email.secret_preview, "app-...pass");
        let wa = list.iter().find(|s| s.service_type == ServiceType::Whatsapp).unwrap();
        assert_eq!(wa.secret_preview, "EAAG...oken");
    }

    #[tokio::test]
    async fn mark_tested_stamps_record() {
        let (store, db, _dir) = store("k").await;
        store.save_whatsapp("u1", &whatsapp()).await.unwrap();
        store.mark_tested("u1", ServiceType::Whatsapp).await.unwrap();
        let record = credentials::find_active(&db, "u1", ServiceType::Whatsapp)
            .await
            .unwrap()
            .unwrap();
        assert!(record.last_tested.is_some());
    }
}
