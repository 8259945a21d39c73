// SPDX-FileCopyrightText: 2026 Envia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring: database, vault, credential store, breakers, adapters.

use std::sync::Arc;

use envia_config::EnviaConfig;
use envia_core::{EnviaError, ServiceType};
use envia_dispatch::Dispatcher;
use envia_email::{EmailAdapter, SmtpMailerFactory};
use envia_resilience::CircuitBreakerRegistry;
use envia_storage::Database;
use envia_vault::{ConfigVault, CredentialStore};
use envia_whatsapp::WhatsAppAdapter;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct App {
    pub db: Database,
    pub store: CredentialStore,
    pub breakers: CircuitBreakerRegistry,
    pub whatsapp: Arc<WhatsAppAdapter>,
    pub email: Arc<EmailAdapter>,
    pub dispatcher: Dispatcher,
}

impl App {
    pub async fn open(config: &EnviaConfig) -> Result<Self, EnviaError> {
        let vault = Arc::new(ConfigVault::from_config(&config.vault).await?);
        let db = Database::from_config(&config.storage).await?;
        let store = CredentialStore::new(db.clone(), vault.clone());
        let breakers = CircuitBreakerRegistry::from_config(&config.resilience);
        let service_name = &config.service.name;

        let whatsapp = Arc::new(WhatsAppAdapter::new(
            &config.whatsapp,
            service_name,
            Arc::new(store.clone()),
            breakers.get(ServiceType::Whatsapp),
        )?);
        let email = Arc::new(EmailAdapter::new(
            &config.email,
            service_name,
            Arc::new(store.clone()),
            breakers.get(ServiceType::Email),
            Arc::new(SmtpMailerFactory),
        ));
        let dispatcher = Dispatcher::new(db.clone(), whatsapp.clone(), email.clone());

        debug!(key_id = vault.key_id(), "envia initialized");
        Ok(Self {
            db,
            store,
            breakers,
            whatsapp,
            email,
            dispatcher,
        })
    }

    pub async fn close(self) {
        drop(self.dispatcher);
        if let Err(e) = self.db.close().await {
            warn!(error = %e, "database did not close cleanly");
        }
    }
}
