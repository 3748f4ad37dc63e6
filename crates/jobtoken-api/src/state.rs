//! Application state.

use std::sync::Arc;

use jobtoken_mail::MailClient;
use jobtoken_store::{
    ApplicationRepository, JobRepository, ProfileRepository, StoreClient, TransactionRepository,
    WalletRepository,
};

use crate::config::ApiConfig;
use crate::services::{Notifier, WalletService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<StoreClient>,
    pub wallet_service: WalletService,
    pub notifier: Notifier,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store = StoreClient::from_env()?;
        let mail = MailClient::from_env()?;
        Ok(Self::from_parts(config, store, mail))
    }

    /// Assemble state from already-built clients.
    pub fn from_parts(config: ApiConfig, store: StoreClient, mail: MailClient) -> Self {
        let store = Arc::new(store);
        let wallet_service = WalletService::new(Arc::clone(&store), config.topup_delay);
        let notifier = Notifier::new(Arc::clone(&store), Arc::new(mail));

        Self {
            config,
            store,
            wallet_service,
            notifier,
        }
    }

    pub fn profiles(&self) -> ProfileRepository {
        ProfileRepository::new(StoreClient::clone(&self.store))
    }

    pub fn wallets(&self) -> WalletRepository {
        WalletRepository::new(StoreClient::clone(&self.store))
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(StoreClient::clone(&self.store))
    }

    pub fn applications(&self) -> ApplicationRepository {
        ApplicationRepository::new(StoreClient::clone(&self.store))
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(StoreClient::clone(&self.store))
    }
}
