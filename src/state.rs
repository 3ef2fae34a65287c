use std::sync::Arc;

use crate::auth::token::TokenSigner;
use crate::config::Config;
use crate::error::Result;
use crate::store::postgres::PostgresStore;
use crate::store::UserStore;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The user document store.
    pub store: Arc<dyn UserStore>,
    /// The session token signer.
    pub tokens: TokenSigner,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates a new `AppState` backed by the PostgreSQL store.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = PostgresStore::connect(&config.database_url).await?;
        tracing::info!("✅ PostgreSQL document store initialized");

        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Creates an `AppState` over an arbitrary store backend.
    pub fn with_store(store: Arc<dyn UserStore>, config: &Config) -> Self {
        AppState {
            store,
            tokens: TokenSigner::new(config),
            config: config.clone(),
        }
    }
}
