//! Application context wiring storage, client, session and stores together.

use std::sync::Arc;

use tracing::info;

use crate::auth::{Session, SessionManager};
use crate::client::{ApiClient, Navigator};
use crate::config::AppConfig;
use crate::error::Result;
use crate::storage::{FileStorage, Storage};
use crate::store::{CartStore, ProductCatalog, SearchStore, ThemeStore};

/// Everything one storefront user session needs, constructed once at startup.
#[derive(Debug)]
pub struct Storefront {
    pub client: ApiClient,
    pub session: SessionManager,
    pub cart: CartStore,
    pub search: SearchStore,
    pub catalog: ProductCatalog,
    pub theme: ThemeStore,
    storage: Arc<dyn Storage>,
}

impl Storefront {
    /// Open the configured file storage and build the context on top of it.
    pub fn open(config: &AppConfig, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(config.storage.path.clone())?);
        Self::with_storage(config, storage, navigator)
    }

    /// Build the context over an existing storage backend.
    ///
    /// Stores load their persisted state here; the session is not restored
    /// until [`init`](Self::init).
    pub fn with_storage(
        config: &AppConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = ApiClient::from_config(&config.api, Arc::clone(&storage), navigator)?;
        Ok(Self {
            session: SessionManager::new(client.clone()),
            cart: CartStore::load(Arc::clone(&storage)),
            search: SearchStore::load(Arc::clone(&storage), config.search.history_cap),
            catalog: ProductCatalog::new(config.catalog.page_size),
            theme: ThemeStore::load(Arc::clone(&storage)),
            client,
            storage,
        })
    }

    /// Restore the session from storage. Never contacts the server.
    pub fn init(&self) -> Option<Session> {
        let session = self.session.restore();
        info!(
            signed_in = session.is_some(),
            cart_items = self.cart.total_items(),
            history = self.search.history().len(),
            theme = %self.theme.theme(),
            "Storefront ready"
        );
        session
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}
