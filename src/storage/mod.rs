//! Persistent client-side key/value storage.
//!
//! Every piece of state that outlives a single process (tokens, the cached
//! user profile, the cart, search history, theme) is a string value under a
//! well-known key. Values are independent: there is no schema versioning and
//! no cross-key transaction.
//!
//! - [`MemoryStorage`]: process-local, for tests and throwaway sessions
//! - [`FileStorage`]: a JSON object on disk, rewritten on every write

mod file;
mod memory;

use std::fmt;

use thiserror::Error;
use tracing::warn;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage keys shared by the client, the session manager and the stores.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USER: &str = "user";
    pub const THEME: &str = "theme";
    pub const CART: &str = "cart";
    pub const SEARCH_HISTORY: &str = "searchHistory";
}

/// Storage failure.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend refused the operation (quota exceeded, access denied).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A string key/value store.
pub trait Storage: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads a key, treating a failed read as absent.
pub fn read(storage: &dyn Storage, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Unable to read from storage");
            None
        }
    }
}

/// Removes both tokens. Failures are logged, never returned.
pub fn clear_tokens(storage: &dyn Storage) {
    for key in [keys::ACCESS_TOKEN, keys::REFRESH_TOKEN] {
        if let Err(e) = storage.remove(key) {
            warn!(key, error = %e, "Unable to clear auth token from storage");
        }
    }
}

/// Removes the tokens and the cached user profile.
pub fn clear_credentials(storage: &dyn Storage) {
    clear_tokens(storage);
    if let Err(e) = storage.remove(keys::USER) {
        warn!(error = %e, "Unable to clear cached user from storage");
    }
}
