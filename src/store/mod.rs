//! Client-side state containers.
//!
//! Each store is an explicitly constructed value that owns its slice of
//! state and writes it back to [`Storage`](crate::storage::Storage) after
//! every mutation. Nothing here is global.
//!
//! - [`cart::CartStore`]: products selected for purchase
//! - [`search::SearchStore`]: search results and recent-search history
//! - [`catalog::ProductCatalog`]: the current page of the product listing
//! - [`theme::ThemeStore`]: colour scheme preference

pub mod cart;
pub mod catalog;
pub mod search;
pub mod theme;

pub use cart::{CartError, CartItem, CartStore};
pub use catalog::ProductCatalog;
pub use search::{SearchHistoryEntry, SearchStore, Suggestion, SuggestionKind};
pub use theme::{Theme, ThemeStore};
