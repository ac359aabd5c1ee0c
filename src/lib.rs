//! SnapBuy storefront client
//!
//! A headless client for the SnapBuy e-commerce API. It keeps the signed-in
//! session, cart, search history and theme in persistent storage and talks to
//! the backend through an HTTP client that refreshes expired access tokens
//! transparently.
//!
//! # Architecture
//!
//! - **Client**: reqwest-based API client with single-retry token refresh
//! - **Session**: restore, establish and clear the signed-in user
//! - **Stores**: cart, search, catalog and theme state persisted per key
//! - **CLI**: the `snapbuy` binary drives all of the above from a terminal
//!
//! # Modules
//!
//! - [`client`]: HTTP client and per-area API accessors
//! - [`auth`]: token claims and session lifecycle
//! - [`store`]: client-side state containers
//! - [`storage`]: key/value persistence backends
//! - [`app`]: the [`Storefront`] context tying it together

pub mod app;
pub mod auth;
pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

pub use app::Storefront;
pub use client::ApiClient;
pub use error::{ApiError, Result};
