//! Authenticated HTTP client for the SnapBuy API.
//!
//! [`ApiClient`] attaches the stored access token to every request and
//! recovers from exactly one failure class, access-token expiry: an HTTP 401
//! triggers a single refresh through `/auth/refreshToken` followed by a single
//! resend of the original request. Concurrent 401s share one refresh through
//! an in-flight guard; a request that finds the token already replaced while
//! it waited reuses the new token instead of refreshing again.
//!
//! Resource APIs hang off the client the same way for every resource:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use snapbuy_client::client::ApiClient;
//! use snapbuy_client::storage::MemoryStorage;
//!
//! # async fn example() -> snapbuy_client::Result<()> {
//! let client = ApiClient::new("http://localhost:8080/api", Arc::new(MemoryStorage::new()))?;
//! let products = client.products().list().await?;
//! let orders = client.orders().list().await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod chat;
mod navigator;
mod orders;
mod payments;
mod products;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub use auth::AuthApi;
pub use chat::ChatApi;
pub use navigator::{Navigator, RecordingNavigator, TracingNavigator};
pub use orders::OrdersApi;
pub use payments::PaymentsApi;
pub use products::{ProductImage, ProductsApi};

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::storage::{self, Storage, keys};
use crate::types::{RefreshResponse, RefreshTokenRequest};

/// Path of the token refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "auth/refreshToken";

/// Default sign-in entry point used for forced re-authentication.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Request payload.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// Multipart form, rebuilt from these parts on every send so a retry can
    /// resend it.
    Multipart(Vec<FormPart>),
}

/// One part of a multipart form.
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub data: Vec<u8>,
    pub mime: String,
    pub file_name: Option<String>,
}

impl FormPart {
    /// A JSON-typed part.
    pub fn json<T: Serialize>(name: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            data: serde_json::to_vec(value)?,
            mime: "application/json".into(),
            file_name: None,
        })
    }

    /// A file part.
    pub fn file(
        name: impl Into<String>,
        data: Vec<u8>,
        mime: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            mime: mime.into(),
            file_name: Some(file_name.into()),
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    /// Send without credentials and without the refresh-on-401 recovery.
    pub skip_auth: bool,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Public endpoint: no bearer token, 401s pass straight through.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

/// HTTP client for the SnapBuy API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    storage: Arc<dyn Storage>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    refresh_guard: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The API root (e.g., "http://localhost:8080/api")
    /// * `storage` - Where tokens are read from and written to
    pub fn new(base_url: impl AsRef<str>, storage: Arc<dyn Storage>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.as_ref())?,
            http: reqwest::Client::new(),
            storage,
            navigator: Arc::new(TracingNavigator),
            login_path: DEFAULT_LOGIN_PATH.into(),
            refresh_guard: Arc::new(Mutex::new(())),
        })
    }

    /// Create a client from configuration, honouring its timeout and login path.
    pub fn from_config(
        config: &ApiConfig,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::new(&config.base_url, storage)?
            .with_http_client(http)
            .with_navigator(navigator)
            .with_login_path(config.login_path.clone()))
    }

    /// Use a custom reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The storage this client reads credentials from.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the Auth API (sign-in, sign-up, OTT, OTP).
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    /// Access the Products API.
    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi { client: self }
    }

    /// Access the Orders API.
    pub fn orders(&self) -> OrdersApi<'_> {
        OrdersApi { client: self }
    }

    /// Access the Payments API.
    pub fn payments(&self) -> PaymentsApi<'_> {
        PaymentsApi { client: self }
    }

    /// Access the Chat API.
    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi { client: self }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request pipeline
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request with credentials attached.
    ///
    /// Returns the response when its status is a success. A 401 on an
    /// authenticated request is recovered at most once; every other error
    /// status comes back as [`ApiError::Api`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<reqwest::Response> {
        let token = if options.skip_auth {
            None
        } else {
            self.credential_for_send()?
        };

        let response = self
            .send(&method, path, &body, &options, token.as_deref())
            .await?;
        if options.skip_auth || response.status() != StatusCode::UNAUTHORIZED {
            return Self::check_status(response).await;
        }

        debug!(%method, path, "Received 401, attempting token refresh");
        let fresh = self.refresh_after_unauthorized(token.as_deref()).await?;

        // Exactly one resend; its outcome is final.
        let retried = self
            .send(&method, path, &body, &options, Some(&fresh))
            .await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(%method, path, "Request still unauthorized after token refresh");
        }
        Self::check_status(retried).await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let response = self
            .request(Method::GET, path, RequestBody::Empty, options)
            .await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T> {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        let response = self.request(Method::POST, path, body, options).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn text(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<String> {
        let response = self.request(method, path, body, options).await?;
        Ok(response.text().await?)
    }

    pub(crate) async fn bytes(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<(Vec<u8>, Option<String>)> {
        let response = self
            .request(method, path, RequestBody::Empty, options)
            .await?;
        let content_type = content_type(response.headers());
        Ok((response.bytes().await?.to_vec(), content_type))
    }

    /// Reads the token to attach. A refresh token without an access token is
    /// an inconsistent local session: it is cleared and the request is not sent.
    fn credential_for_send(&self) -> Result<Option<String>> {
        if let Some(token) = storage::read(self.storage.as_ref(), keys::ACCESS_TOKEN) {
            return Ok(Some(token));
        }
        if storage::read(self.storage.as_ref(), keys::REFRESH_TOKEN).is_some() {
            warn!("Refresh token present without access token, clearing local session");
            storage::clear_tokens(self.storage.as_ref());
            self.navigator.redirect(&self.login_path);
            return Err(ApiError::SessionExpired);
        }
        Ok(None)
    }

    /// Obtains a token to resend with after a 401 on a request sent with `sent`.
    async fn refresh_after_unauthorized(&self, sent: Option<&str>) -> Result<String> {
        let _guard = self.refresh_guard.lock().await;

        // Another request may have refreshed, or expired the session, while
        // this one waited.
        match storage::read(self.storage.as_ref(), keys::ACCESS_TOKEN) {
            Some(current) if sent != Some(current.as_str()) => {
                debug!("Access token already refreshed by a concurrent request");
                return Ok(current);
            }
            None if sent.is_some() => {
                debug!("Session already expired by a concurrent request");
                return Err(ApiError::SessionExpired);
            }
            _ => {}
        }

        let Some(refresh_token) = storage::read(self.storage.as_ref(), keys::REFRESH_TOKEN) else {
            warn!("No refresh token available");
            self.expire_session();
            return Err(ApiError::SessionExpired);
        };

        let refreshed = match self.call_refresh(&refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.expire_session();
                return Err(ApiError::SessionExpired);
            }
        };

        let Some(access_token) = refreshed.access_token.filter(|t| !t.is_empty()) else {
            warn!("Token refresh response carried no access token");
            self.expire_session();
            return Err(ApiError::SessionExpired);
        };

        if let Err(e) = self.storage.set(keys::ACCESS_TOKEN, &access_token) {
            warn!(error = %e, "Unable to persist refreshed access token");
            self.expire_session();
            return Err(ApiError::Storage(e));
        }
        if let Some(rotated) = refreshed.refresh_token.filter(|t| !t.is_empty()) {
            if let Err(e) = self.storage.set(keys::REFRESH_TOKEN, &rotated) {
                warn!(error = %e, "Unable to persist rotated refresh token");
            }
        }

        info!("Access token refreshed");
        Ok(access_token)
    }

    async fn call_refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH)?)
            .json(&RefreshTokenRequest {
                token: refresh_token,
            })
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Drops every stored credential and sends the user to sign in.
    fn expire_session(&self) {
        storage::clear_credentials(self.storage.as_ref());
        self.navigator.redirect(&self.login_path);
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: &RequestBody,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut builder = self.http.request(method.clone(), self.url(path)?);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        debug!(%method, path, authenticated = token.is_some(), "Sending request");
        Ok(builder.send().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

/// Makes `base` a directory URL so relative joins keep its path.
fn normalize_base_url(base: &str) -> Result<Url> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_form(parts: &[FormPart]) -> Result<Form> {
    let mut form = Form::new();
    for part in parts {
        let mut p = Part::bytes(part.data.clone()).mime_str(&part.mime)?;
        if let Some(file_name) = &part.file_name {
            p = p.file_name(file_name.clone());
        }
        form = form.part(part.name.clone(), p);
    }
    Ok(form)
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Extracts a human-readable message from an error body.
///
/// The API reports errors as `{ status, error, message, path }`; plain-text
/// bodies are passed through.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error"] {
            if let Some(msg) = value.get(field).and_then(|v| v.as_str()) {
                if !msg.trim().is_empty() {
                    return msg.to_owned();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".into()
    } else {
        trimmed.to_owned()
    }
}
