//! Session lifecycle: restore, establish, logout.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::claims::{TokenClaims, decode_unverified};
use super::profile_image::resolve_profile_image;
use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::storage::{self, Storage, keys};
use crate::types::{AuthRequest, JwtResponse, OtpRequest, OtpResponse, SignUpRequest, User};

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Builds the displayable user: token claims win for identity fields, the
/// fallback profile fills whatever the token leaves out.
fn merge_user(claims: &TokenClaims, fallback: &User) -> User {
    let roles = if claims.roles.is_empty() {
        fallback.roles.clone()
    } else {
        claims.roles.clone()
    };
    User {
        id: claims.id.filter(|id| *id != 0).unwrap_or(fallback.id),
        name: non_empty(claims.sub.as_deref()).unwrap_or_else(|| fallback.name.clone()),
        email: non_empty(claims.email.as_deref()).unwrap_or_else(|| fallback.email.clone()),
        roles,
        profile_image: resolve_profile_image([
            claims.profile_image.as_deref(),
            fallback.profile_image.as_deref(),
        ]),
        user_address: fallback.user_address.clone(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_owned)
}

/// Owns the signed-in state for one storage context.
///
/// Storage is the source of truth; the manager keeps an in-memory mirror for
/// the lifetime of the process.
#[derive(Debug)]
pub struct SessionManager {
    client: ApiClient,
    storage: Arc<dyn Storage>,
    current: RwLock<Option<Session>>,
}

impl SessionManager {
    /// Create a manager sharing the client's storage. Nothing is restored
    /// until [`restore`](Self::restore) is called.
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        let storage = Arc::clone(client.storage());
        Self {
            client,
            storage,
            current: RwLock::new(None),
        }
    }

    /// Rebuild the session from storage without contacting the server.
    ///
    /// An undecodable access token signs the user out silently: the token and
    /// cached profile are removed and `None` is returned.
    pub fn restore(&self) -> Option<Session> {
        let session = self.restore_from_storage();
        self.set_current(session.clone());
        session
    }

    fn restore_from_storage(&self) -> Option<Session> {
        let access_token = storage::read(self.storage.as_ref(), keys::ACCESS_TOKEN)?;

        let claims = match decode_unverified(&access_token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Failed to restore user from token, signing out");
                for key in [keys::ACCESS_TOKEN, keys::USER] {
                    if let Err(e) = self.storage.remove(key) {
                        warn!(key, error = %e, "Unable to remove corrupt session state");
                    }
                }
                return None;
            }
        };

        let cached = self.cached_user();
        let user = merge_user(&claims, &cached);
        debug!(user = %user.name, "Restored session from stored token");
        Some(Session {
            access_token,
            refresh_token: storage::read(self.storage.as_ref(), keys::REFRESH_TOKEN),
            user,
        })
    }

    /// The cached profile, or an empty one. A corrupt cache entry is dropped.
    fn cached_user(&self) -> User {
        let Some(raw) = storage::read(self.storage.as_ref(), keys::USER) else {
            return User::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable cached user profile");
            if let Err(e) = self.storage.remove(keys::USER) {
                warn!(error = %e, "Unable to remove cached user profile");
            }
            User::default()
        })
    }

    /// Persist a freshly issued token pair and derive the user from it.
    ///
    /// `fallback` supplies fields the token does not carry (the sign-in email,
    /// the sign-up form). Any failure clears the partial state.
    pub fn establish(&self, tokens: &JwtResponse, fallback: &User) -> Result<Session> {
        match self.try_establish(tokens, fallback) {
            Ok(session) => {
                info!(user = %session.user.name, "Signed in");
                self.set_current(Some(session.clone()));
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Could not establish session, clearing partial state");
                storage::clear_credentials(self.storage.as_ref());
                self.set_current(None);
                Err(e)
            }
        }
    }

    fn try_establish(&self, tokens: &JwtResponse, fallback: &User) -> Result<Session> {
        let claims = decode_unverified(&tokens.access_token)?;
        self.storage.set(keys::ACCESS_TOKEN, &tokens.access_token)?;
        self.storage.set(keys::REFRESH_TOKEN, &tokens.refresh_token)?;

        let user = merge_user(&claims, fallback);
        self.storage
            .set(keys::USER, &serde_json::to_string(&user)?)?;

        Ok(Session {
            access_token: tokens.access_token.clone(),
            refresh_token: Some(tokens.refresh_token.clone()),
            user,
        })
    }

    /// Email/password sign-in.
    pub async fn sign_in(&self, credentials: &AuthRequest) -> Result<Session> {
        let tokens = self.client.auth().sign_in(credentials).await?;
        let fallback = User {
            name: credentials.email.clone(),
            email: credentials.email.clone(),
            ..User::default()
        };
        self.establish(&tokens, &fallback)
    }

    /// Register a new account and sign in as it. Any existing session is
    /// dropped first so the new account starts clean.
    pub async fn sign_up(&self, form: &SignUpRequest) -> Result<Session> {
        self.logout();
        let tokens = self.client.auth().sign_up(form).await?;
        let fallback = User {
            name: form.name.clone(),
            email: form.email.clone(),
            profile_image: form.profile_image.clone(),
            user_address: form.user_address.clone(),
            ..User::default()
        };
        self.establish(&tokens, &fallback)
    }

    /// Sign in with a Google identity credential.
    pub async fn sign_in_with_google(&self, credential: &str) -> Result<Session> {
        let tokens = self.client.auth().google_sign_in(credential).await?;
        self.establish(&tokens, &User::default())
    }

    /// Finish the server-side OAuth2 flow from the callback URL.
    ///
    /// The callback carries `accessToken` and `refreshToken` query parameters,
    /// or `error` when the provider refused.
    pub fn complete_oauth_callback(&self, callback: &Url) -> Result<Session> {
        let mut access = None;
        let mut refresh = None;
        for (key, value) in callback.query_pairs() {
            match key.as_ref() {
                "error" => {
                    warn!(error = %value, "OAuth2 provider returned an error");
                    return Err(ApiError::OAuth(format!("login failed: {value}")));
                }
                "accessToken" if !value.is_empty() => access = Some(value.into_owned()),
                "refreshToken" if !value.is_empty() => refresh = Some(value.into_owned()),
                _ => {}
            }
        }
        let (Some(access_token), Some(refresh_token)) = (access, refresh) else {
            return Err(ApiError::OAuth("callback is missing tokens".into()));
        };
        self.establish(
            &JwtResponse {
                access_token,
                refresh_token,
            },
            &User::default(),
        )
    }

    /// Request a magic login link.
    pub async fn send_login_link(&self, email: &str) -> Result<String> {
        self.client.auth().send_ott(email).await
    }

    /// Redeem a magic-link token.
    pub async fn login_with_ott(&self, token: &str) -> Result<Session> {
        let tokens = self.client.auth().login_with_ott(token).await?;
        self.establish(&tokens, &User::default())
    }

    /// Verify a one-time password; signs in when the server issues tokens.
    ///
    /// Returns the server response alongside the session, if one was created.
    pub async fn verify_otp(&self, request: &OtpRequest) -> Result<(OtpResponse, Option<Session>)> {
        let response = self.client.auth().verify_otp(request).await?;
        let session = match response.tokens() {
            Some(tokens) if response.success => {
                let fallback = User {
                    email: request.email.clone(),
                    ..User::default()
                };
                Some(self.establish(&tokens, &fallback)?)
            }
            _ => None,
        };
        Ok((response, session))
    }

    /// Drop every stored credential. Safe to call when already signed out.
    pub fn logout(&self) {
        storage::clear_credentials(self.storage.as_ref());
        if self.take_current().is_some() {
            info!("Signed out");
        }
    }

    /// The current session, if storage still holds its access token.
    ///
    /// The client may clear storage on an unrecoverable refresh failure; the
    /// mirror follows it here.
    pub fn current(&self) -> Option<Session> {
        let Some(stored) = storage::read(self.storage.as_ref(), keys::ACCESS_TOKEN) else {
            self.set_current(None);
            return None;
        };
        let mut guard = self.current.write().ok()?;
        let session = guard.as_mut()?;
        session.access_token = stored;
        session.refresh_token = storage::read(self.storage.as_ref(), keys::REFRESH_TOKEN);
        Some(session.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    fn set_current(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.current.write() {
            *guard = session;
        }
    }

    fn take_current(&self) -> Option<Session> {
        self.current.write().ok().and_then(|mut g| g.take())
    }
}
