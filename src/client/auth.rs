use reqwest::Method;
use serde_json::json;
use url::Url;

use super::{ApiClient, RequestBody, RequestOptions};
use crate::error::Result;
use crate::types::{AuthRequest, JwtResponse, OtpRequest, OtpResponse, SignUpRequest};

/// Server-hosted Google authorization endpoint, relative to the API root's host.
const GOOGLE_AUTHORIZATION_PATH: &str = "/oauth2/authorization/google";

/// Auth API client.
///
/// Every endpoint here is public: requests go out without a bearer token and
/// a 401 (bad credentials, expired code) is returned as-is instead of
/// triggering a token refresh.
#[derive(Debug)]
pub struct AuthApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl AuthApi<'_> {
    /// Exchange email and password for a token pair.
    pub async fn sign_in(&self, credentials: &AuthRequest) -> Result<JwtResponse> {
        self.client
            .post_json("auth/signIn", credentials, RequestOptions::new().anonymous())
            .await
    }

    /// Register and receive a token pair.
    pub async fn sign_up(&self, form: &SignUpRequest) -> Result<JwtResponse> {
        self.client
            .post_json("auth/signUp", form, RequestOptions::new().anonymous())
            .await
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh_token(&self, token: &str) -> Result<JwtResponse> {
        self.client
            .post_json(
                "auth/refreshToken",
                &json!({ "token": token }),
                RequestOptions::new().anonymous(),
            )
            .await
    }

    /// Exchange a Google identity credential for a token pair.
    pub async fn google_sign_in(&self, credential: &str) -> Result<JwtResponse> {
        self.client
            .post_json(
                "auth/google",
                &json!({ "credential": credential }),
                RequestOptions::new().anonymous(),
            )
            .await
    }

    /// Where to send the browser to start the server-side Google OAuth2 flow.
    ///
    /// The flow ends on the client's callback route with `accessToken` and
    /// `refreshToken` query parameters.
    pub fn google_authorization_url(&self) -> Result<Url> {
        Ok(self.client.base_url().join(GOOGLE_AUTHORIZATION_PATH)?)
    }

    /// Email a one-time login link.
    pub async fn send_ott(&self, email: &str) -> Result<String> {
        self.client
            .text(
                Method::POST,
                "ott/sent",
                RequestBody::Empty,
                RequestOptions::new().anonymous().query("email", email),
            )
            .await
    }

    /// Redeem a one-time login token.
    pub async fn login_with_ott(&self, token: &str) -> Result<JwtResponse> {
        let response = self
            .client
            .request(
                Method::POST,
                "ott/login",
                RequestBody::Empty,
                RequestOptions::new().anonymous().query("token", token),
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Send a one-time password to the given phone/email.
    pub async fn send_otp(&self, request: &OtpRequest) -> Result<OtpResponse> {
        self.otp("otp/send", request).await
    }

    /// Verify a one-time password. A successful response carries tokens.
    pub async fn verify_otp(&self, request: &OtpRequest) -> Result<OtpResponse> {
        self.otp("otp/verify", request).await
    }

    /// Resend a one-time password.
    pub async fn resend_otp(&self, request: &OtpRequest) -> Result<OtpResponse> {
        self.otp("otp/resend", request).await
    }

    async fn otp(&self, path: &str, request: &OtpRequest) -> Result<OtpResponse> {
        self.client
            .post_json(path, request, RequestOptions::new().anonymous())
            .await
    }
}
