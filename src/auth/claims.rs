//! Unverified access-token claims.
//!
//! The client never holds the signing key. Claims decoded here are a local
//! display hint (who is signed in, which menu to show) and must never back an
//! authorization decision; the server re-checks every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Claims embedded in a SnapBuy access token.
///
/// A claim of an unexpected type reads as absent instead of failing the
/// whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenClaims {
    /// Username (the API puts the display name or email here).
    #[serde(deserialize_with = "string_claim")]
    pub sub: Option<String>,
    #[serde(deserialize_with = "string_claim")]
    pub email: Option<String>,
    #[serde(deserialize_with = "integer_claim")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "roles_claim")]
    pub roles: Vec<String>,
    #[serde(deserialize_with = "string_claim")]
    pub profile_image: Option<String>,
    #[serde(deserialize_with = "integer_claim")]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Whether `exp` lies in the past. Tokens without `exp` never expire locally.
    #[must_use]
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_unix)
    }
}

/// Decode the payload of a JWT without verifying its signature.
///
/// Fails with [`ApiError::InvalidToken`] when the token is not three
/// dot-separated segments, the header is not a JWT header, or the payload is
/// not a JSON object.
pub fn decode_unverified(token: &str) -> Result<TokenClaims> {
    let mut segments = token.trim().split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ApiError::InvalidToken("expected three segments".into()));
    };

    jsonwebtoken::decode_header(token.trim())
        .map_err(|e| ApiError::InvalidToken(format!("header: {e}")))?;

    let raw = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ApiError::InvalidToken(format!("payload encoding: {e}")))?;
    let payload: Value = serde_json::from_slice(&raw)
        .map_err(|e| ApiError::InvalidToken(format!("payload: {e}")))?;
    if !payload.is_object() {
        return Err(ApiError::InvalidToken("payload is not a JSON object".into()));
    }
    serde_json::from_value(payload).map_err(|e| ApiError::InvalidToken(format!("payload: {e}")))
}

/// Accepts `roles` as a list, a single string, or a comma-separated string.
/// Non-string list entries are skipped.
fn roles_claim<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(roles) => roles
            .into_iter()
            .filter_map(|r| match r {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    })
}

fn string_claim<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Integers, or strings holding one.
fn integer_claim<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
