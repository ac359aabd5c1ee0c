//! Wire types exchanged with the SnapBuy API.
//!
//! Field names follow the API's camelCase JSON.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Products
// =============================================================================

/// Product as listed by the API. Read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
    /// Base64 image payload, when the listing embeds it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl Product {
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// Product payload for the admin create form (sent as the `product` part).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub brand: Option<String>,
    pub price: f64,
    pub category: String,
    pub stock_quantity: u32,
    pub product_available: bool,
}

/// Sort direction for paginated listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Paging and sorting parameters for `/products/pagination-sorting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub sort_direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 12,
            sort_by: "name".into(),
            sort_direction: SortDirection::Asc,
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_pages: u32,
    pub total_elements: u64,
}

// =============================================================================
// Users & auth
// =============================================================================

/// Shipping/profile address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub country: String,
    pub phone_number: String,
}

/// Displayable user profile, also cached in storage under `user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_address: Option<Address>,
}

impl User {
    /// Whether any role names the admin role (`ADMIN` or `ROLE_ADMIN`).
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| {
            let r = r.trim();
            r.eq_ignore_ascii_case("ADMIN") || r.eq_ignore_ascii_case("ROLE_ADMIN")
        })
    }
}

/// Email/password credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: String,
}

/// Registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_address: Option<Address>,
}

/// Token pair returned by every sign-in flavour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of a `/auth/refreshToken` call.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub token: &'a str,
}

/// Refresh response. The access token is optional on the wire so that a
/// response without one is reported as a failed refresh, not a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// One-time password request, used for send, verify and resend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtpRequest {
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// One-time password response. A successful verify carries tokens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtpResponse {
    pub success: bool,
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl OtpResponse {
    /// The token pair, when the server issued one.
    #[must_use]
    pub fn tokens(&self) -> Option<JwtResponse> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() => Some(JwtResponse {
                access_token: access.clone(),
                refresh_token: refresh.clone(),
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Orders & payments
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub customer_name: String,
    pub email: String,
    pub items: Vec<OrderItemRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_name: String,
    pub quantity: u32,
    pub total_price: f64,
}

/// Read projection of a server-side order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: String,
    pub status: String,
    /// Server local time, no offset.
    #[serde(default)]
    pub order_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.items.iter().map(|i| i.total_price).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeRequest {
    pub product_name: String,
    pub quantity: u32,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StripeResponse {
    pub session_id: Option<String>,
    pub session_url: Option<String>,
    pub message: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
}

impl StripeResponse {
    /// The hosted checkout URL, whichever field the server filled.
    #[must_use]
    pub fn checkout_url(&self) -> Option<&str> {
        self.session_url.as_deref().or(self.url.as_deref())
    }
}
