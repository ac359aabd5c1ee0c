//! In-process SnapBuy backend for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

/// What `/auth/refreshToken` does when called.
#[derive(Debug, Clone)]
pub enum RefreshBehavior {
    Issue {
        access: String,
        refresh: Option<String>,
    },
    Fail(StatusCode),
    MissingToken,
}

#[derive(Debug)]
pub struct MockState {
    /// Bearer token protected routes accept.
    pub valid_token: Mutex<String>,
    pub refresh: Mutex<RefreshBehavior>,
    pub refresh_delay: Mutex<Duration>,
    pub refresh_calls: AtomicUsize,
    pub protected_calls: AtomicUsize,
    pub last_refresh_body: Mutex<Option<Value>>,
    pub orders: Mutex<Vec<Value>>,
    /// Every multipart create received, authorized or not.
    pub uploads: Mutex<Vec<Upload>>,
}

/// One part of a received multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPart {
    pub name: String,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    /// Bearer token the form was sent with.
    pub authorization: Option<String>,
    pub parts: Vec<UploadPart>,
}

impl MockState {
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_calls(&self) -> usize {
        self.protected_calls.load(Ordering::SeqCst)
    }

    pub fn accept(&self, token: &str) {
        *self.valid_token.lock().unwrap() = token.to_owned();
    }

    pub fn on_refresh(&self, behavior: RefreshBehavior) {
        *self.refresh.lock().unwrap() = behavior;
    }

    pub fn delay_refresh(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }
}

pub struct MockBackend {
    /// API root, e.g. `http://127.0.0.1:PORT/api`.
    pub base_url: String,
    pub state: Arc<MockState>,
}

/// Mint an unsigned-looking but well-formed JWT for `sub`.
pub fn jwt(sub: &str, email: &str) -> String {
    let claims = json!({
        "sub": sub,
        "email": email,
        "id": 42,
        "roles": ["ROLE_USER"],
        "exp": 4_102_444_800_u64,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test-secret")).unwrap()
}

pub fn products() -> Vec<Value> {
    vec![
        json!({ "id": 1, "name": "Phone X", "description": "A phone", "price": 499.0,
                "category": "Phones", "brand": "Acme", "stockQuantity": 3 }),
        json!({ "id": 2, "name": "Laptop Pro", "description": "A laptop", "price": 1299.5,
                "category": "Laptops", "brand": "Acme", "stockQuantity": 1 }),
        json!({ "id": 3, "name": "Phone Case", "description": "", "price": 9.99,
                "category": "Accessories", "stockQuantity": 0 }),
    ]
}

pub async fn spawn() -> MockBackend {
    let state = Arc::new(MockState {
        valid_token: Mutex::new(String::new()),
        refresh: Mutex::new(RefreshBehavior::Fail(StatusCode::FORBIDDEN)),
        refresh_delay: Mutex::new(Duration::ZERO),
        refresh_calls: AtomicUsize::new(0),
        protected_calls: AtomicUsize::new(0),
        last_refresh_body: Mutex::new(None),
        orders: Mutex::new(Vec::new()),
        uploads: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/api/auth/signIn", post(sign_in))
        .route("/api/auth/refreshToken", post(refresh_token))
        .route("/api/otp/verify", post(verify_otp))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/search", get(search_products))
        .route("/api/products/pagination-sorting", get(page_products))
        .route("/api/products/generate-description", post(generate_description))
        .route("/api/products/generate-image", post(generate_image))
        .route("/api/products/{id}", get(get_product).delete(delete_product))
        .route("/api/orders/place", post(place_order))
        .route("/api/orders/allOrders", get(list_orders))
        .route("/api/chat/ask", get(chat))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{addr}/api"),
        state,
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "status": 401, "error": "Unauthorized", "message": "JWT expired" })),
    )
        .into_response()
}

/// Counts the call and checks the bearer token.
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    state.protected_calls.fetch_add(1, Ordering::SeqCst);
    let expected = format!("Bearer {}", state.valid_token.lock().unwrap());
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(got) if got == expected => Ok(()),
        _ => Err(unauthorized()),
    }
}

async fn sign_in(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    if body["password"] != "secret1" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Bad credentials" })),
        )
            .into_response();
    }
    let access = jwt(email.split('@').next().unwrap_or_default(), &email);
    state.accept(&access);
    Json(json!({ "accessToken": access, "refreshToken": "refresh-1" })).into_response()
}

async fn refresh_token(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_refresh_body.lock().unwrap() = Some(body);

    let delay = *state.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let behavior = state.refresh.lock().unwrap().clone();
    match behavior {
        RefreshBehavior::Issue { access, refresh } => {
            Json(json!({ "accessToken": access, "refreshToken": refresh })).into_response()
        }
        RefreshBehavior::Fail(status) => {
            (status, Json(json!({ "message": "Refresh token expired" }))).into_response()
        }
        RefreshBehavior::MissingToken => Json(json!({})).into_response(),
    }
}

async fn verify_otp(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if body["otp"] != "123456" {
        return Json(json!({ "success": false, "message": "Invalid OTP" })).into_response();
    }
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    let access = jwt("otp-user", &email);
    state.accept(&access);
    Json(json!({
        "success": true,
        "message": "Verified",
        "accessToken": access,
        "refreshToken": "refresh-otp",
    }))
    .into_response()
}

async fn list_products(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    Json(products()).into_response()
}

async fn search_products(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let keyword = params
        .get("keyword")
        .map(|k| k.to_lowercase())
        .unwrap_or_default();
    let hits: Vec<Value> = products()
        .into_iter()
        .filter(|p| {
            p["name"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(&keyword))
        })
        .collect();
    Json(hits).into_response()
}

async fn page_products(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let size: usize = params.get("size").and_then(|s| s.parse().ok()).unwrap_or(12);
    let mut all = products();
    if params.get("sortDirection").map(String::as_str) == Some("desc") {
        all.reverse();
    }
    let total = all.len();
    let content: Vec<Value> = all.into_iter().skip(page * size).take(size).collect();
    Json(json!({
        "content": content,
        "totalPages": total.div_ceil(size),
        "totalElements": total,
    }))
    .into_response()
}

async fn get_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    match products().into_iter().find(|p| p["id"] == id) {
        Some(p) => Json(p).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Product {id} not found") })),
        )
            .into_response(),
    }
}

async fn create_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    // Read the whole form before answering, even when rejecting it.
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let file_name = field.file_name().map(str::to_owned);
        let data = field.bytes().await.unwrap().to_vec();
        parts.push(UploadPart {
            name,
            content_type,
            file_name,
            data,
        });
    }
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state.uploads.lock().unwrap().push(Upload {
        authorization,
        parts: parts.clone(),
    });

    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let Some(product) = parts.iter().find(|p| p.name == "product") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Missing product part" })),
        )
            .into_response();
    };
    let mut created: Value = serde_json::from_slice(&product.data).unwrap();
    created["id"] = json!(100);
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn delete_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if products().iter().any(|p| p["id"] == id) {
        "Deleted".into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("Product {id} not found") })),
        )
            .into_response()
    }
}

async fn generate_description(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    format!(
        "A fine {} for every {} fan.",
        params.get("name").cloned().unwrap_or_default(),
        params.get("category").cloned().unwrap_or_default()
    )
    .into_response()
}

async fn generate_image(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    (
        [(header::CONTENT_TYPE, "image/webp")],
        vec![b'R', b'I', b'F', b'F'],
    )
        .into_response()
}

async fn place_order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if body["email"].as_str().is_some_and(|e| e.starts_with("reject")) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Insufficient stock" })),
        )
            .into_response();
    }
    let catalog = products();
    let items: Vec<Value> = body["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .map(|item| {
            let product = catalog
                .iter()
                .find(|p| p["id"] == item["productId"])
                .cloned()
                .unwrap_or_default();
            let qty = item["quantity"].as_f64().unwrap_or_default();
            json!({
                "productName": product["name"],
                "quantity": item["quantity"],
                "totalPrice": product["price"].as_f64().unwrap_or_default() * qty,
            })
        })
        .collect();
    let mut orders = state.orders.lock().unwrap();
    let order = json!({
        "orderId": format!("ORD{}", orders.len() + 1),
        "customerName": body["customerName"],
        "email": body["email"],
        "status": "PLACED",
        "orderDate": "2026-01-15T10:30:00",
        "items": items,
    });
    orders.push(order.clone());
    Json(order).into_response()
}

async fn list_orders(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let orders = state.orders.lock().unwrap().clone();
    Json(orders).into_response()
}

async fn chat(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    format!(
        "You asked: {}",
        params.get("message").cloned().unwrap_or_default()
    )
    .into_response()
}
