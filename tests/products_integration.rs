mod common;

use std::sync::Arc;

use common::RefreshBehavior;
use serde_json::{Value, json};
use snapbuy_client::client::{Navigator, ProductImage, RecordingNavigator};
use snapbuy_client::storage::{MemoryStorage, Storage, keys};
use snapbuy_client::types::NewProduct;
use snapbuy_client::{ApiClient, ApiError};

fn client_for(base_url: &str, access: &str) -> (ApiClient, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(keys::ACCESS_TOKEN, access).unwrap();
    storage.set(keys::REFRESH_TOKEN, "r1").unwrap();
    let client = ApiClient::new(base_url, Arc::clone(&storage) as Arc<dyn Storage>)
        .unwrap()
        .with_navigator(Arc::new(RecordingNavigator::new()) as Arc<dyn Navigator>);
    (client, storage)
}

fn lamp() -> NewProduct {
    NewProduct {
        name: "Desk Lamp".into(),
        description: "Warm light".into(),
        brand: Some("Lumo".into()),
        price: 24.5,
        category: "Home".into(),
        stock_quantity: 8,
        product_available: true,
    }
}

fn png() -> ProductImage {
    ProductImage {
        data: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        content_type: "image/png".into(),
        file_name: "lamp.png".into(),
    }
}

#[tokio::test]
async fn test_create_product_sends_multipart_form() {
    let backend = common::spawn().await;
    backend.state.accept("good");
    let (client, _) = client_for(&backend.base_url, "good");

    let created = client.products().create(&lamp(), Some(&png())).await.unwrap();
    assert_eq!(created.id, 100);
    assert_eq!(created.name, "Desk Lamp");
    assert_eq!(created.stock_quantity, 8);

    let uploads = backend.state.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 1);
    let parts = &uploads[0].parts;
    assert_eq!(parts.len(), 2);

    assert_eq!(parts[0].name, "product");
    assert_eq!(parts[0].content_type.as_deref(), Some("application/json"));
    let product: Value = serde_json::from_slice(&parts[0].data).unwrap();
    assert_eq!(product["name"], json!("Desk Lamp"));
    assert_eq!(product["stockQuantity"], json!(8));

    assert_eq!(parts[1].name, "imageFile");
    assert_eq!(parts[1].content_type.as_deref(), Some("image/png"));
    assert_eq!(parts[1].file_name.as_deref(), Some("lamp.png"));
    assert_eq!(parts[1].data, png().data);
}

#[tokio::test]
async fn test_create_product_is_resent_intact_after_refresh() {
    let backend = common::spawn().await;
    backend.state.accept("fresh");
    backend.state.on_refresh(RefreshBehavior::Issue {
        access: "fresh".into(),
        refresh: None,
    });
    let (client, storage) = client_for(&backend.base_url, "stale");

    let created = client.products().create(&lamp(), Some(&png())).await.unwrap();
    assert_eq!(created.id, 100);
    assert_eq!(backend.state.refresh_calls(), 1);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("fresh"));

    let uploads = backend.state.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].authorization.as_deref(), Some("Bearer stale"));
    assert_eq!(uploads[1].authorization.as_deref(), Some("Bearer fresh"));
    assert_eq!(uploads[0].parts, uploads[1].parts);
    assert_eq!(uploads[1].parts[1].data, png().data);
}

#[tokio::test]
async fn test_invalid_product_is_never_sent() {
    let backend = common::spawn().await;
    backend.state.accept("good");
    let (client, _) = client_for(&backend.base_url, "good");

    let product = NewProduct {
        name: " ".into(),
        price: 0.0,
        ..lamp()
    };
    let err = client.products().create(&product, None).await.unwrap_err();
    let errors = match err {
        ApiError::Validation(errors) => errors,
        other => panic!("expected validation error, got {other:?}"),
    };
    assert!(errors.get("name").is_some());
    assert!(errors.get("price").is_some());
    assert!(backend.state.uploads.lock().unwrap().is_empty());
    assert_eq!(backend.state.protected_calls(), 0);
}

#[tokio::test]
async fn test_create_without_image_has_single_part() {
    let backend = common::spawn().await;
    backend.state.accept("good");
    let (client, _) = client_for(&backend.base_url, "good");

    client.products().create(&lamp(), None).await.unwrap();
    let uploads = backend.state.uploads.lock().unwrap().clone();
    assert_eq!(uploads[0].parts.len(), 1);
    assert_eq!(uploads[0].parts[0].name, "product");
}

#[tokio::test]
async fn test_delete_product() {
    let backend = common::spawn().await;
    backend.state.accept("good");
    let (client, _) = client_for(&backend.base_url, "good");

    client.products().delete(1).await.unwrap();
    let err = client.products().delete(99).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "API error (404): Product 99 not found");
}

#[tokio::test]
async fn test_generated_description_and_image() {
    let backend = common::spawn().await;
    backend.state.accept("good");
    let (client, _) = client_for(&backend.base_url, "good");

    let description = client
        .products()
        .generate_description("Desk Lamp", "Home")
        .await
        .unwrap();
    assert_eq!(description, "A fine Desk Lamp for every Home fan.");

    let image = client
        .products()
        .generate_image("Desk Lamp", "Home", "Warm light")
        .await
        .unwrap();
    assert_eq!(image.content_type, "image/webp");
    assert_eq!(image.data, b"RIFF".to_vec());
}
