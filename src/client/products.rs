use std::path::Path;

use reqwest::Method;
use tracing::debug;

use super::{ApiClient, FormPart, RequestBody, RequestOptions};
use crate::error::Result;
use crate::types::{NewProduct, Page, PageRequest, Product};
use crate::validation::validate_product;

/// Binary image payload with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    pub data: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl ProductImage {
    /// Read an image file, guessing its content type from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_owned();
        let file_name = path
            .file_name()
            .map_or_else(|| "image".into(), |n| n.to_string_lossy().into_owned());
        Ok(Self {
            data,
            content_type,
            file_name,
        })
    }

    /// File extension matching the content type, if known.
    #[must_use]
    pub fn extension(&self) -> Option<&'static str> {
        mime_guess::get_mime_extensions_str(&self.content_type)
            .and_then(|exts| exts.first().copied())
    }
}

/// Products API client.
#[derive(Debug)]
pub struct ProductsApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl ProductsApi<'_> {
    /// List all products.
    pub async fn list(&self) -> Result<Vec<Product>> {
        self.client.get_json("products", RequestOptions::new()).await
    }

    /// Get a product by ID.
    pub async fn get(&self, id: i64) -> Result<Product> {
        self.client
            .get_json(&format!("products/{id}"), RequestOptions::new())
            .await
    }

    /// Keyword search over names, descriptions, brands and categories.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Product>> {
        self.client
            .get_json(
                "products/search",
                RequestOptions::new().query("keyword", keyword),
            )
            .await
    }

    /// One sorted page of products.
    pub async fn page(&self, request: &PageRequest) -> Result<Page<Product>> {
        self.client
            .get_json(
                "products/pagination-sorting",
                RequestOptions::new()
                    .query("page", request.page)
                    .query("size", request.size)
                    .query("sortBy", &request.sort_by)
                    .query("sortDirection", request.sort_direction.as_str()),
            )
            .await
    }

    /// Create a product, optionally with an image.
    ///
    /// The form is validated first; an invalid one is never sent.
    pub async fn create(&self, product: &NewProduct, image: Option<&ProductImage>) -> Result<Product> {
        validate_product(product)?;
        let mut parts = vec![FormPart::json("product", product)?];
        if let Some(image) = image {
            parts.push(FormPart::file(
                "imageFile",
                image.data.clone(),
                image.content_type.clone(),
                image.file_name.clone(),
            ));
        }
        debug!(name = %product.name, with_image = image.is_some(), "Creating product");
        let response = self
            .client
            .request(
                Method::POST,
                "products",
                RequestBody::Multipart(parts),
                RequestOptions::new(),
            )
            .await?;
        Ok(response.json().await?)
    }

    /// Delete a product.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client
            .request(
                Method::DELETE,
                &format!("products/{id}"),
                RequestBody::Empty,
                RequestOptions::new(),
            )
            .await?;
        Ok(())
    }

    /// Download a product's image.
    pub async fn image(&self, id: i64) -> Result<ProductImage> {
        let (data, content_type) = self
            .client
            .bytes(
                Method::GET,
                &format!("products/{id}/image"),
                RequestOptions::new(),
            )
            .await?;
        Ok(ProductImage {
            data,
            content_type: content_type.unwrap_or_else(|| "image/jpeg".into()),
            file_name: format!("product-{id}"),
        })
    }

    /// Ask the server to draft a description for a product.
    pub async fn generate_description(&self, name: &str, category: &str) -> Result<String> {
        self.client
            .text(
                Method::POST,
                "products/generate-description",
                RequestBody::Json(serde_json::json!({})),
                RequestOptions::new()
                    .query("name", name)
                    .query("category", category),
            )
            .await
    }

    /// Ask the server to generate a product image.
    pub async fn generate_image(
        &self,
        name: &str,
        category: &str,
        description: &str,
    ) -> Result<ProductImage> {
        let (data, content_type) = self
            .client
            .bytes(
                Method::POST,
                "products/generate-image",
                RequestOptions::new()
                    .query("name", name)
                    .query("category", category)
                    .query("description", description),
            )
            .await?;
        Ok(ProductImage {
            data,
            content_type: content_type.unwrap_or_else(|| "image/png".into()),
            file_name: "generated".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_from_path_guesses_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lamp.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let image = ProductImage::from_path(&path).unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.file_name, "lamp.png");
        assert_eq!(image.data.len(), 4);
        assert_eq!(image.extension(), Some("png"));
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.zzz");
        std::fs::write(&path, b"x").unwrap();
        let image = ProductImage::from_path(&path).unwrap();
        assert_eq!(image.content_type, "application/octet-stream");
    }
}
