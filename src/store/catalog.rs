//! Paginated product listing cache.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{PageRequest, Product, SortDirection};

/// The most recently fetched page of products plus the paging state used to
/// fetch it.
#[derive(Debug, Default)]
pub struct ProductCatalog {
    request: PageRequest,
    products: Vec<Product>,
    total_pages: u32,
    total_elements: u64,
}

impl ProductCatalog {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            request: PageRequest {
                size: page_size.max(1),
                ..PageRequest::default()
            },
            ..Self::default()
        }
    }

    /// Change the sort order. Takes effect on the next load, from page 0.
    pub fn set_sort(&mut self, sort_by: impl Into<String>, direction: SortDirection) {
        self.request.sort_by = sort_by.into();
        self.request.sort_direction = direction;
        self.request.page = 0;
    }

    /// Fetch `page` and replace the cached products with it.
    pub async fn load_page(&mut self, client: &ApiClient, page: u32) -> Result<&[Product]> {
        let request = PageRequest {
            page,
            ..self.request.clone()
        };
        let fetched = client.products().page(&request).await?;
        debug!(
            page,
            items = fetched.content.len(),
            total_pages = fetched.total_pages,
            "Loaded product page"
        );
        self.request = request;
        self.products = fetched.content;
        self.total_pages = fetched.total_pages;
        self.total_elements = fetched.total_elements;
        Ok(&self.products)
    }

    /// Reload the current page.
    pub async fn refresh(&mut self, client: &ApiClient) -> Result<&[Product]> {
        self.load_page(client, self.request.page).await
    }

    /// Load the following page; stays put on the last page.
    pub async fn next_page(&mut self, client: &ApiClient) -> Result<&[Product]> {
        let next = if self.has_next() {
            self.request.page.saturating_add(1)
        } else {
            self.request.page
        };
        self.load_page(client, next).await
    }

    /// Load the preceding page; stays put on the first page.
    pub async fn prev_page(&mut self, client: &ApiClient) -> Result<&[Product]> {
        let prev = self.request.page.saturating_sub(1);
        self.load_page(client, prev).await
    }

    pub fn has_next(&self) -> bool {
        self.request
            .page
            .checked_add(1)
            .is_some_and(|next| next < self.total_pages)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Products on this page that can be added to the cart.
    pub fn in_stock(&self) -> usize {
        self.products.iter().filter(|p| p.in_stock()).count()
    }

    pub fn page(&self) -> u32 {
        self.request.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }
}
