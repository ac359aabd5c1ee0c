//! Shopping cart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::storage::{self, Storage, StorageError, keys};
use crate::types::{OrderItemRequest, Product};

/// Cart mutation failure.
#[derive(Error, Debug)]
pub enum CartError {
    #[error("product {0} is out of stock")]
    OutOfStock(i64),

    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    #[error("product {0} is not in the cart")]
    NotInCart(i64),

    #[error("could not save cart: {0}")]
    Storage(#[from] StorageError),
}

/// A product selected for purchase. `1 <= quantity <= product.stock_quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Client-side cart, persisted under the `cart` key after every mutation.
///
/// Nothing is sent to the server until checkout.
#[derive(Debug)]
pub struct CartStore {
    items: Vec<CartItem>,
    storage: Arc<dyn Storage>,
}

impl CartStore {
    /// Load the cart saved in `storage`; unreadable contents start an empty cart.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let items = storage::read(storage.as_ref(), keys::CART)
            .and_then(|raw| {
                serde_json::from_str::<Vec<CartItem>>(&raw)
                    .inspect_err(|e| warn!(error = %e, "Discarding unreadable saved cart"))
                    .ok()
            })
            .unwrap_or_default()
            .into_iter()
            .filter_map(sanitize)
            .collect();
        Self { items, storage }
    }

    /// Add one unit of `product`. Already present: one more, capped at stock.
    ///
    /// A product now out of stock is rejected and the cart keeps its previous
    /// snapshot. Returns the resulting quantity.
    pub fn add(&mut self, product: &Product) -> Result<u32, CartError> {
        if !product.in_stock() {
            return Err(CartError::OutOfStock(product.id));
        }
        let mut next = self.items.clone();
        let quantity = if let Some(item) = next.iter_mut().find(|i| i.product.id == product.id) {
            // Stock may have changed since the item was added.
            item.product = product.clone();
            item.quantity = item.quantity.saturating_add(1).min(product.stock_quantity);
            item.quantity
        } else {
            next.push(CartItem {
                product: product.clone(),
                quantity: 1,
            });
            1
        };
        self.commit(next)?;
        debug!(product_id = product.id, quantity, "Added to cart");
        Ok(quantity)
    }

    /// Set the quantity of an item, clamped to its known stock.
    ///
    /// Below 1 is rejected and leaves the cart unchanged; use
    /// [`remove`](Self::remove) to drop an item. Returns the stored quantity.
    pub fn update_quantity(&mut self, product_id: i64, quantity: i64) -> Result<u32, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut next = self.items.clone();
        let item = next
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        if !item.product.in_stock() {
            return Err(CartError::OutOfStock(product_id));
        }
        let stock = i64::from(item.product.stock_quantity);
        item.quantity = u32::try_from(quantity.min(stock)).unwrap_or(1);
        let stored = item.quantity;
        self.commit(next)?;
        Ok(stored)
    }

    /// Remove an item. Removing an absent item is a no-op.
    pub fn remove(&mut self, product_id: i64) -> Result<(), CartError> {
        if self.get(product_id).is_none() {
            return Ok(());
        }
        let next = self
            .items
            .iter()
            .filter(|i| i.product.id != product_id)
            .cloned()
            .collect();
        self.commit(next)
    }

    pub fn clear(&mut self) -> Result<(), CartError> {
        self.commit(Vec::new())
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn get(&self, product_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product.id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of price × quantity over the current items.
    pub fn total_price(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Order lines for checkout.
    pub fn order_items(&self) -> Vec<OrderItemRequest> {
        self.items
            .iter()
            .map(|i| OrderItemRequest {
                product_id: i.product.id,
                quantity: i.quantity,
            })
            .collect()
    }

    /// Saves `next`, then makes it the current cart. A failed save changes nothing.
    fn commit(&mut self, next: Vec<CartItem>) -> Result<(), CartError> {
        let raw = serde_json::to_string(&next).map_err(StorageError::from)?;
        self.storage.set(keys::CART, &raw)?;
        self.items = next;
        Ok(())
    }
}

/// Re-establishes the quantity bounds on an item read back from storage.
fn sanitize(mut item: CartItem) -> Option<CartItem> {
    if item.quantity == 0 || !item.product.in_stock() {
        return None;
    }
    item.quantity = item.quantity.min(item.product.stock_quantity);
    Some(item)
}
