//! Turning the cart into an order.

use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::store::CartStore;
use crate::types::{Address, OrderRequest, OrderResponse, StripeRequest};
use crate::validation;

/// Details collected on the checkout page.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub email: String,
    pub address: Option<Address>,
}

impl CheckoutForm {
    /// Build the order request for the cart's current contents.
    pub fn order_request(&self, cart: &CartStore) -> OrderRequest {
        OrderRequest {
            customer_name: self.customer_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            items: cart.order_items(),
            shipping_address: self.address.clone(),
        }
    }
}

/// Validate the form, place the order, and empty the cart once the server
/// has accepted it. A rejected order leaves the cart untouched.
pub async fn checkout(
    client: &ApiClient,
    cart: &mut CartStore,
    form: &CheckoutForm,
) -> Result<OrderResponse> {
    if cart.is_empty() {
        return Err(ApiError::EmptyCart);
    }
    validation::validate_checkout(&form.customer_name, &form.email, form.address.as_ref())?;

    let request = form.order_request(cart);
    let order = client.orders().place(&request).await.inspect_err(|e| {
        warn!(error = %e, items = request.items.len(), "Order placement failed");
    })?;

    info!(order_id = %order.order_id, status = %order.status, "Order placed");
    if let Err(e) = cart.clear() {
        // The order already exists server-side.
        warn!(error = %e, "Order placed but cart could not be cleared");
    }
    Ok(order)
}

/// Convert a decimal amount to minor currency units (cents, paise).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Stripe checkout payload covering the whole cart.
pub fn stripe_request(cart: &CartStore, currency: &str) -> Result<StripeRequest> {
    if cart.is_empty() {
        return Err(ApiError::EmptyCart);
    }
    let product_name = match cart.items() {
        [only] => only.product.name.clone(),
        items => format!("SnapBuy order ({} products)", items.len()),
    };
    Ok(StripeRequest {
        product_name,
        quantity: 1,
        amount: to_minor_units(cart.total_price()),
        currency: currency.to_ascii_lowercase(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use crate::types::Product;

    fn product(id: i64, price: f64) -> Product {
        Product {
            id,
            name: format!("P{id}"),
            description: String::new(),
            price,
            category: "Misc".into(),
            brand: None,
            stock_quantity: 10,
            image_data: None,
        }
    }

    fn cart_with(products: &[Product]) -> CartStore {
        let mut cart = CartStore::load(Arc::new(MemoryStorage::new()) as Arc<dyn Storage>);
        for p in products {
            cart.add(p).unwrap();
        }
        cart
    }

    #[test]
    fn minor_units_round() {
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(0.1 + 0.2), 30);
        assert_eq!(to_minor_units(0.0), 0);
    }

    #[test]
    fn stripe_request_for_single_and_many() {
        let single = cart_with(&[product(1, 12.5)]);
        let req = stripe_request(&single, "INR").unwrap();
        assert_eq!(req.product_name, "P1");
        assert_eq!(req.amount, 1250);
        assert_eq!(req.currency, "inr");

        let many = cart_with(&[product(1, 1.0), product(2, 2.0)]);
        let req = stripe_request(&many, "usd").unwrap();
        assert_eq!(req.product_name, "SnapBuy order (2 products)");
        assert_eq!(req.amount, 300);
    }

    #[test]
    fn empty_cart_cannot_pay() {
        let cart = cart_with(&[]);
        assert!(matches!(stripe_request(&cart, "usd"), Err(ApiError::EmptyCart)));
    }

    #[test]
    fn order_request_trims_form() {
        let cart = cart_with(&[product(4, 1.0)]);
        let form = CheckoutForm {
            customer_name: "  Ada ".into(),
            email: " ada@example.com".into(),
            address: None,
        };
        let req = form.order_request(&cart);
        assert_eq!(req.customer_name, "Ada");
        assert_eq!(req.email, "ada@example.com");
        assert_eq!(req.items.len(), 1);
    }
}
