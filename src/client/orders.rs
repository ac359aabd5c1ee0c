use super::{ApiClient, RequestOptions};
use crate::error::Result;
use crate::types::{OrderRequest, OrderResponse};

/// Orders API client.
#[derive(Debug)]
pub struct OrdersApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl OrdersApi<'_> {
    /// Place an order.
    pub async fn place(&self, order: &OrderRequest) -> Result<OrderResponse> {
        self.client
            .post_json("orders/place", order, RequestOptions::new())
            .await
    }

    /// List the signed-in user's orders.
    pub async fn list(&self) -> Result<Vec<OrderResponse>> {
        self.client
            .get_json("orders/allOrders", RequestOptions::new())
            .await
    }
}
