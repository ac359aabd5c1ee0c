use super::{ApiClient, RequestOptions};
use crate::error::Result;
use crate::types::{StripeRequest, StripeResponse};

/// Payments API client.
#[derive(Debug)]
pub struct PaymentsApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl PaymentsApi<'_> {
    /// Create a Stripe checkout session.
    pub async fn stripe_session(&self, request: &StripeRequest) -> Result<StripeResponse> {
        self.client
            .post_json("payments/stripe", request, RequestOptions::new())
            .await
    }
}
