use reqwest::Method;

use super::{ApiClient, RequestBody, RequestOptions};
use crate::error::Result;

/// Chat API client.
#[derive(Debug)]
pub struct ChatApi<'a> {
    pub(super) client: &'a ApiClient,
}

impl ChatApi<'_> {
    /// Ask the shopping assistant a question. The answer is plain text.
    pub async fn ask(&self, message: &str) -> Result<String> {
        self.client
            .text(
                Method::GET,
                "chat/ask",
                RequestBody::Empty,
                RequestOptions::new().query("message", message),
            )
            .await
    }
}
