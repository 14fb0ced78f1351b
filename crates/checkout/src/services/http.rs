//! Order service client over HTTP.

use async_trait::async_trait;

use super::order::{OrderService, OrderServiceError};
use crate::intent::{OrderIntent, OrderIntentReceipt};

/// Calls a remote order service's `POST /api/v1/orders/intents`.
#[derive(Debug, Clone)]
pub struct HttpOrderService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn intents_url(&self) -> String {
        format!("{}/api/v1/orders/intents", self.base_url)
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn create_order_intent(
        &self,
        intent: &OrderIntent,
    ) -> Result<OrderIntentReceipt, OrderServiceError> {
        let response = self
            .client
            .post(self.intents_url())
            .json(intent)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrderServiceError::Rejected(format!("{status}: {body}")));
        }
        if !status.is_success() {
            return Err(OrderServiceError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<OrderIntentReceipt>().await?)
    }
}
