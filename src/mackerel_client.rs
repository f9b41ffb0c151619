use async_trait::async_trait;
use reqwest::Client;

use crate::error::MaintenanceNotifierError;
use crate::metric::MetricValue;

const API_KEY_HEADER: &str = "X-Api-Key";

pub struct MackerelClient {
    client: Client,
    api_base: String,
    api_key: String,
}

#[async_trait]
pub trait Publish: Send + Sync {
    async fn post_service_metric_values(
        &self,
        service: &str,
        values: &[MetricValue],
    ) -> Result<(), MaintenanceNotifierError>;
}

#[async_trait]
impl Publish for MackerelClient {
    async fn post_service_metric_values(
        &self,
        service: &str,
        values: &[MetricValue],
    ) -> Result<(), MaintenanceNotifierError> {
        let url = format!("{}/api/v0/services/{}/tsdb", self.api_base, service);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(values)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(MaintenanceNotifierError::PublishRejected { status, message })
    }
}

impl MackerelClient {
    pub fn new_with_client(client: Client, api_base: String, api_key: String) -> Self {
        MackerelClient {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}
