use serde::Deserialize;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::webhooks::WebhooksResource;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PingResponse {
    pub timestamp: String,
    pub version: String,
}

/// Entry point to the JewelMusic API.
#[derive(Debug, Clone)]
pub struct JewelMusic {
    http: HttpClient,
}

impl JewelMusic {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::new(&config)?;
        info!(
            base_url = config.resolved_base_url(),
            environment = ?config.environment,
            "JewelMusic client ready"
        );
        Ok(Self { http })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Check connectivity and credentials.
    pub async fn ping(&self) -> Result<PingResponse> {
        self.http.get("/ping", &[]).await
    }

    pub fn webhooks(&self) -> WebhooksResource {
        WebhooksResource::new(self.http.clone())
    }
}
