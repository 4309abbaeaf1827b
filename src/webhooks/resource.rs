//! Webhook endpoint management (`/webhooks`).

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

use super::event::WebhookEvent;
use super::signature;
use crate::error::{Error, Result};
use crate::http::HttpClient;

/// Event used by [`WebhooksResource::test`] when none is given.
pub const TEST_EVENT_TYPE: &str = "webhook.test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_multiplier: u32,
    pub max_backoff_delay: u32,
}

/// Registration request for a new endpoint.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookCreate {
    pub url: String,
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "expose_secret")]
    pub secret: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

impl WebhookCreate {
    pub fn new<I, S>(url: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url: url.into(),
            events: events.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update; unset fields are left unchanged server-side.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "expose_secret")]
    pub secret: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    /// Only returned on creation.
    pub secret: Option<SecretString>,
    #[serde(default)]
    pub active: bool,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default)]
pub struct WebhookFilter {
    pub active: Option<bool>,
    pub events: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryFilter {
    pub status: Option<String>,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Query options for [`WebhooksResource::statistics`].
#[derive(Debug, Clone, Default)]
pub struct StatisticsOptions {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub group_by: Option<String>,
}

fn expose_secret<S: Serializer>(secret: &Option<SecretString>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match secret {
        Some(v) => s.serialize_some(v.expose_secret()),
        None => s.serialize_none(),
    }
}

fn page_query(page: u32, per_page: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("perPage", per_page.to_string())]
}

fn require_id(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("missing required field: {name}")));
    }
    Ok(())
}

/// Client for the `/webhooks` endpoints.
#[derive(Debug, Clone)]
pub struct WebhooksResource {
    http: HttpClient,
}

impl WebhooksResource {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self, page: u32, per_page: u32, filter: &WebhookFilter) -> Result<Page<Webhook>> {
        let mut query = page_query(page, per_page);
        if let Some(active) = filter.active {
            query.push(("active", active.to_string()));
        }
        if !filter.events.is_empty() {
            query.push(("events", filter.events.join(",")));
        }
        if let Some(url) = &filter.url {
            query.push(("url", url.clone()));
        }
        self.http.get("/webhooks", &query).await
    }

    pub async fn get(&self, webhook_id: &str) -> Result<Webhook> {
        require_id("webhook_id", webhook_id)?;
        self.http.get(&format!("/webhooks/{webhook_id}"), &[]).await
    }

    /// Register an endpoint. `url` and at least one event are required.
    pub async fn create(&self, request: &WebhookCreate) -> Result<Webhook> {
        if request.url.trim().is_empty() {
            return Err(Error::validation("missing required field: url"));
        }
        if request.events.is_empty() {
            return Err(Error::validation("missing required field: events"));
        }
        debug!(url = %request.url, events = request.events.len(), "registering webhook");
        self.http.post("/webhooks", Some(request)).await
    }

    pub async fn update(&self, webhook_id: &str, update: &WebhookUpdate) -> Result<Webhook> {
        require_id("webhook_id", webhook_id)?;
        self.http.put(&format!("/webhooks/{webhook_id}"), update).await
    }

    pub async fn delete(&self, webhook_id: &str) -> Result<Value> {
        require_id("webhook_id", webhook_id)?;
        self.http.delete(&format!("/webhooks/{webhook_id}")).await
    }

    /// Ask the platform to send a test delivery to the endpoint.
    pub async fn test(&self, webhook_id: &str, event_type: Option<&str>) -> Result<Value> {
        require_id("webhook_id", webhook_id)?;
        let body = json!({ "eventType": event_type.unwrap_or(TEST_EVENT_TYPE) });
        self.http.post(&format!("/webhooks/{webhook_id}/test"), Some(&body)).await
    }

    pub async fn deliveries(
        &self,
        webhook_id: &str,
        page: u32,
        per_page: u32,
        filter: &DeliveryFilter,
    ) -> Result<Page<Value>> {
        require_id("webhook_id", webhook_id)?;
        let mut query = page_query(page, per_page);
        let optional = [
            ("status", &filter.status),
            ("eventType", &filter.event_type),
            ("startDate", &filter.start_date),
            ("endDate", &filter.end_date),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                query.push((key, v.clone()));
            }
        }
        self.http.get(&format!("/webhooks/{webhook_id}/deliveries"), &query).await
    }

    pub async fn delivery(&self, webhook_id: &str, delivery_id: &str) -> Result<Value> {
        require_id("webhook_id", webhook_id)?;
        require_id("delivery_id", delivery_id)?;
        self.http
            .get(&format!("/webhooks/{webhook_id}/deliveries/{delivery_id}"), &[])
            .await
    }

    pub async fn retry_delivery(&self, webhook_id: &str, delivery_id: &str) -> Result<Value> {
        require_id("webhook_id", webhook_id)?;
        require_id("delivery_id", delivery_id)?;
        self.http
            .post(
                &format!("/webhooks/{webhook_id}/deliveries/{delivery_id}/retry"),
                None::<&Value>,
            )
            .await
    }

    /// Delivery metrics for one endpoint.
    pub async fn statistics(&self, webhook_id: &str, options: &StatisticsOptions) -> Result<Value> {
        require_id("webhook_id", webhook_id)?;
        let optional = [
            ("period", &options.period),
            ("startDate", &options.start_date),
            ("endDate", &options.end_date),
            ("groupBy", &options.group_by),
        ];
        let query: Vec<(&str, String)> = optional
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .collect();
        self.http
            .get(&format!("/webhooks/{webhook_id}/statistics"), &query)
            .await
    }

    /// Event types the platform can deliver.
    pub async fn event_types(&self) -> Result<Vec<String>> {
        self.http.get("/webhooks/events/types", &[]).await
    }

    /// See [`signature::verify`].
    pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &str, tolerance_secs: u64) -> bool {
        signature::verify(payload, signature_header, secret, tolerance_secs)
    }

    /// See [`signature::parse`].
    pub fn parse_event(payload: &[u8]) -> Result<WebhookEvent> {
        signature::parse(payload)
    }

    /// See [`signature::sign`].
    pub fn create_signature(payload: &[u8], secret: &str, timestamp: Option<i64>) -> String {
        signature::sign(payload, secret, timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_serializes_camel_case_and_exposes_secret() {
        let mut request = WebhookCreate::new("https://hooks.example.test/jm", ["track.uploaded"])
            .with_secret("whsec_abc")
            .with_description("ci");
        request.retry_policy = Some(RetryPolicy {
            max_retries: 5,
            backoff_multiplier: 2,
            max_backoff_delay: 300,
        });

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["url"], "https://hooks.example.test/jm");
        assert_eq!(json["events"], json!(["track.uploaded"]));
        assert_eq!(json["secret"], "whsec_abc");
        assert_eq!(json["retryPolicy"]["maxBackoffDelay"], 300);
        assert!(json.get("headers").is_none());
        assert!(json.get("active").is_none());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let request = WebhookCreate::new("https://x.test", ["a"]).with_secret("whsec_hidden");
        assert!(!format!("{request:?}").contains("whsec_hidden"));
    }

    #[test]
    fn empty_update_serializes_to_empty_object() {
        let json = serde_json::to_value(WebhookUpdate::default()).unwrap();
        assert_eq!(json, json!({}));
    }

    #[test]
    fn page_tolerates_missing_pagination() {
        let page: Page<Value> = serde_json::from_value(json!({"items": [1, 2]})).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination, Pagination::default());
    }

    #[test]
    fn associated_helpers_delegate_to_signature_module() {
        let payload = br#"{"id":"evt_1","type":"track.uploaded"}"#;
        let header = WebhooksResource::create_signature(payload, "whsec_test", None);
        assert!(WebhooksResource::verify_signature(payload, &header, "whsec_test", 300));
        let event = WebhooksResource::parse_event(payload).unwrap();
        assert_eq!(event.id, "evt_1");
    }
}
