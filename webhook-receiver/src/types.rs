use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Accepted,
    /// Signature check failed; nothing from the body is kept.
    Unauthorized,
    /// Authentic but not a valid event document.
    Malformed,
}

/// One inbound POST to the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Delivery {
    pub fn new(status: DeliveryStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            received_at: Utc::now(),
            status,
            event_id: None,
            event_type: None,
            data: None,
        }
    }

    pub fn accepted(event: &jewelmusic::webhooks::WebhookEvent) -> Self {
        Self {
            event_id: Some(event.id.clone()),
            event_type: Some(event.event_type.clone()),
            data: Some(serde_json::Value::Object(event.data.clone())),
            ..Self::new(DeliveryStatus::Accepted)
        }
    }
}
