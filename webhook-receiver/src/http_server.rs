use crate::dispatch::dispatch;
use crate::store::DeliveryStore;
use crate::types::{Delivery, DeliveryStatus};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use jewelmusic::webhooks::{self, SIGNATURE_HEADER};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const WEBHOOK_PATH: &str = "/webhooks/jewelmusic";

#[derive(Clone)]
pub struct ServerState {
    pub secret: Arc<SecretString>,
    pub tolerance_secs: u64,
    pub store: Arc<RwLock<DeliveryStore>>,
}

impl ServerState {
    pub fn new(secret: SecretString, tolerance_secs: u64, store: DeliveryStore) -> Self {
        Self {
            secret: Arc::new(secret),
            tolerance_secs,
            store: Arc::new(RwLock::new(store)),
        }
    }

    async fn record(&self, delivery: Delivery) {
        let mut store = self.store.write().await;
        store.record(delivery);
        if let Err(e) = store.save() {
            warn!(error = %e, "failed to persist deliveries");
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(handle_webhook))
        .route("/health", get(health))
        .route("/deliveries", get(list_deliveries))
        .with_state(state)
}

async fn handle_webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !webhooks::verify(&body, signature, state.secret.expose_secret(), state.tolerance_secs) {
        warn!(bytes = body.len(), "rejected webhook with invalid signature");
        state.record(Delivery::new(DeliveryStatus::Unauthorized)).await;
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid signature"})));
    }

    let event = match webhooks::parse(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "rejected malformed webhook payload");
            state.record(Delivery::new(DeliveryStatus::Malformed)).await;
            return (StatusCode::BAD_REQUEST, Json(json!({"error": "malformed payload"})));
        }
    };

    debug!(event_id = %event.id, event_type = %event.event_type, "webhook verified");

    if !dispatch(&event) {
        let delivery = Delivery {
            status: DeliveryStatus::Malformed,
            ..Delivery::accepted(&event)
        };
        state.record(delivery).await;
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "event data is incomplete", "event_id": event.id})),
        );
    }

    state.record(Delivery::accepted(&event)).await;
    (
        StatusCode::OK,
        Json(json!({
            "received": true,
            "event_id": event.id,
            "event_type": event.event_type,
        })),
    )
}

async fn health(State(state): State<ServerState>) -> Json<serde_json::Value> {
    let deliveries = state.store.read().await.len();
    Json(json!({"status": "ok", "deliveries": deliveries}))
}

async fn list_deliveries(State(state): State<ServerState>) -> Json<Vec<Delivery>> {
    let store = state.store.read().await;
    Json(store.recent().into_iter().cloned().collect())
}
