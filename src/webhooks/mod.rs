//! Webhook trust boundary, event model and endpoint management.
//!
//! Receivers call [`verify`] on the raw body first, drop the delivery when it
//! returns `false`, and only then [`parse`] it.

pub mod event;
pub mod resource;
pub mod signature;

pub use event::{EventKind, WebhookEvent};
pub use resource::{
    DeliveryFilter, Page, Pagination, RetryPolicy, StatisticsOptions, Webhook, WebhookCreate,
    WebhookFilter, WebhookUpdate, WebhooksResource,
};
pub use signature::{parse, sign, verify, verify_at, DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER};
