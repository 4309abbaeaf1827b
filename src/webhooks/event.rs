use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A webhook event, decoded from a verified delivery body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    /// ISO-8601, as sent.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        EventKind::from(self.event_type.as_str())
    }

    /// The event timestamp, if it is valid RFC 3339.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Known event types, with a fallback for anything newer than this SDK.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    TrackUploaded,
    TrackProcessed,
    AnalysisCompleted,
    TranscriptionCompleted,
    DistributionLive,
    CopilotGenerationCompleted,
    Unknown(String),
}

impl EventKind {
    pub const ALL_KNOWN: [EventKind; 6] = [
        EventKind::TrackUploaded,
        EventKind::TrackProcessed,
        EventKind::AnalysisCompleted,
        EventKind::TranscriptionCompleted,
        EventKind::DistributionLive,
        EventKind::CopilotGenerationCompleted,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::TrackUploaded => "track.uploaded",
            EventKind::TrackProcessed => "track.processed",
            EventKind::AnalysisCompleted => "analysis.completed",
            EventKind::TranscriptionCompleted => "transcription.completed",
            EventKind::DistributionLive => "distribution.live",
            EventKind::CopilotGenerationCompleted => "copilot.generation_completed",
            EventKind::Unknown(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Unknown(_))
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        match s {
            "track.uploaded" => EventKind::TrackUploaded,
            "track.processed" => EventKind::TrackProcessed,
            "analysis.completed" => EventKind::AnalysisCompleted,
            "transcription.completed" => EventKind::TranscriptionCompleted,
            "distribution.live" => EventKind::DistributionLive,
            "copilot.generation_completed" => EventKind::CopilotGenerationCompleted,
            other => EventKind::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
