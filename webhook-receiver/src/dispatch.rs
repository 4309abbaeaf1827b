//! Per-event-type handling for accepted deliveries.

use jewelmusic::webhooks::{EventKind, WebhookEvent};
use serde_json::{Map, Value};
use tracing::{info, warn};

const TEXT_PREVIEW_CHARS: usize = 100;

/// The `data` key each known event carries its subject under.
fn subject_key(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::TrackUploaded | EventKind::TrackProcessed => Some("track"),
        EventKind::AnalysisCompleted => Some("analysis"),
        EventKind::TranscriptionCompleted => Some("transcription"),
        EventKind::DistributionLive => Some("release"),
        EventKind::CopilotGenerationCompleted => Some("generation"),
        EventKind::Unknown(_) => None,
    }
}

fn text<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Follow nested object keys, e.g. `["tempo", "bpm"]`.
fn nested<'a>(obj: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter().try_fold(obj.get(*first)?, |value, key| value.get(*key))
}

fn number(obj: &Map<String, Value>, path: &[&str]) -> Option<f64> {
    nested(obj, path).and_then(Value::as_f64)
}

fn nested_text<'a>(obj: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    nested(obj, path).and_then(Value::as_str)
}

fn platforms(obj: &Map<String, Value>) -> String {
    let names: Vec<&str> = obj
        .get("platforms")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    names.join(", ")
}

fn preview(s: &str) -> String {
    match s.char_indices().nth(TEXT_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Log the interesting parts of an event. Returns `false` when a known
/// event type is missing its subject object.
pub fn dispatch(event: &WebhookEvent) -> bool {
    let kind = event.kind();
    let Some(key) = subject_key(&kind) else {
        warn!(event_type = %event.event_type, event_id = %event.id, "unknown event type");
        return true;
    };
    let Some(subject) = event.data.get(key).and_then(|v| v.as_object()) else {
        warn!(event_type = %kind, event_id = %event.id, key, "event is missing its subject object");
        return false;
    };

    match kind {
        EventKind::TrackUploaded => {
            let duration = number(subject, &["duration"]);
            info!(
                track_id = text(subject, "id"),
                title = text(subject, "title"),
                artist = text(subject, "artist"),
                duration,
                "track uploaded"
            );
        }
        EventKind::TrackProcessed => {
            info!(
                track_id = text(subject, "id"),
                title = text(subject, "title"),
                status = text(subject, "status"),
                "track processed"
            );
        }
        EventKind::AnalysisCompleted => {
            let bpm = number(subject, &["tempo", "bpm"]);
            let key = nested_text(subject, &["key", "key"]);
            let mode = nested_text(subject, &["key", "mode"]);
            info!(
                analysis_id = text(subject, "id"),
                track_id = text(subject, "track_id"),
                bpm,
                key,
                mode,
                "analysis completed"
            );
        }
        EventKind::TranscriptionCompleted => {
            let text_preview = preview(text(subject, "text"));
            info!(
                transcription_id = text(subject, "id"),
                track_id = text(subject, "track_id"),
                language = text(subject, "language"),
                preview = %text_preview,
                "transcription completed"
            );
        }
        EventKind::DistributionLive => {
            let platform_list = platforms(subject);
            info!(
                release_id = text(subject, "id"),
                title = text(subject, "title"),
                artist = text(subject, "artist"),
                platforms = %platform_list,
                "release is live"
            );
        }
        EventKind::CopilotGenerationCompleted => {
            info!(
                generation_id = text(subject, "id"),
                generation_type = text(subject, "type"),
                title = text(subject, "title"),
                style = text(subject, "style"),
                "generation completed"
            );
        }
        EventKind::Unknown(_) => {}
    }
    true
}
