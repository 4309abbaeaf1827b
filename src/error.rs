use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Details attached to an error returned by the API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiErrorInfo {
    pub status: u16,
    pub code: Option<String>,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Value,
}

impl std::fmt::Display for ApiErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)?;
        match (self.status, &self.request_id) {
            (0, None) => Ok(()),
            (0, Some(id)) => write!(f, " (request {id})"),
            (status, None) => write!(f, " (status {status})"),
            (status, Some(id)) => write!(f, " (status {status}, request {id})"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(ApiErrorInfo),

    #[error("not authorized: {0}")]
    Authorization(ApiErrorInfo),

    #[error("not found: {0}")]
    NotFound(ApiErrorInfo),

    #[error("validation failed: {0}")]
    Validation(ApiErrorInfo),

    #[error("rate limited: {info}")]
    RateLimited {
        info: ApiErrorInfo,
        retry_after: Option<Duration>,
    },

    #[error("server error: {0}")]
    Server(ApiErrorInfo),

    #[error("API error: {0}")]
    Api(ApiErrorInfo),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
}

#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
    #[serde(default)]
    meta: Option<ErrorMeta>,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    details: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorMeta {
    request_id: Option<String>,
}

impl Error {
    /// Map a non-success response to the matching variant.
    pub fn from_response(status: StatusCode, body: &[u8], retry_after: Option<Duration>) -> Self {
        let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
        let (code, message, details) = match envelope.error {
            Some(e) => (e.code, e.message, e.details),
            None => (None, None, Value::Null),
        };
        let info = ApiErrorInfo {
            status: status.as_u16(),
            code,
            message: message.unwrap_or_else(|| {
                format!("HTTP {}", status.canonical_reason().unwrap_or("error"))
            }),
            request_id: envelope.meta.and_then(|m| m.request_id),
            details,
        };

        match status.as_u16() {
            400 | 422 => Error::Validation(info),
            401 => Error::Authentication(info),
            403 => Error::Authorization(info),
            404 => Error::NotFound(info),
            429 => Error::RateLimited { info, retry_after },
            500..=599 => Error::Server(info),
            _ => Error::Api(info),
        }
    }

    /// Client-side validation failure, raised before any request is sent.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(ApiErrorInfo {
            message: message.into(),
            ..Default::default()
        })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::Server(_) => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    fn info(&self) -> Option<&ApiErrorInfo> {
        match self {
            Error::Authentication(i)
            | Error::Authorization(i)
            | Error::NotFound(i)
            | Error::Validation(i)
            | Error::Server(i)
            | Error::Api(i)
            | Error::RateLimited { info: i, .. } => Some(i),
            _ => None,
        }
    }

    /// HTTP status of an API error; `None` for local failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => self.info().map(|i| i.status).filter(|s| *s != 0),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.info().and_then(|i| i.request_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{
        "success": false,
        "error": {"code": "TRACK_NOT_FOUND", "message": "Track does not exist", "details": {"id": "trk_1"}},
        "meta": {"requestId": "req_42"}
    }"#;

    #[test]
    fn maps_status_codes_to_variants() {
        let cases: [(u16, fn(&Error) -> bool); 7] = [
            (400, |e| matches!(e, Error::Validation(_))),
            (401, |e| matches!(e, Error::Authentication(_))),
            (403, |e| matches!(e, Error::Authorization(_))),
            (404, |e| matches!(e, Error::NotFound(_))),
            (429, |e| matches!(e, Error::RateLimited { .. })),
            (503, |e| matches!(e, Error::Server(_))),
            (418, |e| matches!(e, Error::Api(_))),
        ];
        for (status, check) in cases {
            let err = Error::from_response(StatusCode::from_u16(status).unwrap(), BODY, None);
            assert!(check(&err), "status {status} mapped to {err:?}");
            assert_eq!(err.status_code(), Some(status));
        }
    }

    #[test]
    fn extracts_envelope_fields() {
        let err = Error::from_response(StatusCode::NOT_FOUND, BODY, None);
        assert_eq!(err.request_id(), Some("req_42"));
        let Error::NotFound(info) = &err else {
            panic!("expected NotFound, got {err:?}");
        };
        assert_eq!(info.code.as_deref(), Some("TRACK_NOT_FOUND"));
        assert_eq!(info.message, "Track does not exist");
        assert_eq!(info.details["id"], "trk_1");
        assert_eq!(
            err.to_string(),
            "not found: Track does not exist (status 404, request req_42)"
        );
    }

    #[test]
    fn non_json_body_falls_back_to_reason() {
        let err = Error::from_response(StatusCode::BAD_GATEWAY, b"<html>oops</html>", None);
        assert_eq!(err.to_string(), "server error: HTTP Bad Gateway (status 502)");
        assert!(err.request_id().is_none());
    }

    #[test]
    fn retryable_classification() {
        let limited = Error::from_response(
            StatusCode::TOO_MANY_REQUESTS,
            b"{}",
            Some(Duration::from_secs(2)),
        );
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(2)));

        assert!(Error::from_response(StatusCode::INTERNAL_SERVER_ERROR, b"", None).is_retryable());
        assert!(!Error::from_response(StatusCode::UNAUTHORIZED, b"", None).is_retryable());
        assert!(!Error::MalformedPayload("x".into()).is_retryable());
    }

    #[test]
    fn local_validation_has_no_status() {
        let err = Error::validation("url is required");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "validation failed: url is required");
    }
}
