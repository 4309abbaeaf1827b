use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use super::event::WebhookEvent;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the signature on inbound deliveries.
pub const SIGNATURE_HEADER: &str = "x-jewelmusic-signature";

/// Default replay window in seconds.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Verify a delivery against its `t=<unix>,v1=<hex>` header.
///
/// Returns `false` for every kind of failure (bad header, stale timestamp,
/// non-UTF-8 body, wrong digest) and never says which one it was.
pub fn verify(payload: &[u8], signature_header: &str, secret: &str, tolerance_secs: u64) -> bool {
    verify_at(payload, signature_header, secret, tolerance_secs, unix_now())
}

/// Same as [`verify`], checked against an explicit clock reading.
pub fn verify_at(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> bool {
    let parts = match SignatureParts::parse(signature_header) {
        Some(p) => p,
        None => return false,
    };

    // Past and future skew are bounded by the same window.
    if now.abs_diff(parts.timestamp) > tolerance_secs {
        return false;
    }

    if std::str::from_utf8(payload).is_err() {
        return false;
    }

    let expected = match hmac_hex(secret, parts.timestamp, payload) {
        Some(d) => d,
        None => return false,
    };
    expected.as_bytes().ct_eq(parts.signature.as_bytes()).into()
}

/// Decode a verified payload into a [`WebhookEvent`].
///
/// Call only after [`verify`] returned `true`.
pub fn parse(payload: &[u8]) -> Result<WebhookEvent> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| Error::MalformedPayload(format!("payload is not valid UTF-8: {e}")))?;
    serde_json::from_str(text)
        .map_err(|e| Error::MalformedPayload(format!("invalid webhook payload: {e}")))
}

/// Build the signature header for `payload`, timestamped now unless given.
///
/// The digest covers the exact bytes given. A non-UTF-8 payload still gets a
/// header, but [`verify`] will never accept it.
pub fn sign(payload: &[u8], secret: &str, timestamp: Option<i64>) -> String {
    let ts = timestamp.unwrap_or_else(unix_now);
    let digest = hmac_hex(secret, ts, payload).unwrap_or_default();
    format!("t={ts},v1={digest}")
}

struct SignatureParts<'a> {
    timestamp: i64,
    signature: &'a str,
}

impl<'a> SignatureParts<'a> {
    /// Exactly one `t` and one `v1`; other keys are ignored. No whitespace
    /// is allowed around tokens.
    fn parse(header: &'a str) -> Option<Self> {
        let mut timestamp = None;
        let mut signature = None;

        for token in header.split(',') {
            let (key, value) = token.split_once('=')?;
            let slot = match key {
                "t" => &mut timestamp,
                "v1" => &mut signature,
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return None;
            }
        }

        Some(Self {
            timestamp: timestamp?.parse().ok()?,
            signature: signature?,
        })
    }
}

fn hmac_hex(secret: &str, timestamp: i64, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
