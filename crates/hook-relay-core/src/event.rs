// hook-relay-core/src/event.rs
// ============================================================================
// Module: Hook Relay Inbound Events
// Description: Per-request inbound event model shared by webhook transports.
// Purpose: Carry raw bytes, headers, and the decoded payload together.
// Dependencies: bytes, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An [`InboundEvent`] is created once per HTTP delivery and discarded after
//! the response is written; nothing here is persisted. The raw body bytes are
//! retained verbatim because signature verification must run over the exact
//! delivered bytes, never a re-serialized payload.
//!
//! Invariants:
//! - Header names are stored lowercased for case-insensitive lookup.
//! - Decoding is fully buffered; there is no streaming parse path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Inbound Event
// ============================================================================

/// A single decoded webhook delivery.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Exact raw body bytes as delivered.
    raw_body: Bytes,
    /// Request headers with lowercased names.
    headers: BTreeMap<String, String>,
    /// Decoded JSON payload.
    payload: Value,
}

impl InboundEvent {
    /// Decodes a delivery from raw bytes and headers.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidJson`] when the body is not valid JSON.
    pub fn decode(
        raw_body: Bytes,
        headers: BTreeMap<String, String>,
    ) -> Result<Self, DecodeError> {
        let payload = serde_json::from_slice(raw_body.as_ref())
            .map_err(|err| DecodeError::InvalidJson(err.to_string()))?;
        Ok(Self {
            raw_body,
            headers,
            payload,
        })
    }

    /// Builds an event from already-decoded parts.
    #[must_use]
    pub const fn from_parts(
        raw_body: Bytes,
        headers: BTreeMap<String, String>,
        payload: Value,
    ) -> Self {
        Self {
            raw_body,
            headers,
            payload,
        }
    }

    /// Returns the exact raw body bytes.
    #[must_use]
    pub const fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Returns a header value by lowercased name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Returns the full header map.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns the decoded JSON payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consumes the event and returns the decoded payload.
    #[must_use]
    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Normalizes a header collection into lowercased names.
#[must_use]
pub fn normalize_headers<I, K, V>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    headers
        .into_iter()
        .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.as_ref().to_string()))
        .collect()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Delivery decode errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The request body was not valid JSON.
    #[error("invalid json payload: {0}")]
    InvalidJson(String),
    /// A mandatory header was absent.
    #[error("missing required header: {0}")]
    MissingHeader(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions."
    )]

    use bytes::Bytes;
    use serde_json::json;

    use super::DecodeError;
    use super::InboundEvent;
    use super::normalize_headers;

    #[test]
    fn decode_parses_json_and_keeps_raw_bytes() {
        let raw = Bytes::from_static(br#"{"type":"page.created"}"#);
        let headers = normalize_headers([("X-GitHub-Event", "push")]);
        let event = InboundEvent::decode(raw.clone(), headers).unwrap();
        assert_eq!(event.raw_body(), &raw);
        assert_eq!(event.payload(), &json!({"type": "page.created"}));
        assert_eq!(event.header("x-github-event"), Some("push"));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        let raw = Bytes::from_static(b"{not json");
        let result = InboundEvent::decode(raw, normalize_headers::<_, &str, &str>([]));
        assert!(matches!(result, Err(DecodeError::InvalidJson(_))));
    }

    #[test]
    fn header_lookup_is_case_insensitive_via_normalization() {
        let headers = normalize_headers([("X-Hub-Signature-256", "sha256=ab")]);
        assert_eq!(headers.get("x-hub-signature-256").map(String::as_str), Some("sha256=ab"));
    }
}
