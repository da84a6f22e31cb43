// hook-relay-server/src/audit.rs
// ============================================================================
// Module: Webhook Audit Logging
// Description: Structured audit events for webhook request handling.
// Purpose: Emit redacted audit logs without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for webhook request
//! logging. Events carry routing metadata only, never payload contents,
//! signatures, or token material. Sinks write JSON lines so deployments can
//! route them to their preferred logging pipeline without redesign.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::telemetry::RequestOutcome;
use crate::telemetry::TransportKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Webhook request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Transport that received the request.
    pub transport: TransportKind,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Routing key when classification succeeded.
    pub routing_key: Option<String>,
    /// Whether a handler was found and invoked.
    pub handled: bool,
    /// Response status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Error message when the request failed (never payload contents).
    pub error_message: Option<String>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

/// Inputs required to construct a webhook audit event.
pub struct WebhookAuditEventParams {
    /// Transport that received the request.
    pub transport: TransportKind,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Routing key when classification succeeded.
    pub routing_key: Option<String>,
    /// Whether a handler was found and invoked.
    pub handled: bool,
    /// Response status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Error message when the request failed.
    pub error_message: Option<String>,
    /// Request body size in bytes.
    pub request_bytes: usize,
}

impl WebhookAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: WebhookAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "webhook_request",
            timestamp_ms,
            transport: params.transport,
            outcome: params.outcome,
            routing_key: params.routing_key,
            handled: params.handled,
            status: params.status,
            error_kind: params.error_kind,
            error_message: params.error_message,
            request_bytes: params.request_bytes,
        }
    }
}

/// Security posture audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityPostureEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Transport the posture applies to.
    pub transport: TransportKind,
    /// Posture kind label.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl SecurityPostureEvent {
    /// Creates an accept-all posture event for a transport.
    #[must_use]
    pub fn accept_all(transport: TransportKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "security_posture",
            timestamp_ms,
            transport,
            kind: "accept_all",
            message: format!(
                "{} transport running without a configured secret; all deliveries are accepted",
                transport.as_str()
            ),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for webhook request events.
pub trait WebhookAuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &WebhookAuditEvent);

    /// Record a security posture audit event.
    fn record_security(&self, _event: &SecurityPostureEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl WebhookAuditSink for StderrAuditSink {
    fn record(&self, event: &WebhookAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_security(&self, event: &SecurityPostureEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes one serialized event line.
    fn write_line<T: Serialize>(&self, event: &T) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{payload}");
        }
    }
}

impl WebhookAuditSink for FileAuditSink {
    fn record(&self, event: &WebhookAuditEvent) {
        self.write_line(event);
    }

    fn record_security(&self, event: &SecurityPostureEvent) {
        self.write_line(event);
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl WebhookAuditSink for NoopAuditSink {
    fn record(&self, _event: &WebhookAuditEvent) {}
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

    use super::SecurityPostureEvent;
    use super::WebhookAuditEvent;
    use super::WebhookAuditEventParams;
    use crate::telemetry::RequestOutcome;
    use crate::telemetry::TransportKind;

    #[test]
    fn audit_event_serializes_without_payload_fields() {
        let event = WebhookAuditEvent::new(WebhookAuditEventParams {
            transport: TransportKind::Github,
            outcome: RequestOutcome::Ok,
            routing_key: Some("code-event:push".to_string()),
            handled: true,
            status: 200,
            error_kind: None,
            error_message: None,
            request_bytes: 64,
        });
        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["event"], "webhook_request");
        assert_eq!(payload["transport"], "github");
        assert_eq!(payload["routing_key"], "code-event:push");
        assert_eq!(payload["status"], 200);
        assert!(payload.get("body").is_none());
    }

    #[test]
    fn accept_all_posture_names_the_transport() {
        let event = SecurityPostureEvent::accept_all(TransportKind::Notion);
        assert_eq!(event.kind, "accept_all");
        assert!(event.message.starts_with("notion transport"));
    }
}
