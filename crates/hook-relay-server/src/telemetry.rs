// hook-relay-server/src/telemetry.rs
// ============================================================================
// Module: Webhook Telemetry
// Description: Observability hooks for webhook intake and dispatch.
// Purpose: Provide metric events and latency buckets without hard deps.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for webhook request counters
//! and latency histograms. It is intentionally dependency-light so
//! deployments can plug in their metrics pipeline without redesign. Labels
//! must never carry payload contents or secret material.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default latency buckets in milliseconds for webhook request histograms.
pub const WEBHOOK_LATENCY_BUCKETS_MS: &[u64] =
    &[1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Webhook transport classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Code-hosting webhook transport.
    Github,
    /// Document-workspace webhook transport.
    Notion,
}

impl TransportKind {
    /// Returns a stable label for the transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Notion => "notion",
        }
    }
}

/// Webhook request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request accepted (including routing misses).
    Ok,
    /// Request rejected or handler failure.
    Error,
}

impl RequestOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Webhook request metric event payload.
///
/// # Invariants
/// - Optional fields are `None` when the metadata is unavailable.
#[derive(Debug, Clone)]
pub struct WebhookMetricEvent {
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
    /// Request body size in bytes.
    pub request_bytes: usize,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for webhook requests and latencies.
pub trait WebhookMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: WebhookMetricEvent);
    /// Records a latency observation for the request.
    fn record_latency(&self, event: WebhookMetricEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl WebhookMetrics for NoopMetrics {
    fn record_request(&self, _event: WebhookMetricEvent) {}

    fn record_latency(&self, _event: WebhookMetricEvent, _latency: Duration) {}
}
