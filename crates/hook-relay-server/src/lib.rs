// hook-relay-server/src/lib.rs
// ============================================================================
// Module: Hook Relay Server Library
// Description: HTTP webhook intake transports for Hook Relay.
// Purpose: Expose the webhook server, audit sinks, and telemetry hooks.
// Dependencies: crate::{audit, server, telemetry}
// ============================================================================

//! ## Overview
//! The server crate ties the routing core together: it reads raw deliveries
//! off HTTP, runs the per-provider verification and classification pipeline,
//! resolves a handler through the read-only registry, and maps the handler
//! result or failure onto the response. Each inbound request is handled by
//! an independent task; the only shared state is read-only.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod server;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::SecurityPostureEvent;
pub use audit::StderrAuditSink;
pub use audit::WebhookAuditEvent;
pub use audit::WebhookAuditSink;
pub use server::RunningServer;
pub use server::ServerError;
pub use server::WebhookServer;
pub use telemetry::NoopMetrics;
pub use telemetry::RequestOutcome;
pub use telemetry::TransportKind;
pub use telemetry::WebhookMetricEvent;
pub use telemetry::WebhookMetrics;
