// hook-relay-core/src/handler.rs
// ============================================================================
// Module: Hook Relay Handler Interface
// Description: Async handler contract invoked for routed webhook events.
// Purpose: Define the collaborator boundary between routing and processing.
// Dependencies: async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Handlers are the external collaborators of the routing core: the
//! dispatcher resolves a routing key, invokes exactly one handler with the
//! event payload, and maps the result or failure onto an HTTP response.
//! Handler failures are caught at the dispatch boundary; they must never
//! take down the process or affect other in-flight deliveries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::routing::ProviderNamespace;

// ============================================================================
// SECTION: Handler Context
// ============================================================================

/// Per-invocation context passed alongside the event payload.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// Flattened routing key that matched the event.
    key: String,
    /// Namespace of the matched key.
    namespace: ProviderNamespace,
    /// Provider event type when the transport exposes one.
    event_type: Option<String>,
    /// Provider delivery identifier when present.
    delivery_id: Option<String>,
}

impl HandlerContext {
    /// Creates a context for a matched routing key.
    #[must_use]
    pub fn new(key: impl Into<String>, namespace: ProviderNamespace) -> Self {
        Self {
            key: key.into(),
            namespace,
            event_type: None,
            delivery_id: None,
        }
    }

    /// Returns a copy with the provider event type set.
    #[must_use]
    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Returns a copy with the provider delivery identifier set.
    #[must_use]
    pub fn with_delivery_id(mut self, delivery_id: impl Into<String>) -> Self {
        self.delivery_id = Some(delivery_id.into());
        self
    }

    /// Returns the flattened routing key that matched.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the namespace of the matched key.
    #[must_use]
    pub const fn namespace(&self) -> ProviderNamespace {
        self.namespace
    }

    /// Returns the provider event type when present.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// Returns the provider delivery identifier when present.
    #[must_use]
    pub fn delivery_id(&self) -> Option<&str> {
        self.delivery_id.as_deref()
    }
}

// ============================================================================
// SECTION: Handler Trait
// ============================================================================

/// Async handler invoked for a routed event.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Processes an event payload.
    ///
    /// Returning `Ok(None)` signals success with no response body; the
    /// transport answers with its generic acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when processing fails; the transport maps the
    /// failure to a generic server error without leaking details.
    async fn handle(
        &self,
        payload: Value,
        ctx: HandlerContext,
    ) -> Result<Option<Value>, HandlerError>;
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Handler invocation errors.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Handler logic reported a failure.
    #[error("handler failed: {0}")]
    Failed(String),
    /// An upstream collaborator call failed.
    #[error("upstream error: {0}")]
    Upstream(String),
}
