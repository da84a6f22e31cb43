// hook-relay-handlers/src/log.rs
// ============================================================================
// Module: Log Handler
// Description: Log-only handler for routed webhook events.
// Purpose: Record routed events without delivering payloads anywhere.
// Dependencies: hook-relay-core, serde_json
// ============================================================================

//! ## Overview
//! `LogHandler` writes one JSON record per routed event and returns no
//! response body, so the transport answers with its generic acknowledgment.
//! Records carry routing metadata only, never payload contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use hook_relay_core::Handler;
use hook_relay_core::HandlerContext;
use hook_relay_core::HandlerError;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Log Handler
// ============================================================================

/// Log-only event handler.
pub struct LogHandler<W: Write + Send> {
    /// Output writer for log records.
    writer: Mutex<W>,
}

impl<W: Write + Send> LogHandler<W> {
    /// Creates a log handler writing to the given writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W: Write + Send> Handler for LogHandler<W> {
    async fn handle(
        &self,
        _payload: Value,
        ctx: HandlerContext,
    ) -> Result<Option<Value>, HandlerError> {
        let record = json!({
            "event": "routed_event",
            "key": ctx.key(),
            "namespace": ctx.namespace().as_str(),
            "event_type": ctx.event_type(),
            "delivery_id": ctx.delivery_id(),
        });
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| HandlerError::Failed("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, &record)
            .map_err(|err| HandlerError::Failed(err.to_string()))?;
        guard
            .write_all(b"\n")
            .map_err(|err| HandlerError::Failed(err.to_string()))?;
        drop(guard);
        Ok(None)
    }
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

    use std::sync::Arc;
    use std::sync::Mutex;

    use hook_relay_core::Handler;
    use hook_relay_core::HandlerContext;
    use hook_relay_core::ProviderNamespace;
    use serde_json::Value;
    use serde_json::json;

    use super::LogHandler;

    /// Shared in-memory writer capturing log output.
    #[derive(Clone, Default)]
    struct SharedBuffer {
        /// Captured bytes.
        bytes: Arc<Mutex<Vec<u8>>>,
    }

    impl std::io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.bytes.lock().map_or(Ok(0), |mut bytes| {
                bytes.extend_from_slice(buf);
                Ok(buf.len())
            })
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn records_routing_metadata_without_payload() {
        let buffer = SharedBuffer::default();
        let handler = LogHandler::new(buffer.clone());
        let ctx = HandlerContext::new("code-event:push", ProviderNamespace::CodeEvent)
            .with_event_type("push")
            .with_delivery_id("d-1");

        let result = handler.handle(json!({ "secret": "s" }), ctx).await.unwrap();
        assert!(result.is_none());

        let bytes = buffer.bytes.lock().unwrap().clone();
        let line = String::from_utf8(bytes).unwrap();
        let record: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(record["event"], "routed_event");
        assert_eq!(record["key"], "code-event:push");
        assert_eq!(record["namespace"], "code-event");
        assert_eq!(record["event_type"], "push");
        assert_eq!(record["delivery_id"], "d-1");
        assert!(!line.contains("secret"));
    }
}
