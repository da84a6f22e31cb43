// system-tests/src/harness.rs
// ============================================================================
// Module: System Test Harness
// Description: In-process server spawning and recording handler doubles.
// Purpose: Drive the real webhook transports over loopback HTTP.
// Dependencies: hook-relay-config, hook-relay-core, hook-relay-server
// ============================================================================

//! ## Overview
//! The harness binds both transports on ephemeral loopback ports and exposes
//! their endpoint URLs. Recording handlers capture every invocation so
//! suites can assert exactly-once delivery and payload fidelity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use hook_relay_config::GithubTransportConfig;
use hook_relay_config::HookRelayConfig;
use hook_relay_config::NotionTransportConfig;
use hook_relay_core::Handler;
use hook_relay_core::HandlerContext;
use hook_relay_core::HandlerError;
use hook_relay_core::PatternRegistry;
use hook_relay_server::NoopAuditSink;
use hook_relay_server::RunningServer;
use hook_relay_server::ServerError;
use hook_relay_server::WebhookServer;
use serde_json::Value;

// ============================================================================
// SECTION: Test Configuration
// ============================================================================

/// Builds a test configuration bound to ephemeral loopback ports.
#[must_use]
pub fn test_config(
    github_secret: Option<&str>,
    notion_token: Option<&str>,
) -> HookRelayConfig {
    HookRelayConfig {
        github: GithubTransportConfig {
            bind: "127.0.0.1:0".to_string(),
            secret: github_secret.map(str::to_string),
            ..GithubTransportConfig::default()
        },
        notion: NotionTransportConfig {
            bind: "127.0.0.1:0".to_string(),
            verification_token: notion_token.map(str::to_string),
            ..NotionTransportConfig::default()
        },
        ..HookRelayConfig::default()
    }
}

// ============================================================================
// SECTION: Test Server
// ============================================================================

/// Running server with resolved endpoint URLs.
pub struct TestServer {
    /// Full code-hosting endpoint URL.
    pub github_endpoint: String,
    /// Code-hosting base URL without the endpoint path.
    pub github_base: String,
    /// Full document-workspace endpoint URL.
    pub notion_endpoint: String,
    /// Document-workspace base URL without the endpoint path.
    pub notion_base: String,
    /// Running transports; aborted on drop.
    running: RunningServer,
}

impl TestServer {
    /// Spawns both transports for the given configuration and registry.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the transports cannot be bound.
    pub async fn spawn(
        config: HookRelayConfig,
        registry: PatternRegistry,
    ) -> Result<Self, ServerError> {
        let github_path = config.github.path.clone();
        let notion_path = config.notion.path.clone();
        let server = WebhookServer::new(config, Arc::new(registry))
            .with_audit(Arc::new(NoopAuditSink));
        let running = server.start().await?;
        let github_base = format!("http://{}", running.github_addr);
        let notion_base = format!("http://{}", running.notion_addr);
        Ok(Self {
            github_endpoint: format!("{github_base}{github_path}"),
            github_base,
            notion_endpoint: format!("{notion_base}{notion_path}"),
            notion_base,
            running,
        })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.running.abort();
    }
}

// ============================================================================
// SECTION: Recording Handlers
// ============================================================================

/// One captured handler invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Routing key that matched.
    pub key: String,
    /// Payload the dispatcher delivered.
    pub payload: Value,
    /// Provider event type from the invocation context.
    pub event_type: Option<String>,
    /// Provider delivery identifier from the invocation context.
    pub delivery_id: Option<String>,
}

/// Handler double capturing invocations.
pub struct RecordingHandler {
    /// Captured invocations in arrival order.
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    /// Result returned on success.
    result: Option<Value>,
    /// Whether every invocation fails.
    fail: bool,
}

impl RecordingHandler {
    /// Creates a handler returning the given result.
    #[must_use]
    pub fn succeeding(result: Option<Value>) -> (Arc<Self>, Arc<Mutex<Vec<RecordedCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(Self {
            calls: Arc::clone(&calls),
            result,
            fail: false,
        });
        (handler, calls)
    }

    /// Creates a handler failing every invocation.
    #[must_use]
    pub fn failing() -> (Arc<Self>, Arc<Mutex<Vec<RecordedCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(Self {
            calls: Arc::clone(&calls),
            result: None,
            fail: true,
        });
        (handler, calls)
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn handle(
        &self,
        payload: Value,
        ctx: HandlerContext,
    ) -> Result<Option<Value>, HandlerError> {
        self.calls
            .lock()
            .map_err(|_| HandlerError::Failed("recording mutex poisoned".to_string()))?
            .push(RecordedCall {
                key: ctx.key().to_string(),
                payload,
                event_type: ctx.event_type().map(str::to_string),
                delivery_id: ctx.delivery_id().map(str::to_string),
            });
        if self.fail {
            return Err(HandlerError::Failed("synthetic handler failure".to_string()));
        }
        Ok(self.result.clone())
    }
}
