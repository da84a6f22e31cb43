// hook-relay-server/src/server.rs
// ============================================================================
// Module: Webhook Server
// Description: Axum transports running the per-request dispatch state machine.
// Purpose: Verify, classify, and dispatch webhook deliveries over HTTP.
// Dependencies: axum, hook-relay-core, hook-relay-providers, tokio
// ============================================================================

//! ## Overview
//! One axum router per transport instance, each with a single POST endpoint
//! at the configured path. Every request walks the same terminal state
//! machine: wrong path 404, wrong method 405, body read fully buffered,
//! provider verification and classification, registry lookup, handler
//! invocation, response mapping. A missing handler answers 200: webhook
//! providers expect 2xx for any accepted delivery, and a non-2xx would
//! trigger provider-side retry storms for events no integration handles.
//!
//! Handler failures are caught here: the response is a fixed 500 body with
//! no stack trace, and the process keeps serving other deliveries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use hook_relay_config::HookRelayConfig;
use hook_relay_core::DecodeError;
use hook_relay_core::Handler;
use hook_relay_core::HandlerContext;
use hook_relay_core::InboundEvent;
use hook_relay_core::PatternRegistry;
use hook_relay_core::ProviderNamespace;
use hook_relay_providers::GithubClassification;
use hook_relay_providers::GithubVerifier;
use hook_relay_providers::NotionClassification;
use hook_relay_providers::NotionTokenVerifier;
use hook_relay_providers::VerifyError;
use hook_relay_providers::github;
use hook_relay_providers::notion;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::audit::SecurityPostureEvent;
use crate::audit::StderrAuditSink;
use crate::audit::WebhookAuditEvent;
use crate::audit::WebhookAuditEventParams;
use crate::audit::WebhookAuditSink;
use crate::telemetry::NoopMetrics;
use crate::telemetry::RequestOutcome;
use crate::telemetry::TransportKind;
use crate::telemetry::WebhookMetricEvent;
use crate::telemetry::WebhookMetrics;

// ============================================================================
// SECTION: Webhook Server
// ============================================================================

/// Webhook server owning both intake transports.
pub struct WebhookServer {
    /// Validated configuration.
    config: HookRelayConfig,
    /// Read-only handler registry shared by all requests.
    registry: Arc<PatternRegistry>,
    /// Audit sink for request events.
    audit: Arc<dyn WebhookAuditSink>,
    /// Metrics sink for request counters and latencies.
    metrics: Arc<dyn WebhookMetrics>,
}

impl WebhookServer {
    /// Builds a server from configuration and a frozen registry.
    #[must_use]
    pub fn new(config: HookRelayConfig, registry: Arc<PatternRegistry>) -> Self {
        Self {
            config,
            registry,
            audit: Arc::new(StderrAuditSink),
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Returns a copy with the audit sink replaced.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn WebhookAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns a copy with the metrics sink replaced.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn WebhookMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Binds both transports and starts serving.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when a bind address is invalid or a listener
    /// cannot be bound.
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        let shared = SharedState {
            registry: Arc::clone(&self.registry),
            audit: Arc::clone(&self.audit),
            metrics: Arc::clone(&self.metrics),
        };

        let github_verifier = GithubVerifier::new(self.config.github.secret.clone());
        if github_verifier.is_accept_all() {
            self.audit.record_security(&SecurityPostureEvent::accept_all(TransportKind::Github));
        }
        let notion_verifier =
            NotionTokenVerifier::new(self.config.notion.verification_token.clone());
        if notion_verifier.is_accept_all() {
            self.audit.record_security(&SecurityPostureEvent::accept_all(TransportKind::Notion));
        }

        let github_state = Arc::new(GithubState {
            shared: shared.clone(),
            verifier: github_verifier,
        });
        let github_app = Router::new()
            .route(&self.config.github.path, post(github_intake))
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .layer(DefaultBodyLimit::max(self.config.server.max_body_bytes))
            .with_state(github_state);

        let notion_state = Arc::new(NotionState {
            shared,
            verifier: notion_verifier,
        });
        let notion_app = Router::new()
            .route(&self.config.notion.path, post(notion_intake))
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .layer(DefaultBodyLimit::max(self.config.server.max_body_bytes))
            .with_state(notion_state);

        let (github_addr, github_task) =
            spawn_transport(&self.config.github.bind, github_app).await?;
        let (notion_addr, notion_task) =
            spawn_transport(&self.config.notion.bind, notion_app).await?;

        Ok(RunningServer {
            github_addr,
            notion_addr,
            github_task,
            notion_task,
        })
    }
}

/// Bound transport address with its serve task.
type BoundTransport = (SocketAddr, JoinHandle<Result<(), ServerError>>);

/// Binds one listener and spawns its serve task.
async fn spawn_transport(bind: &str, app: Router) -> Result<BoundTransport, ServerError> {
    let addr: SocketAddr =
        bind.parse().map_err(|_| ServerError::Config(format!("invalid bind address: {bind}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| ServerError::Bind(format!("bind failed for {bind}: {err}")))?;
    let local_addr = listener
        .local_addr()
        .map_err(|err| ServerError::Bind(format!("local address unavailable: {err}")))?;
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .map_err(|err| ServerError::Transport(err.to_string()))
    });
    Ok((local_addr, task))
}

/// Handle for a running server with both transports bound.
pub struct RunningServer {
    /// Bound address of the code-hosting transport.
    pub github_addr: SocketAddr,
    /// Bound address of the document-workspace transport.
    pub notion_addr: SocketAddr,
    /// Serve task for the code-hosting transport.
    github_task: JoinHandle<Result<(), ServerError>>,
    /// Serve task for the document-workspace transport.
    notion_task: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    /// Runs until either transport fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when a transport task fails or panics.
    pub async fn join(self) -> Result<(), ServerError> {
        let (github, notion) = tokio::try_join!(self.github_task, self.notion_task)
            .map_err(|err| ServerError::Transport(err.to_string()))?;
        github?;
        notion?;
        Ok(())
    }

    /// Aborts both transport tasks.
    pub fn abort(&self) {
        self.github_task.abort();
        self.notion_task.abort();
    }
}

// ============================================================================
// SECTION: Request State
// ============================================================================

/// State shared by both transports.
#[derive(Clone)]
struct SharedState {
    /// Read-only handler registry.
    registry: Arc<PatternRegistry>,
    /// Audit sink for request events.
    audit: Arc<dyn WebhookAuditSink>,
    /// Metrics sink for request counters and latencies.
    metrics: Arc<dyn WebhookMetrics>,
}

/// Per-transport state for the code-hosting intake.
struct GithubState {
    /// State shared by both transports.
    shared: SharedState,
    /// Signature verifier.
    verifier: GithubVerifier,
}

/// Per-transport state for the document-workspace intake.
struct NotionState {
    /// State shared by both transports.
    shared: SharedState,
    /// Token verifier.
    verifier: NotionTokenVerifier,
}

// ============================================================================
// SECTION: Response Disposition
// ============================================================================

/// Terminal outcome of one request, carried to audit and response mapping.
struct Disposition {
    /// Response status code.
    status: StatusCode,
    /// Response body.
    body: ResponseBody,
    /// Outcome label for audit and metrics.
    outcome: RequestOutcome,
    /// Routing key when classification succeeded.
    routing_key: Option<String>,
    /// Whether a handler was found and invoked.
    handled: bool,
    /// Normalized error kind label.
    error_kind: Option<&'static str>,
    /// Error message recorded in the audit event.
    error_message: Option<String>,
}

/// Response body shapes produced by the dispatcher.
enum ResponseBody {
    /// Fixed or formatted text body.
    Text(String),
    /// JSON body.
    Json(Value),
}

impl Disposition {
    /// Builds the generic acknowledgment for accepted, unrouted deliveries.
    fn received(routing_key: Option<String>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ResponseBody::Json(json!({ "received": true })),
            outcome: RequestOutcome::Ok,
            routing_key,
            handled: false,
            error_kind: None,
            error_message: None,
        }
    }

    /// Builds a verification failure response.
    fn verify_failure(error: &VerifyError) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ResponseBody::Text(error.to_string()),
            outcome: RequestOutcome::Error,
            routing_key: None,
            handled: false,
            error_kind: Some("verify"),
            error_message: Some(error.to_string()),
        }
    }

    /// Builds a decode failure response.
    fn decode_failure(error: &DecodeError) -> Self {
        let body = match error {
            DecodeError::InvalidJson(_) => "Bad Request".to_string(),
            DecodeError::MissingHeader(name) => format!("Missing {name} header"),
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ResponseBody::Text(body),
            outcome: RequestOutcome::Error,
            routing_key: None,
            handled: false,
            error_kind: Some("decode"),
            error_message: Some(error.to_string()),
        }
    }
}

/// Records audit and metric events, then renders the response.
fn finish(
    shared: &SharedState,
    transport: TransportKind,
    request_bytes: usize,
    started: Instant,
    disposition: Disposition,
) -> Response {
    let status = disposition.status.as_u16();
    shared.audit.record(&WebhookAuditEvent::new(WebhookAuditEventParams {
        transport,
        outcome: disposition.outcome,
        routing_key: disposition.routing_key.clone(),
        handled: disposition.handled,
        status,
        error_kind: disposition.error_kind,
        error_message: disposition.error_message,
        request_bytes,
    }));
    let metric = WebhookMetricEvent {
        transport,
        outcome: disposition.outcome,
        routing_key: disposition.routing_key,
        handled: disposition.handled,
        status,
        error_kind: disposition.error_kind,
        request_bytes,
    };
    shared.metrics.record_request(metric.clone());
    shared.metrics.record_latency(metric, started.elapsed());
    match disposition.body {
        ResponseBody::Text(text) => (disposition.status, text).into_response(),
        ResponseBody::Json(value) => (disposition.status, axum::Json(value)).into_response(),
    }
}

// ============================================================================
// SECTION: Fallbacks
// ============================================================================

/// Wrong-path fallback.
async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

/// Wrong-method fallback.
async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response()
}

// ============================================================================
// SECTION: Code-Hosting Intake
// ============================================================================

/// Intake endpoint for signed code-hosting deliveries.
async fn github_intake(
    State(state): State<Arc<GithubState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let request_bytes = body.len();
    let headers = lowercase_headers(&headers);

    // Signature runs over the exact raw bytes, before any decoding.
    let signature = headers.get(github::SIGNATURE_HEADER).map(String::as_str);
    if let Err(error) = state.verifier.verify(body.as_ref(), signature) {
        return finish(
            &state.shared,
            TransportKind::Github,
            request_bytes,
            started,
            Disposition::verify_failure(&error),
        );
    }

    let event_type = match github::event_type(&headers) {
        Ok(event_type) => event_type.to_string(),
        Err(error) => {
            return finish(
                &state.shared,
                TransportKind::Github,
                request_bytes,
                started,
                Disposition::decode_failure(&error),
            );
        }
    };

    let event = match InboundEvent::decode(body, headers) {
        Ok(event) => event,
        Err(error) => {
            return finish(
                &state.shared,
                TransportKind::Github,
                request_bytes,
                started,
                Disposition::decode_failure(&error),
            );
        }
    };

    let delivery_id = event.header(github::DELIVERY_ID_HEADER).map(str::to_string);
    let classification = github::classify(&event_type, delivery_id.as_deref(), event.payload());
    let disposition = match classification {
        GithubClassification::Ping => Disposition {
            status: StatusCode::OK,
            body: ResponseBody::Json(json!({ "message": "pong" })),
            outcome: RequestOutcome::Ok,
            routing_key: None,
            handled: false,
            error_kind: None,
            error_message: None,
        },
        GithubClassification::Routed(routed) => {
            let primary = routed.primary.canonical();
            let fallback = routed.fallback.canonical();
            let binding = state
                .shared
                .registry
                .lookup(&primary)
                .or_else(|| state.shared.registry.lookup(&fallback));
            match binding {
                None => Disposition::received(Some(primary)),
                Some(binding) => {
                    let key = binding.key().canonical();
                    let handler = binding.handler();
                    let mut ctx = HandlerContext::new(key.clone(), ProviderNamespace::CodeEvent)
                        .with_event_type(routed.event_type);
                    if let Some(delivery_id) = routed.delivery_id {
                        ctx = ctx.with_delivery_id(delivery_id);
                    }
                    invoke(handler, key, event.into_payload(), ctx).await
                }
            }
        }
    };
    finish(&state.shared, TransportKind::Github, request_bytes, started, disposition)
}

// ============================================================================
// SECTION: Document-Workspace Intake
// ============================================================================

/// Intake endpoint for document-workspace deliveries and handshakes.
async fn notion_intake(
    State(state): State<Arc<NotionState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let request_bytes = body.len();
    let headers = lowercase_headers(&headers);

    let event = match InboundEvent::decode(body, headers) {
        Ok(event) => event,
        Err(error) => {
            return finish(
                &state.shared,
                TransportKind::Notion,
                request_bytes,
                started,
                Disposition::decode_failure(&error),
            );
        }
    };

    if let Err(error) = state.verifier.verify(event.payload()) {
        return finish(
            &state.shared,
            TransportKind::Notion,
            request_bytes,
            started,
            Disposition::verify_failure(&error),
        );
    }

    let disposition = match notion::classify(event.payload()) {
        NotionClassification::Handshake {
            challenge,
        } => {
            let body = challenge.map_or_else(
                || json!({ "ok": true }),
                |challenge| json!({ "challenge": challenge }),
            );
            Disposition {
                status: StatusCode::OK,
                body: ResponseBody::Json(body),
                outcome: RequestOutcome::Ok,
                routing_key: None,
                handled: false,
                error_kind: None,
                error_message: None,
            }
        }
        NotionClassification::Notification {
            key,
            event_type,
        } => {
            let canonical = key.canonical();
            match state.shared.registry.lookup(&canonical) {
                None => Disposition::received(Some(canonical)),
                Some(binding) => {
                    let key = binding.key().canonical();
                    let handler = binding.handler();
                    let ctx = HandlerContext::new(key.clone(), ProviderNamespace::DocEvent)
                        .with_event_type(event_type);
                    let payload = notion::event_data(event.payload());
                    invoke(handler, key, payload, ctx).await
                }
            }
        }
    };
    finish(&state.shared, TransportKind::Notion, request_bytes, started, disposition)
}

// ============================================================================
// SECTION: Handler Invocation
// ============================================================================

/// Awaits one handler invocation and maps the result.
async fn invoke(
    handler: Arc<dyn Handler>,
    key: String,
    payload: Value,
    ctx: HandlerContext,
) -> Disposition {
    match handler.handle(payload, ctx).await {
        Ok(Some(value)) => Disposition {
            status: StatusCode::OK,
            body: ResponseBody::Json(value),
            outcome: RequestOutcome::Ok,
            routing_key: Some(key),
            handled: true,
            error_kind: None,
            error_message: None,
        },
        Ok(None) => Disposition {
            status: StatusCode::OK,
            body: ResponseBody::Json(json!({ "received": true })),
            outcome: RequestOutcome::Ok,
            routing_key: Some(key),
            handled: true,
            error_kind: None,
            error_message: None,
        },
        Err(error) => Disposition {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ResponseBody::Text("Internal Server Error".to_string()),
            outcome: RequestOutcome::Error,
            routing_key: Some(key),
            handled: true,
            error_kind: Some("handler"),
            error_message: Some(error.to_string()),
        },
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts an axum header map into lowercased name/value pairs.
fn lowercase_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Webhook server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors surfaced at startup.
    #[error("config error: {0}")]
    Config(String),
    /// Listener bind errors.
    #[error("bind error: {0}")]
    Bind(String),
    /// Transport serve errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
