// hook-relay-handlers/src/forward.rs
// ============================================================================
// Module: Forward Handler
// Description: Delivers routed events to the companion search service.
// Purpose: Index normalized documents and forward raw events upstream.
// Dependencies: hook-relay-core, hook-relay-providers, reqwest, url
// ============================================================================

//! ## Overview
//! `ForwardHandler` bridges routed events to the upstream indexing service.
//! Document modes normalize the event data first and skip documents with no
//! extractable content; indexing failures surface as `{"success": false}`
//! so the provider still receives its 2xx acknowledgment. Raw mode
//! propagates transport failures as handler errors.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use hook_relay_core::Handler;
use hook_relay_core::HandlerContext;
use hook_relay_core::HandlerError;
use hook_relay_providers::NormalizedDocument;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Request timeout for upstream calls.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Forward Modes
// ============================================================================

/// Delivery mode for a forward handler binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMode {
    /// POST the raw event payload to `{base}/events`.
    Raw,
    /// Normalize document data and POST it to `{base}/index`.
    IndexDocument,
    /// DELETE the document at `{base}/index/{id}`.
    DeleteDocument,
}

// ============================================================================
// SECTION: Forward Handler
// ============================================================================

/// Handler forwarding events to the upstream service.
pub struct ForwardHandler {
    /// HTTP client for upstream calls.
    client: reqwest::Client,
    /// Upstream base URL without trailing slash.
    base: String,
    /// Delivery mode.
    mode: ForwardMode,
}

impl ForwardHandler {
    /// Creates a forward handler for the given upstream base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ForwardError`] when the base URL is invalid or the HTTP
    /// client cannot be constructed.
    pub fn new(base_url: &str, mode: ForwardMode) -> Result<Self, ForwardError> {
        let url =
            Url::parse(base_url).map_err(|err| ForwardError::BaseUrl(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(ForwardError::BaseUrl(format!("unsupported scheme: {scheme}"))),
        }
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|err| ForwardError::Client(err.to_string()))?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            mode,
        })
    }

    /// Forwards a raw payload, failing the invocation on transport errors.
    async fn forward_raw(&self, payload: Value) -> Result<Option<Value>, HandlerError> {
        let response = self
            .client
            .post(format!("{}/events", self.base))
            .json(&payload)
            .send()
            .await
            .map_err(|err| HandlerError::Upstream(err.to_string()))?;
        if !response.status().is_success() {
            return Err(HandlerError::Upstream(format!(
                "upstream status {}",
                response.status()
            )));
        }
        Ok(Some(json!({ "success": true })))
    }

    /// Indexes a normalized document, reporting failure in the result body.
    async fn index_document(&self, payload: &Value) -> Option<Value> {
        let document = NormalizedDocument::from_event_data(payload);
        if !document.has_content() {
            return Some(json!({ "success": true }));
        }
        let delivered = self
            .client
            .post(format!("{}/index", self.base))
            .json(&document.to_payload())
            .send()
            .await
            .is_ok_and(|response| response.status().is_success());
        Some(json!({ "success": delivered }))
    }

    /// Deletes an indexed document, reporting failure in the result body.
    async fn delete_document(&self, payload: &Value) -> Result<Option<Value>, HandlerError> {
        let id = payload
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::Failed("document payload has no id".to_string()))?;
        let delivered = self
            .client
            .delete(format!("{}/index/{id}", self.base))
            .send()
            .await
            .is_ok_and(|response| response.status().is_success());
        Ok(Some(json!({ "success": delivered })))
    }
}

#[async_trait]
impl Handler for ForwardHandler {
    async fn handle(
        &self,
        payload: Value,
        _ctx: HandlerContext,
    ) -> Result<Option<Value>, HandlerError> {
        match self.mode {
            ForwardMode::Raw => self.forward_raw(payload).await,
            ForwardMode::IndexDocument => Ok(self.index_document(&payload).await),
            ForwardMode::DeleteDocument => self.delete_document(&payload).await,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Forward handler construction errors.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The upstream base URL is invalid.
    #[error("invalid upstream base url: {0}")]
    BaseUrl(String),
    /// The HTTP client could not be constructed.
    #[error("http client error: {0}")]
    Client(String),
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
    use std::thread;

    use hook_relay_core::Handler;
    use hook_relay_core::HandlerContext;
    use hook_relay_core::HandlerError;
    use hook_relay_core::ProviderNamespace;
    use serde_json::json;

    use super::ForwardError;
    use super::ForwardHandler;
    use super::ForwardMode;

    /// Captured upstream request line and body.
    type CapturedRequest = (String, String);

    /// Spawns a single-request test server returning the given status.
    fn upstream_stub(status: u16) -> (String, Arc<Mutex<Vec<CapturedRequest>>>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let base = format!("http://{addr}");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let requests = Arc::clone(&captured);
        thread::spawn(move || {
            if let Ok(mut request) = server.recv() {
                let line = format!("{} {}", request.method(), request.url());
                let mut body = String::new();
                let _ = std::io::Read::read_to_string(request.as_reader(), &mut body);
                if let Ok(mut guard) = requests.lock() {
                    guard.push((line, body));
                }
                let _ = request.respond(tiny_http::Response::empty(status));
            }
        });
        (base, captured)
    }

    fn doc_ctx() -> HandlerContext {
        HandlerContext::new("doc-event:page.created", ProviderNamespace::DocEvent)
    }

    #[test]
    fn constructor_rejects_invalid_base_urls() {
        assert!(matches!(
            ForwardHandler::new("not a url", ForwardMode::Raw),
            Err(ForwardError::BaseUrl(_))
        ));
        assert!(matches!(
            ForwardHandler::new("ftp://search.internal", ForwardMode::Raw),
            Err(ForwardError::BaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn index_mode_posts_normalized_document() {
        let (base, captured) = upstream_stub(200);
        let handler = ForwardHandler::new(&base, ForwardMode::IndexDocument).unwrap();
        let payload = json!({
            "id": "p-1",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Spec" }] }
            }
        });

        let result = handler.handle(payload, doc_ctx()).await.unwrap();
        assert_eq!(result, Some(json!({ "success": true })));

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "POST /index");
        assert!(requests[0].1.contains("\"pageId\":\"p-1\""));
        assert!(requests[0].1.contains("Name: Spec"));
    }

    #[tokio::test]
    async fn index_mode_skips_documents_without_content() {
        let handler =
            ForwardHandler::new("http://127.0.0.1:9", ForwardMode::IndexDocument).unwrap();
        let result = handler
            .handle(json!({ "id": "p-1", "properties": {} }), doc_ctx())
            .await
            .unwrap();
        // No upstream call happens, so the unreachable base does not matter.
        assert_eq!(result, Some(json!({ "success": true })));
    }

    #[tokio::test]
    async fn index_mode_reports_upstream_failure_in_result_body() {
        let (base, _captured) = upstream_stub(503);
        let handler = ForwardHandler::new(&base, ForwardMode::IndexDocument).unwrap();
        let payload = json!({
            "id": "p-1",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Spec" }] }
            }
        });
        let result = handler.handle(payload, doc_ctx()).await.unwrap();
        assert_eq!(result, Some(json!({ "success": false })));
    }

    #[tokio::test]
    async fn delete_mode_targets_the_document_id() {
        let (base, captured) = upstream_stub(200);
        let handler = ForwardHandler::new(&base, ForwardMode::DeleteDocument).unwrap();
        let result = handler.handle(json!({ "id": "p-9" }), doc_ctx()).await.unwrap();
        assert_eq!(result, Some(json!({ "success": true })));

        let requests = captured.lock().unwrap();
        assert_eq!(requests[0].0, "DELETE /index/p-9");
    }

    #[tokio::test]
    async fn delete_mode_requires_a_document_id() {
        let handler =
            ForwardHandler::new("http://127.0.0.1:9", ForwardMode::DeleteDocument).unwrap();
        let result = handler.handle(json!({}), doc_ctx()).await;
        assert!(matches!(result, Err(HandlerError::Failed(_))));
    }

    #[tokio::test]
    async fn raw_mode_propagates_upstream_status_failures() {
        let (base, _captured) = upstream_stub(500);
        let handler = ForwardHandler::new(&base, ForwardMode::Raw).unwrap();
        let result = handler.handle(json!({ "ref": "refs/heads/main" }), doc_ctx()).await;
        assert!(matches!(result, Err(HandlerError::Upstream(_))));
    }

    #[tokio::test]
    async fn raw_mode_acknowledges_success() {
        let (base, captured) = upstream_stub(200);
        let handler = ForwardHandler::new(&base, ForwardMode::Raw).unwrap();
        let result = handler.handle(json!({ "ref": "refs/heads/main" }), doc_ctx()).await.unwrap();
        assert_eq!(result, Some(json!({ "success": true })));
        assert_eq!(captured.lock().unwrap()[0].0, "POST /events");
    }
}
