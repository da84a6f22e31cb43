// hook-relay-server/src/server/tests.rs
// ============================================================================
// Module: Webhook Server Unit Tests
// Description: Unit tests for response mapping and dispatch helpers.
// Purpose: Validate terminal dispositions with in-memory fixtures.
// Dependencies: hook-relay-core, hook-relay-providers
// ============================================================================

//! ## Overview
//! Exercises the response-mapping helpers directly; full request flows are
//! covered black-box by the system test suites.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use hook_relay_core::DecodeError;
use hook_relay_core::Handler;
use hook_relay_core::HandlerContext;
use hook_relay_core::HandlerError;
use hook_relay_core::ProviderNamespace;
use hook_relay_providers::VerifyError;
use serde_json::Value;
use serde_json::json;

use super::Disposition;
use super::ResponseBody;
use super::invoke;
use super::lowercase_headers;
use crate::telemetry::RequestOutcome;

/// Handler double returning a fixed result.
struct FixedHandler {
    /// Result payload returned on success.
    result: Option<Value>,
    /// Whether the handler fails.
    fail: bool,
}

#[async_trait]
impl Handler for FixedHandler {
    async fn handle(
        &self,
        _payload: Value,
        _ctx: HandlerContext,
    ) -> Result<Option<Value>, HandlerError> {
        if self.fail {
            return Err(HandlerError::Failed("boom".to_string()));
        }
        Ok(self.result.clone())
    }
}

fn sample_ctx() -> HandlerContext {
    HandlerContext::new("code-event:push", ProviderNamespace::CodeEvent)
}

#[test]
fn lowercase_headers_normalizes_names() {
    let mut headers = HeaderMap::new();
    headers.insert("X-GitHub-Event", HeaderValue::from_static("push"));
    headers.insert("X-Hub-Signature-256", HeaderValue::from_static("sha256=ab"));
    let map = lowercase_headers(&headers);
    assert_eq!(map.get("x-github-event").map(String::as_str), Some("push"));
    assert_eq!(map.get("x-hub-signature-256").map(String::as_str), Some("sha256=ab"));
}

#[test]
fn decode_failure_maps_missing_header_to_specific_body() {
    let disposition =
        Disposition::decode_failure(&DecodeError::MissingHeader("X-GitHub-Event".to_string()));
    assert_eq!(disposition.status, StatusCode::BAD_REQUEST);
    let ResponseBody::Text(body) = disposition.body else {
        panic!("expected text body");
    };
    assert_eq!(body, "Missing X-GitHub-Event header");
}

#[test]
fn decode_failure_maps_invalid_json_to_bad_request() {
    let disposition =
        Disposition::decode_failure(&DecodeError::InvalidJson("eof".to_string()));
    assert_eq!(disposition.status, StatusCode::BAD_REQUEST);
    let ResponseBody::Text(body) = disposition.body else {
        panic!("expected text body");
    };
    assert_eq!(body, "Bad Request");
}

#[test]
fn verify_failures_map_to_fixed_unauthorized_bodies() {
    for (error, expected) in [
        (VerifyError::MissingSignature, "Missing signature"),
        (VerifyError::InvalidSignature, "Invalid signature"),
        (VerifyError::Unauthorized, "Unauthorized"),
    ] {
        let disposition = Disposition::verify_failure(&error);
        assert_eq!(disposition.status, StatusCode::UNAUTHORIZED);
        let ResponseBody::Text(body) = disposition.body else {
            panic!("expected text body");
        };
        assert_eq!(body, expected);
    }
}

#[tokio::test]
async fn invoke_maps_handler_value_to_ok_json() {
    let handler = Arc::new(FixedHandler {
        result: Some(json!({ "indexed": 1 })),
        fail: false,
    });
    let disposition =
        invoke(handler, "code-event:push".to_string(), json!({}), sample_ctx()).await;
    assert_eq!(disposition.status, StatusCode::OK);
    assert_eq!(disposition.outcome, RequestOutcome::Ok);
    assert!(disposition.handled);
    let ResponseBody::Json(body) = disposition.body else {
        panic!("expected json body");
    };
    assert_eq!(body, json!({ "indexed": 1 }));
}

#[tokio::test]
async fn invoke_maps_empty_result_to_received_acknowledgment() {
    let handler = Arc::new(FixedHandler {
        result: None,
        fail: false,
    });
    let disposition =
        invoke(handler, "code-event:push".to_string(), json!({}), sample_ctx()).await;
    assert_eq!(disposition.status, StatusCode::OK);
    let ResponseBody::Json(body) = disposition.body else {
        panic!("expected json body");
    };
    assert_eq!(body, json!({ "received": true }));
}

#[tokio::test]
async fn invoke_maps_handler_failure_to_fixed_500_body() {
    let handler = Arc::new(FixedHandler {
        result: None,
        fail: true,
    });
    let disposition =
        invoke(handler, "code-event:push".to_string(), json!({}), sample_ctx()).await;
    assert_eq!(disposition.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(disposition.outcome, RequestOutcome::Error);
    assert_eq!(disposition.error_kind, Some("handler"));
    assert_eq!(disposition.error_message.as_deref(), Some("handler failed: boom"));
    let ResponseBody::Text(body) = disposition.body else {
        panic!("expected text body");
    };
    assert_eq!(body, "Internal Server Error");
}
