// hook-relay-providers/src/github.rs
// ============================================================================
// Module: Code-Hosting Provider
// Description: HMAC signature verification and event classification.
// Purpose: Authenticate deliveries and derive compound routing keys.
// Dependencies: hex, hmac, hook-relay-core, sha2
// ============================================================================

//! ## Overview
//! The code-hosting provider signs each delivery with
//! `sha256=hex(HMAC-SHA256(secret, raw_body))` in the `x-hub-signature-256`
//! header. Verification runs over the exact raw bytes before any parsing and
//! compares in constant time. With no secret configured the transport runs
//! in accept-all mode, a deliberately permissive default for local
//! development that the server surfaces at startup.
//!
//! Classification reads the mandatory event-type header, combines it with
//! the payload `action` field into a compound `type.action` key, and keeps
//! the coarse `type` key as fallback. A `ping` delivery short-circuits
//! before the registry is consulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use hmac::Hmac;
use hmac::Mac;
use hook_relay_core::DecodeError;
use hook_relay_core::ProviderNamespace;
use hook_relay_core::RoutingKey;
use serde_json::Value;
use sha2::Sha256;

use crate::verify::VerifyError;
use crate::verify::constant_time_eq;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header naming the delivered event type (mandatory).
pub const EVENT_TYPE_HEADER: &str = "x-github-event";
/// Display form of the event-type header for error messages.
pub const EVENT_TYPE_HEADER_DISPLAY: &str = "X-GitHub-Event";
/// Header carrying the provider delivery identifier.
pub const DELIVERY_ID_HEADER: &str = "x-github-delivery";
/// Header carrying the HMAC signature of the raw body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
/// Event type that short-circuits classification with a fixed response.
pub const PING_EVENT: &str = "ping";

/// HMAC-SHA256 keyed by the shared webhook secret.
type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// SECTION: Signature Verifier
// ============================================================================

/// Verifier for signed code-hosting deliveries.
#[derive(Debug, Clone)]
pub struct GithubVerifier {
    /// Shared HMAC secret; `None` selects accept-all mode.
    secret: Option<String>,
}

impl GithubVerifier {
    /// Creates a verifier; an absent secret selects accept-all mode.
    #[must_use]
    pub const fn new(secret: Option<String>) -> Self {
        Self {
            secret,
        }
    }

    /// Returns true when no secret is configured and all deliveries pass.
    #[must_use]
    pub const fn is_accept_all(&self) -> bool {
        self.secret.is_none()
    }

    /// Verifies a delivery signature over the exact raw body bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::MissingSignature`] when a secret is configured
    /// but no signature header was delivered, and
    /// [`VerifyError::InvalidSignature`] on any mismatch.
    pub fn verify(&self, raw_body: &[u8], signature: Option<&str>) -> Result<(), VerifyError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };
        let Some(signature) = signature else {
            return Err(VerifyError::MissingSignature);
        };
        let expected = sign(secret, raw_body);
        if constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(VerifyError::InvalidSignature)
        }
    }
}

/// Computes the `sha256=`-prefixed hex signature for a body.
#[must_use]
pub fn sign(secret: &str, raw_body: &[u8]) -> String {
    // HMAC-SHA256 accepts keys of any length; construction cannot fail.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(raw_body);
    let digest = mac.finalize().into_bytes();
    format!("sha256={}", hex::encode(digest))
}

// ============================================================================
// SECTION: Event Classification
// ============================================================================

/// Reads the mandatory event-type header.
///
/// # Errors
///
/// Returns [`DecodeError::MissingHeader`] when the header is absent; the
/// transport maps this to a 400-class response before parsing the body.
pub fn event_type(headers: &BTreeMap<String, String>) -> Result<&str, DecodeError> {
    headers
        .get(EVENT_TYPE_HEADER)
        .map(String::as_str)
        .ok_or_else(|| DecodeError::MissingHeader(EVENT_TYPE_HEADER_DISPLAY.to_string()))
}

/// Classification outcome for a code-hosting delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GithubClassification {
    /// Ping delivery answered with a fixed acknowledgment.
    Ping,
    /// Delivery routed through the registry.
    Routed(RoutedEvent),
}

/// Routing candidates derived from a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedEvent {
    /// Compound `type.action` key, or the coarse key when no action exists.
    pub primary: RoutingKey,
    /// Coarse `type`-only fallback key.
    pub fallback: RoutingKey,
    /// Raw event type from the header.
    pub event_type: String,
    /// Provider delivery identifier when present.
    pub delivery_id: Option<String>,
}

/// Classifies a delivery into routing candidates.
#[must_use]
pub fn classify(
    event_type: &str,
    delivery_id: Option<&str>,
    payload: &Value,
) -> GithubClassification {
    if event_type == PING_EVENT {
        return GithubClassification::Ping;
    }
    let action = payload.get("action").and_then(Value::as_str);
    let compound = action.map_or_else(
        || event_type.to_string(),
        |action| format!("{event_type}.{action}"),
    );
    GithubClassification::Routed(RoutedEvent {
        primary: RoutingKey::exact(ProviderNamespace::CodeEvent, compound),
        fallback: RoutingKey::exact(ProviderNamespace::CodeEvent, event_type),
        event_type: event_type.to_string(),
        delivery_id: delivery_id.map(str::to_string),
    })
}

// ============================================================================
// SECTION: Event Catalog
// ============================================================================

/// Well-known code-hosting event kinds with typed key constructors.
///
/// Classification accepts arbitrary event strings; this catalog only offers
/// convenient constructors for the kinds integrations commonly bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GithubEventKind {
    /// Branch push.
    Push,
    /// Any pull request activity.
    PullRequest,
    /// Pull request opened.
    PullRequestOpened,
    /// Pull request closed.
    PullRequestClosed,
    /// Pull request review requested.
    PullRequestReviewRequested,
    /// Pull request review submitted.
    PullRequestReviewSubmitted,
    /// Any issue activity.
    Issues,
    /// Issue opened.
    IssuesOpened,
    /// Issue closed.
    IssuesClosed,
    /// Issue reopened.
    IssuesReopened,
    /// Issue assigned.
    IssuesAssigned,
    /// Issue labeled.
    IssuesLabeled,
    /// Any issue comment activity.
    IssueComment,
    /// Issue comment created.
    IssueCommentCreated,
    /// Issue comment edited.
    IssueCommentEdited,
    /// Issue comment deleted.
    IssueCommentDeleted,
    /// Ref created.
    Create,
    /// Ref deleted.
    Delete,
    /// Repository forked.
    Fork,
    /// Repository starred.
    Star,
    /// Repository watched.
    Watch,
    /// Any release activity.
    Release,
    /// Release published.
    ReleasePublished,
    /// Any workflow run activity.
    WorkflowRun,
    /// Workflow run completed.
    WorkflowRunCompleted,
    /// Any check run activity.
    CheckRun,
    /// Check run completed.
    CheckRunCompleted,
}

impl GithubEventKind {
    /// Returns the flattened trigger string for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::PullRequestOpened => "pull_request.opened",
            Self::PullRequestClosed => "pull_request.closed",
            Self::PullRequestReviewRequested => "pull_request.review_requested",
            Self::PullRequestReviewSubmitted => "pull_request_review.submitted",
            Self::Issues => "issues",
            Self::IssuesOpened => "issues.opened",
            Self::IssuesClosed => "issues.closed",
            Self::IssuesReopened => "issues.reopened",
            Self::IssuesAssigned => "issues.assigned",
            Self::IssuesLabeled => "issues.labeled",
            Self::IssueComment => "issue_comment",
            Self::IssueCommentCreated => "issue_comment.created",
            Self::IssueCommentEdited => "issue_comment.edited",
            Self::IssueCommentDeleted => "issue_comment.deleted",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Fork => "fork",
            Self::Star => "star",
            Self::Watch => "watch",
            Self::Release => "release",
            Self::ReleasePublished => "release.published",
            Self::WorkflowRun => "workflow_run",
            Self::WorkflowRunCompleted => "workflow_run.completed",
            Self::CheckRun => "check_run",
            Self::CheckRunCompleted => "check_run.completed",
        }
    }

    /// Returns the routing key for the kind.
    #[must_use]
    pub fn routing_key(self) -> RoutingKey {
        RoutingKey::exact(ProviderNamespace::CodeEvent, self.as_str())
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

    use hook_relay_core::DecodeError;
    use hook_relay_core::event::normalize_headers;
    use serde_json::json;

    use super::GithubClassification;
    use super::GithubEventKind;
    use super::GithubVerifier;
    use super::classify;
    use super::event_type;
    use super::sign;
    use crate::verify::VerifyError;

    #[test]
    fn sign_matches_known_hmac_sha256_vector() {
        let signature = sign("key", b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            signature,
            "sha256=f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn verify_accepts_matching_signature() {
        let verifier = GithubVerifier::new(Some("s3cret".to_string()));
        let body = br#"{"action":"opened"}"#;
        let signature = sign("s3cret", body);
        assert_eq!(verifier.verify(body, Some(&signature)), Ok(()));
    }

    #[test]
    fn verify_rejects_mutated_body() {
        let verifier = GithubVerifier::new(Some("s3cret".to_string()));
        let signature = sign("s3cret", br#"{"action":"opened"}"#);
        let result = verifier.verify(br#"{"action":"opened!"}"#, Some(&signature));
        assert_eq!(result, Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn verify_rejects_mutated_signature() {
        let verifier = GithubVerifier::new(Some("s3cret".to_string()));
        let body = br#"{"action":"opened"}"#;
        let mut signature = sign("s3cret", body);
        signature.pop();
        signature.push('0');
        assert_eq!(verifier.verify(body, Some(&signature)), Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn verify_requires_signature_when_secret_configured() {
        let verifier = GithubVerifier::new(Some("s3cret".to_string()));
        assert_eq!(verifier.verify(b"{}", None), Err(VerifyError::MissingSignature));
    }

    #[test]
    fn verify_skips_in_accept_all_mode() {
        let verifier = GithubVerifier::new(None);
        assert!(verifier.is_accept_all());
        assert_eq!(verifier.verify(b"{}", None), Ok(()));
        assert_eq!(verifier.verify(b"{}", Some("sha256=bogus")), Ok(()));
    }

    #[test]
    fn event_type_header_is_mandatory() {
        let headers = normalize_headers([("X-GitHub-Event", "push")]);
        assert_eq!(event_type(&headers).unwrap(), "push");
        let empty = normalize_headers::<_, &str, &str>([]);
        assert!(matches!(event_type(&empty), Err(DecodeError::MissingHeader(_))));
    }

    #[test]
    fn ping_short_circuits_classification() {
        assert_eq!(classify("ping", None, &json!({"zen": "ok"})), GithubClassification::Ping);
    }

    #[test]
    fn action_field_builds_compound_primary_key() {
        let classification =
            classify("pull_request", Some("d-1"), &json!({"action": "opened"}));
        let GithubClassification::Routed(routed) = classification else {
            panic!("expected routed classification");
        };
        assert_eq!(routed.primary.canonical(), "code-event:pull_request.opened");
        assert_eq!(routed.fallback.canonical(), "code-event:pull_request");
        assert_eq!(routed.event_type, "pull_request");
        assert_eq!(routed.delivery_id.as_deref(), Some("d-1"));
    }

    #[test]
    fn missing_action_collapses_primary_to_coarse_key() {
        let classification = classify("push", None, &json!({"ref": "refs/heads/main"}));
        let GithubClassification::Routed(routed) = classification else {
            panic!("expected routed classification");
        };
        assert_eq!(routed.primary.canonical(), "code-event:push");
        assert_eq!(routed.fallback.canonical(), "code-event:push");
    }

    #[test]
    fn catalog_kinds_produce_code_event_keys() {
        assert_eq!(
            GithubEventKind::PullRequestOpened.routing_key().canonical(),
            "code-event:pull_request.opened"
        );
        assert_eq!(GithubEventKind::Push.routing_key().canonical(), "code-event:push");
    }
}
