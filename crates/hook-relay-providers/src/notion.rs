// hook-relay-providers/src/notion.rs
// ============================================================================
// Module: Document-Workspace Provider
// Description: Token verification, handshake echo, and event classification.
// Purpose: Disambiguate handshakes from notifications and derive routing keys.
// Dependencies: hook-relay-core, serde_json
// ============================================================================

//! ## Overview
//! The document-workspace provider shares one endpoint between two request
//! shapes: a verification handshake `{verification_token, challenge}` and an
//! event notification `{type, data, verification_token, timestamp}`. A
//! payload is treated as a handshake iff it carries `verification_token` and
//! lacks a `type` field; a notification that happens to carry a
//! `challenge`-named property still routes as a notification.
//!
//! Token verification compares the embedded `verification_token` against the
//! configured constant with ordinary equality. With no token configured the
//! transport runs in accept-all mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hook_relay_core::ProviderNamespace;
use hook_relay_core::RoutingKey;
use serde_json::Value;

use crate::verify::VerifyError;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod document;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Payload field naming the notification event type.
pub const TYPE_FIELD: &str = "type";
/// Payload field carrying the shared verification token.
pub const VERIFICATION_TOKEN_FIELD: &str = "verification_token";
/// Payload field carrying the handshake challenge value.
pub const CHALLENGE_FIELD: &str = "challenge";
/// Payload field carrying the notification event data.
pub const DATA_FIELD: &str = "data";

// ============================================================================
// SECTION: Token Verifier
// ============================================================================

/// Verifier for the shared document-workspace verification token.
#[derive(Debug, Clone)]
pub struct NotionTokenVerifier {
    /// Configured token; `None` selects accept-all mode.
    token: Option<String>,
}

impl NotionTokenVerifier {
    /// Creates a verifier; an absent token selects accept-all mode.
    #[must_use]
    pub const fn new(token: Option<String>) -> Self {
        Self {
            token,
        }
    }

    /// Returns true when no token is configured and all payloads pass.
    #[must_use]
    pub const fn is_accept_all(&self) -> bool {
        self.token.is_none()
    }

    /// Verifies the token embedded in a payload.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Unauthorized`] when a token is configured and
    /// the payload token is absent or different.
    pub fn verify(&self, payload: &Value) -> Result<(), VerifyError> {
        let Some(expected) = self.token.as_deref() else {
            return Ok(());
        };
        let delivered = payload.get(VERIFICATION_TOKEN_FIELD).and_then(Value::as_str);
        if delivered == Some(expected) {
            Ok(())
        } else {
            Err(VerifyError::Unauthorized)
        }
    }
}

// ============================================================================
// SECTION: Event Classification
// ============================================================================

/// Classification outcome for a document-workspace payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionClassification {
    /// Verification handshake answered by echoing the challenge.
    Handshake {
        /// Challenge value to echo back when present.
        challenge: Option<String>,
    },
    /// Event notification routed through the registry.
    Notification {
        /// Routing key derived from the event type.
        key: RoutingKey,
        /// Raw event type from the payload.
        event_type: String,
    },
}

/// Classifies a payload as handshake or notification.
#[must_use]
pub fn classify(payload: &Value) -> NotionClassification {
    if payload.get(VERIFICATION_TOKEN_FIELD).is_some() && payload.get(TYPE_FIELD).is_none() {
        let challenge = payload
            .get(CHALLENGE_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string);
        return NotionClassification::Handshake {
            challenge,
        };
    }
    let event_type = payload
        .get(TYPE_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    NotionClassification::Notification {
        key: RoutingKey::exact(ProviderNamespace::DocEvent, event_type.clone()),
        event_type,
    }
}

/// Extracts the notification event data passed to handlers.
#[must_use]
pub fn event_data(payload: &Value) -> Value {
    payload.get(DATA_FIELD).cloned().unwrap_or(Value::Null)
}

// ============================================================================
// SECTION: Event Catalog
// ============================================================================

/// Well-known document-workspace event kinds with typed key constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotionEventKind {
    /// Page created.
    PageCreated,
    /// Page properties updated.
    PageUpdated,
    /// Page deleted.
    PageDeleted,
    /// Page restored from trash.
    PageRestored,
    /// Database created.
    DatabaseCreated,
    /// Database updated.
    DatabaseUpdated,
    /// Database deleted.
    DatabaseDeleted,
    /// Block created.
    BlockCreated,
    /// Block updated.
    BlockUpdated,
    /// Block deleted.
    BlockDeleted,
    /// Comment created.
    CommentCreated,
    /// Comment updated.
    CommentUpdated,
    /// Comment deleted.
    CommentDeleted,
}

impl NotionEventKind {
    /// Returns the flattened trigger string for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageCreated => "page.created",
            Self::PageUpdated => "page.updated",
            Self::PageDeleted => "page.deleted",
            Self::PageRestored => "page.restored",
            Self::DatabaseCreated => "database.created",
            Self::DatabaseUpdated => "database.updated",
            Self::DatabaseDeleted => "database.deleted",
            Self::BlockCreated => "block.created",
            Self::BlockUpdated => "block.updated",
            Self::BlockDeleted => "block.deleted",
            Self::CommentCreated => "comment.created",
            Self::CommentUpdated => "comment.updated",
            Self::CommentDeleted => "comment.deleted",
        }
    }

    /// Returns the routing key for the kind.
    #[must_use]
    pub fn routing_key(self) -> RoutingKey {
        RoutingKey::exact(ProviderNamespace::DocEvent, self.as_str())
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

    use serde_json::Value;
    use serde_json::json;

    use super::NotionClassification;
    use super::NotionEventKind;
    use super::NotionTokenVerifier;
    use super::classify;
    use super::event_data;
    use crate::verify::VerifyError;

    #[test]
    fn matching_token_passes() {
        let verifier = NotionTokenVerifier::new(Some("tok".to_string()));
        assert_eq!(verifier.verify(&json!({"verification_token": "tok"})), Ok(()));
    }

    #[test]
    fn mismatched_token_is_unauthorized() {
        let verifier = NotionTokenVerifier::new(Some("tok".to_string()));
        assert_eq!(
            verifier.verify(&json!({"verification_token": "other"})),
            Err(VerifyError::Unauthorized)
        );
    }

    #[test]
    fn absent_token_field_is_unauthorized_when_configured() {
        let verifier = NotionTokenVerifier::new(Some("tok".to_string()));
        assert_eq!(verifier.verify(&json!({"type": "page.created"})), Err(VerifyError::Unauthorized));
    }

    #[test]
    fn accept_all_mode_passes_everything() {
        let verifier = NotionTokenVerifier::new(None);
        assert!(verifier.is_accept_all());
        assert_eq!(verifier.verify(&json!({})), Ok(()));
    }

    #[test]
    fn token_without_type_classifies_as_handshake() {
        let classification = classify(&json!({
            "verification_token": "tok",
            "challenge": "abc123"
        }));
        assert_eq!(
            classification,
            NotionClassification::Handshake {
                challenge: Some("abc123".to_string()),
            }
        );
    }

    #[test]
    fn handshake_challenge_is_optional() {
        let classification = classify(&json!({ "verification_token": "tok" }));
        assert_eq!(
            classification,
            NotionClassification::Handshake {
                challenge: None,
            }
        );
    }

    #[test]
    fn typed_payload_classifies_as_notification_even_with_challenge_property() {
        let classification = classify(&json!({
            "type": "page.updated",
            "verification_token": "tok",
            "challenge": "custom-property",
            "data": { "id": "p-1" }
        }));
        let NotionClassification::Notification {
            key,
            event_type,
        } = classification
        else {
            panic!("expected notification classification");
        };
        assert_eq!(key.canonical(), "doc-event:page.updated");
        assert_eq!(event_type, "page.updated");
    }

    #[test]
    fn event_data_defaults_to_null() {
        assert_eq!(event_data(&json!({"type": "page.created"})), Value::Null);
        assert_eq!(
            event_data(&json!({"type": "page.created", "data": {"id": "p-1"}})),
            json!({"id": "p-1"})
        );
    }

    #[test]
    fn catalog_kinds_produce_doc_event_keys() {
        assert_eq!(NotionEventKind::PageCreated.routing_key().canonical(), "doc-event:page.created");
        assert_eq!(
            NotionEventKind::CommentDeleted.routing_key().canonical(),
            "doc-event:comment.deleted"
        );
    }
}
