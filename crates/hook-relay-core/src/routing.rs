// hook-relay-core/src/routing.rs
// ============================================================================
// Module: Hook Relay Routing Keys
// Description: Canonical routing keys and trigger patterns for event dispatch.
// Purpose: Provide strongly typed keys with a stable flattened string form.
// Dependencies: regex, serde, thiserror
// ============================================================================

//! ## Overview
//! A routing key names the handler that should process an inbound event. It
//! pairs a provider namespace with a trigger, where the trigger is either an
//! exact string or a compiled regular expression. Keys flatten into a single
//! `namespace:trigger` string so the registry can hold both trigger kinds in
//! one map; pattern triggers are marked with a `REGEXP:` prefix in the
//! flattened form and recompiled on parse.
//!
//! Invariants:
//! - A flattened key with an empty trigger segment is invalid.
//! - Single-segment namespaces (`doc-event`, `code-event`) reject triggers
//!   containing further `:` separators.
//! - Invalid keys are reported as errors, never panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Marker prefix identifying a pattern trigger in flattened key form.
pub const REGEXP_MARKER: &str = "REGEXP:";

// ============================================================================
// SECTION: Provider Namespace
// ============================================================================

/// Provider namespace identifying the transport that owns a routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderNamespace {
    /// Chat platform native event subscriptions.
    ChatEvent,
    /// Chat platform message listeners.
    ChatMessage,
    /// Chat platform slash commands.
    ChatCommand,
    /// Chat platform interactive actions.
    ChatAction,
    /// Chat platform global shortcuts.
    ChatShortcut,
    /// Document-workspace change notifications.
    DocEvent,
    /// Code-hosting webhook deliveries.
    CodeEvent,
}

impl ProviderNamespace {
    /// Returns the stable string label for the namespace.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChatEvent => "chat-event",
            Self::ChatMessage => "chat-message",
            Self::ChatCommand => "chat-command",
            Self::ChatAction => "chat-action",
            Self::ChatShortcut => "chat-shortcut",
            Self::DocEvent => "doc-event",
            Self::CodeEvent => "code-event",
        }
    }

    /// Parses a namespace label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "chat-event" => Some(Self::ChatEvent),
            "chat-message" => Some(Self::ChatMessage),
            "chat-command" => Some(Self::ChatCommand),
            "chat-action" => Some(Self::ChatAction),
            "chat-shortcut" => Some(Self::ChatShortcut),
            "doc-event" => Some(Self::DocEvent),
            "code-event" => Some(Self::CodeEvent),
            _ => None,
        }
    }

    /// Returns true when the namespace belongs to the chat platform family.
    #[must_use]
    pub const fn is_chat(self) -> bool {
        matches!(
            self,
            Self::ChatEvent
                | Self::ChatMessage
                | Self::ChatCommand
                | Self::ChatAction
                | Self::ChatShortcut
        )
    }
}

impl fmt::Display for ProviderNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Trigger
// ============================================================================

/// Trigger a handler binding matches against.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Exact string trigger.
    Exact(String),
    /// Compiled regular-expression trigger.
    Pattern(Regex),
}

impl Trigger {
    /// Creates an exact trigger.
    #[must_use]
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Compiles a pattern trigger from a regular-expression source.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingKeyError::InvalidPattern`] when the source does not
    /// compile.
    pub fn pattern(source: &str) -> Result<Self, RoutingKeyError> {
        let regex =
            Regex::new(source).map_err(|err| RoutingKeyError::InvalidPattern(err.to_string()))?;
        Ok(Self::Pattern(regex))
    }

    /// Parses a flattened trigger, honoring the `REGEXP:` marker prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingKeyError::InvalidPattern`] when a marked pattern
    /// source does not compile.
    pub fn parse(raw: &str) -> Result<Self, RoutingKeyError> {
        raw.strip_prefix(REGEXP_MARKER).map_or_else(|| Ok(Self::exact(raw)), Self::pattern)
    }

    /// Returns the exact trigger string when this trigger is exact.
    #[must_use]
    pub fn as_exact(&self) -> Option<&str> {
        match self {
            Self::Exact(value) => Some(value.as_str()),
            Self::Pattern(_) => None,
        }
    }

    /// Returns true when the candidate string matches the trigger.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Exact(value) => value == candidate,
            Self::Pattern(regex) => regex.is_match(candidate),
        }
    }

    /// Returns the flattened string form of the trigger.
    #[must_use]
    pub fn flatten(&self) -> String {
        match self {
            Self::Exact(value) => value.clone(),
            Self::Pattern(regex) => format!("{REGEXP_MARKER}{}", regex.as_str()),
        }
    }
}

impl PartialEq for Trigger {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Trigger {}

// ============================================================================
// SECTION: Routing Key
// ============================================================================

/// Canonical routing key pairing a namespace with a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingKey {
    /// Provider namespace owning the key.
    namespace: ProviderNamespace,
    /// Trigger matched against inbound events.
    trigger: Trigger,
}

impl RoutingKey {
    /// Creates a routing key from parts.
    #[must_use]
    pub const fn new(namespace: ProviderNamespace, trigger: Trigger) -> Self {
        Self {
            namespace,
            trigger,
        }
    }

    /// Creates an exact-trigger routing key.
    #[must_use]
    pub fn exact(namespace: ProviderNamespace, trigger: impl Into<String>) -> Self {
        Self::new(namespace, Trigger::exact(trigger))
    }

    /// Parses a flattened `namespace:trigger` key.
    ///
    /// Single-segment namespaces reject triggers containing further `:`
    /// separators; chat namespaces accept embedded colons only through the
    /// `REGEXP:` marker prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingKeyError`] when the namespace is unknown, the trigger
    /// segment is empty or malformed, or a pattern source does not compile.
    pub fn parse(raw: &str) -> Result<Self, RoutingKeyError> {
        let (label, rest) = raw
            .split_once(':')
            .ok_or_else(|| RoutingKeyError::EmptyTrigger(raw.to_string()))?;
        let namespace = ProviderNamespace::parse(label)
            .ok_or_else(|| RoutingKeyError::UnknownNamespace(label.to_string()))?;
        if rest.is_empty() {
            return Err(RoutingKeyError::EmptyTrigger(raw.to_string()));
        }
        if !namespace.is_chat() && rest.contains(':') {
            return Err(RoutingKeyError::ExtraSegments(raw.to_string()));
        }
        if namespace.is_chat() && !rest.starts_with(REGEXP_MARKER) && rest.contains(':') {
            return Err(RoutingKeyError::ExtraSegments(raw.to_string()));
        }
        let trigger = Trigger::parse(rest)?;
        Ok(Self {
            namespace,
            trigger,
        })
    }

    /// Returns the namespace of the key.
    #[must_use]
    pub const fn namespace(&self) -> ProviderNamespace {
        self.namespace
    }

    /// Returns the trigger of the key.
    #[must_use]
    pub const fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Returns the flattened canonical string form of the key.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.namespace.as_str(), self.trigger.flatten())
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Routing key parse and validation errors.
#[derive(Debug, Error)]
pub enum RoutingKeyError {
    /// The namespace label is not in the closed namespace set.
    #[error("unknown routing namespace: {0}")]
    UnknownNamespace(String),
    /// The key carries no trigger segment after the namespace.
    #[error("routing key has no trigger segment: {0}")]
    EmptyTrigger(String),
    /// The key carries unexpected extra segments after the trigger.
    #[error("routing key has unexpected extra segments: {0}")]
    ExtraSegments(String),
    /// A pattern trigger source failed to compile.
    #[error("invalid pattern trigger: {0}")]
    InvalidPattern(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
