// hook-relay-providers/src/chat.rs
// ============================================================================
// Module: Chat Platform Provider
// Description: Compiles chat routing keys into a native registration plan.
// Purpose: Bind flattened chat triggers to the platform client at startup.
// Dependencies: hook-relay-core
// ============================================================================

//! ## Overview
//! The chat platform dispatches through its own connection-oriented client,
//! so no inbound HTTP verification or per-request classification happens
//! here. Instead, flattened `chat-*` routing keys are reconstructed once at
//! startup into a registration plan: one native registration call per valid
//! binding, with literal or pattern triggers preserved. Malformed bindings
//! are skipped and reported, never fatal.
//!
//! Invariants:
//! - Event and command registrations require literal triggers.
//! - Plan order follows registry insertion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use hook_relay_core::PatternRegistry;
use hook_relay_core::ProviderNamespace;
use hook_relay_core::Trigger;

// ============================================================================
// SECTION: Trigger Kinds
// ============================================================================

/// Native registration kinds offered by the chat platform client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTriggerKind {
    /// Platform event subscription.
    Event,
    /// Message listener.
    Message,
    /// Slash command.
    Command,
    /// Interactive action.
    Action,
    /// Global shortcut.
    Shortcut,
}

impl ChatTriggerKind {
    /// Maps a chat namespace onto its registration kind.
    #[must_use]
    pub const fn from_namespace(namespace: ProviderNamespace) -> Option<Self> {
        match namespace {
            ProviderNamespace::ChatEvent => Some(Self::Event),
            ProviderNamespace::ChatMessage => Some(Self::Message),
            ProviderNamespace::ChatCommand => Some(Self::Command),
            ProviderNamespace::ChatAction => Some(Self::Action),
            ProviderNamespace::ChatShortcut => Some(Self::Shortcut),
            ProviderNamespace::DocEvent | ProviderNamespace::CodeEvent => None,
        }
    }

    /// Returns the stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Message => "message",
            Self::Command => "command",
            Self::Action => "action",
            Self::Shortcut => "shortcut",
        }
    }

    /// Returns true when the kind accepts pattern triggers.
    #[must_use]
    pub const fn accepts_patterns(self) -> bool {
        matches!(self, Self::Message | Self::Action | Self::Shortcut)
    }
}

// ============================================================================
// SECTION: Registration Plan
// ============================================================================

/// One native registration call the chat client should perform.
#[derive(Debug, Clone)]
pub struct ChatRegistration {
    /// Registration kind.
    pub kind: ChatTriggerKind,
    /// Literal or pattern trigger to register.
    pub trigger: Trigger,
    /// Flattened routing key the registration was derived from.
    pub key: String,
}

/// A binding skipped during plan construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRejection {
    /// Flattened routing key of the skipped binding.
    pub key: String,
    /// Human-readable skip reason.
    pub reason: String,
}

/// Registration plan produced once at startup.
#[derive(Debug, Clone, Default)]
pub struct ChatRegistrationPlan {
    /// Valid registrations in registry insertion order.
    pub registrations: Vec<ChatRegistration>,
    /// Skipped bindings with reasons.
    pub rejections: Vec<PlanRejection>,
}

impl ChatRegistrationPlan {
    /// Builds the registration plan from chat bindings in the registry.
    ///
    /// Non-chat bindings are ignored; malformed chat bindings are recorded
    /// as rejections.
    #[must_use]
    pub fn build(registry: &PatternRegistry) -> Self {
        let mut plan = Self::default();
        for binding in registry.bindings() {
            let key = binding.key().canonical();
            let Some(kind) = ChatTriggerKind::from_namespace(binding.key().namespace()) else {
                continue;
            };
            let trigger = binding.key().trigger().clone();
            if matches!(trigger, Trigger::Pattern(_)) && !kind.accepts_patterns() {
                plan.rejections.push(PlanRejection {
                    key,
                    reason: format!(
                        "{} registrations require a literal trigger",
                        kind.as_str()
                    ),
                });
                continue;
            }
            plan.registrations.push(ChatRegistration {
                kind,
                trigger,
                key,
            });
        }
        plan
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
