// hook-relay-core/src/registry.rs
// ============================================================================
// Module: Hook Relay Pattern Registry
// Description: Read-only registry mapping routing keys to handler bindings.
// Purpose: Resolve inbound events to handlers by exact key or pattern scan.
// Dependencies: crate::{handler, routing}
// ============================================================================

//! ## Overview
//! The registry is populated once during single-threaded startup through
//! [`RegistryBuilder`] and is read-only afterwards, so concurrent dispatch
//! needs no locking. Duplicate registration of a flattened key is
//! deterministic: the last registration wins. A miss is a normal outcome,
//! not an error; callers branch on the `Option` result.
//!
//! Invariants:
//! - At most one binding per flattened key.
//! - Pattern-fallback scans visit bindings in insertion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::handler::Handler;
use crate::routing::ProviderNamespace;
use crate::routing::RoutingKey;
use crate::routing::RoutingKeyError;
use crate::routing::Trigger;

// ============================================================================
// SECTION: Handler Binding
// ============================================================================

/// Static association between a routing key and a handler.
#[derive(Clone)]
pub struct HandlerBinding {
    /// Routing key the handler matches.
    key: RoutingKey,
    /// Handler invoked for matching events.
    handler: Arc<dyn Handler>,
}

impl HandlerBinding {
    /// Creates a binding from a key and a handler.
    #[must_use]
    pub const fn new(key: RoutingKey, handler: Arc<dyn Handler>) -> Self {
        Self {
            key,
            handler,
        }
    }

    /// Returns the routing key of the binding.
    #[must_use]
    pub const fn key(&self) -> &RoutingKey {
        &self.key
    }

    /// Returns the handler of the binding.
    #[must_use]
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }
}

// ============================================================================
// SECTION: Registry Builder
// ============================================================================

/// Builder collecting handler bindings during startup.
#[derive(Default)]
pub struct RegistryBuilder {
    /// Bindings in insertion order.
    bindings: Vec<HandlerBinding>,
    /// Index from flattened key to binding position.
    index: BTreeMap<String, usize>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding; a duplicate flattened key replaces the earlier
    /// handler (last registration wins).
    #[must_use]
    pub fn register(mut self, key: RoutingKey, handler: Arc<dyn Handler>) -> Self {
        let canonical = key.canonical();
        let binding = HandlerBinding::new(key, handler);
        if let Some(position) = self.index.get(&canonical) {
            self.bindings[*position] = binding;
        } else {
            self.index.insert(canonical, self.bindings.len());
            self.bindings.push(binding);
        }
        self
    }

    /// Registers a binding from a flattened key string.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingKeyError`] when the flattened key is invalid; the
    /// caller is expected to log the rejection and continue.
    pub fn register_flat(
        self,
        raw: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<Self, RoutingKeyError> {
        let key = RoutingKey::parse(raw)?;
        Ok(self.register(key, handler))
    }

    /// Freezes the builder into a read-only registry.
    #[must_use]
    pub fn build(self) -> PatternRegistry {
        PatternRegistry {
            bindings: self.bindings,
            index: self.index,
        }
    }
}

// ============================================================================
// SECTION: Pattern Registry
// ============================================================================

/// Read-only registry of handler bindings.
pub struct PatternRegistry {
    /// Bindings in insertion order.
    bindings: Vec<HandlerBinding>,
    /// Index from flattened key to binding position.
    index: BTreeMap<String, usize>,
}

impl PatternRegistry {
    /// Looks up a binding by flattened key.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&HandlerBinding> {
        self.index.get(key).map(|position| &self.bindings[*position])
    }

    /// Looks up a binding by routing key.
    #[must_use]
    pub fn lookup_key(&self, key: &RoutingKey) -> Option<&HandlerBinding> {
        self.lookup(&key.canonical())
    }

    /// Looks up a binding by exact candidate, falling back to a scan of
    /// same-namespace pattern triggers matched against the candidate trigger.
    #[must_use]
    pub fn lookup_with_regex_fallback(
        &self,
        namespace: ProviderNamespace,
        candidate_exact: &str,
        candidate_trigger: &str,
    ) -> Option<&HandlerBinding> {
        let exact = format!("{}:{candidate_exact}", namespace.as_str());
        if let Some(binding) = self.lookup(&exact) {
            return Some(binding);
        }
        self.bindings.iter().find(|binding| {
            binding.key().namespace() == namespace
                && matches!(binding.key().trigger(), Trigger::Pattern(_))
                && binding.key().trigger().matches(candidate_trigger)
        })
    }

    /// Returns all bindings in insertion order.
    pub fn bindings(&self) -> impl Iterator<Item = &HandlerBinding> {
        self.bindings.iter()
    }

    /// Returns the flattened keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.bindings.iter().map(|binding| binding.key().canonical())
    }

    /// Returns the number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true when no bindings are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
