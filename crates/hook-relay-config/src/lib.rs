// hook-relay-config/src/lib.rs
// ============================================================================
// Module: Hook Relay Config Library
// Description: Canonical config model and validation for Hook Relay.
// Purpose: Single source of truth for hook-relay.toml semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `hook-relay-config` defines the canonical configuration model for the
//! webhook transports. It provides strict, fail-closed validation: a config
//! that parses but violates a limit is rejected at load time, never at
//! request time.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
