// hook-relay-providers/src/verify.rs
// ============================================================================
// Module: Verification Primitives
// Description: Shared authenticity errors and constant-time comparisons.
// Purpose: Provide side-channel resistant helpers for webhook verification.
// Dependencies: subtle, thiserror
// ============================================================================

//! ## Overview
//! Authenticity failures share one error type across providers so the
//! transport can map them uniformly onto 401 responses. Comparisons over
//! secret material run in constant time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Webhook authenticity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// A signature header was required but absent.
    #[error("Missing signature")]
    MissingSignature,
    /// The delivered signature did not match the expected digest.
    #[error("Invalid signature")]
    InvalidSignature,
    /// The shared verification token did not match.
    #[error("Unauthorized")]
    Unauthorized,
}

// ============================================================================
// SECTION: Constant-Time Comparisons
// ============================================================================

/// Compares two byte slices in constant time.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        reason = "Test-only panic-based assertions."
    )]

    use super::constant_time_eq;

    #[test]
    fn equal_slices_compare_equal() {
        assert!(constant_time_eq(b"sha256=abc", b"sha256=abc"));
    }

    #[test]
    fn differing_lengths_compare_unequal() {
        assert!(!constant_time_eq(b"sha256=abc", b"sha256=abcd"));
    }

    #[test]
    fn differing_bytes_compare_unequal() {
        assert!(!constant_time_eq(b"sha256=abc", b"sha256=abd"));
    }
}
