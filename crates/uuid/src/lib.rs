//! Resource identifier utilities.
//!
//! Every resource placed in an IPS document bundle needs an identifier that is unique within
//! the bundle and never reused across conversions. The same value appears twice on the wire:
//! as the resource `id` and inside the entry's `fullUrl` (`urn:uuid:<id>`).
//!
//! This crate provides:
//! - A small wrapper type ([`ResourceId`]) that *guarantees* the canonical format once
//!   constructed.
//! - A generator seam ([`IdGenerator`]) so the bundle assembler never reaches for a
//!   process-wide random source directly.
//!
//! ## Canonical form
//! - Hyphenated, lowercase, 36 characters (RFC 4122 layout)
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().hyphenated().to_string()`.
//! - [`ResourceId::parse`] rejects uppercase, simple (unhyphenated) and braced forms so that a
//!   reference string and the `id` it points at always compare byte-for-byte.
//!
//! ## Concurrency
//! [`RandomIdGenerator`] is stateless; randomness comes from the operating system CSPRNG via
//! the `uuid` crate, which is safe to call from any number of threads.

mod service;

// Re-export public types
pub use service::{IdGenerator, RandomIdGenerator, ResourceId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
