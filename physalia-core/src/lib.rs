//! Shared primitives, traits, and utilities for the Physalia cheminformatics ecosystem.
//!
//! `physalia-core` provides the foundation that the other Physalia crates build on:
//!
//! - **Error types** — [`PhysaliaError`] and [`Result`] for structured error handling
//! - **Traits** — Core abstractions like [`ContentAddressable`], [`Annotated`], [`Summarizable`]
//! - **Bitset words** — Word-level fingerprint bit operations ([`bitvec`])
//! - **Hashing** — FNV-1a for stable fingerprint folding, SHA-256 for content addressing
//! - **Primes** — The hash-prime search used by fingerprint generators
//! - **Memory mapping** — Zero-copy file access (std feature only)

pub mod bitvec;
pub mod error;
pub mod hash;
pub mod prime;
pub mod traits;

#[cfg(feature = "std")]
pub mod mmap;

pub use error::{PhysaliaError, Result};
pub use traits::*;
