//! # nearfield-types
//!
//! Shared types, error definitions, and constants for the nearfield
//! broad-phase proximity library.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other nearfield crates share.

pub mod constants;
pub mod error;

pub use error::{NearfieldError, NearfieldResult};
