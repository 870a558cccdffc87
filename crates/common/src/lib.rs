//! Shared value types and the configuration error taxonomy.
//!
//! # Invariants
//! - Invalid parameters are rejected at construction, never silently clamped.
//! - Colours are linear RGB with components in [0, 1].

mod error;
mod types;

pub use error::{ConfigError, ensure_finite, ensure_positive};
pub use types::Rgb;
