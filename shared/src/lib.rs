//! Shared types and models for the Labelworks platform
//!
//! This crate contains the domain models and the pure inventory
//! reconciliation logic used by the backend.

pub mod models;
pub mod reconciliation;
pub mod types;
pub mod validation;

pub use models::*;
pub use reconciliation::*;
pub use types::*;
pub use validation::*;
