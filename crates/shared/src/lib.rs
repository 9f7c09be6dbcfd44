//! # featgate Shared
//!
//! Common types used across the featgate crates: the closed role set,
//! feature definitions, actors, configuration and errors.

pub mod actor;
pub mod config;
pub mod error;
pub mod feature;
pub mod role;

// Re-exports
pub use actor::*;
pub use config::*;
pub use error::*;
pub use feature::*;
pub use role::*;
