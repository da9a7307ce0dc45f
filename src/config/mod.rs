//! Validation configuration for keju.
//!
//! This module defines the ValidationConfig struct that represents
//! `<validation folder>/validation.json`. Keys are read once, with defaults
//! baked in, so the rest of the crate never probes for optional keys.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::ValidationConfig;
pub use types::CONFIG_FILE_NAME;
