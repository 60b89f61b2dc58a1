//! Shared types, error model, and configuration for pipeviz.
//!
//! This crate is the foundation depended on by all other pipeviz crates.
//! It provides:
//! - [`PipevizError`]: the unified error type
//! - Domain types ([`Resource`], [`ResourceKind`], [`NavNode`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, LoggingConfig, NavConfig, PlantUmlConfig, init_config,
    load_config, load_config_from,
};
pub use error::{PipevizError, Result};
pub use types::{
    DEFAULT_RESOURCE_NAME, Metadata, Nav, NavNode, Resource, ResourceKind, VERSION_LABEL,
    scalar_to_string,
};
