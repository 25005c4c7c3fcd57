// src/config/mod.rs

//! Configuration loading and validation for outproc.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate profiles and turn them into `RunOptions` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_for_cli, load_from_path};
pub use model::{ConfigFile, Profile, ProfileConfig, RawConfigFile};
pub use validate::{parse_duration, parse_timeout, validate_config};
