//! Configuration management module
//!
//! This module handles configuration loading, validation, and persistence
//! from command-line arguments, environment variables, configuration files
//! and default values.

pub mod environment;
pub mod settings;

pub use environment::*;
pub use settings::*;
