//! azsites - Azure App Service management sample
//!
//! Authenticates a service principal against Azure Resource Manager and
//! drives resource groups, App Service plans, sites and certificates
//! through the ARM REST API.

pub mod arm;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod resource;
pub mod scenario;
pub mod utils;
pub mod website;

// Re-export commonly used types
pub use error::{AzsitesError, Result};
