//! App Service management module
//!
//! Hosting plans, sites, site configuration and certificates under the
//! Microsoft.Web resource provider.

pub mod models;
pub mod operations;

pub use models::*;
pub use operations::*;
