//! Azure Resource Manager access
//!
//! Shared request plumbing for the resource-group and web-site clients.

pub mod client;
pub mod models;

pub use client::*;
pub use models::*;
