//! Authentication module for Azure Resource Manager
//!
//! This module obtains service-principal tokens through azure_identity and
//! wraps them, together with the target subscription, into the credential
//! every management call is made with.

pub mod credential;
pub mod provider;

pub use credential::*;
pub use provider::*;
