//! Utility functions module
//!
//! Console formatting and HTTP client construction.

pub mod format;
pub mod network;

pub use format::*;
pub use network::*;
