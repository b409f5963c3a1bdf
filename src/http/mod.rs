//! HTTP transport module
//!
//! The transport seam used by every management call, with a reqwest-backed
//! implementation and a decorator that records requests and responses.

pub mod logging;
pub mod transport;

pub use logging::*;
pub use transport::*;
