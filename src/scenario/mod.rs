//! Scripted resource-management sequence
//!
//! The management context and the steps that run against it.

pub mod context;
pub mod steps;

pub use context::*;
pub use steps::*;
