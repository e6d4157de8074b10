//! StrokeLab Common Utilities
//!
//! Shared infrastructure for all StrokeLab crates:
//! - Error types and result aliases
//! - Clock utilities for frame-sequential state
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
