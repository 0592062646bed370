//! Shared utilities for the accrue workspace.

pub mod logging;

pub use logging::{init_logging, LogFormat};
