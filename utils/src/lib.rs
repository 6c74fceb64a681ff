//! Shared utilities for matric binaries.

pub mod logging;

pub use logging::{init_logging, LogFormat};
