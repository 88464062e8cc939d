//! Utility modules

pub mod logger;

pub use logger::{init_logging, LogGuards, LOG_TARGETS};
