//! Utility module with helper functions
//!
//! This module provides:
//! - Configuration handling
//! - Logging setup

mod config;
mod logging;

pub use config::{ContrastiveConfig, LossConfig, PenaltyConfig};
pub use logging::setup_logging;
