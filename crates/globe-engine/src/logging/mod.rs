//! Logging utilities.
//!
//! This module centralizes logger initialization. Engine code logs through the
//! `log` facade only; `env_logger` is installed by the host.

mod init;

pub use init::{LoggingConfig, init_logging};
