//! CLI command implementations.

pub mod config;
pub mod locate;
pub mod status;
pub mod watch;
