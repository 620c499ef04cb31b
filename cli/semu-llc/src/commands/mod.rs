//! CLI command implementations.

pub mod config;
pub mod cpus;
pub mod describe;
pub mod machine;
pub mod targets;
