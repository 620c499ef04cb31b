//! Error types for target registration and machine construction.

use std::path::PathBuf;

use crate::capability::Capability;

/// Errors that can occur while registering targets or building machines.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// A different target is already registered under this name.
    #[error("target '{name}' is already registered")]
    DuplicateRegistration {
        /// The contested registry key.
        name: String,
    },

    /// A downstream subsystem is not implemented for this target.
    #[error("{capability} is not available for target '{target}'")]
    CapabilityUnavailable {
        /// Which subsystem was queried.
        capability: Capability,
        /// Target name.
        target: String,
    },

    /// Malformed or unknown token in a feature string.
    #[error("invalid feature spec '{token}': {reason}")]
    InvalidFeatureSpec {
        /// The offending token.
        token: String,
        /// Why the token was rejected.
        reason: String,
    },

    /// CPU name not present in the target's processor table.
    #[error("unknown CPU '{cpu}' for target '{target}'")]
    UnknownCpu {
        /// The requested CPU name.
        cpu: String,
        /// Target name.
        target: String,
    },

    /// Target triple could not be parsed.
    #[error("invalid target triple '{triple}': {reason}")]
    InvalidTriple {
        /// The raw triple string.
        triple: String,
        /// Description of the problem.
        reason: String,
    },

    /// No target registered under this name.
    #[error("unknown target '{name}'")]
    UnknownTarget {
        /// The requested name.
        name: String,
    },

    /// No registered target accepts the given triple.
    #[error("no registered target matches triple '{triple}'")]
    NoTargetForTriple {
        /// The triple that was looked up.
        triple: String,
    },

    /// Target is registered but has no machine factory.
    #[error("target '{name}' has no target machine factory")]
    NoMachineFactory {
        /// Target name.
        name: String,
    },

    /// A construction option is out of range.
    #[error("invalid option: {detail}")]
    InvalidOption {
        /// Description of the problem.
        detail: String,
    },

    /// Data layout string does not follow the layout grammar.
    #[error("invalid data layout spec '{spec}': {reason}")]
    InvalidDataLayout {
        /// The offending specification component.
        spec: String,
        /// Description of the problem.
        reason: String,
    },

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error reading/writing machine configuration files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Machine configuration file not found.
    #[error("machine config not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
