//! Error types shared by every nodebuild crate.
//!
//! Every variant is fatal for a run. Recoverable conditions (for example a
//! failed `fallocate` that falls back to `dd`) are logged where they happen
//! and never reach this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Inventory check '{check}' failed: {reason}")]
    InventoryUnavailable { check: &'static str, reason: String },

    #[error("Unsupported operating system: {0}")]
    UnsupportedOs(String),

    #[error("Required tool not found: {0}")]
    ToolMissing(String),

    #[error("Invalid value '{value}' for override {name}")]
    InvalidOverride { name: &'static str, value: String },

    #[error("Swap allocation failed: {0}")]
    SwapAllocation(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Patch failed: {0}")]
    Patch(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub fn inventory(check: &'static str, reason: impl Into<String>) -> Self {
        BuildError::InventoryUnavailable {
            check,
            reason: reason.into(),
        }
    }

    /// Short remediation hint shown under the diagnostic, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            BuildError::InventoryUnavailable { .. } => {
                Some("Check that /proc is mounted and readable by this user")
            }
            BuildError::UnsupportedOs(_) => {
                Some("Set inventory.allow_unsupported_os: true to build anyway")
            }
            BuildError::ToolMissing(_) => {
                Some("Run without --skip-toolchain so the SCL packages get installed")
            }
            BuildError::InvalidOverride { .. } => {
                Some("Jobs and swap size must be positive integers; opt level is O0, O1 or O2")
            }
            BuildError::SwapAllocation(_) => {
                Some("Free disk space for the swap file or set NODEBUILD_SWAP_GIB lower")
            }
            BuildError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Some("Swap, toolchain and profile steps must run as root")
            }
            _ => None,
        }
    }
}

impl From<serde_yaml_ng::Error> for BuildError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        BuildError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(err: serde_json::Error) -> Self {
        BuildError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
