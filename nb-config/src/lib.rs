//! Configuration for nodebuild.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, `NODEBUILD_*`
//! environment variables, command-line flags.

pub mod config;
pub mod loader;
pub mod overrides;

pub use config::{
    default_patches, BuildConfig, ExposureSettings, InventorySettings, NodeSettings, PatchRule,
    SwapSettings, ToolchainSettings,
};
pub use loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use overrides::Overrides;
