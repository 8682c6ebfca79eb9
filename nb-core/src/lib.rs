pub mod command_stream;
pub mod error;
pub mod inventory;
pub mod os_release;
pub mod output_macros;

// Re-export inventory types for convenience
pub use command_stream::{is_tool_installed, CommandRunner, CommandSpec, DuctRunner};
pub use error::{BuildError, Result};
pub use inventory::{HostResources, ProcInventory, SystemInventory};
pub use os_release::OsRelease;

#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
