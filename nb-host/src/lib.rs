//! Host provisioning collaborators: swap, compiler toolchain and PATH
//! exposure. Each operation states its own idempotency contract.

pub mod exposure;
pub mod swap;
pub mod toolchain;

pub use exposure::{expose, link_binaries, write_profile_shim};
pub use swap::{AllocationMethod, FileSwapManager, SwapManager, SwapOutcome};
pub use toolchain::{SclEnv, Toolchain};
