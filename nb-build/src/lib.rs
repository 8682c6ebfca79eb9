//! Everything between a plan and an installed Node.js: fetching the release
//! tarball, patching it for glibc 2.17, compiling it inside the SCL toolchain
//! and checking the result.

pub mod invoker;
pub mod patch;
pub mod source;
pub mod verify;

pub use invoker::{BuildInvoker, BuildRequest, BuildStep, ToolchainBuildInvoker};
pub use patch::{apply_patch, apply_patches, PatchStatus};
pub use source::{download, extract, fetch_source};
pub use verify::verify_installation;
