use crate::settings::SwapGates;
use serde::Serialize;
use std::path::PathBuf;

const MIB_BYTES: u64 = 1024 * 1024;

/// Size of a `gib` swap file in bytes, or `None` if it does not fit a `u64`.
pub fn swap_size_bytes(gib: u64) -> Option<u64> {
    gib.checked_mul(1024)?.checked_mul(MIB_BYTES)
}

/// Swap needed for this run, or 0 if any swap is already active.
///
/// Never stacks swap files: a second call that sees the first call's swap
/// returns 0.
pub fn compute_swap_requirement(
    _total_memory_mib: u64,
    existing_swap_mib: u64,
    configured_target_gib: u64,
) -> u64 {
    if existing_swap_mib > 0 {
        return 0;
    }
    configured_target_gib.saturating_mul(1024)
}

/// Applies both swap gates in sequence: threshold first, then active swap.
pub fn plan_swap(
    total_memory_mib: u64,
    existing_swap_mib: u64,
    configured_target_gib: u64,
    low_memory_threshold_mib: u64,
    gates: SwapGates,
) -> u64 {
    if gates.only_below_threshold && total_memory_mib >= low_memory_threshold_mib {
        return 0;
    }
    if gates.skip_if_active {
        compute_swap_requirement(total_memory_mib, existing_swap_mib, configured_target_gib)
    } else {
        configured_target_gib.saturating_mul(1024)
    }
}

/// Request handed to the swap manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRequest {
    pub path: PathBuf,
    pub size_mib: u64,
    pub activate: bool,
}
