use crate::profile::PlannerPolicy;
use serde::{Deserialize, Serialize};

/// Peak resident size of one V8 compile unit under `-O0`, rounded up.
pub const DEFAULT_MEMORY_PER_JOB_MIB: u64 = 1700;
/// Below this much RAM the build runs serially.
pub const DEFAULT_LOW_MEMORY_THRESHOLD_MIB: u64 = 6144;
/// Parallel V8 links can exhaust memory regardless of total throughput.
pub const DEFAULT_HARD_CAP: u32 = 3;
pub const DEFAULT_SWAP_TARGET_GIB: u64 = 8;

/// Two independent gates deciding whether swap gets provisioned.
///
/// Evaluated in order: the threshold gate first, then the active-swap gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwapGates {
    /// Skip provisioning when RAM is at or above the low-memory threshold.
    pub only_below_threshold: bool,
    /// Skip provisioning when any swap is already active.
    pub skip_if_active: bool,
}

impl Default for SwapGates {
    fn default() -> Self {
        Self {
            only_below_threshold: true,
            skip_if_active: true,
        }
    }
}

/// Static planner parameters. Every number is configurable because the
/// hosts this runs on disagree about what is safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerSettings {
    pub memory_per_job_mib: u64,
    pub low_memory_threshold_mib: u64,
    /// `None` leaves parallelism bounded only by CPUs and memory.
    pub hard_cap: Option<u32>,
    pub swap_target_gib: u64,
    pub policy: PlannerPolicy,
    pub swap_gates: SwapGates,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            memory_per_job_mib: DEFAULT_MEMORY_PER_JOB_MIB,
            low_memory_threshold_mib: DEFAULT_LOW_MEMORY_THRESHOLD_MIB,
            hard_cap: Some(DEFAULT_HARD_CAP),
            swap_target_gib: DEFAULT_SWAP_TARGET_GIB,
            policy: PlannerPolicy::default(),
            swap_gates: SwapGates::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings: PlannerSettings =
            serde_yaml_ng::from_str("hard_cap: null\nswap_target_gib: 16\n").unwrap();
        assert_eq!(settings.hard_cap, None);
        assert_eq!(settings.swap_target_gib, 16);
        assert_eq!(settings.memory_per_job_mib, DEFAULT_MEMORY_PER_JOB_MIB);
        assert_eq!(settings.swap_gates, SwapGates::default());
    }

    #[test]
    fn test_policy_and_gates_from_yaml() {
        let settings: PlannerSettings = serde_yaml_ng::from_str(
            "policy: throughput\nswap_gates:\n  only_below_threshold: false\n",
        )
        .unwrap();
        assert_eq!(settings.policy, PlannerPolicy::Throughput);
        assert!(!settings.swap_gates.only_below_threshold);
        assert!(settings.swap_gates.skip_if_active);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<PlannerSettings, _> = serde_yaml_ng::from_str("max_jobs: 4\n");
        assert!(result.is_err());
    }
}
