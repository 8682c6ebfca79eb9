use nb_core::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compiler flag set trading compile-time memory against runtime speed.
///
/// Debug symbols are always off: they roughly double the memory `ld` needs
/// when linking V8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptimizationProfile {
    O0,
    O1,
    O2,
}

impl OptimizationProfile {
    pub fn cflags(&self) -> &'static str {
        match self {
            OptimizationProfile::O0 => "-O0 -g0",
            OptimizationProfile::O1 => "-O1 -g0",
            OptimizationProfile::O2 => "-O2 -g0",
        }
    }
}

impl fmt::Display for OptimizationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizationProfile::O0 => "O0",
            OptimizationProfile::O1 => "O1",
            OptimizationProfile::O2 => "O2",
        };
        f.write_str(name)
    }
}

impl FromStr for OptimizationProfile {
    type Err = BuildError;

    /// Accepts `O0`/`O1`/`O2` in any case, with or without the leading `-`,
    /// or a bare digit.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().trim_start_matches('-').to_ascii_uppercase();
        match normalized.as_str() {
            "O0" | "0" => Ok(OptimizationProfile::O0),
            "O1" | "1" => Ok(OptimizationProfile::O1),
            "O2" | "2" => Ok(OptimizationProfile::O2),
            _ => Err(BuildError::InvalidOverride {
                name: "opt-level",
                value: s.to_string(),
            }),
        }
    }
}

/// Which default profile the planner picks when nothing is overridden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerPolicy {
    /// Shared hosts: always the lowest-memory profile.
    #[default]
    Constrained,
    /// Hosts with headroom: middle profile when memory is not scarce.
    Throughput,
}

pub fn select_optimization_profile(
    total_memory_mib: u64,
    user_override: Option<OptimizationProfile>,
    policy: PlannerPolicy,
    low_memory_threshold_mib: u64,
) -> OptimizationProfile {
    if let Some(profile) = user_override {
        return profile;
    }
    match policy {
        PlannerPolicy::Constrained => OptimizationProfile::O0,
        PlannerPolicy::Throughput if total_memory_mib >= low_memory_threshold_mib => {
            OptimizationProfile::O1
        }
        PlannerPolicy::Throughput => OptimizationProfile::O0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_common_spellings() {
        assert_eq!("O2".parse::<OptimizationProfile>().unwrap(), OptimizationProfile::O2);
        assert_eq!("o1".parse::<OptimizationProfile>().unwrap(), OptimizationProfile::O1);
        assert_eq!("-O0".parse::<OptimizationProfile>().unwrap(), OptimizationProfile::O0);
        assert_eq!("2".parse::<OptimizationProfile>().unwrap(), OptimizationProfile::O2);
    }

    #[test]
    fn test_parse_rejects_unknown_levels() {
        for bad in ["O3", "Os", "fast", ""] {
            let err = bad.parse::<OptimizationProfile>().unwrap_err();
            assert!(matches!(err, BuildError::InvalidOverride { name: "opt-level", .. }));
        }
    }

    #[test]
    fn test_constrained_policy_defaults_to_o0() {
        assert_eq!(
            select_optimization_profile(65536, None, PlannerPolicy::Constrained, 6144),
            OptimizationProfile::O0
        );
    }

    #[test]
    fn test_throughput_policy_depends_on_memory() {
        assert_eq!(
            select_optimization_profile(16384, None, PlannerPolicy::Throughput, 6144),
            OptimizationProfile::O1
        );
        assert_eq!(
            select_optimization_profile(4096, None, PlannerPolicy::Throughput, 6144),
            OptimizationProfile::O0
        );
    }

    #[test]
    fn test_override_wins_in_every_branch() {
        for policy in [PlannerPolicy::Constrained, PlannerPolicy::Throughput] {
            for memory in [512, 6143, 6144, 131072] {
                assert_eq!(
                    select_optimization_profile(
                        memory,
                        Some(OptimizationProfile::O2),
                        policy,
                        6144
                    ),
                    OptimizationProfile::O2
                );
            }
        }
    }

    #[test]
    fn test_cflags_never_carry_debug_info() {
        for profile in [
            OptimizationProfile::O0,
            OptimizationProfile::O1,
            OptimizationProfile::O2,
        ] {
            assert!(profile.cflags().ends_with("-g0"));
            assert!(profile.cflags().starts_with(&format!("-{}", profile)));
        }
    }
}
