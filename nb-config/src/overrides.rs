//! Per-run overrides from the environment and the command line.
//!
//! This is the only place nodebuild reads `NODEBUILD_*` variables. The
//! planner receives the result as an explicit [`PlanOverrides`].

use nb_core::error::{BuildError, Result};
use nb_planner::{swap_size_bytes, OptimizationProfile, PlanOverrides};
use std::env;
use tracing::debug;

pub const ENV_JOBS: &str = "NODEBUILD_JOBS";
pub const ENV_SWAP_GIB: &str = "NODEBUILD_SWAP_GIB";
pub const ENV_OPT_LEVEL: &str = "NODEBUILD_OPT_LEVEL";
pub const ENV_VERBOSE: &str = "NODEBUILD_VERBOSE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub jobs: Option<u32>,
    pub swap_gib: Option<u64>,
    pub opt_level: Option<OptimizationProfile>,
    pub verbose: bool,
}

impl Overrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read overrides through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let overrides = Self {
            jobs: get(ENV_JOBS)
                .map(|v| parse_jobs(ENV_JOBS, &v))
                .transpose()?,
            swap_gib: get(ENV_SWAP_GIB)
                .map(|v| parse_swap_gib(ENV_SWAP_GIB, &v))
                .transpose()?,
            opt_level: get(ENV_OPT_LEVEL)
                .map(|v| parse_opt_level(ENV_OPT_LEVEL, &v))
                .transpose()?,
            verbose: get(ENV_VERBOSE)
                .map(|v| parse_flag(ENV_VERBOSE, &v))
                .transpose()?
                .unwrap_or(false),
        };
        debug!(?overrides, "environment overrides");
        Ok(overrides)
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: Overrides) -> Overrides {
        Overrides {
            jobs: other.jobs.or(self.jobs),
            swap_gib: other.swap_gib.or(self.swap_gib),
            opt_level: other.opt_level.or(self.opt_level),
            verbose: self.verbose || other.verbose,
        }
    }

    pub fn plan_overrides(&self) -> PlanOverrides {
        PlanOverrides {
            jobs: self.jobs,
            swap_gib: self.swap_gib,
            opt_level: self.opt_level,
        }
    }
}

fn invalid(name: &'static str, value: &str) -> BuildError {
    BuildError::InvalidOverride {
        name,
        value: value.to_string(),
    }
}

pub fn parse_jobs(name: &'static str, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(jobs) if jobs > 0 => Ok(jobs),
        _ => Err(invalid(name, value)),
    }
}

pub fn parse_swap_gib(name: &'static str, value: &str) -> Result<u64> {
    match value.trim().parse::<u64>() {
        Ok(gib) if gib > 0 && swap_size_bytes(gib).is_some() => Ok(gib),
        _ => Err(invalid(name, value)),
    }
}

pub fn parse_opt_level(name: &'static str, value: &str) -> Result<OptimizationProfile> {
    value.parse().map_err(|_| invalid(name, value))
}

pub fn parse_flag(name: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_all_overrides_parsed() {
        let overrides = Overrides::from_lookup(lookup(&[
            (ENV_JOBS, "2"),
            (ENV_SWAP_GIB, "16"),
            (ENV_OPT_LEVEL, "o1"),
            (ENV_VERBOSE, "yes"),
        ]))
        .unwrap();
        assert_eq!(
            overrides,
            Overrides {
                jobs: Some(2),
                swap_gib: Some(16),
                opt_level: Some(OptimizationProfile::O1),
                verbose: true,
            }
        );
    }

    #[test]
    fn test_empty_values_are_unset() {
        let overrides = Overrides::from_lookup(lookup(&[(ENV_JOBS, ""), (ENV_OPT_LEVEL, " ")]))
            .unwrap();
        assert_eq!(overrides, Overrides::default());
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        for (key, value) in [
            (ENV_JOBS, "0"),
            (ENV_JOBS, "four"),
            (ENV_SWAP_GIB, "-8"),
            (ENV_SWAP_GIB, "18014398509481984"),
            (ENV_OPT_LEVEL, "O3"),
            (ENV_VERBOSE, "maybe"),
        ] {
            let err = Overrides::from_lookup(lookup(&[(key, value)])).unwrap_err();
            match err {
                BuildError::InvalidOverride { name, value: v } => {
                    assert_eq!(name, key);
                    assert_eq!(v, value);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_largest_addressable_swap_is_accepted() {
        let max_gib = u64::MAX / (1024 * 1024 * 1024);
        assert_eq!(parse_swap_gib(ENV_SWAP_GIB, &max_gib.to_string()).unwrap(), max_gib);
        assert!(parse_swap_gib(ENV_SWAP_GIB, &(max_gib + 1).to_string()).is_err());
    }

    #[test]
    fn test_cli_layer_wins_over_env() {
        let env_layer = Overrides {
            jobs: Some(1),
            swap_gib: Some(4),
            opt_level: None,
            verbose: true,
        };
        let cli_layer = Overrides {
            jobs: Some(3),
            opt_level: Some(OptimizationProfile::O2),
            ..Overrides::default()
        };
        let merged = env_layer.merge(cli_layer);
        assert_eq!(merged.jobs, Some(3));
        assert_eq!(merged.swap_gib, Some(4));
        assert_eq!(merged.opt_level, Some(OptimizationProfile::O2));
        assert!(merged.verbose);
    }
}
