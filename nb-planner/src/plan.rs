use crate::jobs::compute_job_count;
use crate::profile::{select_optimization_profile, OptimizationProfile};
use crate::settings::PlannerSettings;
use crate::swap::{plan_swap, SwapRequest};
use nb_core::HostResources;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Whether a plan value was computed or taken from an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Computed,
    Override,
}

/// Explicit per-run overrides. Each one bypasses its computed default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOverrides {
    pub jobs: Option<u32>,
    pub swap_gib: Option<u64>,
    pub opt_level: Option<OptimizationProfile>,
}

/// The resource plan for one build run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResourcePlan {
    pub total_memory_mib: u64,
    pub existing_swap_mib: u64,
    pub cpu_count: u32,
    pub memory_per_job_mib: u64,
    pub swap_to_add_mib: u64,
    pub job_count: u32,
    pub optimization_profile: OptimizationProfile,
    pub swap_source: Source,
    pub job_source: Source,
    pub profile_source: Source,
}

impl BuildResourcePlan {
    pub fn needs_swap(&self) -> bool {
        self.swap_to_add_mib > 0
    }

    /// Swap available to the build once the plan has been applied.
    pub fn effective_swap_mib(&self) -> u64 {
        self.existing_swap_mib.saturating_add(self.swap_to_add_mib)
    }

    /// The request for the swap manager, if this plan adds swap.
    pub fn swap_request(&self, path: &Path) -> Option<SwapRequest> {
        self.needs_swap().then(|| SwapRequest {
            path: path.to_path_buf(),
            size_mib: self.swap_to_add_mib,
            activate: true,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildPlanner {
    settings: PlannerSettings,
}

impl BuildPlanner {
    pub fn new(settings: PlannerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn plan(&self, resources: &HostResources, overrides: &PlanOverrides) -> BuildResourcePlan {
        let s = &self.settings;

        let swap_target_gib = overrides.swap_gib.unwrap_or(s.swap_target_gib);
        let swap_to_add_mib = plan_swap(
            resources.total_memory_mib,
            resources.existing_swap_mib,
            swap_target_gib,
            s.low_memory_threshold_mib,
            s.swap_gates,
        );

        let (job_count, job_source) = match overrides.jobs {
            Some(jobs) => (jobs, Source::Override),
            None => (
                compute_job_count(
                    resources.cpu_count,
                    resources.total_memory_mib,
                    resources.existing_swap_mib.saturating_add(swap_to_add_mib),
                    s.memory_per_job_mib,
                    s.low_memory_threshold_mib,
                    s.hard_cap,
                ),
                Source::Computed,
            ),
        };

        let optimization_profile = select_optimization_profile(
            resources.total_memory_mib,
            overrides.opt_level,
            s.policy,
            s.low_memory_threshold_mib,
        );

        let plan = BuildResourcePlan {
            total_memory_mib: resources.total_memory_mib,
            existing_swap_mib: resources.existing_swap_mib,
            cpu_count: resources.cpu_count,
            memory_per_job_mib: s.memory_per_job_mib,
            swap_to_add_mib,
            job_count,
            optimization_profile,
            swap_source: source_of(overrides.swap_gib.is_some()),
            job_source,
            profile_source: source_of(overrides.opt_level.is_some()),
        };

        debug!(?plan, ?overrides, "computed build resource plan");
        info!(
            jobs = plan.job_count,
            swap_to_add_mib = plan.swap_to_add_mib,
            profile = %plan.optimization_profile,
            "build plan ready"
        );
        plan
    }
}

fn source_of(overridden: bool) -> Source {
    if overridden {
        Source::Override
    } else {
        Source::Computed
    }
}
