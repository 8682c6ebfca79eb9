//! Resource-aware build planner.
//!
//! Given a [`HostResources`](nb_core::HostResources) snapshot and static
//! [`PlannerSettings`], decides how much swap to provision, how many
//! compile jobs to run and which optimization profile to build with. The
//! planner is a pure function: it reads no environment, spawns nothing and
//! keeps no state between runs.

pub mod jobs;
pub mod plan;
pub mod profile;
pub mod settings;
pub mod swap;

pub use jobs::compute_job_count;
pub use plan::{BuildPlanner, BuildResourcePlan, PlanOverrides, Source};
pub use profile::{select_optimization_profile, OptimizationProfile, PlannerPolicy};
pub use settings::{PlannerSettings, SwapGates};
pub use swap::{compute_swap_requirement, plan_swap, swap_size_bytes, SwapRequest};
