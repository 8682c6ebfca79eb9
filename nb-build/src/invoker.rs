//! configure / make / make install under the SCL toolchain.

use nb_core::command_stream::{CommandRunner, CommandSpec};
use nb_core::error::{BuildError, Result};
use nb_host::SclEnv;
use nb_planner::{BuildResourcePlan, OptimizationProfile};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// What the build needs from the plan, plus where to build and install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub source_dir: PathBuf,
    pub prefix: PathBuf,
    pub job_count: u32,
    pub profile: OptimizationProfile,
}

impl BuildRequest {
    pub fn from_plan(plan: &BuildResourcePlan, source_dir: PathBuf, prefix: PathBuf) -> Self {
        Self {
            source_dir,
            prefix,
            job_count: plan.job_count,
            profile: plan.optimization_profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Configure,
    Compile,
    Install,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildStep::Configure => "configure",
            BuildStep::Compile => "make",
            BuildStep::Install => "make install",
        })
    }
}

pub trait BuildInvoker {
    fn build(&self, request: &BuildRequest) -> Result<()>;
}

pub struct ToolchainBuildInvoker {
    runner: Arc<dyn CommandRunner>,
    scl: SclEnv,
}

impl ToolchainBuildInvoker {
    pub fn new(runner: Arc<dyn CommandRunner>, scl: SclEnv) -> Self {
        Self { runner, scl }
    }

    fn command(&self, step: BuildStep, request: &BuildRequest) -> CommandSpec {
        let spec = match step {
            BuildStep::Configure => CommandSpec::new("./configure")
                .arg(format!("--prefix={}", request.prefix.display())),
            BuildStep::Compile => CommandSpec::new("make").arg(format!("-j{}", request.job_count)),
            BuildStep::Install => CommandSpec::new("make").arg("install"),
        };
        let flags = request.profile.cflags();
        self.scl.wrap(
            spec.env("CFLAGS", flags)
                .env("CXXFLAGS", flags)
                .env("JOBS", request.job_count.to_string())
                .current_dir(&request.source_dir),
        )
    }
}

impl BuildInvoker for ToolchainBuildInvoker {
    fn build(&self, request: &BuildRequest) -> Result<()> {
        info!(
            source = %request.source_dir.display(),
            prefix = %request.prefix.display(),
            jobs = request.job_count,
            profile = %request.profile,
            "starting build"
        );

        for step in [BuildStep::Configure, BuildStep::Compile, BuildStep::Install] {
            info!(%step, "build step");
            self.runner
                .run(&self.command(step, request))
                .map_err(|e| BuildError::Command(format!("{} failed: {}", step, e)))?;
        }

        info!(prefix = %request.prefix.display(), "build installed");
        Ok(())
    }
}
