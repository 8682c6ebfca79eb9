// Command handlers

use crate::cli::{Args, Command, ConfigSubcommand};
use anyhow::{Context as _, Result};
use nb_config::{BuildConfig, ConfigLoader, Overrides};
use nb_core::command_stream::{CommandRunner, DuctRunner};
use nb_core::error::BuildError;
use nb_core::inventory::{ProcInventory, SystemInventory};
use nb_core::nb_warning;
use nb_core::OsRelease;
use nb_planner::{BuildPlanner, BuildResourcePlan};
use std::sync::Arc;
use tracing::{debug, info};

pub mod config;
pub mod install;
pub mod plan;
pub mod swap;
pub mod verify;

/// Everything a command needs, resolved once per run.
pub struct AppContext {
    pub config: BuildConfig,
    pub overrides: Overrides,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppContext {
    pub fn new(config: BuildConfig, overrides: Overrides) -> Self {
        Self {
            config,
            overrides,
            runner: Arc::new(DuctRunner),
        }
    }

    fn inventory(&self) -> ProcInventory {
        ProcInventory::new(
            &self.config.inventory.proc_root,
            &self.config.inventory.os_release_path,
        )
    }

    /// Read os-release. With `strict`, an unsupported OS is fatal unless the
    /// configuration allows it; otherwise it is only reported.
    pub fn check_os(&self, strict: bool) -> Result<OsRelease> {
        let os = self.inventory().os_release()?;
        if let Err(e) = os.ensure_supported() {
            if strict && !self.config.inventory.allow_unsupported_os {
                return Err(e.into());
            }
            nb_warning!("{}", e);
        }
        info!(os = %os.display_name(), "host operating system");
        Ok(os)
    }

    /// Take the inventory and compute the plan for this run.
    pub fn plan(&self) -> Result<BuildResourcePlan> {
        let resources = self
            .inventory()
            .resources()
            .context("Failed to take host inventory")?;
        debug!(?resources, "host resources");
        let planner = BuildPlanner::new(self.config.planner.clone());
        Ok(planner.plan(&resources, &self.overrides.plan_overrides()))
    }
}

/// Resolve configuration and overrides from `args` and the environment.
pub fn resolve(args: &Args) -> Result<(BuildConfig, Overrides)> {
    let env = Overrides::from_env()?;
    let cli = args.overrides()?;
    let config = ConfigLoader::new().load(args.config.as_deref())?;
    Ok((config, env.merge(cli)))
}

/// Main command dispatcher
#[must_use = "command execution results should be handled"]
pub fn execute_command(command: &Command, ctx: &AppContext) -> Result<()> {
    match command {
        Command::Plan { json } => {
            debug!("Handling plan command with json={}", json);
            plan::handle_plan(ctx, *json)
        }
        Command::Swap => {
            debug!("Handling swap command");
            swap::handle_swap(ctx)
        }
        Command::Install {
            skip_toolchain,
            skip_verify,
        } => {
            debug!("Handling install command");
            install::handle_install(ctx, *skip_toolchain, *skip_verify)
        }
        Command::Verify => {
            debug!("Handling verify command");
            verify::handle_verify(ctx)
        }
        Command::Config { command } => match command {
            ConfigSubcommand::Show => config::handle_show(&ctx.config),
        },
    }
}

/// The hint for the innermost [`BuildError`] in `err`, if any.
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .and_then(BuildError::hint)
}
