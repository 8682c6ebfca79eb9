use super::AppContext;
use anyhow::{Context, Result};
use nb_core::{nb_info, nb_progress, nb_success};
use nb_host::{FileSwapManager, SwapManager, SwapOutcome};
use nb_planner::BuildResourcePlan;

/// Provision swap for `plan`, if it asks for any.
pub fn ensure_swap(ctx: &AppContext, plan: &BuildResourcePlan) -> Result<()> {
    let Some(request) = plan.swap_request(&ctx.config.swap.path) else {
        nb_info!("No additional swap needed");
        return Ok(());
    };

    nb_progress!(
        "Provisioning {} MiB of swap at {}",
        request.size_mib,
        request.path.display()
    );
    let manager = FileSwapManager::new(ctx.runner.clone(), &ctx.config.swap);
    let outcome = manager
        .ensure(&request)
        .with_context(|| format!("Failed to provision swap at {}", request.path.display()))?;

    match outcome {
        SwapOutcome::AlreadyActive => {
            nb_info!("Swap {} is already active", request.path.display());
        }
        SwapOutcome::Reused => {
            nb_success!("Reused existing swap file {}", request.path.display());
        }
        SwapOutcome::Created { method } => {
            nb_success!("Created swap file {} ({:?})", request.path.display(), method);
        }
    }
    Ok(())
}

pub fn handle_swap(ctx: &AppContext) -> Result<()> {
    ctx.check_os(true)?;
    let plan = ctx.plan()?;
    ensure_swap(ctx, &plan)
}
