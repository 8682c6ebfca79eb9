use super::swap::ensure_swap;
use super::AppContext;
use anyhow::{Context, Result};
use nb_build::{
    apply_patches, fetch_source, verify_installation, BuildInvoker, BuildRequest, PatchStatus,
    ToolchainBuildInvoker,
};
use nb_core::{nb_info, nb_progress, nb_success};
use nb_host::{expose, Toolchain};
use std::time::Instant;
use tracing::info;

/// OS check, plan, swap, toolchain, fetch, patch, build, expose, verify.
///
/// Each step is idempotent, so a failed run can simply be repeated.
pub fn handle_install(ctx: &AppContext, skip_toolchain: bool, skip_verify: bool) -> Result<()> {
    let started = Instant::now();
    let config = &ctx.config;

    let os = ctx.check_os(true)?;
    nb_info!("Host: {}", os.display_name());

    let plan = ctx.plan()?;
    nb_info!(
        "Plan: {} job(s), {}, {} MiB swap to add",
        plan.job_count,
        plan.optimization_profile,
        plan.swap_to_add_mib
    );
    ensure_swap(ctx, &plan)?;

    let toolchain = Toolchain::new(config.toolchain.clone(), ctx.runner.clone());
    if skip_toolchain || !config.toolchain.install {
        nb_info!("Skipping toolchain installation");
    } else {
        nb_progress!("Installing SCL toolchain");
        toolchain
            .install()
            .context("Failed to install the SCL toolchain")?;
    }
    let scl = toolchain.verify()?;
    nb_success!("Toolchain ready: {}", config.toolchain.collections().join(", "));

    nb_progress!("Fetching Node.js v{}", config.node.version);
    let source_dir = fetch_source(&config.node)
        .with_context(|| format!("Failed to fetch {}", config.node.tarball_url()))?;

    let statuses = apply_patches(&source_dir, &config.patches)?;
    let applied = statuses
        .iter()
        .filter(|s| matches!(s, PatchStatus::Applied { .. }))
        .count();
    nb_success!(
        "Source patched ({} applied, {} already in place)",
        applied,
        statuses.len() - applied
    );

    nb_progress!(
        "Building with {} job(s) at {}; this takes hours on small hosts",
        plan.job_count,
        plan.optimization_profile
    );
    let request = BuildRequest::from_plan(&plan, source_dir, config.node.prefix.clone());
    ToolchainBuildInvoker::new(ctx.runner.clone(), scl).build(&request)?;
    nb_success!("Installed into {}", config.node.prefix.display());

    let links = expose(&config.exposure, &config.node.prefix)?;
    nb_success!(
        "Linked {} binaries into {}",
        links.len(),
        config.exposure.link_dir.display()
    );

    if skip_verify {
        nb_info!("Skipping verification");
    } else {
        let version =
            verify_installation(ctx.runner.as_ref(), &config.node.prefix, &config.node.version)?;
        nb_success!("node {} verified", version);
    }

    info!(elapsed_secs = started.elapsed().as_secs(), "install finished");
    Ok(())
}
