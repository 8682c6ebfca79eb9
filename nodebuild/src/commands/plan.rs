use super::AppContext;
use anyhow::Result;
use colored::Colorize;
use nb_core::{nb_info, nb_println};
use nb_planner::{BuildResourcePlan, Source};

fn source_tag(source: Source) -> String {
    match source {
        Source::Computed => "computed".dimmed().to_string(),
        Source::Override => "override".yellow().to_string(),
    }
}

/// Human-readable rendering of a plan.
pub fn render(plan: &BuildResourcePlan) -> Vec<String> {
    let row = |label: &str, value: String, tag: Option<Source>| {
        let tag = tag.map(|s| format!("  ({})", source_tag(s))).unwrap_or_default();
        format!("  {} {}{}", format!("{:<22}", label).bold(), value.cyan(), tag)
    };

    vec![
        row("Memory", format!("{} MiB", plan.total_memory_mib), None),
        row("Existing swap", format!("{} MiB", plan.existing_swap_mib), None),
        row("CPUs", plan.cpu_count.to_string(), None),
        row(
            "Swap to add",
            format!("{} MiB", plan.swap_to_add_mib),
            Some(plan.swap_source),
        ),
        row(
            "Memory per job",
            format!("{} MiB", plan.memory_per_job_mib),
            None,
        ),
        row("Jobs", plan.job_count.to_string(), Some(plan.job_source)),
        row(
            "Optimization",
            format!(
                "{} ({})",
                plan.optimization_profile,
                plan.optimization_profile.cflags()
            ),
            Some(plan.profile_source),
        ),
    ]
}

pub fn handle_plan(ctx: &AppContext, json: bool) -> Result<()> {
    ctx.check_os(false)?;
    let plan = ctx.plan()?;

    if json {
        nb_println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    nb_println!("{}", "Build plan".bold());
    for line in render(&plan) {
        nb_println!("{}", line);
    }
    if !plan.needs_swap() {
        nb_info!("No swap file will be created");
    }
    Ok(())
}
