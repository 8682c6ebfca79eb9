// CLI argument parsing and definitions

use clap::{Parser, Subcommand};
use nb_config::overrides::{parse_jobs, parse_opt_level, parse_swap_gib};
use nb_config::Overrides;
use nb_core::error::Result;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "nodebuild")]
#[command(about = "Build Node.js from source on memory-constrained EL7 hosts")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a configuration file (default: /etc/nodebuild.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Parallel compile jobs, bypassing the planner
    #[arg(long, global = true, value_name = "N")]
    pub jobs: Option<String>,

    /// Swap to provision in GiB, bypassing the planner's target
    #[arg(long, global = true, value_name = "GIB")]
    pub swap_gib: Option<String>,

    /// Optimization profile: O0, O1 or O2
    #[arg(long, global = true, value_name = "LEVEL")]
    pub opt_level: Option<String>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Args {
    /// Overrides given on the command line. Validated like their
    /// environment counterparts and named after the flag on error.
    pub fn overrides(&self) -> Result<Overrides> {
        Ok(Overrides {
            jobs: self
                .jobs
                .as_deref()
                .map(|v| parse_jobs("--jobs", v))
                .transpose()?,
            swap_gib: self
                .swap_gib
                .as_deref()
                .map(|v| parse_swap_gib("--swap-gib", v))
                .transpose()?,
            opt_level: self
                .opt_level
                .as_deref()
                .map(|v| parse_opt_level("--opt-level", v))
                .transpose()?,
            verbose: self.verbose,
        })
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Inspect the host and print the build plan
    Plan {
        /// Print the plan as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Provision the swap file the plan calls for
    Swap,
    /// Run the full pipeline: swap, toolchain, fetch, patch, build, expose, verify
    Install {
        /// Do not install SCL packages; they must already be present
        #[arg(long)]
        skip_toolchain: bool,
        /// Skip the final `node --version` check
        #[arg(long)]
        skip_verify: bool,
    },
    /// Check that the installed node reports the configured version
    Verify,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigSubcommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration as YAML
    Show,
}
