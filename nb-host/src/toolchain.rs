//! Software Collections toolchain.
//!
//! EL7 ships gcc 4.8 and Python 2.7; Node.js needs a C++17 compiler and
//! Python 3. Both come from SCL and are used through `scl enable`.

use nb_config::ToolchainSettings;
use nb_core::command_stream::{is_tool_installed, CommandRunner, CommandSpec};
use nb_core::error::{BuildError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command prefix that runs a program with the collections enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SclEnv {
    prefix: Vec<String>,
}

impl SclEnv {
    pub fn new(collections: &[String]) -> Self {
        let mut prefix = vec!["scl".to_string(), "enable".to_string()];
        prefix.extend(collections.iter().cloned());
        prefix.push("--".to_string());
        Self { prefix }
    }

    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    pub fn wrap(&self, spec: CommandSpec) -> CommandSpec {
        spec.wrapped_in(&self.prefix)
    }
}

pub struct Toolchain {
    settings: ToolchainSettings,
    runner: Arc<dyn CommandRunner>,
    tool_lookup: fn(&str) -> bool,
}

impl Toolchain {
    pub fn new(settings: ToolchainSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            runner,
            tool_lookup: is_tool_installed,
        }
    }

    /// Replace the PATH lookup used for the `scl` presence check.
    pub fn with_tool_lookup(mut self, lookup: fn(&str) -> bool) -> Self {
        self.tool_lookup = lookup;
        self
    }

    /// Install the SCL repository and the collection packages with yum.
    ///
    /// yum is a no-op for packages already installed, so this is safe to
    /// repeat. A failure names the packages of the failed step.
    pub fn install(&self) -> Result<()> {
        if let Some(release) = &self.settings.release_package {
            info!(package = %release, "enabling Software Collections repository");
            self.yum_install(std::slice::from_ref(release))?;
        }

        let packages = self.settings.packages();
        info!(packages = %packages.join(" "), "installing toolchain collections");
        self.yum_install(&packages)
    }

    fn yum_install(&self, packages: &[String]) -> Result<()> {
        let spec = CommandSpec::new("yum")
            .args(["install", "-y"])
            .args(packages.iter().cloned());
        self.runner.run(&spec).map_err(|e| {
            BuildError::Command(format!("yum could not install {}: {}", packages.join(" "), e))
        })
    }

    fn collection_bin(&self, collection: &str, tool: &str) -> PathBuf {
        self.settings
            .scl_root
            .join(collection)
            .join("root/usr/bin")
            .join(tool)
    }

    /// Confirm every tool the build needs is present.
    pub fn verify(&self) -> Result<SclEnv> {
        if !(self.tool_lookup)("scl") {
            return Err(BuildError::ToolMissing("scl (package scl-utils)".to_string()));
        }

        let devtoolset = self.settings.devtoolset_collection();
        for tool in ["gcc", "g++", "make"] {
            let path = self.collection_bin(&devtoolset, tool);
            if !path.exists() {
                return Err(BuildError::ToolMissing(format!(
                    "{} from {} ({})",
                    tool,
                    devtoolset,
                    path.display()
                )));
            }
        }

        let python_enable = self
            .settings
            .scl_root
            .join(&self.settings.python_collection)
            .join("enable");
        if !python_enable.exists() {
            return Err(BuildError::ToolMissing(format!(
                "python collection {} ({})",
                self.settings.python_collection,
                python_enable.display()
            )));
        }

        info!(collections = %self.settings.collections().join(" "), "toolchain verified");
        Ok(SclEnv::new(&self.settings.collections()))
    }
}
