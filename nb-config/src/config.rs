//! The nodebuild configuration file.
//!
//! Every section is optional; anything left out keeps the defaults below,
//! which reproduce the conservative shared-hosting policy.

use nb_core::error::{BuildError, Result};
use nb_planner::{swap_size_bytes, PlannerSettings};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of the YAML configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub node: NodeSettings,
    pub planner: PlannerSettings,
    pub swap: SwapSettings,
    pub toolchain: ToolchainSettings,
    pub patches: Vec<PatchRule>,
    pub exposure: ExposureSettings,
    pub inventory: InventorySettings,

    /// Where this configuration was read from, if anywhere.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Which Node.js release to build and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeSettings {
    pub version: String,
    pub mirror: String,
    pub prefix: PathBuf,
    pub work_dir: PathBuf,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            version: "18.20.4".to_string(),
            mirror: "https://nodejs.org/dist".to_string(),
            prefix: PathBuf::from("/opt/nodejs"),
            work_dir: PathBuf::from("/usr/local/src/nodebuild"),
        }
    }
}

impl NodeSettings {
    pub fn tarball_name(&self) -> String {
        format!("node-v{}.tar.gz", self.version)
    }

    pub fn tarball_url(&self) -> String {
        format!(
            "{}/v{}/{}",
            self.mirror.trim_end_matches('/'),
            self.version,
            self.tarball_name()
        )
    }

    pub fn source_dir(&self) -> PathBuf {
        self.work_dir.join(format!("node-v{}", self.version))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwapSettings {
    pub path: PathBuf,
    pub fstab_path: PathBuf,
    /// Kernel table of active swap areas.
    pub proc_swaps_path: PathBuf,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/swapfile"),
            fstab_path: PathBuf::from("/etc/fstab"),
            proc_swaps_path: PathBuf::from("/proc/swaps"),
        }
    }
}

/// Software Collections providing a modern compiler and Python on EL7.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainSettings {
    /// Install the collections with yum before checking for them.
    pub install: bool,
    /// Package that enables the SCL repository; `null` on hosts where the
    /// repository is already configured (RHEL subscriptions, CloudLinux).
    pub release_package: Option<String>,
    pub devtoolset: u32,
    pub python_collection: String,
    pub scl_root: PathBuf,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            install: true,
            release_package: Some("centos-release-scl".to_string()),
            devtoolset: 11,
            python_collection: "rh-python38".to_string(),
            scl_root: PathBuf::from("/opt/rh"),
        }
    }
}

impl ToolchainSettings {
    pub fn devtoolset_collection(&self) -> String {
        format!("devtoolset-{}", self.devtoolset)
    }

    pub fn collections(&self) -> Vec<String> {
        vec![self.devtoolset_collection(), self.python_collection.clone()]
    }

    /// RPMs providing the compiler, make and Python collections.
    pub fn packages(&self) -> Vec<String> {
        let devtoolset = self.devtoolset_collection();
        vec![
            format!("{}-gcc", devtoolset),
            format!("{}-gcc-c++", devtoolset),
            format!("{}-make", devtoolset),
            self.python_collection.clone(),
        ]
    }
}

/// One text substitution applied to the extracted source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchRule {
    /// Path relative to the source directory.
    pub file: PathBuf,
    /// Regular expression, matched in multi-line mode.
    pub pattern: String,
    pub replacement: String,
}

const ARES_CONFIG: &str = "deps/cares/config/linux/ares_config.h";

/// glibc 2.17 has neither `getrandom(2)` nor `<sys/random.h>`.
pub fn default_patches() -> Vec<PatchRule> {
    vec![
        PatchRule {
            file: PathBuf::from(ARES_CONFIG),
            pattern: r"(?m)^#define HAVE_GETRANDOM 1$".to_string(),
            replacement: "/* #undef HAVE_GETRANDOM */".to_string(),
        },
        PatchRule {
            file: PathBuf::from(ARES_CONFIG),
            pattern: r"(?m)^#define HAVE_SYS_RANDOM_H 1$".to_string(),
            replacement: "/* #undef HAVE_SYS_RANDOM_H */".to_string(),
        },
    ]
}

/// How the installed binaries are made reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExposureSettings {
    pub profile_path: PathBuf,
    pub link_dir: PathBuf,
    pub binaries: Vec<String>,
}

impl Default for ExposureSettings {
    fn default() -> Self {
        Self {
            profile_path: PathBuf::from("/etc/profile.d/nodejs.sh"),
            link_dir: PathBuf::from("/usr/local/bin"),
            binaries: vec!["node".to_string(), "npm".to_string(), "npx".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InventorySettings {
    pub proc_root: PathBuf,
    pub os_release_path: PathBuf,
    pub allow_unsupported_os: bool,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            os_release_path: PathBuf::from("/etc/os-release"),
            allow_unsupported_os: false,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            node: NodeSettings::default(),
            planner: PlannerSettings::default(),
            swap: SwapSettings::default(),
            toolchain: ToolchainSettings::default(),
            patches: default_patches(),
            exposure: ExposureSettings::default(),
            inventory: InventorySettings::default(),
            source_path: None,
        }
    }
}

impl BuildConfig {
    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        let version_re = Regex::new(r"^\d+\.\d+\.\d+$")
            .map_err(|e| BuildError::Config(e.to_string()))?;
        if !version_re.is_match(&self.node.version) {
            return Err(BuildError::Config(format!(
                "node.version must look like 18.20.4, got '{}'",
                self.node.version
            )));
        }
        if self.planner.memory_per_job_mib == 0 {
            return Err(BuildError::Config(
                "planner.memory_per_job_mib must be positive".to_string(),
            ));
        }
        if self.planner.swap_target_gib == 0 {
            return Err(BuildError::Config(
                "planner.swap_target_gib must be positive".to_string(),
            ));
        }
        if swap_size_bytes(self.planner.swap_target_gib).is_none() {
            return Err(BuildError::Config(format!(
                "planner.swap_target_gib {} is too large",
                self.planner.swap_target_gib
            )));
        }
        if self.planner.hard_cap == Some(0) {
            return Err(BuildError::Config(
                "planner.hard_cap must be positive or null".to_string(),
            ));
        }
        for rule in &self.patches {
            Regex::new(&rule.pattern).map_err(|e| {
                BuildError::Config(format!(
                    "invalid patch pattern for {}: {}",
                    rule.file.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}
