//! Swap file provisioning.
//!
//! Create-or-reuse: an active swap at the requested path is left alone, a
//! correctly sized inactive file is reused, and an fstab entry is only added
//! when no line already names the path.

use nb_config::SwapSettings;
use nb_core::command_stream::{CommandRunner, CommandSpec};
use nb_core::error::{BuildError, Result};
use nb_planner::SwapRequest;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationMethod {
    Fallocate,
    ZeroFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The path was already an active swap area.
    AlreadyActive,
    /// A correctly sized file was already present and has been activated.
    Reused,
    Created { method: AllocationMethod },
}

pub trait SwapManager {
    fn ensure(&self, request: &SwapRequest) -> Result<SwapOutcome>;
}

/// Swap manager backed by a file on the root filesystem.
pub struct FileSwapManager {
    runner: Arc<dyn CommandRunner>,
    proc_swaps_path: PathBuf,
    fstab_path: PathBuf,
}

impl FileSwapManager {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: &SwapSettings) -> Self {
        Self {
            runner,
            proc_swaps_path: settings.proc_swaps_path.clone(),
            fstab_path: settings.fstab_path.clone(),
        }
    }

    fn is_active(&self, path: &Path) -> Result<bool> {
        let table = fs::read_to_string(&self.proc_swaps_path).map_err(|e| {
            BuildError::inventory(
                "proc.swaps",
                format!("{}: {}", self.proc_swaps_path.display(), e),
            )
        })?;
        Ok(active_swap_paths(&table).iter().any(|p| p == path))
    }

    fn allocate(&self, path: &Path, size_mib: u64) -> Result<AllocationMethod> {
        let fallocate = CommandSpec::new("fallocate").args([
            "-l".to_string(),
            format!("{}M", size_mib),
            path.display().to_string(),
        ]);
        match self
            .runner
            .run(&fallocate)
            .and_then(|_| check_size(path, size_mib))
        {
            Ok(()) => return Ok(AllocationMethod::Fallocate),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "fallocate unavailable, falling back to zero-fill"
                );
                let _ = fs::remove_file(path);
            }
        }

        let dd = CommandSpec::new("dd").args([
            "if=/dev/zero".to_string(),
            format!("of={}", path.display()),
            "bs=1M".to_string(),
            format!("count={}", size_mib),
        ]);
        self.runner
            .run(&dd)
            .and_then(|_| check_size(path, size_mib))
            .map_err(|e| {
                let _ = fs::remove_file(path);
                BuildError::SwapAllocation(format!(
                    "both fallocate and dd failed for {} ({} MiB): {}",
                    path.display(),
                    size_mib,
                    e
                ))
            })?;
        Ok(AllocationMethod::ZeroFill)
    }

    fn persist(&self, path: &Path) -> Result<()> {
        let existing = match fs::read_to_string(&self.fstab_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if fstab_has_entry(&existing, path) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.fstab_path)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            writeln!(file)?;
        }
        writeln!(file, "{} none swap sw 0 0", path.display())?;
        info!(fstab = %self.fstab_path.display(), "persisted swap entry");
        Ok(())
    }
}

impl SwapManager for FileSwapManager {
    fn ensure(&self, request: &SwapRequest) -> Result<SwapOutcome> {
        let path = request.path.as_path();

        if self.is_active(path)? {
            info!(path = %path.display(), "swap already active, leaving it untouched");
            if request.activate {
                self.persist(path)?;
            }
            return Ok(SwapOutcome::AlreadyActive);
        }

        let outcome = if check_size(path, request.size_mib).is_ok() {
            info!(path = %path.display(), "reusing existing swap file");
            SwapOutcome::Reused
        } else {
            if path.exists() {
                fs::remove_file(path)?;
            }
            let method = self.allocate(path, request.size_mib)?;
            SwapOutcome::Created { method }
        };

        restrict_permissions(path)?;
        self.runner
            .run(&CommandSpec::new("mkswap").arg(path.display().to_string()))?;

        if request.activate {
            self.runner
                .run(&CommandSpec::new("swapon").arg(path.display().to_string()))?;
            self.persist(path)?;
        }

        info!(
            path = %path.display(),
            size_mib = request.size_mib,
            ?outcome,
            "swap provisioned"
        );
        Ok(outcome)
    }
}

fn check_size(path: &Path, size_mib: u64) -> Result<()> {
    let actual = fs::metadata(path)?.len();
    let expected = size_mib.checked_mul(MIB).ok_or_else(|| {
        BuildError::SwapAllocation(format!("{} MiB does not fit in a file size", size_mib))
    })?;
    if actual == expected {
        Ok(())
    } else {
        Err(BuildError::SwapAllocation(format!(
            "{} is {} bytes, expected {}",
            path.display(),
            actual,
            expected
        )))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Paths listed in `/proc/swaps` (first column, header skipped).
pub fn active_swap_paths(table: &str) -> Vec<PathBuf> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .map(PathBuf::from)
        .collect()
}

fn fstab_has_entry(fstab: &str, path: &Path) -> bool {
    fstab
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .any(|device| Path::new(device) == path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_swap_paths_skip_header() {
        let table = "Filename\t\t\t\tType\t\tSize\tUsed\tPriority\n\
                     /swapfile                               file\t\t8388604\t0\t-2\n\
                     /dev/dm-1                               partition\t2097148\t0\t-3\n";
        assert_eq!(
            active_swap_paths(table),
            vec![PathBuf::from("/swapfile"), PathBuf::from("/dev/dm-1")]
        );
        assert!(active_swap_paths("Filename Type Size Used Priority\n").is_empty());
    }

    #[test]
    fn test_check_size_rejects_unaddressable_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("swapfile");
        fs::write(&path, b"").unwrap();
        let err = check_size(&path, u64::MAX / 1024).unwrap_err();
        assert!(matches!(err, BuildError::SwapAllocation(_)));
    }

    #[test]
    fn test_fstab_entry_detection_ignores_comments() {
        let fstab = "# /swapfile none swap sw 0 0\nUUID=abc / xfs defaults 0 0\n";
        assert!(!fstab_has_entry(fstab, Path::new("/swapfile")));
        let fstab = "UUID=abc / xfs defaults 0 0\n  /swapfile   none swap defaults 0 0\n";
        assert!(fstab_has_entry(fstab, Path::new("/swapfile")));
    }
}
