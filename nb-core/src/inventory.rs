//! Host resource inventory.
//!
//! Reads total memory, active swap and logical CPU count from `/proc`.
//! There is no safe default for any of these values, so every failed read is
//! a fatal [`BuildError::InventoryUnavailable`].

use crate::error::{BuildError, Result};
use crate::os_release::OsRelease;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Snapshot of the resources the planner cares about, in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostResources {
    pub total_memory_mib: u64,
    pub existing_swap_mib: u64,
    pub cpu_count: u32,
}

/// Source of host facts. Read once per run.
pub trait SystemInventory {
    fn resources(&self) -> Result<HostResources>;
    fn os_release(&self) -> Result<OsRelease>;
}

/// Inventory backed by procfs and an os-release file.
#[derive(Debug, Clone)]
pub struct ProcInventory {
    proc_root: PathBuf,
    os_release_path: PathBuf,
}

impl Default for ProcInventory {
    fn default() -> Self {
        Self::new("/proc", "/etc/os-release")
    }
}

impl ProcInventory {
    pub fn new(proc_root: impl Into<PathBuf>, os_release_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            os_release_path: os_release_path.into(),
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    fn read(&self, check: &'static str, name: &str) -> Result<String> {
        let path = self.proc_root.join(name);
        fs::read_to_string(&path)
            .map_err(|e| BuildError::inventory(check, format!("{}: {}", path.display(), e)))
    }

    pub fn total_memory_mib(&self) -> Result<u64> {
        let meminfo = self.read("meminfo.MemTotal", "meminfo")?;
        meminfo_mib(&meminfo, "MemTotal", "meminfo.MemTotal")
    }

    pub fn existing_swap_mib(&self) -> Result<u64> {
        let meminfo = self.read("meminfo.SwapTotal", "meminfo")?;
        meminfo_mib(&meminfo, "SwapTotal", "meminfo.SwapTotal")
    }

    pub fn cpu_count(&self) -> Result<u32> {
        let cpuinfo = self.read("cpuinfo", "cpuinfo")?;
        let count = count_processors(&cpuinfo);
        if count == 0 {
            return Err(BuildError::inventory(
                "cpuinfo",
                "no 'processor' entries found",
            ));
        }
        Ok(count)
    }
}

impl SystemInventory for ProcInventory {
    fn resources(&self) -> Result<HostResources> {
        let resources = HostResources {
            total_memory_mib: self.total_memory_mib()?,
            existing_swap_mib: self.existing_swap_mib()?,
            cpu_count: self.cpu_count()?,
        };
        debug!(?resources, proc_root = %self.proc_root.display(), "read host inventory");
        Ok(resources)
    }

    fn os_release(&self) -> Result<OsRelease> {
        let text = fs::read_to_string(&self.os_release_path).map_err(|e| {
            BuildError::inventory(
                "os-release",
                format!("{}: {}", self.os_release_path.display(), e),
            )
        })?;
        OsRelease::parse(&text)
    }
}

/// Parse a `Key:   12345 kB` line from meminfo and convert to MiB.
fn meminfo_mib(meminfo: &str, key: &str, check: &'static str) -> Result<u64> {
    let line = meminfo
        .lines()
        .find(|line| line.split(':').next() == Some(key))
        .ok_or_else(|| BuildError::inventory(check, format!("'{}' not present", key)))?;

    let value = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| BuildError::inventory(check, format!("no value in '{}'", line)))?;
    let kib: u64 = value
        .parse()
        .map_err(|_| BuildError::inventory(check, format!("unparsable value '{}'", value)))?;
    Ok(kib / 1024)
}

fn count_processors(cpuinfo: &str) -> u32 {
    cpuinfo
        .lines()
        .filter(|line| line.split(':').next().map(str::trim) == Some("processor"))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MEMINFO: &str = "MemTotal:        4028376 kB\n\
                           MemFree:          211356 kB\n\
                           SwapTotal:        2097148 kB\n\
                           SwapFree:         2097148 kB\n";

    const CPUINFO: &str = "processor\t: 0\nvendor_id\t: GenuineIntel\n\n\
                           processor\t: 1\nvendor_id\t: GenuineIntel\n";

    fn fixture(meminfo: &str, cpuinfo: &str) -> (TempDir, ProcInventory) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("meminfo"), meminfo).unwrap();
        fs::write(dir.path().join("cpuinfo"), cpuinfo).unwrap();
        let inventory = ProcInventory::new(dir.path(), dir.path().join("os-release"));
        (dir, inventory)
    }

    #[test]
    fn test_reads_resources_in_mib() {
        let (_dir, inventory) = fixture(MEMINFO, CPUINFO);
        let resources = inventory.resources().unwrap();
        assert_eq!(
            resources,
            HostResources {
                total_memory_mib: 3933,
                existing_swap_mib: 2047,
                cpu_count: 2,
            }
        );
    }

    #[test]
    fn test_missing_swap_key_is_fatal() {
        let (_dir, inventory) = fixture("MemTotal: 4028376 kB\n", CPUINFO);
        let err = inventory.resources().unwrap_err();
        assert!(matches!(
            err,
            BuildError::InventoryUnavailable {
                check: "meminfo.SwapTotal",
                ..
            }
        ));
    }

    #[test]
    fn test_garbage_memory_value_is_fatal() {
        let (_dir, inventory) = fixture("MemTotal: lots kB\nSwapTotal: 0 kB\n", CPUINFO);
        let err = inventory.total_memory_mib().unwrap_err();
        assert!(err.to_string().contains("unparsable value 'lots'"));
    }

    #[test]
    fn test_zero_cpus_is_fatal() {
        let (_dir, inventory) = fixture(MEMINFO, "vendor_id\t: GenuineIntel\n");
        assert!(matches!(
            inventory.cpu_count(),
            Err(BuildError::InventoryUnavailable { check: "cpuinfo", .. })
        ));
    }

    #[test]
    fn test_missing_proc_root_is_fatal() {
        let inventory = ProcInventory::new("/nonexistent/proc", "/nonexistent/os-release");
        assert!(inventory.resources().is_err());
        assert!(inventory.os_release().is_err());
    }

    #[test]
    fn test_reads_os_release_file() {
        let (dir, inventory) = fixture(MEMINFO, CPUINFO);
        fs::write(
            dir.path().join("os-release"),
            "NAME=\"CentOS Linux\"\nID=\"centos\"\nVERSION_ID=\"7\"\n",
        )
        .unwrap();
        let release = inventory.os_release().unwrap();
        assert_eq!(release.id, "centos");
        assert_eq!(release.version_id, "7");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_live_proc_inventory() {
        let resources = ProcInventory::default().resources().unwrap();
        assert!(resources.total_memory_mib > 0);
        assert!(resources.cpu_count > 0);
    }
}
