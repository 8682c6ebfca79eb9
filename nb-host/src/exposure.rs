//! Makes the installed Node.js reachable: a `/etc/profile.d` shim for login
//! shells and symlinks in a directory already on PATH for everything else.

use nb_config::ExposureSettings;
use nb_core::error::{BuildError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn profile_script(prefix: &Path) -> String {
    let bin = prefix.join("bin");
    format!(
        "# Managed by nodebuild; rewritten on every install.\n\
         case \":$PATH:\" in\n  \
           *\":{bin}:\"*) ;;\n  \
           *) export PATH=\"{bin}:$PATH\" ;;\n\
         esac\n",
        bin = bin.display()
    )
}

/// Write the profile shim. Returns `false` when it was already current.
pub fn write_profile_shim(profile_path: &Path, prefix: &Path) -> Result<bool> {
    let script = profile_script(prefix);
    if fs::read_to_string(profile_path).is_ok_and(|current| current == script) {
        return Ok(false);
    }
    if let Some(parent) = profile_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(profile_path, script)?;
    info!(path = %profile_path.display(), "wrote profile shim");
    Ok(true)
}

/// Symlink `prefix/bin/<name>` into `link_dir` for each binary.
#[cfg(unix)]
pub fn link_binaries(prefix: &Path, link_dir: &Path, binaries: &[String]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(link_dir)?;

    let mut links = Vec::with_capacity(binaries.len());
    for name in binaries {
        let source = prefix.join("bin").join(name);
        if !source.exists() {
            return Err(BuildError::Verification(format!(
                "installed binary {} is missing",
                source.display()
            )));
        }

        let dest = link_dir.join(name);
        if dest.exists() || dest.is_symlink() {
            fs::remove_file(&dest)?;
        }
        std::os::unix::fs::symlink(&source, &dest)?;
        links.push(dest);
    }
    info!(dir = %link_dir.display(), count = links.len(), "linked binaries");
    Ok(links)
}

#[cfg(not(unix))]
pub fn link_binaries(_prefix: &Path, _link_dir: &Path, _binaries: &[String]) -> Result<Vec<PathBuf>> {
    Err(BuildError::UnsupportedOs("symlinks require a Unix host".to_string()))
}

/// Write the shim and the symlinks described by `settings`.
pub fn expose(settings: &ExposureSettings, prefix: &Path) -> Result<Vec<PathBuf>> {
    write_profile_shim(&settings.profile_path, prefix)?;
    link_binaries(prefix, &settings.link_dir, &settings.binaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_script_guards_double_insertion() {
        let script = profile_script(Path::new("/opt/nodejs"));
        assert!(script.contains("*\":/opt/nodejs/bin:\"*) ;;"));
        assert!(script.contains("export PATH=\"/opt/nodejs/bin:$PATH\""));
        assert!(script.ends_with("esac\n"));
    }
}
