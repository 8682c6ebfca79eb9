use nb_core::command_stream::{CommandRunner, CommandSpec};
use nb_core::error::{BuildError, Result};
use std::path::Path;
use tracing::info;

/// Run `<prefix>/bin/node --version` and require it to print `v<version>`.
pub fn verify_installation(runner: &dyn CommandRunner, prefix: &Path, version: &str) -> Result<String> {
    let node = prefix.join("bin/node");
    let reported = runner
        .capture(&CommandSpec::new(node.display().to_string()).arg("--version"))
        .map_err(|e| BuildError::Verification(format!("{} did not run: {}", node.display(), e)))?;

    let reported = reported.trim().to_string();
    let expected = format!("v{}", version.trim_start_matches('v'));
    if reported != expected {
        return Err(BuildError::Verification(format!(
            "{} reports {}, expected {}",
            node.display(),
            reported,
            expected
        )));
    }
    info!(node = %node.display(), version = %reported, "installation verified");
    Ok(reported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_core::mock::ScriptedRunner;

    #[test]
    fn test_matching_version_passes() {
        let runner = ScriptedRunner::new().on("/opt/nodejs/bin/node", |_| Ok("v18.20.4\n".into()));
        let version = verify_installation(&runner, Path::new("/opt/nodejs"), "18.20.4").unwrap();
        assert_eq!(version, "v18.20.4");
    }

    #[test]
    fn test_mismatched_version_fails() {
        let runner = ScriptedRunner::new().on("/opt/nodejs/bin/node", |_| Ok("v16.20.2\n".into()));
        let err = verify_installation(&runner, Path::new("/opt/nodejs"), "18.20.4").unwrap_err();
        match err {
            BuildError::Verification(msg) => assert!(msg.contains("v16.20.2")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_binary_fails() {
        let runner = ScriptedRunner::new().failing("/opt/nodejs/bin/node");
        let err = verify_installation(&runner, Path::new("/opt/nodejs"), "18.20.4").unwrap_err();
        assert!(matches!(err, BuildError::Verification(_)));
    }
}
