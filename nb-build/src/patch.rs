//! Regex substitutions over the extracted source tree.

use nb_config::PatchRule;
use nb_core::error::{BuildError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    Applied { replacements: usize },
    /// The pattern no longer matches and the replacement is already there.
    AlreadyApplied,
}

/// Apply one rule to `source_dir/rule.file`.
pub fn apply_patch(source_dir: &Path, rule: &PatchRule) -> Result<PatchStatus> {
    let target = source_dir.join(&rule.file);
    let original = fs::read_to_string(&target).map_err(|e| {
        BuildError::Patch(format!("cannot read {}: {}", target.display(), e))
    })?;
    let pattern = Regex::new(&rule.pattern).map_err(|e| {
        BuildError::Patch(format!("invalid pattern '{}': {}", rule.pattern, e))
    })?;

    let replacements = pattern.find_iter(&original).count();
    if replacements == 0 {
        if original.contains(&rule.replacement) {
            debug!(file = %rule.file.display(), pattern = %rule.pattern, "already patched");
            return Ok(PatchStatus::AlreadyApplied);
        }
        return Err(BuildError::Patch(format!(
            "'{}' matches nothing in {}",
            rule.pattern,
            target.display()
        )));
    }

    let patched = pattern.replace_all(&original, rule.replacement.as_str());
    fs::write(&target, patched.as_bytes())?;
    info!(file = %rule.file.display(), replacements, "patched");
    Ok(PatchStatus::Applied { replacements })
}

/// Apply `rules` in order, stopping at the first failure.
pub fn apply_patches(source_dir: &Path, rules: &[PatchRule]) -> Result<Vec<PatchStatus>> {
    rules
        .iter()
        .map(|rule| apply_patch(source_dir, rule))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_config::default_patches;
    use tempfile::TempDir;

    const ARES_CONFIG_H: &str = "\
/* Define to 1 if you have the getrandom function. */
#define HAVE_GETRANDOM 1

/* Define to 1 if you have the <sys/random.h> header file. */
#define HAVE_SYS_RANDOM_H 1

#define HAVE_SYS_SOCKET_H 1
";

    fn source_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("deps/cares/config/linux");
        fs::create_dir_all(&config).unwrap();
        fs::write(config.join("ares_config.h"), ARES_CONFIG_H).unwrap();
        dir
    }

    #[test]
    fn test_default_patches_disable_getrandom() {
        let dir = source_tree();
        let statuses = apply_patches(dir.path(), &default_patches()).unwrap();
        assert_eq!(
            statuses,
            vec![
                PatchStatus::Applied { replacements: 1 },
                PatchStatus::Applied { replacements: 1 }
            ]
        );

        let header =
            fs::read_to_string(dir.path().join("deps/cares/config/linux/ares_config.h")).unwrap();
        assert!(header.contains("/* #undef HAVE_GETRANDOM */"));
        assert!(header.contains("/* #undef HAVE_SYS_RANDOM_H */"));
        assert!(!header.contains("#define HAVE_GETRANDOM 1"));
        assert!(header.contains("#define HAVE_SYS_SOCKET_H 1"));
    }

    #[test]
    fn test_reapplying_is_a_no_op() {
        let dir = source_tree();
        apply_patches(dir.path(), &default_patches()).unwrap();
        let header_path = dir.path().join("deps/cares/config/linux/ares_config.h");
        let first = fs::read_to_string(&header_path).unwrap();

        let statuses = apply_patches(dir.path(), &default_patches()).unwrap();
        assert!(statuses.iter().all(|s| *s == PatchStatus::AlreadyApplied));
        assert_eq!(fs::read_to_string(&header_path).unwrap(), first);
    }

    #[test]
    fn test_unmatched_rule_is_an_error() {
        let dir = source_tree();
        let rule = PatchRule {
            file: "deps/cares/config/linux/ares_config.h".into(),
            pattern: r"(?m)^#define HAVE_ARC4RANDOM_BUF 1$".to_string(),
            replacement: "/* #undef HAVE_ARC4RANDOM_BUF */".to_string(),
        };
        let err = apply_patch(dir.path(), &rule).unwrap_err();
        assert!(matches!(err, BuildError::Patch(_)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = apply_patches(dir.path(), &default_patches()).unwrap_err();
        match err {
            BuildError::Patch(msg) => assert!(msg.contains("ares_config.h")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
