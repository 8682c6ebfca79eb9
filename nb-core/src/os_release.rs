use crate::error::{BuildError, Result};
use serde::Serialize;

/// Distributions that ship the Software Collections this tool relies on.
pub const SUPPORTED_IDS: &[&str] = &["centos", "rhel", "cloudlinux"];
pub const SUPPORTED_MAJOR: &str = "7";

/// The fields of `/etc/os-release` used for host validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OsRelease {
    pub id: String,
    pub version_id: String,
    pub pretty_name: Option<String>,
}

impl OsRelease {
    pub fn parse(text: &str) -> Result<Self> {
        let mut id = None;
        let mut version_id = None;
        let mut pretty_name = None;

        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "ID" => id = Some(value.to_lowercase()),
                "VERSION_ID" => version_id = Some(value),
                "PRETTY_NAME" => pretty_name = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            id: id.ok_or_else(|| BuildError::inventory("os-release", "ID not present"))?,
            version_id: version_id
                .ok_or_else(|| BuildError::inventory("os-release", "VERSION_ID not present"))?,
            pretty_name,
        })
    }

    pub fn major_version(&self) -> &str {
        self.version_id.split('.').next().unwrap_or("")
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_IDS.contains(&self.id.as_str()) && self.major_version() == SUPPORTED_MAJOR
    }

    /// Fails with [`BuildError::UnsupportedOs`] unless this is an EL7 host.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(BuildError::UnsupportedOs(format!(
                "{} {} (expected one of {} at major version {})",
                self.id,
                self.version_id,
                SUPPORTED_IDS.join(", "),
                SUPPORTED_MAJOR
            )))
        }
    }

    pub fn display_name(&self) -> String {
        self.pretty_name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.id, self.version_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cloudlinux() {
        let release = OsRelease::parse(
            "NAME=\"CloudLinux\"\nVERSION=\"7.9 (Boris Yegorov)\"\nID=\"cloudlinux\"\n\
             VERSION_ID=\"7.9\"\nPRETTY_NAME=\"CloudLinux 7.9 (Boris Yegorov)\"\n",
        )
        .unwrap();
        assert_eq!(release.id, "cloudlinux");
        assert_eq!(release.major_version(), "7");
        assert!(release.is_supported());
        assert_eq!(release.display_name(), "CloudLinux 7.9 (Boris Yegorov)");
    }

    #[test]
    fn test_el8_is_rejected() {
        let release = OsRelease::parse("ID=\"rhel\"\nVERSION_ID=\"8.6\"\n").unwrap();
        let err = release.ensure_supported().unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedOs(_)));
        assert!(err.to_string().contains("rhel 8.6"));
    }

    #[test]
    fn test_ubuntu_is_rejected() {
        let release = OsRelease::parse("ID=ubuntu\nVERSION_ID=\"7\"\n").unwrap();
        assert!(!release.is_supported());
    }

    #[test]
    fn test_missing_id_is_inventory_error() {
        let err = OsRelease::parse("VERSION_ID=\"7\"\n").unwrap_err();
        assert!(matches!(
            err,
            BuildError::InventoryUnavailable { check: "os-release", .. }
        ));
    }
}
