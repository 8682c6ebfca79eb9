//! Release tarball download and extraction.

use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use nb_config::NodeSettings;
use nb_core::error::{BuildError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("nodebuild/", env!("CARGO_PKG_VERSION"));

fn progress_bar(len: Option<u64>) -> ProgressBar {
    match len {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} {bytes} downloaded")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        }
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Download `url` to `dest` unless `dest` already exists.
///
/// The body is streamed to a `.part` file that is renamed on success, so an
/// interrupted download is never mistaken for a complete archive. Returns
/// `false` when nothing was downloaded.
pub fn download(url: &str, dest: &Path) -> Result<bool> {
    if dest.is_file() {
        info!(archive = %dest.display(), "archive already present, skipping download");
        return Ok(false);
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let network = |e: reqwest::Error| BuildError::Network(format!("{}: {}", url, e));
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(network)?;

    info!(%url, "downloading source");
    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(network)?;

    let part = partial_path(dest);
    let pb = progress_bar(response.content_length());
    let copied = File::create(&part).and_then(|file| {
        let mut writer = pb.wrap_write(file);
        io::copy(&mut response, &mut writer)
    });
    pb.finish_and_clear();

    let bytes = match copied {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = fs::remove_file(&part);
            return Err(BuildError::Network(format!("{}: {}", url, e)));
        }
    };
    fs::rename(&part, dest)?;
    info!(archive = %dest.display(), bytes, "download complete");
    Ok(true)
}

/// Unpack a gzip tarball into `work_dir`, unless `source_dir` already holds
/// a `configure` script. Returns `false` when extraction was skipped.
pub fn extract(archive: &Path, work_dir: &Path, source_dir: &Path) -> Result<bool> {
    if source_dir.join("configure").is_file() {
        info!(source = %source_dir.display(), "source already extracted");
        return Ok(false);
    }

    debug!(archive = %archive.display(), dest = %work_dir.display(), "extracting");
    let file = File::open(archive)?;
    Archive::new(GzDecoder::new(file))
        .unpack(work_dir)
        .map_err(|e| {
            BuildError::Io(io::Error::new(
                e.kind(),
                format!("failed to extract {}: {}", archive.display(), e),
            ))
        })?;

    if !source_dir.join("configure").is_file() {
        return Err(BuildError::Verification(format!(
            "{} did not contain {}/configure",
            archive.display(),
            source_dir.display()
        )));
    }
    info!(source = %source_dir.display(), "source extracted");
    Ok(true)
}

/// Download and extract the configured release. Returns the source dir.
pub fn fetch_source(node: &NodeSettings) -> Result<PathBuf> {
    let archive = node.work_dir.join(node.tarball_name());
    let source_dir = node.source_dir();
    if !source_dir.join("configure").is_file() {
        download(&node.tarball_url(), &archive)?;
    }
    extract(&archive, &node.work_dir, &source_dir)?;
    Ok(source_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/src/node-v18.20.4.tar.gz")),
            PathBuf::from("/src/node-v18.20.4.tar.gz.part")
        );
    }
}
