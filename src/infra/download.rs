//! HTTP download functionality
//!
//! Downloads LÖVE runtimes and helper tools with retry and exponential
//! backoff, and unpacks downloaded zip archives.

use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::config::defaults;
use crate::error::DownloadError;

/// Download result containing file path and metadata
#[derive(Debug)]
pub struct DownloadResult {
    /// Path to the downloaded file
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// SHA256 checksum of the downloaded content
    pub checksum: String,
}

/// Download manager for fetching files with retry support
#[derive(Debug, Clone)]
pub struct DownloadManager {
    client: reqwest::Client,
    max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds)
    base_delay_ms: u64,
}

impl DownloadManager {
    /// Create a new download manager
    pub fn new() -> Self {
        Self::with_config(defaults::MAX_DOWNLOAD_RETRIES, 1000)
    }

    /// Create a download manager with custom settings
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(300))
                .connect_timeout(Duration::from_secs(30))
                .user_agent(concat!("makelove/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            max_retries,
            base_delay_ms,
        }
    }

    /// Get max retries
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Download a file with retry logic
    ///
    /// A partial file is removed when every attempt fails.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<DownloadResult, DownloadError> {
        let mut attempts = 0;
        let mut last_error = None;
        let mut delay_ms = self.base_delay_ms;

        while attempts < self.max_retries {
            attempts += 1;
            tracing::info!("Downloading '{url}'..");

            match self.download_once(url, dest).await {
                Ok(result) => {
                    tracing::debug!(
                        "Downloaded {} bytes to {} (sha256 {})",
                        result.size,
                        dest.display(),
                        result.checksum
                    );
                    return Ok(result);
                }
                Err(e) => {
                    tracing::warn!("Download attempt {attempts} failed: {e}");
                    last_error = Some(e);

                    if attempts < self.max_retries {
                        // Exponential backoff with cap at 30 seconds
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = (delay_ms * 2).min(30_000);
                    }
                }
            }
        }

        let _ = tokio::fs::remove_file(dest).await;

        Err(last_error.unwrap_or_else(|| DownloadError::MaxRetriesExceeded {
            url: url.to_string(),
            retries: self.max_retries,
        }))
    }

    async fn download_once(&self, url: &str, dest: &Path) -> Result<DownloadResult, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::NetworkError {
                url: url.to_string(),
                error: format!("HTTP {}", response.status()),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                })?;
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| DownloadError::IoError {
                path: dest.to_path_buf(),
                error: e.to_string(),
            })?;

        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| DownloadError::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            })?;

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::IoError {
                    path: dest.to_path_buf(),
                    error: e.to_string(),
                })?;

            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| DownloadError::IoError {
            path: dest.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(DownloadResult {
            path: dest.to_path_buf(),
            size: downloaded,
            checksum: hex::encode(hasher.finalize()),
        })
    }

    /// Download a zip archive and unpack it into `dest`
    ///
    /// Release zips wrap everything in one top-level directory; that
    /// directory is stripped so its contents land directly in `dest`.
    pub async fn download_and_unpack(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        let archive_path = dest.with_extension("download.zip");
        self.download(url, &archive_path).await?;

        let unpacked = unpack_zip(&archive_path, dest);
        let _ = std::fs::remove_file(&archive_path);
        unpacked
    }
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Unpack a zip archive, stripping a single shared top-level directory
pub fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<(), DownloadError> {
    let extract_err = |e: &dyn std::fmt::Display| DownloadError::ExtractFailed {
        path: archive_path.to_path_buf(),
        error: e.to_string(),
    };
    let io_err = |path: &Path, e: std::io::Error| DownloadError::IoError {
        path: path.to_path_buf(),
        error: e.to_string(),
    };

    let file = File::open(archive_path).map_err(|e| io_err(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| extract_err(&e))?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| extract_err(&e))?;
        let name = entry
            .enclosed_name()
            .ok_or_else(|| extract_err(&"Invalid zip entry name"))?;
        names.push(name);
    }
    let strip = usize::from(has_single_root(&names));

    for (i, name) in names.iter().enumerate() {
        let mut entry = archive.by_index(i).map_err(|e| extract_err(&e))?;
        let stripped: PathBuf = name.components().skip(strip).collect();
        if stripped.as_os_str().is_empty() {
            continue;
        }

        let dest_path = dest.join(&stripped);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path).map_err(|e| io_err(&dest_path, e))?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut outfile = File::create(&dest_path).map_err(|e| io_err(&dest_path, e))?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| io_err(&dest_path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                std::fs::set_permissions(&dest_path, std::fs::Permissions::from_mode(mode))
                    .map_err(|e| io_err(&dest_path, e))?;
            }
        }
    }

    Ok(())
}

/// Whether every entry lives below the same top-level directory
fn has_single_root(names: &[PathBuf]) -> bool {
    let mut roots = names.iter().filter_map(|n| n.components().next());
    let Some(first) = roots.next() else {
        return false;
    };
    let nested = names.iter().any(|n| n.components().count() > 1);
    nested && roots.all(|r| r == first)
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
