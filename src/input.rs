//! Input resolution: turn a user-supplied path or URL into a [`SelectedFile`].
//!
//! The file is read fully into memory because the service upload is a single
//! multipart part. No type or size checks happen here; the service rejects
//! what it cannot convert.

use crate::error::ConvertError;
use crate::state::SelectedFile;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name used when a URL has no usable last path segment.
const FALLBACK_FILE_NAME: &str = "download.bin";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load the input as a [`SelectedFile`].
///
/// URLs are downloaded with the given timeout; anything else is treated as a
/// local path.
pub async fn load_file(input: &str, timeout_secs: u64) -> Result<SelectedFile, ConvertError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<SelectedFile, ConvertError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConvertError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ConvertError::FileNotFound {
            path: PathBuf::from(path),
        })?;

    debug!("Loaded local file: {} ({} bytes)", path.display(), bytes.len());
    Ok(SelectedFile::new(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<SelectedFile, ConvertError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ConvertError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ConvertError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let name = file_name_from_url(url).unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    info!("Downloaded '{}' ({} bytes)", name, bytes.len());
    Ok(SelectedFile::new(name, bytes.to_vec()))
}

/// Last path segment of a URL, if it looks like a file name.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    if !last.is_empty() && last.contains('.') {
        Some(last.to_string())
    } else {
        None
    }
}
