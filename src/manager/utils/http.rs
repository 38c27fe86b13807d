//! HTTP utilities for downloading package sources.
//!
//! Streams response bodies straight to disk so large tarballs are never
//! buffered in memory.

use crate::manager::error::{Error, ErrorExt, Result};
use futures_lite::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Downloads `url` into the file at `dest`, returning the number of bytes written.
///
/// Connection failures, non-success HTTP statuses and interrupted streams
/// are all reported as [`Error::Network`].
pub async fn download_to_file(client: &reqwest::Client, url: &url::Url, dest: &Path) -> Result<u64> {
    log::info!("Downloading {}", url);

    let network = |reason: String| Error::Network {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| network(format!("Download failed: {}", e)))?
        .error_for_status()
        .map_err(|e| network(format!("Server returned an error: {}", e)))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating download directory", parent)?;
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .fs_context("creating download file", dest)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| network(format!("Download stream error: {}", e)))?;
        file.write_all(&chunk)
            .await
            .fs_context("writing download chunk", dest)?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.fs_context("flushing download", dest)?;
    log::debug!("Downloaded {} bytes to {}", downloaded, dest.display());

    Ok(downloaded)
}
