//! HTTP client wrapper for downloading files.
//!
//! This module provides the `HttpClient` struct which streams a response body
//! to disk, optionally authenticated with a Bearer token.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::error::DownloadError;
use super::filename::filename_from_url;
use crate::http_client::{HttpTimeouts, Redirects, build_client, url_authority};

/// HTTP client for downloading files with streaming support.
///
/// Follows redirects natively. Create once per run and reuse for every file,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use databus_core::HttpTimeouts;
/// use databus_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(HttpTimeouts::default())?;
/// let result = client
///     .download_to_file("https://example.org/u/g/a/1.0/a.ttl", Path::new("./downloads"))
///     .await?;
/// println!("Downloaded to: {}", result.path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// What a completed download produced.
#[derive(Debug, Clone)]
pub struct DownloadFileResult {
    /// Final output path.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes_downloaded: u64,
}

impl HttpClient {
    /// Creates a client with the shared timeout policy.
    ///
    /// # Errors
    ///
    /// Returns the builder error if TLS or proxy setup fails.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(Redirects::Follow, timeouts)?,
        })
    }

    /// Downloads `url` into `output_dir`, named after the URL's final segment.
    ///
    /// An existing file with the same name is overwritten.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid or has no final path segment
    /// - The request fails (network error, timeout)
    /// - The server returns a non-success status
    /// - Writing to disk fails
    #[must_use = "download result contains the path to the downloaded file"]
    #[instrument(skip(self, output_dir), fields(url = %url))]
    pub async fn download_to_file(
        &self,
        url: &str,
        output_dir: &Path,
    ) -> Result<DownloadFileResult, DownloadError> {
        self.download_inner(url, output_dir, None).await
    }

    /// Downloads `url` with `Authorization: Bearer <token>`.
    ///
    /// The token value is never logged.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`download_to_file`](Self::download_to_file).
    #[must_use = "download result contains the path to the downloaded file"]
    #[instrument(skip(self, output_dir, token), fields(url = %url))]
    pub async fn download_to_file_with_bearer(
        &self,
        url: &str,
        output_dir: &Path,
        token: &str,
    ) -> Result<DownloadFileResult, DownloadError> {
        self.download_inner(url, output_dir, Some(token)).await
    }

    async fn download_inner(
        &self,
        url: &str,
        output_dir: &Path,
        bearer: Option<&str>,
    ) -> Result<DownloadFileResult, DownloadError> {
        debug!("starting download");

        let parsed_url = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let filename =
            filename_from_url(&parsed_url).ok_or_else(|| DownloadError::no_filename(url))?;
        let file_path = output_dir.join(&filename);

        let response = self.send_request(&parsed_url, bearer).await?;

        let mut file = File::create(&file_path)
            .await
            .map_err(|e| DownloadError::io(file_path.clone(), e))?;

        let stream_result = stream_to_file(&mut file, response, url, &file_path).await;
        if stream_result.is_err() {
            debug!(path = %file_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&file_path).await;
        }
        let bytes_downloaded = stream_result?;

        info!(path = %file_path.display(), bytes = bytes_downloaded, "download complete");

        Ok(DownloadFileResult {
            path: file_path,
            bytes_downloaded,
        })
    }

    async fn send_request(
        &self,
        url: &Url,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url.as_str());
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        if matches!(status_code, 401 | 403) {
            let domain = url_authority(url).unwrap_or_else(|| url.to_string());
            return Err(DownloadError::access_denied(
                url.as_str(),
                status_code,
                domain,
                bearer.is_some(),
            ));
        }
        Err(DownloadError::http_status(url.as_str(), status_code))
    }
}

/// Streams response body to file, returning bytes written.
///
/// Kept separate so the caller can remove the partial file on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
