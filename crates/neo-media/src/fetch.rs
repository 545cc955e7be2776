//! HTTP(S) fetches with a size cap.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{MediaError, MediaResult};

/// Only plain web URLs are fetched; `file://` and friends are refused.
pub fn validate_url(raw: &str) -> MediaResult<Url> {
    let url = Url::parse(raw).map_err(|e| MediaError::UnsupportedUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(MediaError::UnsupportedUrl(raw.to_string())),
    }
}

/// File extension of the URL path, if it has a short alphanumeric one.
pub fn url_extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.last()?;
    let (_, ext) = last.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

async fn get(http: &reqwest::Client, url: &Url, max_bytes: u64) -> MediaResult<reqwest::Response> {
    let response = http.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MediaError::download_failed(format!("{} returned {}", url, status)));
    }
    if let Some(len) = response.content_length() {
        if len > max_bytes {
            return Err(MediaError::ResourceLimit(format!(
                "{} is {} bytes, limit is {}",
                url, len, max_bytes
            )));
        }
    }
    Ok(response)
}

/// Stream `url` into `dest`. Returns the number of bytes written.
pub async fn download_to(
    http: &reqwest::Client,
    url: &Url,
    dest: &Path,
    max_bytes: u64,
) -> MediaResult<u64> {
    let mut response = get(http, url, max_bytes).await?;
    let mut file = tokio::fs::File::create(dest).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(MediaError::ResourceLimit(format!(
                "{} exceeded {} bytes",
                url, max_bytes
            )));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    info!("Downloaded {} bytes from {} to {}", written, url, dest.display());
    Ok(written)
}

/// Fetch `url` into memory.
pub async fn fetch_bytes(http: &reqwest::Client, url: &Url, max_bytes: u64) -> MediaResult<Vec<u8>> {
    let mut response = get(http, url, max_bytes).await?;
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        if body.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(MediaError::ResourceLimit(format!(
                "{} exceeded {} bytes",
                url, max_bytes
            )));
        }
        body.extend_from_slice(&chunk);
    }

    debug!("Fetched {} bytes from {}", body.len(), url);
    Ok(body)
}
