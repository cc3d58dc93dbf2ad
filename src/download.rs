//! Source download with an on-disk cache.
//!
//! A tile's source is fetched once into the cache directory and reused on
//! every later run. Downloads stream into `<file>.partial` and are renamed
//! into place only after the byte count checks out, so the cache never holds
//! a truncated file under its real name.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::{header, Client};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::catalog::TileSpec;
use crate::config::DownloadConfig;
use crate::error::{Result, WarpError};
use crate::raster::codec::partial_path;

/// Size of a usable cache entry, or `None` when there is nothing to reuse.
pub async fn cached_size(path: &Path) -> Result<Option<u64>> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() && metadata.len() > 0 => Ok(Some(metadata.len())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolve a tile's cached source without touching the network.
pub async fn cached_source(tile: &TileSpec, cache_dir: &Path) -> Result<PathBuf> {
    let path = cache_dir.join(&tile.filename);
    match cached_size(&path).await? {
        Some(size) => {
            info!(
                tile = %tile.name,
                path = %path.display(),
                size_mb = size as f64 / 1_048_576.0,
                "Cache hit"
            );
            Ok(path)
        }
        None => Err(WarpError::Download {
            url: tile.url.clone(),
            message: format!("offline and {} is not cached", path.display()),
        }),
    }
}

/// HTTP client for source downloads.
pub struct Downloader {
    client: Client,
    config: DownloadConfig,
}

impl Downloader {
    /// Create a downloader with the configured headers and timeouts.
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(referer) = &config.referer {
            let value =
                header::HeaderValue::from_str(referer).map_err(|e| WarpError::Config {
                    message: format!("Invalid referer header '{}': {}", referer, e),
                })?;
            headers.insert(header::REFERER, value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self { client, config })
    }

    /// Return the cached source for `tile`, downloading it first when missing
    /// or when `force` is set.
    #[instrument(skip(self, tile, cache_dir), fields(tile = %tile.name))]
    pub async fn ensure_cached(
        &self,
        tile: &TileSpec,
        cache_dir: &Path,
        force: bool,
    ) -> Result<PathBuf> {
        let path = cache_dir.join(&tile.filename);

        if !force {
            if let Some(size) = cached_size(&path).await? {
                info!(
                    path = %path.display(),
                    size_mb = size as f64 / 1_048_576.0,
                    "Cache hit"
                );
                return Ok(path);
            }
        }

        fs::create_dir_all(cache_dir).await?;
        info!(url = %tile.url, description = %tile.description, "Downloading");

        let mut attempt = 0;
        let mut delay = self.config.initial_retry_delay();
        loop {
            match self.fetch(&tile.url, &path).await {
                Ok(bytes) => {
                    info!(
                        path = %path.display(),
                        size_mb = bytes as f64 / 1_048_576.0,
                        "Cached"
                    );
                    return Ok(path);
                }
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        error = %e,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    return Err(WarpError::Download {
                        url: tile.url.clone(),
                        message: format!("giving up after {} attempt(s): {}", attempt + 1, e),
                    });
                }
            }
        }
    }

    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// On failure the `.partial` file is removed and `dest` is left as it was.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let partial = partial_path(dest);
        match self.stream_to(url, &partial).await {
            Ok(bytes) => {
                fs::rename(&partial, dest).await?;
                Ok(bytes)
            }
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }

    /// Stream the body of `url` into `partial` and check its length.
    async fn stream_to(&self, url: &str, partial: &Path) -> Result<u64> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let total = response.content_length();

        let mut file = fs::File::create(partial).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let mut next_report = 10;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total.filter(|&total| total > 0) {
                let percent = downloaded * 100 / total;
                if percent >= next_report {
                    debug!(
                        url = url,
                        percent = percent,
                        downloaded_mb = downloaded as f64 / 1_048_576.0,
                        total_mb = total as f64 / 1_048_576.0,
                        "Download progress"
                    );
                    next_report = (percent / 10 + 1) * 10;
                }
            }
        }
        file.flush().await?;

        match total {
            Some(expected) if downloaded != expected => Err(WarpError::Download {
                url: url.to_string(),
                message: format!(
                    "size mismatch: expected {} bytes, got {}",
                    expected, downloaded
                ),
            }),
            _ => Ok(downloaded),
        }
    }
}
