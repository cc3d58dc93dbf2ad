//! Configuration management for mercwarp.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::{default_catalog, TileSpec};
use crate::error::{Result, WarpError};
use crate::raster::Compression;

/// Command-line arguments for mercwarp
#[derive(Parser, Debug, Default)]
#[command(name = "mercwarp")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to JSON configuration file
    #[arg(short, long, env = "MERCWARP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding downloaded plate-carree sources
    #[arg(long, env = "MERCWARP_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory receiving Web-Mercator-corrected PNGs
    #[arg(short, long, env = "MERCWARP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of tiles processed concurrently
    #[arg(short, long, env = "MERCWARP_JOBS")]
    pub jobs: Option<usize>,

    /// Never touch the network; a cache miss fails the tile
    #[arg(long)]
    pub offline: bool,

    /// Download sources again even when cached
    #[arg(long)]
    pub force_download: bool,

    /// Process only the named tiles (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    pub only: Vec<String>,

    /// PNG compression effort for outputs
    #[arg(long, value_enum)]
    pub compression: Option<Compression>,

    /// Skip writing manifest.json
    #[arg(long)]
    pub no_manifest: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MERCWARP_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// HTTP download configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Referer header; some atlas hosts refuse hotlinked requests without one
    #[serde(default = "default_referer")]
    pub referer: Option<String>,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay in milliseconds (doubles each retry)
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
}

impl DownloadConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cached sources
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Reprojected outputs and manifest
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Concurrent tiles
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    #[serde(default)]
    pub offline: bool,

    #[serde(default)]
    pub force_download: bool,

    /// Tile names to process; empty means all
    #[serde(default)]
    pub only: Vec<String>,

    #[serde(default)]
    pub compression: Compression,

    /// Write `manifest.json` into the output directory
    #[serde(default = "default_write_manifest")]
    pub write_manifest: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub download: DownloadConfig,

    /// Tile table; defaults to the built-in catalog
    #[serde(default = "default_catalog")]
    pub tiles: Vec<TileSpec>,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Build configuration from already-parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        // Start with defaults, or the JSON file when one is given
        let mut config = match &args.config {
            Some(config_path) => Self::load_from_file(config_path)?,
            None => Config::default(),
        };

        // Override with command-line arguments
        if let Some(cache_dir) = args.cache_dir {
            config.cache_dir = cache_dir;
        }
        if let Some(output_dir) = args.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(jobs) = args.jobs {
            config.jobs = jobs;
        }
        if let Some(compression) = args.compression {
            config.compression = compression;
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }
        if !args.only.is_empty() {
            config.only = args.only;
        }
        config.offline |= args.offline;
        config.force_download |= args.force_download;
        if args.no_manifest {
            config.write_manifest = false;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(WarpError::Config {
                message: "Cache directory cannot be empty".to_string(),
            });
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(WarpError::Config {
                message: "Output directory cannot be empty".to_string(),
            });
        }

        if self.jobs == 0 {
            return Err(WarpError::Config {
                message: "Jobs must be at least 1".to_string(),
            });
        }

        if self.offline && self.force_download {
            return Err(WarpError::Config {
                message: "--offline and --force-download cannot be combined".to_string(),
            });
        }

        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(WarpError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        if self.tiles.is_empty() {
            return Err(WarpError::Config {
                message: "Tile catalog is empty".to_string(),
            });
        }

        let mut names = HashSet::new();
        let mut filenames = HashSet::new();
        for tile in &self.tiles {
            tile.validate()?;
            if !names.insert(tile.name.as_str()) {
                return Err(WarpError::Config {
                    message: format!("Duplicate tile name: {}", tile.name),
                });
            }
            if !filenames.insert(tile.filename.as_str()) {
                return Err(WarpError::Config {
                    message: format!("Duplicate tile filename: {}", tile.filename),
                });
            }
        }

        for name in &self.only {
            if !names.contains(name.as_str()) {
                return Err(WarpError::Config {
                    message: format!(
                        "Unknown tile '{}'. Known tiles: {}",
                        name,
                        self.tiles
                            .iter()
                            .map(|t| t.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                });
            }
        }

        Ok(())
    }

    /// Tiles to process, in catalog order
    pub fn selected_tiles(&self) -> Vec<TileSpec> {
        self.tiles
            .iter()
            .filter(|tile| self.only.is_empty() || self.only.contains(&tile.name))
            .cloned()
            .collect()
    }

    /// Where the overlay manifest goes
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join("manifest.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            output_dir: default_output_dir(),
            jobs: default_jobs(),
            offline: false,
            force_download: false,
            only: Vec::new(),
            compression: Compression::default(),
            write_manifest: default_write_manifest(),
            log_level: default_log_level(),
            download: DownloadConfig::default(),
            tiles: default_catalog(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            referer: default_referer(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
        }
    }
}

// Default value functions for serde
fn default_cache_dir() -> PathBuf {
    PathBuf::from("scripts/cache/lp")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public/lp")
}

fn default_jobs() -> usize {
    1
}

fn default_write_manifest() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_user_agent() -> String {
    format!("mercwarp/{}", env!("CARGO_PKG_VERSION"))
}

fn default_referer() -> Option<String> {
    Some("https://djlorenz.github.io/astronomy/lp/".to_string())
}

fn default_request_timeout_secs() -> u64 {
    1800
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_retry_delay_ms() -> u64 {
    2000
}
