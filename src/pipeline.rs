//! Batch driver: cache, reproject and publish every selected tile.
//!
//! Tiles are independent. Each one is fetched (or found in the cache),
//! decoded, remapped onto Web Mercator rows and written back in its original
//! colour mode. A failing tile is reported and skipped; the others still run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{info, info_span, Instrument};

use crate::catalog::TileSpec;
use crate::config::Config;
use crate::download::{cached_source, Downloader};
use crate::error::{Result, WarpError};
use crate::logging::{
    generate_run_id, log_error, log_operation_end, log_operation_start, log_raster_stats,
    log_timed_operation,
};
use crate::manifest::{OverlayEntry, OverlayManifest};
use crate::projection::{LatitudeExtent, RowIndexMap, RowMapStats};
use crate::raster::{read_png, resample, write_png, ColorMode, Compression};

/// What reprojecting a single file produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReprojectOutcome {
    pub width: usize,
    pub height: usize,
    pub color_mode: ColorMode,
    pub bit_depth: u8,
    /// Size of the written PNG
    pub bytes: u64,
    pub stats: RowMapStats,
}

/// A tile that made it all the way to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TileReport {
    pub tile: TileSpec,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub outcome: ReprojectOutcome,
}

impl TileReport {
    pub fn overlay_entry(&self) -> OverlayEntry {
        OverlayEntry {
            name: self.tile.name.clone(),
            file: self.tile.filename.clone(),
            description: self.tile.description.clone(),
            bounds: self.tile.leaflet_bounds(),
            width: self.outcome.width,
            height: self.outcome.height,
            color_mode: self.outcome.color_mode,
            bytes: self.outcome.bytes,
            duplicated_rows: self.outcome.stats.duplicated_rows,
            skipped_rows: self.outcome.stats.skipped_rows,
        }
    }
}

/// A tile that was aborted, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFailure {
    pub name: String,
    pub error: String,
}

/// Result of a whole batch run, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_id: String,
    pub reports: Vec<TileReport>,
    pub failures: Vec<TileFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total size of all written overlays
    pub fn total_bytes(&self) -> u64 {
        self.reports.iter().map(|r| r.outcome.bytes).sum()
    }
}

/// Decode `source`, remap its rows for `extent` and write the result to `destination`.
///
/// The output keeps the source's dimensions, colour mode, bit depth, palette
/// and transparency.
pub fn reproject_file(
    source: &Path,
    destination: &Path,
    extent: &LatitudeExtent,
    compression: Compression,
) -> Result<ReprojectOutcome> {
    let raster = read_png(source)?;
    log_raster_stats(
        &source.display().to_string(),
        raster.width(),
        raster.height(),
        raster.color_mode(),
        raster.bit_depth(),
        raster.memory_usage(),
    );

    let map = RowIndexMap::build(extent, raster.height())?;
    let stats = map.stats();
    let output = resample(&raster, &map)?;
    drop(raster);

    let bytes = write_png(&output, destination, compression)?;

    Ok(ReprojectOutcome {
        width: output.width(),
        height: output.height(),
        color_mode: output.color_mode(),
        bit_depth: output.bit_depth(),
        bytes,
        stats,
    })
}

/// Fetch and reproject one tile.
async fn process_tile(
    tile: &TileSpec,
    config: &Config,
    downloader: Option<&Downloader>,
    run_id: &str,
) -> Result<TileReport> {
    // Reject a bad extent before any file is touched
    let extent = tile.extent()?;

    let source_path = match downloader {
        Some(downloader) => {
            downloader
                .ensure_cached(tile, &config.cache_dir, config.force_download)
                .await?
        }
        None => cached_source(tile, &config.cache_dir).await?,
    };
    let output_path = config.output_dir.join(&tile.filename);

    info!(
        tile = %tile.name,
        extent = %extent,
        "Reprojecting"
    );

    let compression = config.compression;
    let run_id = run_id.to_string();
    let (src, dst) = (source_path.clone(), output_path.clone());
    let outcome = tokio::task::spawn_blocking(move || {
        log_timed_operation("reproject", &run_id, || {
            reproject_file(&src, &dst, &extent, compression)
        })
    })
    .await
    .map_err(|e| WarpError::Task {
        message: format!("reprojection task for '{}' failed: {}", tile.name, e),
    })??;

    info!(
        tile = %tile.name,
        output = %output_path.display(),
        width = outcome.width,
        height = outcome.height,
        color_mode = %outcome.color_mode,
        duplicated_rows = outcome.stats.duplicated_rows,
        skipped_rows = outcome.stats.skipped_rows,
        size_mb = outcome.bytes as f64 / 1_048_576.0,
        "Tile done"
    );

    Ok(TileReport {
        tile: tile.clone(),
        source_path,
        output_path,
        outcome,
    })
}

/// Process every selected tile of `config` and refresh the manifest.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let run_id = generate_run_id();
    let tiles = config.selected_tiles();
    let start = Instant::now();
    log_operation_start(
        "reproject_catalog",
        Some(&format!(
            "{} tile(s), {} job(s), run {}",
            tiles.len(),
            config.jobs,
            run_id
        )),
    );

    tokio::fs::create_dir_all(&config.output_dir).await?;
    let downloader = if config.offline {
        None
    } else {
        Some(Downloader::new(config.download.clone())?)
    };

    let downloader = downloader.as_ref();
    let run_id_ref = run_id.as_str();
    let mut results: Vec<(usize, String, Result<TileReport>)> =
        stream::iter(tiles.iter().enumerate())
            .map(|(position, tile)| {
                let span = info_span!("tile", tile = %tile.name, run_id = run_id_ref);
                async move {
                    let result = process_tile(tile, config, downloader, run_id_ref).await;
                    (position, tile.name.clone(), result)
                }
                .instrument(span)
            })
            .buffer_unordered(config.jobs.max(1))
            .collect()
            .await;
    results.sort_by_key(|(position, _, _)| *position);

    let mut summary = RunSummary {
        run_id: run_id.clone(),
        ..Default::default()
    };
    for (_, name, result) in results {
        match result {
            Ok(report) => summary.reports.push(report),
            Err(e) => {
                log_error(&e, &format!("tile '{}'", name));
                summary.failures.push(TileFailure {
                    name,
                    error: e.to_string(),
                });
            }
        }
    }

    if config.write_manifest && !summary.reports.is_empty() {
        let path = config.manifest_path();
        let mut manifest = OverlayManifest::load(&path).await?.unwrap_or_default();
        for report in &summary.reports {
            manifest.upsert(report.overlay_entry());
        }
        let position = |name: &str| {
            config
                .tiles
                .iter()
                .position(|tile| tile.name == name)
                .unwrap_or(usize::MAX)
        };
        manifest.retain_names(|name| position(name) != usize::MAX);
        manifest.sort_by_rank(position);
        manifest.save(&path).await?;
        info!(path = %path.display(), overlays = manifest.overlays.len(), "Manifest written");
    }

    info!(
        processed = summary.reports.len(),
        failed = summary.failures.len(),
        total_mb = summary.total_bytes() as f64 / 1_048_576.0,
        "Run finished"
    );
    log_operation_end("reproject_catalog", start, summary.is_success());

    Ok(summary)
}
