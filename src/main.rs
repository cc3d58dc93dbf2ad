//! mercwarp - reproject plate-carree overlays onto Web Mercator rows
//!
//! This is the main entry point for the mercwarp batch tool.

use tracing::{error, info, warn};

use mercwarp::pipeline;
use mercwarp::{init_tracing, Config, Result, WarpError};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    init_tracing(&config.log_level);

    info!("Starting mercwarp v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!(
        cache_dir = %config.cache_dir.display(),
        output_dir = %config.output_dir.display(),
        offline = config.offline,
        "Configuration loaded"
    );

    let summary = pipeline::run(&config).await?;

    for report in &summary.reports {
        info!(
            "{} -> {} ({:.1} MB)",
            report.tile.filename,
            report.output_path.display(),
            report.outcome.bytes as f64 / 1_048_576.0
        );
    }
    for failure in &summary.failures {
        warn!("{} failed: {}", failure.name, failure.error);
    }

    info!(
        "{} Mercator-corrected file(s) in {} (total: {:.1} MB)",
        summary.reports.len(),
        config.output_dir.display(),
        summary.total_bytes() as f64 / 1_048_576.0
    );

    if !summary.is_success() {
        return Err(WarpError::Task {
            message: format!("{} tile(s) failed", summary.failures.len()),
        });
    }

    Ok(())
}
