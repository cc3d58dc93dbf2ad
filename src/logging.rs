//! Logging utilities for mercwarp.
//!
//! This module provides structured logging helpers so that a batch run can be
//! followed tile by tile and grepped afterwards.

use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::raster::ColorMode;

/// Initialize the tracing subscriber with the given log level
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Log a start message for a significant operation
pub fn log_operation_start(operation: &str, details: Option<&str>) {
    if let Some(details) = details {
        info!(
            operation = operation,
            details = details,
            "Starting operation"
        );
    } else {
        info!(operation = operation, "Starting operation");
    }
}

/// Log the completion of a significant operation
pub fn log_operation_end(operation: &str, start_time: Instant, success: bool) {
    let duration = start_time.elapsed();
    let duration_ms = duration.as_secs_f64() * 1000.0;

    if success {
        info!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed successfully"
        );
    } else {
        warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Operation completed with failures"
        );
    }
}

/// Log an operation with timing and result in a single statement
pub fn log_timed_operation<F, R>(operation: &str, run_id: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();

    debug!(operation = operation, run_id = run_id, "Starting operation");

    let result = f();

    info!(
        operation = operation,
        run_id = run_id,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );

    result
}

/// Log the layout of a decoded raster
pub fn log_raster_stats(
    file_path: &str,
    width: usize,
    height: usize,
    color_mode: ColorMode,
    bit_depth: u8,
    memory_usage: usize,
) {
    info!(
        operation = "raster_load",
        file_path = file_path,
        width = width,
        height = height,
        color_mode = %color_mode,
        bit_depth = bit_depth,
        memory_mb = memory_usage / (1024 * 1024),
        "Raster loaded"
    );
}

/// Log an error with context
pub fn log_error(error: &crate::error::WarpError, context: &str) {
    error!(
        error = %error,
        context = context,
        "Error occurred"
    );
}

/// Generate a unique id for one batch run
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}
