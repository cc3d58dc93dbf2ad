//! # mercwarp
//!
//! Reproject plate-carree raster overlays onto Web Mercator rows.
//!
//! Web maps stretch an image overlay linearly in Mercator space between its
//! corner coordinates. Imagery sampled on a latitude-linear grid therefore
//! lands hundreds of kilometres off at mid latitudes. This crate fixes that
//! with a pure vertical remap: every output row takes the nearest source row
//! for the latitude it represents in Mercator space. Longitude is linear in
//! both projections and is left alone.
//!
//! ## Architecture
//!
//! - **Projection**: the Mercator projector pair and the row-index mapper
//! - **Raster**: layout-preserving PNG codec and the row resampler
//! - **Driver**: tile catalog, download cache, batch pipeline and overlay manifest

pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod projection;
pub mod raster;

pub use catalog::{default_catalog, TileSpec};
pub use config::Config;
pub use error::{Result, WarpError};
pub use logging::{
    generate_run_id, init_tracing, log_error, log_operation_end, log_operation_start,
    log_raster_stats, log_timed_operation,
};
pub use projection::{inverse_mercator_y, mercator_y, LatitudeExtent, RowIndexMap, RowMapStats};
pub use raster::{reproject, resample, ColorMode, Palette, Raster, Transparency};
