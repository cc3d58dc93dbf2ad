//! Error types for mercwarp.
//!
//! The first three variants are raised by the pure reprojection core and are
//! deterministic for a given input. Everything else comes from the driver
//! (files, PNG codec, network, configuration).

use thiserror::Error;

/// The main error type for mercwarp operations.
#[derive(Error, Debug)]
pub enum WarpError {
    /// Latitude extent is empty, reversed, non-finite, touches a pole, or leaves [-90, 90]
    #[error("Invalid extent [{lat_min}, {lat_max}]: {message}")]
    InvalidExtent {
        lat_min: f64,
        lat_max: f64,
        message: String,
    },

    /// Row-index mapping needs at least two rows
    #[error("Degenerate raster height {height}: at least two rows are required")]
    DegenerateHeight { height: usize },

    /// Row-index map does not fit the raster it is applied to
    #[error("Shape mismatch: {message}")]
    ShapeMismatch { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG decoding errors
    #[error("PNG decode error: {0}")]
    PngDecode(#[from] png::DecodingError),

    /// PNG encoding errors
    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),

    /// Raster layouts we cannot carry through unchanged
    #[error("Unsupported image: {message}")]
    UnsupportedImage { message: String },

    /// Pixel buffer does not match the declared raster dimensions
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Download failures (missing cache in offline mode, size mismatch, retries exhausted)
    #[error("Download failed for {url}: {message}")]
    Download { url: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background task panicked or was cancelled
    #[error("Task error: {message}")]
    Task { message: String },
}

/// Convenience type alias for Results with WarpError
pub type Result<T> = std::result::Result<T, WarpError>;
