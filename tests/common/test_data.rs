//! Test data generation utilities.
//!
//! Synthetic plate-carree sheets with recognisable rows, written as PNG in the
//! colour layouts the atlas sources use.

use std::path::Path;

use mercwarp::raster::{write_png, Compression};
use mercwarp::{ColorMode, Palette, Raster, Result, TileSpec, Transparency};
use ndarray::Array3;

/// Palette used by indexed fixtures: entry 0 is the transparent background.
pub fn fixture_palette() -> Palette {
    Palette::new(
        (0..=255u8)
            .map(|v| [v, v.wrapping_mul(3), 255 - v])
            .collect(),
    )
}

/// Indexed raster whose row `r` is filled with a value derived from `r`, with
/// a per-column offset so rows are not uniform.
pub fn indexed_raster(width: usize, height: usize) -> Raster {
    let pixels = Array3::from_shape_fn((height, width, 1), |(row, col, _)| {
        ((row * 7 + col / 8) % 255 + 1) as u8
    });
    Raster::new(
        pixels,
        ColorMode::Indexed,
        8,
        Some(fixture_palette()),
        Some(Transparency::PaletteIndex(0)),
    )
    .expect("valid indexed fixture")
}

/// RGB raster with a vertical gradient in red and a horizontal one in blue.
pub fn rgb_raster(width: usize, height: usize) -> Raster {
    let pixels = Array3::from_shape_fn((height, width, 3), |(row, col, channel)| match channel {
        0 => (row % 256) as u8,
        1 => (row / 256) as u8,
        _ => (col % 256) as u8,
    });
    Raster::new(pixels, ColorMode::Rgb, 8, None, None).expect("valid rgb fixture")
}

/// 8-bit RGB or grayscale raster whose first column holds sample value 5 and
/// the rest value 200, carrying `key` as its tRNS colour key.
pub fn keyed_raster(mode: ColorMode, width: usize, height: usize, key: Vec<u8>) -> Raster {
    let pixels = Array3::from_shape_fn((height, width, mode.channels()), |(row, col, _)| {
        if col == 0 {
            5
        } else {
            200u8.wrapping_sub((row % 7) as u8)
        }
    });
    Raster::new(pixels, mode, 8, None, Some(Transparency::ColorKey(key)))
        .expect("valid keyed fixture")
}

/// Write a colour-keyed fixture to `path`.
pub fn create_keyed_png(
    path: &Path,
    mode: ColorMode,
    width: usize,
    height: usize,
    key: Vec<u8>,
) -> Result<Raster> {
    let raster = keyed_raster(mode, width, height, key);
    write_png(&raster, path, Compression::Fast)?;
    Ok(raster)
}

/// Write an indexed fixture to `path`.
pub fn create_indexed_png(path: &Path, width: usize, height: usize) -> Result<Raster> {
    let raster = indexed_raster(width, height);
    write_png(&raster, path, Compression::Fast)?;
    Ok(raster)
}

/// Write an RGB fixture to `path`.
pub fn create_rgb_png(path: &Path, width: usize, height: usize) -> Result<Raster> {
    let raster = rgb_raster(width, height);
    write_png(&raster, path, Compression::Fast)?;
    Ok(raster)
}

/// A tile entry pointing at `url`.
pub fn tile(name: &str, url: &str, (lat_min, lat_max): (f64, f64)) -> TileSpec {
    TileSpec {
        name: name.to_string(),
        url: url.to_string(),
        filename: format!("{}.png", name),
        description: format!("{} test sheet", name),
        lat_min,
        lat_max,
        lon_min: -30.0,
        lon_max: 60.0,
    }
}
