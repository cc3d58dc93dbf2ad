//! Row gather driven by a [`RowIndexMap`].

use ndarray::Axis;

use crate::error::{Result, WarpError};
use crate::projection::{LatitudeExtent, RowIndexMap};
use crate::raster::Raster;

/// Build a new raster whose row `i` is source row `map[i]`.
///
/// Width, lanes, colour mode, bit depth, palette and transparency are carried
/// over untouched; palette indices are copied, never re-quantized.
pub fn resample(source: &Raster, map: &RowIndexMap) -> Result<Raster> {
    if map.source_height() != source.height() {
        return Err(WarpError::ShapeMismatch {
            message: format!(
                "row map was built for {} source rows, raster has {}",
                map.source_height(),
                source.height()
            ),
        });
    }
    if map.len() != source.height() {
        return Err(WarpError::ShapeMismatch {
            message: format!(
                "row map has {} entries, raster has {} rows",
                map.len(),
                source.height()
            ),
        });
    }

    let pixels = source.pixels().select(Axis(0), map.indices());
    Ok(source.with_pixels(pixels))
}

/// Remap a plate-carree raster covering `extent` onto Web Mercator rows.
pub fn reproject(source: &Raster, extent: &LatitudeExtent) -> Result<Raster> {
    let map = RowIndexMap::build(extent, source.height())?;
    resample(source, &map)
}
