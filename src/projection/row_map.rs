//! Nearest-neighbour row mapping from plate-carree to Web Mercator.
//!
//! Output rows are evenly spaced in Mercator Y between the extent's bounds.
//! Each one is converted back to a latitude and then to the source row that
//! contains it under the source's linear-latitude spacing. Mercator stretches
//! high latitudes and squeezes the tropics, so the resulting table repeats
//! rows toward the poles and skips rows near the equator.

use crate::error::{Result, WarpError};
use crate::projection::extent::LatitudeExtent;
use crate::projection::mercator::{inverse_mercator_y, mercator_y};

/// Source-row index for every output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIndexMap {
    indices: Vec<usize>,
    source_height: usize,
}

/// How much a row map expands and compresses its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowMapStats {
    /// Output rows that repeat the previous output row's source row
    pub duplicated_rows: usize,
    /// Source rows no output row refers to
    pub skipped_rows: usize,
}

impl RowIndexMap {
    /// Build the map for a raster of `height` rows covering `extent`.
    ///
    /// The output has the same height as the source. Ties at exact half rows
    /// round to even.
    pub fn build(extent: &LatitudeExtent, height: usize) -> Result<Self> {
        if height <= 1 {
            return Err(WarpError::DegenerateHeight { height });
        }

        let lat_max = extent.lat_max();
        let lat_span = extent.span();
        let merc_max = mercator_y(lat_max);
        let merc_span = merc_max - mercator_y(extent.lat_min());

        let last_row = (height - 1) as f64;
        let rows = height as f64;

        let indices = (0..height)
            .map(|i| {
                let fraction = i as f64 / last_row;
                let lat = inverse_mercator_y(merc_max - fraction * merc_span);
                let src_row = ((lat_max - lat) / lat_span * rows).round_ties_even();
                // Float excursions at the extremes can land just outside the raster
                src_row.clamp(0.0, last_row) as usize
            })
            .collect();

        Ok(Self {
            indices,
            source_height: height,
        })
    }

    /// Wrap an explicit index table.
    ///
    /// Every index must address a row of a raster with `source_height` rows.
    pub fn from_indices(indices: Vec<usize>, source_height: usize) -> Result<Self> {
        if let Some(bad) = indices.iter().find(|&&index| index >= source_height) {
            return Err(WarpError::ShapeMismatch {
                message: format!(
                    "row index {} is out of range for a source of {} rows",
                    bad, source_height
                ),
            });
        }
        Ok(Self {
            indices,
            source_height,
        })
    }

    /// Source row for each output row, top to bottom
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of output rows
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Row count of the raster this map was built for
    pub fn source_height(&self) -> usize {
        self.source_height
    }

    /// Count repeated and unreferenced source rows.
    pub fn stats(&self) -> RowMapStats {
        let duplicated_rows = self
            .indices
            .windows(2)
            .filter(|pair| pair[0] == pair[1])
            .count();

        let mut referenced = vec![false; self.source_height];
        for &index in &self.indices {
            referenced[index] = true;
        }
        let skipped_rows = referenced.iter().filter(|&&hit| !hit).count();

        RowMapStats {
            duplicated_rows,
            skipped_rows,
        }
    }
}
