//! Assertion utilities for reprojected rasters.

use mercwarp::{LatitudeExtent, Raster, RowIndexMap};

/// Assert that every output row is the source row the Mercator map selects.
///
/// # Panics
///
/// Panics on the first output row that differs from its mapped source row.
pub fn assert_rows_follow_mercator_map(source: &Raster, output: &Raster, extent: &LatitudeExtent) {
    assert_eq!(source.height(), output.height(), "height changed");
    assert_eq!(source.width(), output.width(), "width changed");
    assert_eq!(source.lanes(), output.lanes(), "lane count changed");

    let map = RowIndexMap::build(extent, source.height()).expect("valid row map");
    for (out_row, &src_row) in map.indices().iter().enumerate() {
        assert!(
            output.row(out_row) == source.row(src_row),
            "output row {} does not match source row {}",
            out_row,
            src_row
        );
    }
}

/// Assert that colour layout and its metadata survived unchanged.
pub fn assert_same_layout(source: &Raster, output: &Raster) {
    assert_eq!(source.color_mode(), output.color_mode());
    assert_eq!(source.bit_depth(), output.bit_depth());
    assert_eq!(source.palette(), output.palette());
    assert_eq!(source.transparency(), output.transparency());
}
