//! Plate-carree to Web Mercator row geometry.
//!
//! This module holds the projector pair, the latitude extent type and the
//! row-index mapper that turns an extent into a per-row source index table.

pub mod extent;
pub mod mercator;
pub mod row_map;

pub use extent::LatitudeExtent;
pub use mercator::{inverse_mercator_y, mercator_y};
pub use row_map::{RowIndexMap, RowMapStats};
