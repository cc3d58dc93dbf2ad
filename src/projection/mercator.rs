//! Spherical Mercator projector pair.
//!
//! Both functions work on the unitless Mercator ordinate (the Gudermannian
//! inverse), not on metres. Multiply by the earth radius if you need EPSG:3857
//! coordinates; the row mapper only ever needs ratios.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Mercator Y for a latitude in degrees.
///
/// The input must lie strictly inside (-90, 90). At the poles the result
/// diverges; callers validate their extents before getting here.
pub fn mercator_y(lat_deg: f64) -> f64 {
    (FRAC_PI_4 + lat_deg.to_radians() / 2.0).tan().ln()
}

/// Latitude in degrees for a Mercator Y. Total over finite input.
pub fn inverse_mercator_y(y: f64) -> f64 {
    (2.0 * y.exp().atan() - FRAC_PI_2).to_degrees()
}
