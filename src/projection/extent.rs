//! Geographic latitude bounds of a plate-carree raster.

use crate::error::{Result, WarpError};

/// North/south bounds of a raster whose first row sits at `lat_max` and whose
/// last row sits at `lat_min`, rows evenly spaced in latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatitudeExtent {
    lat_min: f64,
    lat_max: f64,
}

impl LatitudeExtent {
    /// Build a validated extent.
    ///
    /// Both bounds must be finite, inside [-90, 90] and not on a pole (the
    /// Mercator ordinate is unbounded there), and `lat_min < lat_max`.
    pub fn new(lat_min: f64, lat_max: f64) -> Result<Self> {
        let invalid = |message: &str| WarpError::InvalidExtent {
            lat_min,
            lat_max,
            message: message.to_string(),
        };

        if !lat_min.is_finite() || !lat_max.is_finite() {
            return Err(invalid("latitudes must be finite"));
        }
        if !(-90.0..=90.0).contains(&lat_min) || !(-90.0..=90.0).contains(&lat_max) {
            return Err(invalid("latitudes must be in the range -90 to 90"));
        }
        if lat_min.abs() == 90.0 || lat_max.abs() == 90.0 {
            return Err(invalid("Web Mercator cannot represent the poles"));
        }
        if lat_min >= lat_max {
            return Err(invalid("lat_min must be strictly less than lat_max"));
        }

        Ok(Self { lat_min, lat_max })
    }

    /// Southern bound (latitude of the last row)
    pub fn lat_min(&self) -> f64 {
        self.lat_min
    }

    /// Northern bound (latitude of the first row)
    pub fn lat_max(&self) -> f64 {
        self.lat_max
    }

    /// Latitude span in degrees; always positive.
    pub fn span(&self) -> f64 {
        self.lat_max - self.lat_min
    }
}

impl std::fmt::Display for LatitudeExtent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°..{}°", self.lat_min, self.lat_max)
    }
}
