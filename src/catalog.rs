//! Tile table: where each source sheet lives and what it covers.
//!
//! The built-in catalog lists the 2024 light-pollution atlas sheets. A JSON
//! config file can replace it with any other set of plate-carree PNGs.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpError};
use crate::projection::LatitudeExtent;

const LP2024_BASE: &str = "https://djlorenz.github.io/astronomy/lp2024";

/// One source raster and its geographic footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Short identifier used by `--only` and the manifest
    pub name: String,
    /// Download location of the plate-carree source
    pub url: String,
    /// File name used in both the cache and the output directory
    pub filename: String,
    /// Human readable description for logs and the manifest
    #[serde(default)]
    pub description: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl TileSpec {
    fn lp2024(
        name: &str,
        source: &str,
        filename: &str,
        description: &str,
        (lat_min, lat_max): (f64, f64),
        (lon_min, lon_max): (f64, f64),
    ) -> Self {
        Self {
            name: name.to_string(),
            url: format!("{}/{}", LP2024_BASE, source),
            filename: filename.to_string(),
            description: description.to_string(),
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Validated latitude extent of this tile
    pub fn extent(&self) -> Result<LatitudeExtent> {
        LatitudeExtent::new(self.lat_min, self.lat_max)
    }

    /// Check everything the driver relies on besides the latitude extent.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| WarpError::Config {
            message: format!("tile '{}': {}", self.name, message),
        };

        if self.name.is_empty() {
            return Err(WarpError::Config {
                message: "tile name cannot be empty".to_string(),
            });
        }
        if self.filename.is_empty()
            || self.filename.contains(['/', '\\'])
            || self.filename == "."
            || self.filename == ".."
        {
            return Err(invalid(format!(
                "filename '{}' must be a plain file name",
                self.filename
            )));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(invalid(format!("url '{}' must be http(s)", self.url)));
        }
        if !(-180.0..=180.0).contains(&self.lon_min)
            || !(-180.0..=180.0).contains(&self.lon_max)
            || self.lon_min >= self.lon_max
        {
            return Err(invalid(format!(
                "longitude range [{}, {}] must satisfy -180 <= lon_min < lon_max <= 180",
                self.lon_min, self.lon_max
            )));
        }
        self.extent().map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Leaflet `ImageOverlay` bounds: `[[south, west], [north, east]]`
    pub fn leaflet_bounds(&self) -> [[f64; 2]; 2] {
        [[self.lat_min, self.lon_min], [self.lat_max, self.lon_max]]
    }
}

/// The 2024 light-pollution atlas sheets with their stated extents.
pub fn default_catalog() -> Vec<TileSpec> {
    vec![
        TileSpec::lp2024(
            "world",
            "world2024_low3.png",
            "world_low3.png",
            "World LP 2024, 1/40°, 65°S-75°N, 180°W-180°E",
            (-65.0, 75.0),
            (-180.0, 180.0),
        ),
        TileSpec::lp2024(
            "north_america",
            "NorthAmerica2024.png",
            "NorthAmerica.png",
            "North America LP 2024, 1/120°, 7-75°N, 180-51°W",
            (7.0, 75.0),
            (-180.0, -51.0),
        ),
        TileSpec::lp2024(
            "south_america",
            "SouthAmerica2024.png",
            "SouthAmerica.png",
            "South America LP 2024, 1/120°, 57°S-14°N, 93-33°W",
            (-57.0, 14.0),
            (-93.0, -33.0),
        ),
        TileSpec::lp2024(
            "europe",
            "Europe2024.png",
            "Europe2024.png",
            "Europe LP 2024, 1/120°, 34-75°N, 32°W-70°E",
            (34.0, 75.0),
            (-32.0, 70.0),
        ),
        TileSpec::lp2024(
            "africa",
            "Africa2024.png",
            "Africa.png",
            "Africa LP 2024, 1/120°, 36°S-38°N, 26°W-64°E",
            (-36.0, 38.0),
            (-26.0, 64.0),
        ),
        TileSpec::lp2024(
            "asia",
            "Asia2024.png",
            "Asia.png",
            "Asia LP 2024, 1/120°, 5-75°N, 60-180°E",
            (5.0, 75.0),
            (60.0, 180.0),
        ),
        TileSpec::lp2024(
            "australia",
            "Australia2024.png",
            "Australia.png",
            "Australia LP 2024, 1/120°, 48°S-8°N, 94-180°E",
            (-48.0, 8.0),
            (94.0, 180.0),
        ),
    ]
}
