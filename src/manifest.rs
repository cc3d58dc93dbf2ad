//! Overlay manifest written next to the reprojected PNGs.
//!
//! The manifest tells a web map which file to place where: each entry carries
//! Leaflet `ImageOverlay` bounds (`[[south, west], [north, east]]`) together
//! with the output's pixel size and colour mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::error::Result;
use crate::raster::codec::partial_path;
use crate::raster::ColorMode;

/// One reprojected overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub name: String,
    pub file: String,
    #[serde(default)]
    pub description: String,
    pub bounds: [[f64; 2]; 2],
    pub width: usize,
    pub height: usize,
    pub color_mode: ColorMode,
    pub bytes: u64,
    pub duplicated_rows: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayManifest {
    pub generated_at: DateTime<Utc>,
    pub overlays: Vec<OverlayEntry>,
}

impl Default for OverlayManifest {
    fn default() -> Self {
        Self {
            generated_at: Utc::now(),
            overlays: Vec::new(),
        }
    }
}

impl OverlayManifest {
    /// Read an existing manifest; a missing file is not an error.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the entry with the same name, or append.
    pub fn upsert(&mut self, entry: OverlayEntry) {
        match self.overlays.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.overlays.push(entry),
        }
    }

    /// Drop entries whose name is not accepted by `keep`.
    pub fn retain_names<F>(&mut self, keep: F)
    where
        F: Fn(&str) -> bool,
    {
        self.overlays.retain(|entry| keep(&entry.name));
    }

    /// Order entries by `rank`, unknown names last.
    pub fn sort_by_rank<F>(&mut self, rank: F)
    where
        F: Fn(&str) -> usize,
    {
        self.overlays.sort_by_key(|entry| rank(&entry.name));
    }

    /// Stamp and write as pretty JSON, replacing the file in one rename.
    pub async fn save(&mut self, path: &Path) -> Result<()> {
        self.generated_at = Utc::now();
        let partial = partial_path(path);
        fs::write(&partial, serde_json::to_string_pretty(self)?).await?;
        fs::rename(&partial, path).await?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&OverlayEntry> {
        self.overlays.iter().find(|entry| entry.name == name)
    }
}
