//! In-memory rasters that keep their on-disk colour layout.
//!
//! A [`Raster`] stores pixels as a `(height, width, lanes)` byte array. Lanes
//! are bytes, not channels: 16-bit samples take two lanes each (big-endian, as
//! in the PNG stream), and sub-byte samples (1, 2 or 4 bit grayscale or
//! palette indices) are unpacked to one byte per sample. Row operations never
//! need to know the difference, and the codec can write exactly what it read.

pub mod codec;
pub mod resample;

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpError};

pub use codec::{decode_png, encode_png, read_png, write_png, Compression};
pub use resample::{reproject, resample};

/// Pixel storage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Palette indices into a shared colour table
    Indexed,
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
}

impl ColorMode {
    /// Samples per pixel
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Indexed | ColorMode::Grayscale => 1,
            ColorMode::GrayscaleAlpha => 2,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }

    /// Whether `bit_depth` is a legal PNG depth for this mode
    pub fn supports_bit_depth(&self, bit_depth: u8) -> bool {
        match self {
            ColorMode::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
            ColorMode::Grayscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            ColorMode::GrayscaleAlpha | ColorMode::Rgb | ColorMode::Rgba => {
                matches!(bit_depth, 8 | 16)
            }
        }
    }

    /// Byte lanes per pixel in memory for the given bit depth
    pub fn lanes(&self, bit_depth: u8) -> usize {
        let bytes_per_sample = if bit_depth == 16 { 2 } else { 1 };
        self.channels() * bytes_per_sample
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColorMode::Indexed => "indexed",
            ColorMode::Grayscale => "grayscale",
            ColorMode::GrayscaleAlpha => "grayscale_alpha",
            ColorMode::Rgb => "rgb",
            ColorMode::Rgba => "rgba",
        };
        f.write_str(name)
    }
}

/// Ordered RGB colour table for indexed rasters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<[u8; 3]>);

impl Palette {
    pub fn new(entries: Vec<[u8; 3]>) -> Self {
        Self(entries)
    }

    /// Parse the body of a PLTE chunk
    pub fn from_plte(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 3 != 0 {
            return Err(WarpError::UnsupportedImage {
                message: format!("palette length {} is not a multiple of 3", bytes.len()),
            });
        }
        Ok(Self(
            bytes
                .chunks_exact(3)
                .map(|rgb| [rgb[0], rgb[1], rgb[2]])
                .collect(),
        ))
    }

    /// Body of a PLTE chunk
    pub fn to_plte(&self) -> Vec<u8> {
        self.0.iter().flatten().copied().collect()
    }

    pub fn entries(&self) -> &[[u8; 3]] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Transparency information carried alongside the pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transparency {
    /// Exactly one palette entry is fully transparent, all others opaque
    PaletteIndex(u8),
    /// Per-entry alpha for the leading palette entries
    PaletteAlpha(Vec<u8>),
    /// Colour key for grayscale or RGB rasters, laid out as in the tRNS chunk:
    /// one big-endian 16-bit value per channel whatever the bit depth
    ColorKey(Vec<u8>),
}

impl Transparency {
    /// Interpret tRNS data as the PNG decoder reports it.
    ///
    /// Below 16 bits the decoder narrows a colour key to one byte per sample;
    /// those are widened back to the chunk layout. A palette alpha table maps
    /// to [`Transparency::PaletteIndex`] only when it re-encodes to the very
    /// same bytes: one trailing fully transparent entry after opaque ones.
    pub fn from_trns(mode: ColorMode, bit_depth: u8, bytes: &[u8]) -> Self {
        if mode != ColorMode::Indexed {
            let key = if bit_depth < 16 && bytes.len() == mode.channels() {
                bytes.iter().flat_map(|&sample| [0, sample]).collect()
            } else {
                bytes.to_vec()
            };
            return Transparency::ColorKey(key);
        }

        match bytes.split_last() {
            Some((&0, opaque))
                if opaque.len() <= u8::MAX as usize && opaque.iter().all(|&alpha| alpha == 255) =>
            {
                Transparency::PaletteIndex(opaque.len() as u8)
            }
            _ => Transparency::PaletteAlpha(bytes.to_vec()),
        }
    }

    /// Body of a tRNS chunk
    pub fn to_trns(&self) -> Vec<u8> {
        match self {
            Transparency::PaletteIndex(index) => {
                let mut alpha = vec![255; *index as usize + 1];
                alpha[*index as usize] = 0;
                alpha
            }
            Transparency::PaletteAlpha(alpha) => alpha.clone(),
            Transparency::ColorKey(key) => key.clone(),
        }
    }
}

/// A decoded raster: pixels plus everything needed to re-encode them as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pixels: Array3<u8>,
    color_mode: ColorMode,
    bit_depth: u8,
    palette: Option<Palette>,
    transparency: Option<Transparency>,
}

impl Raster {
    /// Assemble a raster, checking that the parts agree with each other.
    pub fn new(
        pixels: Array3<u8>,
        color_mode: ColorMode,
        bit_depth: u8,
        palette: Option<Palette>,
        transparency: Option<Transparency>,
    ) -> Result<Self> {
        if !color_mode.supports_bit_depth(bit_depth) {
            return Err(WarpError::UnsupportedImage {
                message: format!("bit depth {} is not valid for {}", bit_depth, color_mode),
            });
        }

        let lanes = color_mode.lanes(bit_depth);
        if pixels.len_of(Axis(2)) != lanes {
            return Err(WarpError::ShapeMismatch {
                message: format!(
                    "{} at {} bits needs {} lanes per pixel, got {}",
                    color_mode,
                    bit_depth,
                    lanes,
                    pixels.len_of(Axis(2))
                ),
            });
        }

        match (&color_mode, &palette) {
            (ColorMode::Indexed, None) => {
                return Err(WarpError::UnsupportedImage {
                    message: "indexed raster without a palette".to_string(),
                });
            }
            (ColorMode::Indexed, Some(palette)) if palette.len() > 1 << bit_depth => {
                return Err(WarpError::UnsupportedImage {
                    message: format!(
                        "palette of {} entries does not fit {} bit indices",
                        palette.len(),
                        bit_depth
                    ),
                });
            }
            _ => {}
        }

        Ok(Self {
            pixels,
            color_mode,
            bit_depth,
            palette,
            transparency,
        })
    }

    /// Same metadata, different pixels. Used by row operations that keep the lane layout.
    pub(crate) fn with_pixels(&self, pixels: Array3<u8>) -> Self {
        Self {
            pixels,
            color_mode: self.color_mode,
            bit_depth: self.bit_depth,
            palette: self.palette.clone(),
            transparency: self.transparency.clone(),
        }
    }

    pub fn height(&self) -> usize {
        self.pixels.len_of(Axis(0))
    }

    pub fn width(&self) -> usize {
        self.pixels.len_of(Axis(1))
    }

    /// Byte lanes per pixel
    pub fn lanes(&self) -> usize {
        self.pixels.len_of(Axis(2))
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn transparency(&self) -> Option<&Transparency> {
        self.transparency.as_ref()
    }

    pub fn pixels(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// One row as a `(width, lanes)` view
    pub fn row(&self, index: usize) -> ArrayView2<'_, u8> {
        self.pixels.index_axis(Axis(0), index)
    }

    /// In-memory size of the pixel buffer
    pub fn memory_usage(&self) -> usize {
        self.pixels.len()
    }
}
