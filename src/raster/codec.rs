//! PNG decoding and encoding that keeps the colour layout intact.
//!
//! Decoding uses no transformations, so palette images stay palette images
//! and the PLTE/tRNS chunks come back out exactly as they went in.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WarpError};
use crate::raster::{ColorMode, Palette, Raster, Transparency};

/// Deflate effort used when writing PNGs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Fast,
    #[default]
    Default,
    Best,
}

impl From<Compression> for png::Compression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Fast => png::Compression::Fast,
            Compression::Default => png::Compression::Default,
            Compression::Best => png::Compression::Best,
        }
    }
}

fn color_mode_of(color_type: png::ColorType) -> ColorMode {
    match color_type {
        png::ColorType::Grayscale => ColorMode::Grayscale,
        png::ColorType::Rgb => ColorMode::Rgb,
        png::ColorType::Indexed => ColorMode::Indexed,
        png::ColorType::GrayscaleAlpha => ColorMode::GrayscaleAlpha,
        png::ColorType::Rgba => ColorMode::Rgba,
    }
}

fn color_type_of(mode: ColorMode) -> png::ColorType {
    match mode {
        ColorMode::Grayscale => png::ColorType::Grayscale,
        ColorMode::Rgb => png::ColorType::Rgb,
        ColorMode::Indexed => png::ColorType::Indexed,
        ColorMode::GrayscaleAlpha => png::ColorType::GrayscaleAlpha,
        ColorMode::Rgba => png::ColorType::Rgba,
    }
}

/// Decode a PNG stream into a [`Raster`].
pub fn decode_png<R: Read>(input: R) -> Result<Raster> {
    // Continental atlas sheets run past 100 Mpx, well over the default limit
    let mut decoder = png::Decoder::new_with_limits(input, png::Limits { bytes: usize::MAX });
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;

    let (color_mode, bit_depth, width, height, palette, trns) = {
        let info = reader.info();
        (
            color_mode_of(info.color_type),
            info.bit_depth as u8,
            info.width as usize,
            info.height as usize,
            info.palette.as_ref().map(|plte| plte.to_vec()),
            info.trns.as_ref().map(|trns| trns.to_vec()),
        )
    };

    if width == 0 || height == 0 {
        return Err(WarpError::UnsupportedImage {
            message: format!("empty image {}x{}", width, height),
        });
    }

    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer)?;

    let lanes = color_mode.lanes(bit_depth);
    let mut samples = Vec::with_capacity(height * width * lanes);
    for line in buffer[..frame.buffer_size()]
        .chunks_exact(frame.line_size)
        .take(height)
    {
        if bit_depth < 8 {
            unpack_samples(line, width, bit_depth, &mut samples);
        } else {
            samples.extend_from_slice(&line[..width * lanes]);
        }
    }
    let pixels = Array3::from_shape_vec((height, width, lanes), samples)?;

    // A palette on a direct-colour image is only a quantization hint
    let palette = match (color_mode, palette) {
        (ColorMode::Indexed, Some(plte)) => Some(Palette::from_plte(&plte)?),
        _ => None,
    };
    let transparency = trns.map(|bytes| Transparency::from_trns(color_mode, bit_depth, &bytes));

    debug!(
        width = width,
        height = height,
        color_mode = %color_mode,
        bit_depth = bit_depth,
        "Decoded PNG"
    );

    Raster::new(pixels, color_mode, bit_depth, palette, transparency)
}

/// Encode a [`Raster`] as PNG in its own colour mode and bit depth.
pub fn encode_png<W: Write>(raster: &Raster, output: W, compression: Compression) -> Result<()> {
    let too_large = |dimension: &str, value: usize| WarpError::UnsupportedImage {
        message: format!("{} {} does not fit a PNG header", dimension, value),
    };
    let width = u32::try_from(raster.width()).map_err(|_| too_large("width", raster.width()))?;
    let height =
        u32::try_from(raster.height()).map_err(|_| too_large("height", raster.height()))?;
    let depth =
        png::BitDepth::from_u8(raster.bit_depth()).ok_or_else(|| WarpError::UnsupportedImage {
            message: format!("bit depth {} is not a PNG bit depth", raster.bit_depth()),
        })?;

    let mut encoder = png::Encoder::new(output, width, height);
    encoder.set_color(color_type_of(raster.color_mode()));
    encoder.set_depth(depth);
    encoder.set_compression(compression.into());
    if let Some(palette) = raster.palette() {
        encoder.set_palette(palette.to_plte());
    }
    if let Some(transparency) = raster.transparency() {
        encoder.set_trns(transparency.to_trns());
    }

    let pixels = raster.pixels();
    let samples = match pixels.as_slice() {
        Some(contiguous) => Cow::Borrowed(contiguous),
        None => Cow::Owned(pixels.iter().copied().collect()),
    };
    let data = if raster.bit_depth() < 8 {
        let mut packed = Vec::new();
        for row in samples.chunks_exact(raster.width() * raster.lanes()) {
            pack_samples(row, raster.bit_depth(), &mut packed);
        }
        Cow::Owned(packed)
    } else {
        samples
    };

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}

/// Read and decode a PNG file.
pub fn read_png(path: &Path) -> Result<Raster> {
    let file = File::open(path)?;
    decode_png(BufReader::new(file))
}

/// Encode `raster` to `path` via a sibling temp file, returning the written size.
///
/// The destination only ever holds a complete image.
pub fn write_png(raster: &Raster, path: &Path, compression: Compression) -> Result<u64> {
    let partial = partial_path(path);
    let written = File::create(&partial)
        .map_err(WarpError::from)
        .and_then(|file| {
            let mut output = BufWriter::new(file);
            encode_png(raster, &mut output, compression)?;
            output.flush()?;
            Ok(())
        });
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::rename(&partial, path)?;
    Ok(fs::metadata(path)?.len())
}

/// `<name>.partial` next to `path`
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Spread packed 1/2/4-bit samples into one byte each.
fn unpack_samples(line: &[u8], count: usize, bit_depth: u8, out: &mut Vec<u8>) {
    let depth = bit_depth as usize;
    let per_byte = 8 / depth;
    let mask = (1u8 << depth) - 1;
    for x in 0..count {
        let shift = 8 - depth * (x % per_byte + 1);
        out.push((line[x / per_byte] >> shift) & mask);
    }
}

/// Inverse of [`unpack_samples`] for a single row; the last byte is zero padded.
fn pack_samples(samples: &[u8], bit_depth: u8, out: &mut Vec<u8>) {
    let depth = bit_depth as usize;
    let per_byte = 8 / depth;
    let mask = (1u8 << depth) - 1;
    for chunk in samples.chunks(per_byte) {
        let mut byte = 0u8;
        for (i, &sample) in chunk.iter().enumerate() {
            byte |= (sample & mask) << (8 - depth * (i + 1));
        }
        out.push(byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_to_vec(raster: &Raster) -> Vec<u8> {
        let mut bytes = Vec::new();
        encode_png(raster, &mut bytes, Compression::Fast).unwrap();
        bytes
    }

    #[test]
    fn test_indexed_round_trip_keeps_palette_and_transparency() {
        let pixels = Array3::from_shape_fn((6, 4, 1), |(r, c, _)| ((r + c) % 3) as u8);
        let palette = Palette::new(vec![[0, 0, 0], [20, 40, 80], [250, 200, 10]]);
        let raster = Raster::new(
            pixels,
            ColorMode::Indexed,
            8,
            Some(palette.clone()),
            Some(Transparency::PaletteIndex(0)),
        )
        .unwrap();

        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded.color_mode(), ColorMode::Indexed);
        assert_eq!(decoded.palette(), Some(&palette));
        assert_eq!(decoded.transparency(), Some(&Transparency::PaletteIndex(0)));
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_four_bit_indices_survive() {
        // Odd width forces a padded final byte on each row
        let pixels = Array3::from_shape_fn((3, 5, 1), |(r, c, _)| ((r * 5 + c) % 16) as u8);
        let palette = Palette::new((0..16).map(|v| [v * 16, v, 255 - v]).collect());
        let raster =
            Raster::new(pixels, ColorMode::Indexed, 4, Some(palette), None).unwrap();

        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded.bit_depth(), 4);
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_one_bit_grayscale() {
        let pixels = Array3::from_shape_fn((2, 11, 1), |(r, c, _)| ((r + c) % 2) as u8);
        let raster = Raster::new(pixels, ColorMode::Grayscale, 1, None, None).unwrap();
        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_rgba_round_trip() {
        let pixels = Array3::from_shape_fn((5, 3, 4), |(r, c, k)| (r * 40 + c * 7 + k) as u8);
        let raster = Raster::new(pixels, ColorMode::Rgba, 8, None, None).unwrap();
        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_sixteen_bit_rgb_round_trip() {
        let pixels = Array3::from_shape_fn((2, 2, 6), |(r, c, k)| (r * 100 + c * 10 + k) as u8);
        let raster = Raster::new(pixels, ColorMode::Rgb, 16, None, None).unwrap();
        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded, raster);
    }

    #[test]
    fn test_eight_bit_rgb_color_key_survives_two_round_trips() {
        let pixels = Array3::from_shape_fn((4, 4, 3), |(r, c, _)| if r == c { 5 } else { 200 });
        let key = Transparency::ColorKey(vec![0, 5, 0, 5, 0, 5]);
        let raster = Raster::new(pixels, ColorMode::Rgb, 8, None, Some(key.clone())).unwrap();

        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded.transparency(), Some(&key));

        let bytes = encode_to_vec(&decoded);
        assert_eq!(decode_png(Cursor::new(bytes.clone())).unwrap(), raster);

        let rgba = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(rgba.get_pixel(1, 1).0, [5, 5, 5, 0]);
        assert_eq!(rgba.get_pixel(0, 1).0, [200, 200, 200, 255]);
    }

    #[test]
    fn test_eight_bit_grayscale_color_key_survives_two_round_trips() {
        let pixels = Array3::from_shape_fn((3, 5, 1), |(_, c, _)| (c * 10) as u8);
        let key = Transparency::ColorKey(vec![0, 20]);
        let raster =
            Raster::new(pixels, ColorMode::Grayscale, 8, None, Some(key.clone())).unwrap();

        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded.transparency(), Some(&key));

        let bytes = encode_to_vec(&decoded);
        assert_eq!(decode_png(Cursor::new(bytes.clone())).unwrap(), raster);

        let gray = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(gray.get_pixel(2, 0).0[3], 0);
        assert_eq!(gray.get_pixel(3, 0).0[3], 255);
    }

    #[test]
    fn test_encode_non_contiguous_pixels() {
        let pixels = Array3::from_shape_fn((3, 2, 3), |(r, c, k)| (r * 30 + c * 3 + k) as u8);
        let mut flipped = pixels.clone();
        flipped.invert_axis(ndarray::Axis(0));
        let raster = Raster::new(flipped, ColorMode::Rgb, 8, None, None).unwrap();
        assert!(raster.pixels().as_slice().is_none());

        let decoded = decode_png(Cursor::new(encode_to_vec(&raster))).unwrap();
        assert_eq!(decoded.row(0), pixels.index_axis(ndarray::Axis(0), 2));
    }

    #[test]
    fn test_pack_unpack() {
        let samples = [3, 0, 1, 2, 3];
        let mut packed = Vec::new();
        pack_samples(&samples, 2, &mut packed);
        assert_eq!(packed, vec![0b1100_0110, 0b1100_0000]);

        let mut unpacked = Vec::new();
        unpack_samples(&packed, samples.len(), 2, &mut unpacked);
        assert_eq!(unpacked, samples);
    }

    #[test]
    fn test_garbage_input() {
        let result = decode_png(Cursor::new(b"definitely not a png".to_vec()));
        assert!(matches!(result, Err(WarpError::PngDecode(_))));
    }

    #[test]
    fn test_write_png_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        let pixels = Array3::from_elem((2, 2, 3), 9u8);
        let raster = Raster::new(pixels, ColorMode::Rgb, 8, None, None).unwrap();

        let bytes = write_png(&raster, &path, Compression::Default).unwrap();
        assert!(bytes > 0);
        assert!(!partial_path(&path).exists());
        assert_eq!(read_png(&path).unwrap(), raster);
    }

    #[test]
    fn test_partial_path() {
        let path = Path::new("/tmp/out/Europe2024.png");
        assert_eq!(
            partial_path(path),
            PathBuf::from("/tmp/out/Europe2024.png.partial")
        );
    }
}
