//! Cross-checks with an independent PNG decoder.
//!
//! Outputs are written by our own encoder; decoding them with the `image`
//! crate makes sure any other consumer (a browser, Pillow) would read them too.

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat};
use std::path::Path;

/// Load an image from a file
pub fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    image::open(path)
}

/// Detect image format from bytes
pub fn detect_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Dimensions as reported by the `image` crate
pub fn dimensions(path: &Path) -> (u32, u32) {
    load_image(path).expect("decodable PNG").dimensions()
}

/// RGBA value of a pixel after palette expansion
pub fn rgba_at(path: &Path, x: u32, y: u32) -> [u8; 4] {
    load_image(path).expect("decodable PNG").get_pixel(x, y).0
}
