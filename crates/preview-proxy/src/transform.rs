//! Image fill-cropping

use crate::error::Result;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Scale the image to cover `width` x `height`, crop the overflow around the
/// center, and re-encode as JPEG.
pub fn fill(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let src = image::load_from_memory(data)?;
    let filled = src.resize_to_fill(width, height, FilterType::Lanczos3);

    // JPEG carries no alpha channel; flatten before encoding.
    let out = DynamicImage::ImageRgb8(filled.into_rgb8());
    let mut buf = Cursor::new(Vec::new());
    out.write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(buf.into_inner())
}
