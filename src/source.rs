//! # Source Photos
//!
//! Decodes the photos users assign to labels. Anything the `image` crate
//! reads (PNG, JPEG, BMP, ...) works out of the box. HEIC/HEIF photos, as
//! phones produce them, need the `heif` feature.

use std::path::Path;

use image::DynamicImage;

use crate::error::SheetError;

/// Read and decode a photo from disk.
pub fn open(path: &Path) -> Result<DynamicImage, SheetError> {
    let bytes = std::fs::read(path)?;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    decode(&bytes, name)
}

/// Decode photo bytes. `name` is only used to recognize `.heic`/`.heif`.
pub fn decode(bytes: &[u8], name: &str) -> Result<DynamicImage, SheetError> {
    let lower = name.to_lowercase();
    let image = if is_heif(bytes) || lower.ends_with(".heic") || lower.ends_with(".heif") {
        decode_heif(bytes)?
    } else {
        image::load_from_memory(bytes)?
    };

    if image.width() == 0 || image.height() == 0 {
        return Err(SheetError::InvalidInput(format!("photo '{}' is empty", name)));
    }
    Ok(image)
}

/// ISO base media files start with a box size followed by `ftyp` and a brand.
pub fn is_heif(data: &[u8]) -> bool {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return false;
    }
    matches!(
        &data[8..12],
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"hevm" | b"hevs" | b"mif1" | b"msf1"
    )
}

#[cfg(feature = "heif")]
fn decode_heif(data: &[u8]) -> Result<DynamicImage, SheetError> {
    use image::{Rgb, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let failed = |e: libheif_rs::HeifError| SheetError::InvalidInput(format!("HEIF decode failed: {}", e));

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data).map_err(failed)?;
    let handle = ctx.primary_image_handle().map_err(failed)?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(failed)?;

    let planes = decoded.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| SheetError::InvalidInput("HEIF image has no interleaved RGB plane".into()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let stride = interleaved.stride;
    let samples = interleaved.data;

    let mut rgb = RgbImage::new(width, height);
    for y in 0..height {
        let row = y as usize * stride;
        for x in 0..width {
            let offset = row + x as usize * 3;
            if let Some(px) = samples.get(offset..offset + 3) {
                rgb.put_pixel(x, y, Rgb([px[0], px[1], px[2]]));
            }
        }
    }
    Ok(DynamicImage::ImageRgb8(rgb))
}

#[cfg(not(feature = "heif"))]
fn decode_heif(_data: &[u8]) -> Result<DynamicImage, SheetError> {
    Err(SheetError::InvalidInput(
        "HEIC/HEIF photos need the `heif` feature".into(),
    ))
}
