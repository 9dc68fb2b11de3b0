//! # Page Export
//!
//! Serializes assembled page rasters for printing.
//!
//! ## PDF Layout
//!
//! One PDF page per raster. Each page carries a single RGB image XObject
//! drawn over the whole MediaBox, so the printed size of a page is its pixel
//! size at the DPI it was assembled at:
//!
//! ```text
//! MediaBox = [0 0  width·72/dpi  height·72/dpi]      (points)
//!
//! q  W 0 0 H 0 0 cm  /Im0 Do  Q                     (content stream)
//! ```
//!
//! Pages are opaque (white paper under every sticker), so the alpha channel
//! is dropped and no soft mask is written.

use std::path::{Path, PathBuf};

use chrono::Utc;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::info;

use crate::error::SheetError;

/// PostScript points per inch.
const POINTS_PER_INCH: f64 = 72.0;

/// Render pages into an in-memory PDF document.
pub fn pdf_bytes(pages: &[RgbaImage], dpi: u32) -> Result<Vec<u8>, SheetError> {
    if pages.is_empty() {
        return Err(SheetError::InvalidInput("no pages to export".into()));
    }
    if dpi == 0 {
        return Err(SheetError::InvalidInput("dpi must be positive".into()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page in pages {
        let (width, height) = page.dimensions();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            rgb_samples(page),
        ));

        let (width_pt, height_pt) = (points(width, dpi) as f32, points(height, dpi) as f32);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        },
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let created = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(concat!("stickersheet ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(created),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Write pages as a single PDF file.
pub fn write_pdf(pages: &[RgbaImage], dpi: u32, path: &Path) -> Result<(), SheetError> {
    let bytes = pdf_bytes(pages, dpi)?;
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), pages = pages.len(), dpi, bytes = bytes.len(), "wrote PDF");
    Ok(())
}

/// Write each page as `<stem>-<n>.png` in `dir`, numbered from 1.
///
/// Returns the written paths in page order.
pub fn write_pngs(pages: &[RgbaImage], dir: &Path, stem: &str) -> Result<Vec<PathBuf>, SheetError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let path = dir.join(format!("{}-{}.png", stem, index + 1));
        page.save(&path)?;
        written.push(path);
    }
    info!(dir = %dir.display(), pages = written.len(), "wrote PNG pages");
    Ok(written)
}

fn points(px: u32, dpi: u32) -> f64 {
    px as f64 * POINTS_PER_INCH / dpi as f64
}

fn rgb_samples(page: &RgbaImage) -> Vec<u8> {
    page.pixels().flat_map(|p| [p[0], p[1], p[2]]).collect()
}
