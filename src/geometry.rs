//! # Sheet Geometry
//!
//! Converts the physical (millimeter) description of a label sheet into pixel
//! positions at a print resolution.
//!
//! ## Calculations
//!
//! ```text
//! px = trunc(mm / 25.4 * dpi)
//!
//! cell (r, c) origin:
//!   x = px(left_margin) + c * (px(sticker_width)  + px(horizontal_gap))
//!   y = px(top_margin)  + r * (px(sticker_height) + px(vertical_gap))
//! ```
//!
//! Every length is converted on its own and then combined, so the column stride
//! is the same integer for every cell of a row. Truncation (not rounding) is
//! applied to each conversion; a 5mm gap at 150 DPI is 29px, not 30px.
//!
//! ## Usage
//!
//! ```
//! use stickersheet::geometry::mm_to_px;
//!
//! assert_eq!(mm_to_px(10.0, 150), 59);
//! assert_eq!(mm_to_px(210.0, 300), 2480);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::template::TemplateDescriptor;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Convert millimeters to whole pixels at `dpi`, truncating toward zero.
///
/// Negative lengths saturate to 0.
#[inline]
pub fn mm_to_px(value_mm: f64, dpi: u32) -> u32 {
    (value_mm / MM_PER_INCH * dpi as f64) as u32
}

/// Convert pixels back to millimeters at `dpi`.
#[inline]
pub fn px_to_mm(px: u32, dpi: u32) -> f64 {
    px as f64 * MM_PER_INCH / dpi as f64
}

/// A (row, column) position in the sticker grid, 0-indexed.
///
/// Ordering is row-major, which is the order cells are laid out on a page.
/// `Display` is 1-indexed because that is how users count labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoordinate {
    pub row: u32,
    pub column: u32,
}

impl GridCoordinate {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Build from the 1-indexed numbers a user typed. Returns `None` for 0.
    pub fn from_one_based(row: u32, column: u32) -> Option<Self> {
        Some(Self {
            row: row.checked_sub(1)?,
            column: column.checked_sub(1)?,
        })
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row + 1, self.column + 1)
    }
}

/// Width and height of a raster in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Pixel size of one sticker. The grid is uniform, so this holds for every cell.
pub fn cell_size(descriptor: &TemplateDescriptor, dpi: u32) -> PixelSize {
    PixelSize::new(
        mm_to_px(descriptor.sticker_width_mm, dpi),
        mm_to_px(descriptor.sticker_height_mm, dpi),
    )
}

/// Top-left pixel of cell (`row`, `column`) on its page.
///
/// Closed form: no cell depends on another, so cells can be placed in any order.
pub fn cell_origin(row: u32, column: u32, descriptor: &TemplateDescriptor, dpi: u32) -> (u32, u32) {
    let stride_x =
        mm_to_px(descriptor.sticker_width_mm, dpi) + mm_to_px(descriptor.horizontal_gap_mm, dpi);
    let stride_y =
        mm_to_px(descriptor.sticker_height_mm, dpi) + mm_to_px(descriptor.vertical_gap_mm, dpi);

    (
        mm_to_px(descriptor.left_margin_mm, dpi) + column * stride_x,
        mm_to_px(descriptor.top_margin_mm, dpi) + row * stride_y,
    )
}

/// Pixel size of the whole page.
pub fn page_size(descriptor: &TemplateDescriptor, dpi: u32) -> PixelSize {
    PixelSize::new(
        mm_to_px(descriptor.page_width_mm, dpi),
        mm_to_px(descriptor.page_height_mm, dpi),
    )
}
