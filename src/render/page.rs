//! # Page Assembler
//!
//! Places finished sticker rasters at their grid positions on white page
//! rasters.
//!
//! ## Pagination
//!
//! A template describes one page of `rows × columns` stickers. Coordinates
//! are taken row-major; row `r` lands on page `r / rows`, local row
//! `r % rows`. A grid that stays inside the template's pattern always gives
//! exactly one page, and an empty grid gives one blank page.
//!
//! ```text
//! rows = 2            page 0            page 1
//! (0,0) (0,1)   →   ┌─────────┐       ┌─────────┐
//! (1,0) (1,1)       │ ▣ ▣     │       │ ▣ ·     │
//! (2,0)             │ ▣ ▣     │       │ · ·     │
//!                   └─────────┘       └─────────┘
//! ```
//!
//! Pages are produced lazily, one per [`Iterator::next`] call. Assembly is
//! pure: the same grid always produces byte-identical pages.

use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::iter::Peekable;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::compose::preview;
use crate::error::SheetError;
use crate::geometry::{GridCoordinate, PixelSize, cell_origin, cell_size, page_size};
use crate::template::TemplateDescriptor;

/// Page background.
pub const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Cell outline color in overviews.
pub const OUTLINE: Rgba<u8> = Rgba([160, 160, 160, 255]);

/// Lay out `grid` on pages.
///
/// `grid` may own its rasters or borrow them (`BTreeMap<_, &RgbaImage>`).
///
/// Fails with [`SheetError::CellOutOfRange`] if any coordinate's column is
/// outside the template's pattern.
pub fn assemble<'a, R: Borrow<RgbaImage>>(
    descriptor: &'a TemplateDescriptor,
    dpi: u32,
    grid: &'a BTreeMap<GridCoordinate, R>,
) -> Result<Pages<'a, R>, SheetError> {
    let pattern = descriptor.pattern;
    if let Some(coord) = grid.keys().find(|c| c.column >= pattern.columns) {
        return Err(SheetError::CellOutOfRange {
            coord: *coord,
            rows: pattern.rows,
            columns: pattern.columns,
        });
    }

    let page_count = grid
        .keys()
        .next_back()
        .map_or(1, |last| last.row / pattern.rows + 1);

    Ok(Pages {
        descriptor,
        dpi,
        cell: cell_size(descriptor, dpi),
        page: page_size(descriptor, dpi),
        cells: grid.iter().peekable(),
        next_page: 0,
        page_count,
    })
}

/// Lazy sequence of assembled pages.
pub struct Pages<'a, R = RgbaImage> {
    descriptor: &'a TemplateDescriptor,
    dpi: u32,
    cell: PixelSize,
    page: PixelSize,
    cells: Peekable<btree_map::Iter<'a, GridCoordinate, R>>,
    next_page: u32,
    page_count: u32,
}

impl<R> Pages<'_, R> {
    /// Total number of pages, including those already yielded.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Pixel size of every page.
    pub fn page_size(&self) -> PixelSize {
        self.page
    }
}

impl<R: Borrow<RgbaImage>> Iterator for Pages<'_, R> {
    type Item = RgbaImage;

    fn next(&mut self) -> Option<RgbaImage> {
        if self.next_page >= self.page_count {
            return None;
        }
        let page_index = self.next_page;
        self.next_page += 1;

        let rows = self.descriptor.pattern.rows;
        let mut page = RgbaImage::from_pixel(self.page.width, self.page.height, PAPER);

        while let Some((coord, raster)) = self.cells.next_if(|(c, _)| c.row / rows == page_index) {
            let (x, y) = cell_origin(coord.row % rows, coord.column, self.descriptor, self.dpi);
            let fitted = fit_to_cell(raster.borrow(), self.cell);
            imageops::overlay(&mut page, &*fitted, x as i64, y as i64);
        }

        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.page_count - self.next_page) as usize;
        (left, Some(left))
    }
}

impl<R: Borrow<RgbaImage>> ExactSizeIterator for Pages<'_, R> {}

/// Composed stickers should already be cell-sized; resize when they are not.
fn fit_to_cell(raster: &RgbaImage, cell: PixelSize) -> Cow<'_, RgbaImage> {
    if raster.dimensions() == (cell.width, cell.height) {
        Cow::Borrowed(raster)
    } else {
        Cow::Owned(imageops::resize(
            raster,
            cell.width,
            cell.height,
            FilterType::Lanczos3,
        ))
    }
}

/// Low-resolution picture of the first page with every cell outlined.
///
/// Stickers are scaled to their cell's height and centered, clipped to the
/// cell, the way the sheet preview shows them.
pub fn overview<R: Borrow<RgbaImage>>(
    descriptor: &TemplateDescriptor,
    dpi: u32,
    grid: &BTreeMap<GridCoordinate, R>,
) -> RgbaImage {
    let page = page_size(descriptor, dpi);
    let cell = cell_size(descriptor, dpi);
    let mut canvas = RgbaImage::from_pixel(page.width, page.height, PAPER);

    for row in 0..descriptor.pattern.rows {
        for column in 0..descriptor.pattern.columns {
            let (x, y) = cell_origin(row, column, descriptor, dpi);
            if let Some(raster) = grid.get(&GridCoordinate::new(row, column)) {
                let tile = preview(raster.borrow(), cell);
                imageops::replace(&mut canvas, &tile, x as i64, y as i64);
            }
            draw_outline(&mut canvas, x, y, cell, OUTLINE);
        }
    }

    canvas
}

fn draw_outline(canvas: &mut RgbaImage, x: u32, y: u32, size: PixelSize, color: Rgba<u8>) {
    if size.width == 0 || size.height == 0 {
        return;
    }
    let (right, bottom) = (x + size.width - 1, y + size.height - 1);
    let mut plot = |px: u32, py: u32| {
        if px < canvas.width() && py < canvas.height() {
            canvas.put_pixel(px, py, color);
        }
    };
    for px in x..=right {
        plot(px, y);
        plot(px, bottom);
    }
    for py in y..=bottom {
        plot(x, py);
        plot(right, py);
    }
}
