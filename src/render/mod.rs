//! # Rendering Module
//!
//! Turns photos into finished stickers and stickers into printable pages.
//!
//! ## Modules
//!
//! - [`compose`]: builds one sticker (background, photo, logo, caption)
//! - [`caption`]: caption font loading, shrink-to-fit and contrast color
//! - [`page`]: places stickers on pages at their grid positions
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use stickersheet::geometry::{GridCoordinate, cell_size};
//! use stickersheet::render::{self, Assets, compose::LabelStyle};
//! # fn demo(
//! #     assets: &Assets,
//! #     template: &stickersheet::template::TemplateDescriptor,
//! #     photo: &image::DynamicImage,
//! # ) -> Result<(), stickersheet::SheetError> {
//! let dpi = 300;
//! let sticker = render::compose::compose(photo, &LabelStyle::default(), cell_size(template, dpi), assets)?;
//!
//! let mut grid = BTreeMap::new();
//! grid.insert(GridCoordinate::new(0, 0), sticker);
//! for page in render::page::assemble(template, dpi, &grid)? {
//!     page.save("page.png")?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod caption;
pub mod compose;
pub mod page;

use crate::logos::LogoSet;
use caption::FontSource;

/// Read-only artwork the compositor draws with.
#[derive(Debug, Clone)]
pub struct Assets {
    pub logos: LogoSet,
    pub font: FontSource,
}
