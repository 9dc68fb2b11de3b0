//! # Stickersheet - Photo Sticker Sheet Library
//!
//! Stickersheet turns photos into printable sticker sheets. It provides:
//!
//! - **Geometry**: millimeter templates to pixel cells at any print DPI
//! - **Composition**: blurred background, centered photo, logo and a
//!   contrast-colored caption, one sticker per grid cell
//! - **Page assembly**: stickers placed on white pages at their cell origins
//! - **Export**: multi-page PDF or numbered PNG files
//!
//! ## Quick Start
//!
//! ```no_run
//! use stickersheet::{GridCoordinate, LabelStyle, LogoChoice, ResourcePaths, Resources, Session};
//!
//! // Load templates, logos and the caption font
//! let resources = Resources::load(&ResourcePaths::in_dir("resources"))?;
//!
//! // Start a 300 dpi sheet on the first template
//! let mut session = Session::new(&resources, 300)?;
//!
//! // Assign a photo and style the first sticker
//! let cell = GridCoordinate::new(0, 0);
//! session.set_source_image(cell, stickersheet::source::open("cat.jpg".as_ref())?)?;
//! session.set_style(cell, LabelStyle::default().with_logo("ESPuino".parse()?).with_caption("Kitchen"))?;
//!
//! // Compose everything and write a PDF
//! let pages = session.assemble_pages()?;
//! stickersheet::export::write_pdf(&pages, session.dpi(), "sheet.pdf".as_ref())?;
//!
//! # Ok::<(), stickersheet::SheetError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`geometry`] | mm to pixel conversion, cell size and origin |
//! | [`template`] | Template descriptors and the template catalog |
//! | [`logos`] | Logo artwork and logo selection |
//! | [`render`] | Sticker compositor, caption text, page assembler |
//! | [`session`] | Per-sheet grid of photos, styles and stickers |
//! | [`config`] | Resource paths and startup loading |
//! | [`source`] | Photo decoding |
//! | [`job`] | JSON sheet descriptions for batch builds |
//! | [`export`] | PDF and PNG output |
//! | [`error`] | Error types |

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod job;
pub mod logos;
pub mod render;
pub mod session;
pub mod source;
pub mod template;

// Re-exports for convenience
pub use config::{ResourcePaths, Resources};
pub use error::SheetError;
pub use geometry::{GridCoordinate, PixelSize};
pub use logos::LogoChoice;
pub use render::compose::LabelStyle;
pub use session::Session;
pub use template::{TemplateCatalog, TemplateDescriptor};
