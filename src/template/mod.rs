//! # Sheet Templates
//!
//! A template describes one kind of printed sticker sheet: how many stickers
//! it holds, how large they are, and where the grid sits on the page.
//!
//! ## Physical Layout
//!
//! ```text
//! ┌──────────────────── page_width ────────────────────┐
//! │            top_margin                              │
//! │ left   ┌────────┐ h_gap ┌────────┐                 │
//! │ margin │ (1, 1) │       │ (1, 2) │   sticker_height│
//! │        └────────┘       └────────┘                 │
//! │            v_gap                                   │
//! │        ┌────────┐       ┌────────┐                 │
//! │        │ (2, 1) │       │ (2, 2) │                 │
//! │        └────────┘       └────────┘                 │
//! │        sticker_width                               │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Descriptors are validated when they are loaded: a grid that spills past
//! its page is a [`SheetError::GeometryViolation`], never a layout-time surprise.

pub mod catalog;

pub use catalog::TemplateCatalog;

use serde::{Deserialize, Serialize};

use crate::error::SheetError;

/// A4 width in millimeters.
pub const A4_WIDTH_MM: f64 = 210.0;

/// A4 height in millimeters.
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Slack for float comparisons of accumulated millimeter sums.
const FIT_TOLERANCE_MM: f64 = 1e-6;

/// Rows and columns of the sticker grid.
///
/// Serialized as a `[rows, columns]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct GridPattern {
    pub rows: u32,
    pub columns: u32,
}

impl GridPattern {
    pub const fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    /// Number of cells on one page.
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }
}

impl From<[u32; 2]> for GridPattern {
    fn from([rows, columns]: [u32; 2]) -> Self {
        Self { rows, columns }
    }
}

impl From<GridPattern> for [u32; 2] {
    fn from(pattern: GridPattern) -> Self {
        [pattern.rows, pattern.columns]
    }
}

fn default_page_width() -> f64 {
    A4_WIDTH_MM
}

fn default_page_height() -> f64 {
    A4_HEIGHT_MM
}

/// Physical description of a sticker sheet. All lengths in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    #[serde(rename = "sticker_pattern")]
    pub pattern: GridPattern,
    #[serde(rename = "sticker_width")]
    pub sticker_width_mm: f64,
    #[serde(rename = "sticker_height")]
    pub sticker_height_mm: f64,
    #[serde(rename = "top_margin")]
    pub top_margin_mm: f64,
    #[serde(rename = "left_margin")]
    pub left_margin_mm: f64,
    #[serde(rename = "horizontal_margin")]
    pub horizontal_gap_mm: f64,
    #[serde(rename = "vertical_margin")]
    pub vertical_gap_mm: f64,
    #[serde(rename = "page_width", default = "default_page_width")]
    pub page_width_mm: f64,
    #[serde(rename = "page_height", default = "default_page_height")]
    pub page_height_mm: f64,
}

impl TemplateDescriptor {
    /// Horizontal extent of the grid including the left margin.
    pub fn used_width_mm(&self) -> f64 {
        let columns = self.pattern.columns as f64;
        self.left_margin_mm
            + columns * self.sticker_width_mm
            + (columns - 1.0).max(0.0) * self.horizontal_gap_mm
    }

    /// Vertical extent of the grid including the top margin.
    pub fn used_height_mm(&self) -> f64 {
        let rows = self.pattern.rows as f64;
        self.top_margin_mm
            + rows * self.sticker_height_mm
            + (rows - 1.0).max(0.0) * self.vertical_gap_mm
    }

    /// Check ranges and that the grid fits on the page.
    ///
    /// `name` is only used in error messages.
    pub fn validate(&self, name: &str) -> Result<(), SheetError> {
        let invalid = |detail: String| SheetError::Configuration(format!("template '{}': {}", name, detail));

        if self.pattern.rows == 0 || self.pattern.columns == 0 {
            return Err(invalid(format!(
                "sticker_pattern must be positive, got [{}, {}]",
                self.pattern.rows, self.pattern.columns
            )));
        }

        for (field, value) in [
            ("sticker_width", self.sticker_width_mm),
            ("sticker_height", self.sticker_height_mm),
            ("page_width", self.page_width_mm),
            ("page_height", self.page_height_mm),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{} must be positive, got {}", field, value)));
            }
        }

        for (field, value) in [
            ("top_margin", self.top_margin_mm),
            ("left_margin", self.left_margin_mm),
            ("horizontal_margin", self.horizontal_gap_mm),
            ("vertical_margin", self.vertical_gap_mm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{} must not be negative, got {}", field, value)));
            }
        }

        let used_width = self.used_width_mm();
        if used_width > self.page_width_mm + FIT_TOLERANCE_MM {
            return Err(SheetError::GeometryViolation {
                template: name.to_string(),
                detail: format!(
                    "{} columns need {:.2}mm but the page is {:.2}mm wide",
                    self.pattern.columns, used_width, self.page_width_mm
                ),
            });
        }

        let used_height = self.used_height_mm();
        if used_height > self.page_height_mm + FIT_TOLERANCE_MM {
            return Err(SheetError::GeometryViolation {
                template: name.to_string(),
                detail: format!(
                    "{} rows need {:.2}mm but the page is {:.2}mm tall",
                    self.pattern.rows, used_height, self.page_height_mm
                ),
            });
        }

        Ok(())
    }
}
