//! # Error Types
//!
//! This module defines error types used throughout the stickersheet library.
//!
//! Errors fall into three groups:
//!
//! | Group | Variants | When |
//! |-------|----------|------|
//! | Configuration | `Configuration`, `GeometryViolation`, `Json` | Loading templates and logos at startup (fatal) |
//! | Input | `NoImage`, `CellOutOfRange`, `UnknownTemplate`, `InvalidInput`, `FontUnavailable`, `Image` | Per operation, other cells unaffected |
//! | Output | `CellFailed`, `Pdf`, `Io` | Assembling and exporting pages |

use thiserror::Error;

use crate::geometry::GridCoordinate;

/// Main error type for stickersheet operations
#[derive(Debug, Error)]
pub enum SheetError {
    /// Missing or malformed template/logo resource
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Template grid does not fit on its declared page
    #[error("Template '{template}' does not fit its page: {detail}")]
    GeometryViolation { template: String, detail: String },

    /// Template name not present in the catalog
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    /// Composition was requested for a cell without a source image
    #[error("No image assigned to label {coord}")]
    NoImage { coord: GridCoordinate },

    /// Coordinate outside the selected template's grid
    #[error("Label {coord} is outside the {rows}x{columns} grid")]
    CellOutOfRange {
        coord: GridCoordinate,
        rows: u32,
        columns: u32,
    },

    /// Source image or target size cannot be composed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Caption requested but no usable font was loaded
    #[error("Caption font unavailable: {0}")]
    FontUnavailable(String),

    /// A cell holds an image whose composition failed
    #[error("Label {coord} could not be composed: {reason}")]
    CellFailed {
        coord: GridCoordinate,
        reason: String,
    },

    /// PDF serialization error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Image decoding/encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// True for errors that must abort startup rather than a single operation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SheetError::Configuration(_) | SheetError::GeometryViolation { .. } | SheetError::Json(_)
        )
    }
}

impl From<lopdf::Error> for SheetError {
    fn from(err: lopdf::Error) -> Self {
        SheetError::Pdf(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_one_indexed() {
        let err = SheetError::NoImage {
            coord: GridCoordinate::new(0, 2),
        };
        assert_eq!(err.to_string(), "No image assigned to label (1, 3)");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(SheetError::Configuration("x".into()).is_configuration());
        assert!(
            SheetError::GeometryViolation {
                template: "t".into(),
                detail: "d".into()
            }
            .is_configuration()
        );
        assert!(!SheetError::FontUnavailable("x".into()).is_configuration());
        assert!(
            !SheetError::NoImage {
                coord: GridCoordinate::new(0, 0)
            }
            .is_configuration()
        );
    }
}
