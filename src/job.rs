//! # Sheet Jobs
//!
//! A job file describes a whole sheet so it can be built without the
//! interactive editor:
//!
//! ```json
//! {
//!   "template": "Round 2x4",
//!   "dpi": 300,
//!   "cells": [
//!     { "row": 1, "column": 1, "image": "photos/cat.jpg", "logo": "ESPuino", "caption": "Kitchen" },
//!     { "row": 1, "column": 2, "image": "photos/dog.png", "blur": 0 }
//!   ]
//! }
//! ```
//!
//! Rows and columns are 1-indexed, as users see them. Relative image paths
//! are resolved against the job file's directory. `blur` defaults to 20,
//! `logo` to none and `caption` to empty.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Resources;
use crate::error::SheetError;
use crate::geometry::GridCoordinate;
use crate::logos::LogoChoice;
use crate::render::compose::{DEFAULT_BLUR, LabelStyle};
use crate::session::Session;
use crate::source;

/// One sheet to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
    #[serde(default)]
    pub cells: Vec<JobCell>,
}

/// One sticker of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCell {
    pub row: u32,
    pub column: u32,
    pub image: PathBuf,
    #[serde(default = "default_blur")]
    pub blur: u8,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub caption: String,
}

fn default_blur() -> u8 {
    DEFAULT_BLUR
}

impl JobCell {
    /// Zero-based grid coordinate.
    pub fn coordinate(&self) -> Result<GridCoordinate, SheetError> {
        GridCoordinate::from_one_based(self.row, self.column).ok_or_else(|| {
            SheetError::InvalidInput(format!(
                "cell row/column are 1-indexed, got ({}, {})",
                self.row, self.column
            ))
        })
    }

    pub fn style(&self) -> Result<LabelStyle, SheetError> {
        let logo = match &self.logo {
            Some(name) => name.parse()?,
            None => LogoChoice::None,
        };
        Ok(LabelStyle::new(self.blur, logo, self.caption.as_str()))
    }
}

impl Job {
    pub fn from_json_str(json: &str) -> Result<Self, SheetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a job file. Returns the job and the directory its image paths
    /// are relative to.
    pub fn load(path: &Path) -> Result<(Self, PathBuf), SheetError> {
        let json = std::fs::read_to_string(path)?;
        let job = Self::from_json_str(&json)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok((job, base))
    }

    /// Build a session with every cell's photo and style assigned.
    ///
    /// `dpi` overrides the job's own resolution; one of the two must be set.
    pub fn into_session<'r>(
        &self,
        resources: &'r Resources,
        dpi: Option<u32>,
        base_dir: &Path,
    ) -> Result<Session<'r>, SheetError> {
        let dpi = dpi
            .or(self.dpi)
            .ok_or_else(|| SheetError::InvalidInput("no dpi given by job or caller".into()))?;
        let mut session = Session::with_template(resources, &self.template, dpi)?;

        for cell in &self.cells {
            let coord = cell.coordinate()?;
            let style = cell.style()?;
            let path = base_dir.join(&cell.image);
            debug!(label = %coord, path = %path.display(), "reading photo");
            session.set_source_image(coord, source::open(&path)?)?;
            session.set_style(coord, style)?;
        }
        Ok(session)
    }
}
