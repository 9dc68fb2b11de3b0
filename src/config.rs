//! # Resource Configuration
//!
//! Everything the engine reads from disk is loaded once, at startup, into a
//! [`Resources`] value that is then passed by reference.
//!
//! ## Resource Directory
//!
//! ```text
//! resources/
//! ├── templates.json        template catalog (required)
//! ├── espuino_logo.png      logo artwork with alpha (required)
//! ├── tonuino_logo.png      logo artwork with alpha (required)
//! └── fonts/caption.ttf     caption font (optional)
//! ```
//!
//! A missing catalog or logo aborts startup. A missing font does not: the
//! failure is kept and reported when a sticker with a caption is composed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SheetError;
use crate::logos::LogoSet;
use crate::render::Assets;
use crate::render::caption::FontSource;
use crate::template::TemplateCatalog;

/// Where resources live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePaths {
    /// Template catalog JSON.
    pub templates: PathBuf,
    /// Directory holding the logo PNGs.
    pub logo_dir: PathBuf,
    /// Caption font file.
    pub font: PathBuf,
}

impl ResourcePaths {
    /// The standard layout under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            templates: dir.join("templates.json"),
            logo_dir: dir.to_path_buf(),
            font: dir.join("fonts").join("caption.ttf"),
        }
    }

    pub fn with_font(mut self, font: impl Into<PathBuf>) -> Self {
        self.font = font.into();
        self
    }
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self::in_dir("resources")
    }
}

/// Loaded, immutable resources.
#[derive(Debug, Clone)]
pub struct Resources {
    pub catalog: TemplateCatalog,
    pub assets: Assets,
}

impl Resources {
    /// Load all resources. Only catalog and logo failures are errors.
    pub fn load(paths: &ResourcePaths) -> Result<Self, SheetError> {
        let catalog = TemplateCatalog::load(&paths.templates)?;
        info!(
            templates = catalog.len(),
            path = %paths.templates.display(),
            "loaded template catalog"
        );

        let logos = LogoSet::load(&paths.logo_dir)?;

        let font = FontSource::load(&paths.font);
        if let FontSource::Missing(reason) = &font {
            warn!(%reason, "caption font not loaded; captions will fail to render");
        }

        Ok(Self {
            catalog,
            assets: Assets { logos, font },
        })
    }
}
