//! # Logo Registry
//!
//! The brand logos a sticker can carry in its bottom-right corner.
//!
//! The set of logos is fixed; their artwork is loaded once at startup from
//! PNG files with alpha channels and is read-only afterwards.
//!
//! ## Usage
//!
//! ```
//! use stickersheet::logos::{LogoChoice, LogoId};
//!
//! let choice: LogoChoice = "Tonuino".parse().unwrap();
//! assert_eq!(choice, LogoChoice::Named(LogoId::Tonuino));
//! assert_eq!("None".parse::<LogoChoice>().unwrap(), LogoChoice::None);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::SheetError;

/// A registered logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogoId {
    #[serde(rename = "ESPuino")]
    Espuino,
    #[serde(rename = "Tonuino")]
    Tonuino,
}

impl LogoId {
    pub const ALL: [LogoId; 2] = [LogoId::Espuino, LogoId::Tonuino];

    /// Display name, as shown in the logo selector.
    pub fn name(self) -> &'static str {
        match self {
            LogoId::Espuino => "ESPuino",
            LogoId::Tonuino => "Tonuino",
        }
    }

    /// Artwork file name inside the resource directory.
    pub fn file_name(self) -> &'static str {
        match self {
            LogoId::Espuino => "espuino_logo.png",
            LogoId::Tonuino => "tonuino_logo.png",
        }
    }
}

impl fmt::Display for LogoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which logo (if any) a sticker carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogoChoice {
    #[default]
    None,
    Named(LogoId),
}

impl From<Option<LogoId>> for LogoChoice {
    fn from(id: Option<LogoId>) -> Self {
        id.map_or(LogoChoice::None, LogoChoice::Named)
    }
}

impl FromStr for LogoChoice {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Ok(LogoChoice::None);
        }
        LogoId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s))
            .map(LogoChoice::Named)
            .ok_or_else(|| {
                SheetError::Configuration(format!(
                    "unknown logo '{}' (expected None, ESPuino or Tonuino)",
                    s
                ))
            })
    }
}

/// The loaded logo artwork.
#[derive(Debug, Clone)]
pub struct LogoSet {
    espuino: RgbaImage,
    tonuino: RgbaImage,
}

impl LogoSet {
    /// Build from in-memory artwork.
    pub fn new(espuino: RgbaImage, tonuino: RgbaImage) -> Result<Self, SheetError> {
        for (id, image) in [(LogoId::Espuino, &espuino), (LogoId::Tonuino, &tonuino)] {
            if image.width() == 0 || image.height() == 0 {
                return Err(SheetError::Configuration(format!("logo {} is empty", id)));
            }
        }
        Ok(Self { espuino, tonuino })
    }

    /// Load every logo from `dir` by its registered file name.
    ///
    /// Missing or undecodable files are configuration errors.
    pub fn load(dir: &Path) -> Result<Self, SheetError> {
        let load_one = |id: LogoId| -> Result<RgbaImage, SheetError> {
            let path = dir.join(id.file_name());
            image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|e| {
                    SheetError::Configuration(format!(
                        "cannot load logo {} from {}: {}",
                        id,
                        path.display(),
                        e
                    ))
                })
        };
        Self::new(load_one(LogoId::Espuino)?, load_one(LogoId::Tonuino)?)
    }

    /// Artwork for a logo.
    pub fn get(&self, id: LogoId) -> &RgbaImage {
        match id {
            LogoId::Espuino => &self.espuino,
            LogoId::Tonuino => &self.tonuino,
        }
    }

    /// Artwork for a choice, `None` when no logo is selected.
    pub fn resolve(&self, choice: LogoChoice) -> Option<&RgbaImage> {
        match choice {
            LogoChoice::None => None,
            LogoChoice::Named(id) => Some(self.get(id)),
        }
    }
}
