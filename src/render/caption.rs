//! Caption text: font loading, measuring, shrink-to-fit and contrast.
//!
//! Captions are rendered with a TrueType font through ab_glyph. Sizes are em
//! sizes in pixels (a 30px caption has a 30px em square), so a size means the
//! same thing regardless of the font's ascent/descent proportions.
//!
//! ## Fitting
//!
//! The caption starts at [`CAPTION_START_SIZE`]. If its ink is wider than
//! 90% of the sticker, the size is scaled down once, proportionally:
//!
//! ```text
//! size = trunc(max_width / measured_width * 30)
//! ```
//!
//! This is a single correction. Glyph hinting and kerning do not scale
//! linearly, so the corrected caption can still end up slightly wider than
//! the target; it is drawn anyway.
//!
//! ## Contrast
//!
//! The fill is white when the mean luma of the strip of canvas the caption
//! covers is below 128, black otherwise (a mean of exactly 128 gets black).

use std::path::Path;

use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use image::{Pixel, Rgba, RgbaImage};

use crate::error::SheetError;

/// Starting caption size in pixels per em.
pub const CAPTION_START_SIZE: f32 = 30.0;

/// Fraction of the sticker width a caption may use before it is shrunk.
pub const CAPTION_MAX_WIDTH_RATIO: f64 = 0.9;

/// Distance from the sticker's top edge to the caption's layout origin.
pub const CAPTION_TOP_PX: i64 = 10;

/// Mean luma below which captions are drawn white.
pub const CONTRAST_THRESHOLD: f64 = 128.0;

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A loaded caption font.
#[derive(Clone)]
pub struct CaptionFont {
    font: FontArc,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont").finish_non_exhaustive()
    }
}

impl CaptionFont {
    /// Parse a TrueType/OpenType font from memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SheetError> {
        FontArc::try_from_vec(bytes)
            .map(|font| Self { font })
            .map_err(|e| SheetError::FontUnavailable(e.to_string()))
    }

    /// Read and parse a font file.
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let bytes = std::fs::read(path).map_err(|e| {
            SheetError::FontUnavailable(format!("{}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes)
            .map_err(|e| SheetError::FontUnavailable(format!("{}: {}", path.display(), e)))
    }

    /// ab_glyph scales by line height; convert from an em size.
    fn px_scale(&self, em_px: f32) -> PxScale {
        let units_per_em = self.font.units_per_em().unwrap_or(1000.0);
        PxScale::from(em_px * self.font.height_unscaled() / units_per_em)
    }

    /// Lay out `text` on a single line with its layout origin at (0, 0).
    ///
    /// The origin is the top of the line box; glyphs sit on a baseline one
    /// ascent below it.
    pub fn layout(&self, text: &str, em_px: f32) -> CaptionLayout {
        let scale = self.px_scale(em_px);
        let scaled = self.font.as_scaled(scale);
        let baseline = scaled.ascent();

        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0f32;
        let mut previous = None;

        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }

        // Ink bounds, falling back to the advance box for whitespace-only text.
        let mut bounds: Option<(i64, i64, i64, i64)> = None;
        for glyph in &glyphs {
            if let Some(outlined) = self.font.outline_glyph(glyph.clone()) {
                let r = outlined.px_bounds();
                let (x0, y0, x1, y1) = (
                    r.min.x as i64,
                    r.min.y as i64,
                    r.max.x as i64,
                    r.max.y as i64,
                );
                bounds = Some(match bounds {
                    None => (x0, y0, x1, y1),
                    Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
                });
            }
        }
        let baseline_px = baseline.round() as i64;
        let (min_x, min_y, max_x, max_y) =
            bounds.unwrap_or((0, baseline_px, caret.ceil() as i64, baseline_px));

        CaptionLayout {
            em_px,
            glyphs,
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Lay out `text` at the start size, shrinking once if it is too wide.
    pub fn fit(&self, text: &str, canvas_width: u32) -> CaptionLayout {
        let max_width = canvas_width as f64 * CAPTION_MAX_WIDTH_RATIO;
        let layout = self.layout(text, CAPTION_START_SIZE);

        let width = layout.width() as f64;
        if width <= max_width {
            return layout;
        }

        let size = (max_width / width * CAPTION_START_SIZE as f64).trunc().max(1.0) as f32;
        self.layout(text, size)
    }

    /// Draw a laid out caption with its layout origin at (`x`, `y`).
    ///
    /// Coverage is alpha-blended over the canvas; pixels off the canvas are dropped.
    pub fn draw(&self, canvas: &mut RgbaImage, layout: &CaptionLayout, x: i64, y: i64, fill: Rgba<u8>) {
        let (width, height) = (canvas.width() as i64, canvas.height() as i64);

        for glyph in &layout.glyphs {
            let placed = Glyph {
                id: glyph.id,
                scale: glyph.scale,
                position: point(glyph.position.x + x as f32, glyph.position.y + y as f32),
            };
            let Some(outlined) = self.font.outline_glyph(placed) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * fill[3] as f32).round() as u8;
                if alpha == 0 {
                    return;
                }
                let ink = Rgba([fill[0], fill[1], fill[2], alpha]);
                canvas.get_pixel_mut(px as u32, py as u32).blend(&ink);
            });
        }
    }
}

/// A caption positioned relative to its layout origin.
#[derive(Debug, Clone)]
pub struct CaptionLayout {
    /// Size the caption was laid out at, pixels per em.
    pub em_px: f32,
    glyphs: Vec<Glyph>,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

impl CaptionLayout {
    /// Ink width in pixels.
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x).max(0) as u32
    }

    /// Ink height in pixels.
    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y).max(0) as u32
    }
}

/// Where the caption font comes from, or why there is none.
#[derive(Debug, Clone)]
pub enum FontSource {
    Loaded(CaptionFont),
    Missing(String),
}

impl FontSource {
    /// Load from a path, recording (not raising) a failure.
    pub fn load(path: &Path) -> Self {
        match CaptionFont::load(path) {
            Ok(font) => FontSource::Loaded(font),
            Err(e) => FontSource::Missing(e.to_string()),
        }
    }

    /// The font, or [`SheetError::FontUnavailable`].
    pub fn require(&self) -> Result<&CaptionFont, SheetError> {
        match self {
            FontSource::Loaded(font) => Ok(font),
            FontSource::Missing(reason) => Err(SheetError::FontUnavailable(reason.clone())),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FontSource::Loaded(_))
    }
}

/// ITU-R 601 luma, rounded, as PIL computes it for "L" conversion.
#[inline]
pub fn luma(pixel: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

/// Mean luma of the full-width strip of the top `height` rows.
///
/// The strip is clamped to the canvas and is at least one row tall.
pub fn strip_luminance(canvas: &RgbaImage, height: u32) -> f64 {
    let rows = height.clamp(1, canvas.height().max(1)).min(canvas.height());
    let count = rows as u64 * canvas.width() as u64;
    if count == 0 {
        return 0.0;
    }

    let total: u64 = (0..rows)
        .flat_map(|y| (0..canvas.width()).map(move |x| (x, y)))
        .map(|(x, y)| luma(canvas.get_pixel(x, y)) as u64)
        .sum();

    total as f64 / count as f64
}

/// White on dark backgrounds, black otherwise.
pub fn contrast_fill(mean_luma: f64) -> Rgba<u8> {
    if mean_luma < CONTRAST_THRESHOLD { WHITE } else { BLACK }
}

/// Locate a TrueType font installed on the system, for tests and CLI fallback.
pub fn find_system_font() -> Option<std::path::PathBuf> {
    const CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/Library/Fonts/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];
    CANDIDATES
        .iter()
        .map(std::path::PathBuf::from)
        .find(|path| path.is_file())
}
