//! # Sticker Compositor
//!
//! Builds one finished sticker raster from a photo and its style.
//!
//! ## Layers
//!
//! ```text
//!  ┌──────────────────────────────┐
//!  │          Caption             │  ← contrast-colored text, 10px from top
//!  │       ┌──────────┐           │
//!  │ blur  │  photo   │  blur     │  ← photo scaled to the sticker height, centered
//!  │       │          │           │
//!  │       │          │     [logo]│  ← 10% of the width, 10px from the right edge
//!  └───────┴──────────┴───────────┘
//!    background: blurred photo scaled to the sticker width, pinned top-left
//! ```
//!
//! Composition is a pure function of (photo, style, cell size, assets): the
//! same inputs always give byte-identical output, and nothing is shared
//! between calls, so stickers can be composed in parallel.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use super::Assets;
use super::caption::{CAPTION_TOP_PX, contrast_fill, strip_luminance};
use crate::error::SheetError;
use crate::geometry::PixelSize;
use crate::logos::LogoChoice;

/// Highest accepted blur strength.
pub const MAX_BLUR: u8 = 100;

/// Blur strength new stickers start with.
pub const DEFAULT_BLUR: u8 = 20;

/// Logo width as a fraction of the sticker width.
pub const LOGO_WIDTH_RATIO: f64 = 0.1;

/// Gap between the logo and the sticker's right edge.
pub const LOGO_RIGHT_INSET_PX: i64 = 10;

/// Default size of the label preview panel.
pub const PREVIEW_SIZE: PixelSize = PixelSize::new(278, 170);

const RESAMPLE: FilterType = FilterType::Lanczos3;

/// How a sticker should look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelStyle {
    blur: u8,
    pub logo: LogoChoice,
    pub caption: String,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            blur: DEFAULT_BLUR,
            logo: LogoChoice::None,
            caption: String::new(),
        }
    }
}

impl LabelStyle {
    /// Build a style. Blur is clamped to `0..=100`.
    pub fn new(blur: u8, logo: LogoChoice, caption: impl Into<String>) -> Self {
        Self {
            blur: blur.min(MAX_BLUR),
            logo,
            caption: caption.into(),
        }
    }

    /// Gaussian blur radius of the background; 0 means no blur.
    pub fn blur(&self) -> u8 {
        self.blur
    }

    pub fn set_blur(&mut self, blur: u8) {
        self.blur = blur.min(MAX_BLUR);
    }

    pub fn with_blur(mut self, blur: u8) -> Self {
        self.set_blur(blur);
        self
    }

    pub fn with_logo(mut self, logo: LogoChoice) -> Self {
        self.logo = logo;
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }
}

/// A style with its choices resolved against the loaded assets.
struct Recipe<'a> {
    blur: u8,
    logo: Option<&'a RgbaImage>,
    caption: Option<&'a str>,
}

impl<'a> Recipe<'a> {
    fn resolve(style: &'a LabelStyle, assets: &'a Assets) -> Self {
        Self {
            blur: style.blur,
            logo: assets.logos.resolve(style.logo),
            caption: Some(style.caption.as_str()).filter(|c| !c.is_empty()),
        }
    }
}

/// Compose one sticker.
///
/// Fails with [`SheetError::FontUnavailable`] if the style has a caption and
/// no font is loaded; nothing is drawn in that case.
pub fn compose(
    source: &DynamicImage,
    style: &LabelStyle,
    cell: PixelSize,
    assets: &Assets,
) -> Result<RgbaImage, SheetError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(SheetError::InvalidInput("source image is empty".into()));
    }
    if cell.width == 0 || cell.height == 0 {
        return Err(SheetError::InvalidInput(format!(
            "sticker is {}x{}px at this resolution",
            cell.width, cell.height
        )));
    }

    let recipe = Recipe::resolve(style, assets);
    // Resolve the font up front so a missing font never yields a half-drawn sticker.
    let font = match recipe.caption {
        Some(_) => Some(assets.font.require()?),
        None => None,
    };

    let rgba = source.to_rgba8();
    let foreground = foreground_layer(&rgba, cell.height);
    let background = background_layer(&rgba, recipe.blur, cell.width);

    let mut canvas = RgbaImage::new(cell.width, cell.height);
    imageops::replace(&mut canvas, &background, 0, 0);

    let x_offset = (cell.width as i64 - foreground.width() as i64).div_euclid(2);
    imageops::overlay(&mut canvas, &foreground, x_offset, 0);

    if let Some(logo) = recipe.logo {
        let logo = logo_layer(logo, cell.width);
        let x = cell.width as i64 - logo.width() as i64 - LOGO_RIGHT_INSET_PX;
        let y = cell.height as i64 - logo.height() as i64;
        imageops::overlay(&mut canvas, &logo, x, y);
    }

    if let (Some(text), Some(font)) = (recipe.caption, font) {
        let layout = font.fit(text, cell.width);
        let fill = contrast_fill(strip_luminance(&canvas, layout.height()));
        let x = (cell.width as i64 - layout.width() as i64).div_euclid(2);
        font.draw(&mut canvas, &layout, x, CAPTION_TOP_PX, fill);
    }

    Ok(canvas)
}

/// The photo scaled to `height`, width following the aspect ratio.
pub fn foreground_layer(source: &RgbaImage, height: u32) -> RgbaImage {
    let width = scaled_length(source.width(), height, source.height());
    resize_layer(source, width, height)
}

/// The blurred photo scaled to `width`, height following the aspect ratio.
///
/// The blur runs on the unscaled photo. Strength 0 skips the blur entirely.
pub fn background_layer(source: &RgbaImage, blur: u8, width: u32) -> RgbaImage {
    let height = scaled_length(source.height(), width, source.width());
    if blur == 0 {
        return resize_layer(source, width, height);
    }

    let mut blurred = imageops::blur(source, blur as f32);
    if is_opaque(source) {
        // Blurring a constant alpha plane is the identity.
        set_opaque(&mut blurred);
    }
    resize_layer(&blurred, width, height)
}

/// A logo scaled to 10% of `cell_width`, aspect preserved.
pub fn logo_layer(logo: &RgbaImage, cell_width: u32) -> RgbaImage {
    let width = ((cell_width as f64 * LOGO_WIDTH_RATIO) as u32).max(1);
    let height = scaled_length(logo.height(), width, logo.width());
    resize_layer(logo, width, height)
}

/// Fit a raster into a fixed-size white panel: scaled to the panel height and
/// centered horizontally, overflow clipped.
pub fn preview(raster: &RgbaImage, panel: PixelSize) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(panel.width, panel.height, Rgba([255, 255, 255, 255]));
    if raster.width() == 0 || raster.height() == 0 || panel.width == 0 || panel.height == 0 {
        return canvas;
    }
    let scaled = foreground_layer(raster, panel.height);
    let x = (panel.width as i64 - scaled.width() as i64).div_euclid(2);
    imageops::overlay(&mut canvas, &scaled, x, 0);
    canvas
}

/// `length * target / reference`, truncated, at least 1.
fn scaled_length(length: u32, target: u32, reference: u32) -> u32 {
    ((length as f64 * target as f64 / reference as f64) as u32).max(1)
}

fn resize_layer(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    let mut resized = imageops::resize(image, width, height, RESAMPLE);
    if is_opaque(image) {
        // Lanczos ringing can round a constant 255 alpha down by one.
        set_opaque(&mut resized);
    }
    resized
}

fn is_opaque(image: &RgbaImage) -> bool {
    image.pixels().all(|p| p[3] == 255)
}

fn set_opaque(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logos::{LogoId, LogoSet};
    use crate::render::caption::FontSource;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 128, 255])
        })
    }

    fn assets() -> Assets {
        let espuino = RgbaImage::from_pixel(40, 20, Rgba([255, 0, 0, 255]));
        // Left half transparent, right half opaque blue.
        let tonuino = RgbaImage::from_fn(40, 40, |x, _| {
            if x < 20 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        Assets {
            logos: LogoSet::new(espuino, tonuino).unwrap(),
            font: FontSource::Missing("no font in tests".into()),
        }
    }

    #[test]
    fn test_blur_is_clamped() {
        assert_eq!(LabelStyle::new(250, LogoChoice::None, "").blur(), MAX_BLUR);
        assert_eq!(LabelStyle::default().with_blur(101).blur(), MAX_BLUR);
        assert_eq!(LabelStyle::default().blur(), DEFAULT_BLUR);
    }

    #[test]
    fn test_output_matches_cell_and_is_opaque() {
        let source = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(gradient(400, 600)).to_rgb8());
        let style = LabelStyle::new(20, LogoChoice::None, "");
        let out = compose(&source, &style, PixelSize::new(200, 118), &assets()).unwrap();
        assert_eq!(out.dimensions(), (200, 118));
        assert!(out.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let source = DynamicImage::ImageRgba8(gradient(120, 90));
        let style = LabelStyle::new(5, LogoChoice::Named(LogoId::Espuino), "");
        let a = compose(&source, &style, PixelSize::new(100, 60), &assets()).unwrap();
        let b = compose(&source, &style, PixelSize::new(100, 60), &assets()).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_zero_blur_background_is_plain_resize() {
        let source = gradient(64, 32);
        let background = background_layer(&source, 0, 32);
        let expected = imageops::resize(&source, 32, 16, FilterType::Lanczos3);
        assert_eq!(background.dimensions(), (32, 16));
        assert_eq!(background.as_raw(), expected.as_raw());
    }

    #[test]
    fn test_zero_blur_same_size_is_identical() {
        let source = gradient(50, 50);
        assert_eq!(background_layer(&source, 0, 50).as_raw(), source.as_raw());
    }

    #[test]
    fn test_blur_changes_background() {
        let source = gradient(60, 60);
        assert_ne!(background_layer(&source, 10, 60).as_raw(), source.as_raw());
    }

    #[test]
    fn test_foreground_keeps_aspect_ratio() {
        let layer = foreground_layer(&gradient(400, 600), 118);
        // 400 * 118 / 600 = 78.67
        assert_eq!(layer.dimensions(), (78, 118));
    }

    #[test]
    fn test_background_keeps_aspect_ratio() {
        let layer = background_layer(&gradient(400, 600), 0, 200);
        assert_eq!(layer.dimensions(), (200, 300));
    }

    #[test]
    fn test_wide_foreground_overflows_both_sides() {
        // 1000x100 source into a 100x50 cell: foreground is 500x50, offset -200.
        let mut source = RgbaImage::from_pixel(1000, 100, Rgba([0, 0, 0, 255]));
        for y in 0..100 {
            for x in 480..520 {
                source.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let out = compose(
            &DynamicImage::ImageRgba8(source),
            &LabelStyle::new(0, LogoChoice::None, ""),
            PixelSize::new(100, 50),
            &assets(),
        )
        .unwrap();
        assert_eq!(out.dimensions(), (100, 50));
        // The white band of the source lands in the middle of the sticker.
        assert_eq!(out.get_pixel(50, 25)[0], 255);
        assert_eq!(out.get_pixel(5, 25)[0], 0);
    }

    #[test]
    fn test_fully_transparent_source_stays_transparent() {
        let source = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 0]));
        let out = compose(
            &DynamicImage::ImageRgba8(source),
            &LabelStyle::new(0, LogoChoice::None, ""),
            PixelSize::new(40, 40),
            &assets(),
        )
        .unwrap();
        assert!(out.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_logo_bottom_right() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 255, 0, 255])));
        let style = LabelStyle::new(0, LogoChoice::Named(LogoId::Espuino), "");
        let out = compose(&source, &style, PixelSize::new(200, 100), &assets()).unwrap();

        // Logo is 20x10, placed at x = 200 - 20 - 10 = 170, y = 90.
        assert_eq!(*out.get_pixel(175, 95), Rgba([255, 0, 0, 255]));
        assert_eq!(*out.get_pixel(175, 85), Rgba([0, 255, 0, 255]));
        assert_eq!(*out.get_pixel(195, 95), Rgba([0, 255, 0, 255]));
        assert_eq!(*out.get_pixel(165, 95), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_logo_alpha_is_a_mask() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 255, 0, 255])));
        let style = LabelStyle::new(0, LogoChoice::Named(LogoId::Tonuino), "");
        let out = compose(&source, &style, PixelSize::new(200, 100), &assets()).unwrap();

        // Logo is 20x20 at (170, 80); its transparent left half keeps the photo.
        assert_eq!(*out.get_pixel(172, 95), Rgba([0, 255, 0, 255]));
        assert_eq!(*out.get_pixel(187, 95), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_caption_without_font_fails() {
        let source = DynamicImage::ImageRgba8(gradient(10, 10));
        let style = LabelStyle::new(0, LogoChoice::None, "Hello");
        let err = compose(&source, &style, PixelSize::new(50, 30), &assets()).unwrap_err();
        assert!(matches!(err, SheetError::FontUnavailable(_)));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        let style = LabelStyle::default();
        assert!(matches!(
            compose(&empty, &style, PixelSize::new(10, 10), &assets()),
            Err(SheetError::InvalidInput(_))
        ));
        let source = DynamicImage::ImageRgba8(gradient(10, 10));
        assert!(matches!(
            compose(&source, &style, PixelSize::new(0, 10), &assets()),
            Err(SheetError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_preview_centers_on_white() {
        let raster = RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255]));
        let panel = preview(&raster, PREVIEW_SIZE);
        assert_eq!(panel.dimensions(), (278, 170));
        assert_eq!(*panel.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*panel.get_pixel(139, 85), Rgba([0, 0, 0, 255]));
    }
}
