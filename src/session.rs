//! # Editing Session
//!
//! A session is one sheet being edited: a selected template, a print
//! resolution, and one slot per grid cell holding the photo, its style and
//! the last composed sticker.
//!
//! ## Slot Lifecycle
//!
//! ```text
//!            set_source_image            compose_cell (ok)
//!  (empty) ────────────────────► Dirty ─────────────────────► Composed
//!                                  ▲  │                           │
//!                                  │  └── compose_cell (err) ──► Failed
//!                                  │                              │
//!                                  └── set_style / set_source ────┘
//! ```
//!
//! Changing the photo or style drops the composed sticker. A failed
//! composition leaves the previously composed sticker (if any) untouched and
//! marks the slot failed; such a slot blocks page assembly until it composes
//! successfully or is cleared, so a failure is never mistaken for an
//! intentionally empty cell.
//!
//! Selecting another template clears every slot: the sticker size changed, so
//! composed rasters are discarded rather than rescaled.

use std::collections::BTreeMap;

use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::Resources;
use crate::error::SheetError;
use crate::geometry::{GridCoordinate, PixelSize, cell_size};
use crate::render::compose::{self, LabelStyle};
use crate::render::page;
use crate::template::TemplateDescriptor;

/// Per-cell state.
#[derive(Debug, Clone)]
pub struct LabelSlot {
    source: DynamicImage,
    style: LabelStyle,
    composed: Option<RgbaImage>,
    failure: Option<String>,
}

impl LabelSlot {
    fn new(source: DynamicImage) -> Self {
        Self {
            source,
            style: LabelStyle::default(),
            composed: None,
            failure: None,
        }
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn style(&self) -> &LabelStyle {
        &self.style
    }

    /// The last successfully composed sticker, if it is still current.
    pub fn composed(&self) -> Option<&RgbaImage> {
        self.composed.as_ref()
    }

    /// Why the last composition attempt failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn invalidate(&mut self) {
        self.composed = None;
        self.failure = None;
    }

    fn needs_composition(&self) -> bool {
        self.composed.is_none() && self.failure.is_none()
    }
}

/// One sheet being edited.
pub struct Session<'r> {
    resources: &'r Resources,
    template_name: String,
    descriptor: TemplateDescriptor,
    dpi: u32,
    /// Row-major, `rows * columns` long.
    slots: Vec<Option<LabelSlot>>,
}

impl<'r> Session<'r> {
    /// Start a session on the catalog's first template.
    pub fn new(resources: &'r Resources, dpi: u32) -> Result<Self, SheetError> {
        let (name, _) = resources
            .catalog
            .first()
            .ok_or_else(|| SheetError::Configuration("template catalog is empty".into()))?;
        Self::with_template(resources, name, dpi)
    }

    /// Start a session on a named template.
    pub fn with_template(resources: &'r Resources, name: &str, dpi: u32) -> Result<Self, SheetError> {
        if dpi == 0 {
            return Err(SheetError::InvalidInput("dpi must be positive".into()));
        }
        let descriptor = resources.catalog.require(name)?.clone();
        let slots = vec![None; descriptor.pattern.cell_count()];
        Ok(Self {
            resources,
            template_name: name.to_string(),
            descriptor,
            dpi,
            slots,
        })
    }

    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    pub fn descriptor(&self) -> &TemplateDescriptor {
        &self.descriptor
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Pixel size every sticker is composed at.
    pub fn cell_size(&self) -> PixelSize {
        cell_size(&self.descriptor, self.dpi)
    }

    /// Switch templates. Every slot is cleared.
    pub fn select_template(&mut self, name: &str) -> Result<(), SheetError> {
        let descriptor = self.resources.catalog.require(name)?.clone();
        info!(template = name, "new template selected, clearing label data");
        self.slots = vec![None; descriptor.pattern.cell_count()];
        self.descriptor = descriptor;
        self.template_name = name.to_string();
        Ok(())
    }

    /// Change the print resolution. Photos and styles are kept; composed
    /// stickers are dropped because their pixel size changed.
    pub fn set_dpi(&mut self, dpi: u32) -> Result<(), SheetError> {
        if dpi == 0 {
            return Err(SheetError::InvalidInput("dpi must be positive".into()));
        }
        if dpi != self.dpi {
            self.dpi = dpi;
            self.slots.iter_mut().flatten().for_each(LabelSlot::invalidate);
        }
        Ok(())
    }

    fn index(&self, coord: GridCoordinate) -> Result<usize, SheetError> {
        let pattern = self.descriptor.pattern;
        if coord.row >= pattern.rows || coord.column >= pattern.columns {
            return Err(SheetError::CellOutOfRange {
                coord,
                rows: pattern.rows,
                columns: pattern.columns,
            });
        }
        Ok(coord.row as usize * pattern.columns as usize + coord.column as usize)
    }

    fn coordinate(&self, index: usize) -> GridCoordinate {
        let columns = self.descriptor.pattern.columns as usize;
        GridCoordinate::new((index / columns) as u32, (index % columns) as u32)
    }

    /// Slot at `coord`, `None` when no photo was assigned.
    pub fn slot(&self, coord: GridCoordinate) -> Result<Option<&LabelSlot>, SheetError> {
        let index = self.index(coord)?;
        Ok(self.slots[index].as_ref())
    }

    fn slot_mut(&mut self, coord: GridCoordinate) -> Result<&mut LabelSlot, SheetError> {
        let index = self.index(coord)?;
        self.slots[index].as_mut().ok_or(SheetError::NoImage { coord })
    }

    /// Assign a photo. A new slot starts with the default style; an existing
    /// slot keeps its style.
    pub fn set_source_image(&mut self, coord: GridCoordinate, image: DynamicImage) -> Result<(), SheetError> {
        let index = self.index(coord)?;
        info!(label = %coord, width = image.width(), height = image.height(), "loaded image for label");
        match &mut self.slots[index] {
            Some(slot) => {
                slot.source = image;
                slot.invalidate();
            }
            empty => *empty = Some(LabelSlot::new(image)),
        }
        Ok(())
    }

    /// Change a cell's style. The cell must have a photo.
    pub fn set_style(&mut self, coord: GridCoordinate, style: LabelStyle) -> Result<(), SheetError> {
        let slot = self.slot_mut(coord)?;
        if slot.style != style {
            slot.style = style;
            slot.invalidate();
        }
        Ok(())
    }

    /// Remove a cell's photo and sticker.
    pub fn clear_cell(&mut self, coord: GridCoordinate) -> Result<(), SheetError> {
        let index = self.index(coord)?;
        self.slots[index] = None;
        Ok(())
    }

    /// Compose one cell, replacing its sticker on success.
    pub fn compose_cell(&mut self, coord: GridCoordinate) -> Result<&RgbaImage, SheetError> {
        let cell = self.cell_size();
        let resources = self.resources;
        let index = self.index(coord)?;
        let slot = self.slots[index].as_mut().ok_or(SheetError::NoImage { coord })?;

        let result = compose::compose(&slot.source, &slot.style, cell, &resources.assets);
        apply_result(coord, slot, result)?;
        slot.composed.as_ref().ok_or(SheetError::NoImage { coord })
    }

    /// Compose every cell that has a photo but no current sticker, in parallel.
    ///
    /// Returns the cells that failed; their slots are marked failed.
    pub fn compose_pending(&mut self) -> Vec<(GridCoordinate, SheetError)> {
        let cell = self.cell_size();
        let assets = &self.resources.assets;

        let results: Vec<(usize, Result<RgbaImage, SheetError>)> = self
            .slots
            .par_iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref()
                    .filter(|slot| slot.needs_composition())
                    .map(|slot| (index, slot))
            })
            .map(|(index, slot)| (index, compose::compose(&slot.source, &slot.style, cell, assets)))
            .collect();

        let mut failures = Vec::new();
        for (index, result) in results {
            let coord = self.coordinate(index);
            if let Some(slot) = self.slots[index].as_mut()
                && let Err(e) = apply_result(coord, slot, result)
            {
                failures.push((coord, e));
            }
        }
        failures
    }

    /// Cells that have a photo, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = GridCoordinate> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| self.coordinate(index))
    }

    /// Current stickers keyed by cell.
    pub fn composed_grid(&self) -> BTreeMap<GridCoordinate, &RgbaImage> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_ref()
                    .and_then(LabelSlot::composed)
                    .map(|raster| (self.coordinate(index), raster))
            })
            .collect()
    }

    /// Compose whatever is pending, then lay every sticker out on pages.
    ///
    /// Fails without producing any page if a cell with a photo has no
    /// sticker because its composition failed.
    pub fn assemble_pages(&mut self) -> Result<Vec<RgbaImage>, SheetError> {
        self.compose_pending();

        if let Some((index, reason)) = self
            .slots
            .iter()
            .enumerate()
            .find_map(|(index, slot)| slot.as_ref()?.failure().map(|reason| (index, reason)))
        {
            return Err(SheetError::CellFailed {
                coord: self.coordinate(index),
                reason: reason.to_string(),
            });
        }

        let grid = self.composed_grid();
        let pages: Vec<RgbaImage> = page::assemble(&self.descriptor, self.dpi, &grid)?.collect();
        info!(pages = pages.len(), stickers = grid.len(), dpi = self.dpi, "assembled pages");
        Ok(pages)
    }

    /// Low-resolution picture of the sheet with current stickers.
    pub fn overview(&self, dpi: u32) -> RgbaImage {
        page::overview(&self.descriptor, dpi, &self.composed_grid())
    }
}

/// Store a composition result: all-or-nothing on the sticker.
fn apply_result(
    coord: GridCoordinate,
    slot: &mut LabelSlot,
    result: Result<RgbaImage, SheetError>,
) -> Result<(), SheetError> {
    match result {
        Ok(raster) => {
            debug!(label = %coord, width = raster.width(), height = raster.height(), "composed");
            info!(label = %coord, "generated label");
            slot.composed = Some(raster);
            slot.failure = None;
            Ok(())
        }
        Err(e) => {
            warn!(label = %coord, error = %e, "label generation failed");
            slot.failure = Some(e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logos::{LogoChoice, LogoSet};
    use crate::render::Assets;
    use crate::render::caption::FontSource;
    use crate::render::page::PAPER;
    use crate::template::TemplateCatalog;
    use image::{Rgba, RgbaImage};

    const CATALOG: &str = r#"{
        "Grid 2x2": {
            "sticker_pattern": [2, 2],
            "sticker_width": 50, "sticker_height": 30,
            "top_margin": 10, "left_margin": 10,
            "horizontal_margin": 5, "vertical_margin": 5
        },
        "Single": {
            "sticker_pattern": [1, 1],
            "sticker_width": 100, "sticker_height": 60,
            "top_margin": 20, "left_margin": 20,
            "horizontal_margin": 0, "vertical_margin": 0
        }
    }"#;

    fn resources() -> Resources {
        let logo = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        Resources {
            catalog: TemplateCatalog::from_json_str(CATALOG).unwrap(),
            assets: Assets {
                logos: LogoSet::new(logo.clone(), logo).unwrap(),
                font: FontSource::Missing("not installed".into()),
            },
        }
    }

    fn photo() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([0, 128, 255, 255])))
    }

    #[test]
    fn test_starts_on_first_template() {
        let resources = resources();
        let session = Session::new(&resources, 150).unwrap();
        assert_eq!(session.template_name(), "Grid 2x2");
        assert_eq!(session.cell_size(), PixelSize::new(295, 177));
        assert_eq!(session.occupied().count(), 0);
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let resources = resources();
        assert!(Session::new(&resources, 0).is_err());
    }

    #[test]
    fn test_compose_without_image() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let err = session.compose_cell(GridCoordinate::new(1, 0)).unwrap_err();
        assert!(matches!(err, SheetError::NoImage { coord } if coord == GridCoordinate::new(1, 0)));
        assert_eq!(err.to_string(), "No image assigned to label (2, 1)");
    }

    #[test]
    fn test_out_of_range() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        assert!(matches!(
            session.set_source_image(GridCoordinate::new(2, 0), photo()),
            Err(SheetError::CellOutOfRange { .. })
        ));
    }

    #[test]
    fn test_style_requires_image() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        assert!(matches!(
            session.set_style(GridCoordinate::new(0, 0), LabelStyle::default()),
            Err(SheetError::NoImage { .. })
        ));
    }

    #[test]
    fn test_compose_cell_stores_sticker() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let coord = GridCoordinate::new(0, 1);
        session.set_source_image(coord, photo()).unwrap();
        let sticker = session.compose_cell(coord).unwrap();
        assert_eq!(sticker.dimensions(), (295, 177));
        assert!(session.slot(coord).unwrap().unwrap().composed().is_some());
    }

    #[test]
    fn test_style_change_invalidates() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let coord = GridCoordinate::new(0, 0);
        session.set_source_image(coord, photo()).unwrap();
        session.compose_cell(coord).unwrap();

        // Same style keeps the sticker.
        session.set_style(coord, LabelStyle::default()).unwrap();
        assert!(session.slot(coord).unwrap().unwrap().composed().is_some());

        session
            .set_style(coord, LabelStyle::new(0, LogoChoice::None, ""))
            .unwrap();
        assert!(session.slot(coord).unwrap().unwrap().composed().is_none());
    }

    #[test]
    fn test_caption_without_font_marks_slot_failed() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let coord = GridCoordinate::new(0, 0);
        session.set_source_image(coord, photo()).unwrap();
        session.compose_cell(coord).unwrap();

        session
            .set_style(coord, LabelStyle::default().with_caption("Hello"))
            .unwrap();
        let err = session.compose_cell(coord).unwrap_err();
        assert!(matches!(err, SheetError::FontUnavailable(_)));

        // The style change already dropped the old sticker.
        let slot = session.slot(coord).unwrap().unwrap();
        assert!(slot.failure().is_some());
        assert!(slot.composed().is_none());
    }

    #[test]
    fn test_recompose_failure_retains_sticker() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let coord = GridCoordinate::new(0, 0);
        session.set_source_image(coord, photo()).unwrap();
        let before = session.compose_cell(coord).unwrap().clone();

        let slot = session.slots[0].as_mut().unwrap();
        let result = Err(SheetError::FontUnavailable("gone".into()));
        assert!(apply_result(coord, slot, result).is_err());

        let slot = session.slot(coord).unwrap().unwrap();
        assert_eq!(slot.composed().unwrap().as_raw(), before.as_raw());
        assert_eq!(slot.failure(), Some("Caption font unavailable: gone"));
    }

    #[test]
    fn test_failed_cell_blocks_assembly() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let good = GridCoordinate::new(0, 0);
        let bad = GridCoordinate::new(1, 1);
        session.set_source_image(good, photo()).unwrap();
        session.set_source_image(bad, photo()).unwrap();
        session
            .set_style(bad, LabelStyle::default().with_caption("needs a font"))
            .unwrap();

        let err = session.assemble_pages().unwrap_err();
        assert!(matches!(err, SheetError::CellFailed { coord, .. } if coord == bad));
        // The healthy cell was still composed.
        assert!(session.slot(good).unwrap().unwrap().composed().is_some());

        session.clear_cell(bad).unwrap();
        assert_eq!(session.assemble_pages().unwrap().len(), 1);
    }

    #[test]
    fn test_assemble_composes_pending_cells() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let coord = GridCoordinate::new(1, 1);
        session.set_source_image(coord, photo()).unwrap();

        let pages = session.assemble_pages().unwrap();
        assert_eq!(pages.len(), 1);
        let (x, y) = crate::geometry::cell_origin(1, 1, session.descriptor(), 150);
        assert_ne!(*pages[0].get_pixel(x + 100, y + 50), PAPER);
        let cell = session.cell_size();
        for (row, column) in [(0, 0), (0, 1), (1, 0)] {
            let (x0, y0) = crate::geometry::cell_origin(row, column, session.descriptor(), 150);
            let blank = (y0..y0 + cell.height)
                .flat_map(|py| (x0..x0 + cell.width).map(move |px| (px, py)))
                .all(|(px, py)| *pages[0].get_pixel(px, py) == PAPER);
            assert!(blank, "cell ({}, {}) should be untouched paper", row + 1, column + 1);
        }
    }

    #[test]
    fn test_select_template_clears_grid() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        session.set_source_image(GridCoordinate::new(1, 1), photo()).unwrap();
        session.select_template("Single").unwrap();
        assert_eq!(session.occupied().count(), 0);
        assert_eq!(session.descriptor().pattern.cell_count(), 1);
        assert!(session.slot(GridCoordinate::new(1, 1)).is_err());
        assert!(matches!(
            session.select_template("Missing"),
            Err(SheetError::UnknownTemplate(_))
        ));
        assert_eq!(session.template_name(), "Single");
    }

    #[test]
    fn test_dpi_change_keeps_photos_drops_stickers() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        let coord = GridCoordinate::new(0, 0);
        session.set_source_image(coord, photo()).unwrap();
        session.compose_cell(coord).unwrap();
        session.set_dpi(300).unwrap();
        let slot = session.slot(coord).unwrap().unwrap();
        assert!(slot.composed().is_none());
        assert_eq!(session.compose_cell(coord).unwrap().dimensions(), (590, 354));
    }

    #[test]
    fn test_compose_pending_reports_failures() {
        let resources = resources();
        let mut session = Session::new(&resources, 150).unwrap();
        for row in 0..2 {
            for column in 0..2 {
                session
                    .set_source_image(GridCoordinate::new(row, column), photo())
                    .unwrap();
            }
        }
        session
            .set_style(GridCoordinate::new(0, 1), LabelStyle::default().with_caption("x"))
            .unwrap();

        let failures = session.compose_pending();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, GridCoordinate::new(0, 1));
        assert_eq!(session.composed_grid().len(), 3);
        // Nothing left to do on a second pass.
        assert!(session.compose_pending().is_empty());
    }
}
