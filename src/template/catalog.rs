//! Template catalog: the named set of sheet templates, loaded once at startup.
//!
//! The catalog file is a JSON object mapping template name to descriptor:
//!
//! ```json
//! {
//!   "Round 2x4": {
//!     "sticker_pattern": [4, 2],
//!     "sticker_width": 96, "sticker_height": 63.5,
//!     "top_margin": 15.15, "left_margin": 7.75,
//!     "horizontal_margin": 2.5, "vertical_margin": 0
//!   }
//! }
//! ```
//!
//! Names keep the order they have in the file; the first entry is the
//! default selection.

use std::path::Path;

use serde_json::{Map, Value};

use super::TemplateDescriptor;
use crate::error::SheetError;

/// Read-only mapping from template name to descriptor.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    entries: Vec<(String, TemplateDescriptor)>,
}

impl TemplateCatalog {
    /// Build a catalog from already-constructed descriptors, validating each.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, TemplateDescriptor)>,
    ) -> Result<Self, SheetError> {
        let mut catalog = Self::default();
        for (name, descriptor) in entries {
            if catalog.get(&name).is_some() {
                return Err(SheetError::Configuration(format!(
                    "duplicate template name '{}'",
                    name
                )));
            }
            descriptor.validate(&name)?;
            catalog.entries.push((name, descriptor));
        }
        if catalog.entries.is_empty() {
            return Err(SheetError::Configuration("template catalog is empty".into()));
        }
        Ok(catalog)
    }

    /// Parse a catalog from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, SheetError> {
        let root: Map<String, Value> = serde_json::from_str(json).map_err(|e| {
            SheetError::Configuration(format!("template catalog is not a JSON object: {}", e))
        })?;

        let mut entries = Vec::with_capacity(root.len());
        for (name, value) in root {
            let descriptor: TemplateDescriptor = serde_json::from_value(value).map_err(|e| {
                SheetError::Configuration(format!("template '{}' is malformed: {}", name, e))
            })?;
            entries.push((name, descriptor));
        }

        Self::from_entries(entries)
    }

    /// Load a catalog file. A missing file is a configuration error.
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SheetError::Configuration(format!(
                "cannot read template catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Look up a template by name.
    pub fn get(&self, name: &str) -> Option<&TemplateDescriptor> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, descriptor)| descriptor)
    }

    /// Look up a template by name, or fail with [`SheetError::UnknownTemplate`].
    pub fn require(&self, name: &str) -> Result<&TemplateDescriptor, SheetError> {
        self.get(name)
            .ok_or_else(|| SheetError::UnknownTemplate(name.to_string()))
    }

    /// Template names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// All entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateDescriptor)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// The template selected when nothing else was chosen.
    pub fn first(&self) -> Option<(&str, &TemplateDescriptor)> {
        self.iter().next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "Zeta 2x2": {
            "sticker_pattern": [2, 2],
            "sticker_width": 50, "sticker_height": 30,
            "top_margin": 10, "left_margin": 10,
            "horizontal_margin": 5, "vertical_margin": 5
        },
        "Alpha 1x1": {
            "sticker_pattern": [1, 1],
            "sticker_width": 100, "sticker_height": 100,
            "top_margin": 0, "left_margin": 0,
            "horizontal_margin": 0, "vertical_margin": 0,
            "page_width": 100, "page_height": 100
        }
    }"#;

    #[test]
    fn test_load_preserves_file_order() {
        let catalog = TemplateCatalog::from_json_str(CATALOG).unwrap();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["Zeta 2x2", "Alpha 1x1"]);
        assert_eq!(catalog.first().unwrap().0, "Zeta 2x2");
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_page_size_override() {
        let catalog = TemplateCatalog::from_json_str(CATALOG).unwrap();
        let alpha = catalog.get("Alpha 1x1").unwrap();
        assert_eq!(alpha.page_width_mm, 100.0);
        let zeta = catalog.get("Zeta 2x2").unwrap();
        assert_eq!(zeta.page_height_mm, 297.0);
    }

    #[test]
    fn test_unknown_template() {
        let catalog = TemplateCatalog::from_json_str(CATALOG).unwrap();
        assert!(matches!(
            catalog.require("nope"),
            Err(SheetError::UnknownTemplate(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_missing_field_is_configuration_error() {
        let json = r#"{ "broken": { "sticker_pattern": [1, 1] } }"#;
        let err = TemplateCatalog::from_json_str(json).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_not_an_object() {
        assert!(TemplateCatalog::from_json_str("[1, 2]").unwrap_err().is_configuration());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(TemplateCatalog::from_json_str("{}").unwrap_err().is_configuration());
    }

    #[test]
    fn test_oversized_template_fails_at_load() {
        let json = r#"{ "huge": {
            "sticker_pattern": [1, 3],
            "sticker_width": 80, "sticker_height": 30,
            "top_margin": 0, "left_margin": 0,
            "horizontal_margin": 0, "vertical_margin": 0
        } }"#;
        assert!(matches!(
            TemplateCatalog::from_json_str(json),
            Err(SheetError::GeometryViolation { template, .. }) if template == "huge"
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = TemplateCatalog::load(Path::new("/nonexistent/templates.json")).unwrap_err();
        assert!(matches!(err, SheetError::Configuration(_)));
    }
}
