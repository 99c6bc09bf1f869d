//! Template registry.
//!
//! Maps (locality, age category) to a template asset and its overlay
//! placements. The table is data, loaded from `static/templates.json` (or a
//! file given at runtime), and is shared by validation, generation and the
//! status self-test so they always agree on what is supported.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::fields::FieldTag;

const BUNDLED_TABLE: &str = include_str!("../../static/templates.json");

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read template table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse template table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("locality '{locality}' maps {category} to unknown layout '{layout}'")]
    UnknownLayout {
        locality: String,
        category: String,
        layout: String,
    },
    #[error("locality '{locality}' registers unknown age category '{category}'")]
    UnknownCategory { locality: String, category: String },
    #[error("template table defines no localities")]
    Empty,
}

/// Where and what to draw for one piece of text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverlayPlacement {
    pub x: f32,
    pub y: f32,
    pub page: usize,
    pub field: FieldTag,
}

#[derive(Debug, Deserialize)]
struct Layout {
    template: String,
    overlays: Vec<OverlayPlacement>,
}

#[derive(Debug, Deserialize)]
struct TemplateTable {
    font: String,
    categories: Vec<String>,
    layouts: HashMap<String, Layout>,
    localities: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    baselines: HashMap<String, String>,
}

#[derive(Debug)]
pub struct TemplateRegistry {
    font_path: String,
    categories: Vec<String>,
    localities: BTreeMap<String, BTreeMap<String, Arc<Layout>>>,
    baselines: HashMap<String, String>,
}

impl TemplateRegistry {
    /// The table compiled into the binary.
    pub fn bundled() -> Result<Self, RegistryError> {
        Self::from_json(BUNDLED_TABLE)
    }

    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let table: TemplateTable = serde_json::from_str(raw)?;
        if table.localities.is_empty() {
            return Err(RegistryError::Empty);
        }

        let layouts: HashMap<String, Arc<Layout>> = table
            .layouts
            .into_iter()
            .map(|(name, layout)| (name, Arc::new(layout)))
            .collect();

        let mut localities = BTreeMap::new();
        for (locality, categories) in table.localities {
            let mut entries = BTreeMap::new();
            for (category, layout_name) in categories {
                if !table.categories.contains(&category) {
                    return Err(RegistryError::UnknownCategory { locality, category });
                }
                let layout = layouts
                    .get(&layout_name)
                    .cloned()
                    .ok_or_else(|| RegistryError::UnknownLayout {
                        locality: locality.clone(),
                        category: category.clone(),
                        layout: layout_name.clone(),
                    })?;
                entries.insert(category, layout);
            }
            localities.insert(locality, entries);
        }

        Ok(Self {
            font_path: table.font,
            categories: table.categories,
            localities,
            baselines: table
                .baselines
                .into_iter()
                .map(|(path, digest)| (path, digest.to_ascii_lowercase()))
                .collect(),
        })
    }

    fn layout(&self, locality: &str, category: &str) -> Option<&Layout> {
        self.localities
            .get(locality)
            .and_then(|entries| entries.get(category))
            .map(|layout| layout.as_ref())
    }

    pub fn resolve_template(&self, locality: &str, category: &str) -> Option<&str> {
        self.layout(locality, category)
            .map(|layout| layout.template.as_str())
    }

    /// Placements in declaration order; empty for an unregistered pair.
    pub fn resolve_overlays(&self, locality: &str, category: &str) -> &[OverlayPlacement] {
        self.layout(locality, category)
            .map(|layout| layout.overlays.as_slice())
            .unwrap_or(&[])
    }

    pub fn localities(&self) -> impl Iterator<Item = &str> {
        self.localities.keys().map(String::as_str)
    }

    pub fn known_categories(&self) -> &[String] {
        &self.categories
    }

    pub fn is_known_locality(&self, locality: &str) -> bool {
        self.localities.contains_key(locality)
    }

    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn supports(&self, locality: &str, category: &str) -> bool {
        self.layout(locality, category).is_some()
    }

    /// Categories registered for `locality`, in global category order.
    pub fn categories_for(&self, locality: &str) -> Vec<&str> {
        let Some(entries) = self.localities.get(locality) else {
            return Vec::new();
        };
        self.categories
            .iter()
            .filter(|category| entries.contains_key(category.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn supported_pairs(&self) -> Vec<(&str, &str)> {
        self.localities()
            .flat_map(|locality| {
                self.categories_for(locality)
                    .into_iter()
                    .map(move |category| (locality, category))
            })
            .collect()
    }

    /// Every distinct template asset referenced by the table, sorted.
    pub fn template_paths(&self) -> Vec<&str> {
        self.localities
            .values()
            .flat_map(|entries| entries.values())
            .map(|layout| layout.template.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn font_path(&self) -> &str {
        &self.font_path
    }

    /// Known-good SHA-256 (lowercase hex) for an asset, if one is recorded.
    pub fn baseline_for(&self, path: &str) -> Option<&str> {
        self.baselines.get(path).map(String::as_str)
    }
}
