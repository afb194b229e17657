use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::color::Color;

/// A model response that parsed as JSON but did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("response has no '{0}' field")]
    MissingField(&'static str),
    #[error("field '{field}' has the wrong type; expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("field '{0}' is empty")]
    Empty(&'static str),
    #[error("no usable colors in response ({skipped} entries rejected)")]
    NoUsableColors { skipped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandingContent {
    pub title: String,
    pub slogan: String,
    pub tips: Vec<String>,
}

impl BrandingContent {
    /// Validates a `{title, slogan, tips}` object. Title and slogan must be
    /// non-blank strings and `tips` must be an array; non-string or blank tips
    /// are dropped.
    pub fn from_object(object: &Map<String, Value>) -> Result<Self, ShapeError> {
        let title = required_text(object, "title")?;
        let slogan = required_text(object, "slogan")?;
        let tips = object
            .get("tips")
            .ok_or(ShapeError::MissingField("tips"))?
            .as_array()
            .ok_or(ShapeError::WrongType {
                field: "tips",
                expected: "array of strings",
            })?
            .iter()
            .filter_map(Value::as_str)
            .map(|tip| tip.split_whitespace().collect::<Vec<&str>>().join(" "))
            .filter(|tip| !tip.is_empty())
            .collect();
        Ok(Self {
            title,
            slogan,
            tips,
        })
    }
}

fn required_text(object: &Map<String, Value>, field: &'static str) -> Result<String, ShapeError> {
    let text = object
        .get(field)
        .ok_or(ShapeError::MissingField(field))?
        .as_str()
        .ok_or(ShapeError::WrongType {
            field,
            expected: "string",
        })?
        .trim()
        .to_string();
    if text.is_empty() {
        return Err(ShapeError::Empty(field));
    }
    Ok(text)
}

/// Validates a `{colors: [{hex, name, rgb}]}` object.
///
/// Entries whose hex does not parse are skipped; the result is rejected only
/// when nothing usable remains.
pub fn colors_from_object(object: &Map<String, Value>) -> Result<Vec<Color>, ShapeError> {
    let rows = object
        .get("colors")
        .ok_or(ShapeError::MissingField("colors"))?
        .as_array()
        .ok_or(ShapeError::WrongType {
            field: "colors",
            expected: "array of color objects",
        })?;
    if rows.is_empty() {
        return Err(ShapeError::Empty("colors"));
    }

    let mut colors = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for row in rows {
        match serde_json::from_value::<Color>(row.clone()) {
            Ok(color) => colors.push(color),
            Err(_) => skipped += 1,
        }
    }
    if colors.is_empty() {
        return Err(ShapeError::NoUsableColors { skipped });
    }
    Ok(colors)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub id: String,
    pub name: String,
    pub description: String,
    pub colors: Vec<Color>,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<BrandingContent>,
}

impl ColorPalette {
    /// File name used when exporting: whitespace runs become `-`, lowercased.
    pub fn export_file_name(&self) -> String {
        format!("{}.json", slug(&self.name))
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn slug(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<&str>>()
        .join("-")
        .to_lowercase()
}

/// Saved palettes, newest first. Ids in the collection are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedPalettes {
    palettes: Vec<ColorPalette>,
}

impl SavedPalettes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `palette`. Returns `false` without changes when its id is
    /// already present.
    pub fn save(&mut self, palette: ColorPalette) -> bool {
        if self.contains(&palette.id) {
            return false;
        }
        self.palettes.insert(0, palette);
        true
    }

    /// Removes the first entry with `id`; absent ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Option<ColorPalette> {
        let idx = self.palettes.iter().position(|palette| palette.id == id)?;
        Some(self.palettes.remove(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.palettes.iter().any(|palette| palette.id == id)
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColorPalette> {
        self.palettes.iter()
    }

    pub fn to_vec(&self) -> Vec<ColorPalette> {
        self.palettes.clone()
    }
}
