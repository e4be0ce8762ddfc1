//! Document-level types.

use super::PageGeometry;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A flowing document: an ordered list of units laid out top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Optional document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Flow units in reading order
    #[serde(default)]
    pub units: Vec<FlowUnit>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from a list of units.
    pub fn from_units(units: Vec<FlowUnit>) -> Self {
        Self { title: None, units }
    }

    /// Load a document from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Parse a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of flow units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the document has no units.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Append a unit at the end of the flow.
    pub fn push(&mut self, unit: FlowUnit) {
        self.units.push(unit);
    }

    /// Get a unit by index.
    pub fn get(&self, index: usize) -> Option<&FlowUnit> {
        self.units.get(index)
    }

    /// Apply a content edit.
    ///
    /// Geometry edits leave the document untouched; they are handled by
    /// the paginator. On error the document is unchanged.
    pub fn apply(&mut self, edit: &Edit) -> Result<()> {
        match edit {
            Edit::Insert { index, unit } => {
                if *index > self.units.len() {
                    return Err(self.out_of_range("insert", *index));
                }
                self.units.insert(*index, unit.clone());
            }
            Edit::Remove { index } => {
                if *index >= self.units.len() {
                    return Err(self.out_of_range("remove", *index));
                }
                self.units.remove(*index);
            }
            Edit::Replace { index, unit } => {
                let len = self.units.len();
                let slot = self
                    .units
                    .get_mut(*index)
                    .ok_or_else(|| Error::InvalidEdit(format!("replace at {index} (len {len})")))?;
                *slot = unit.clone();
            }
            Edit::AppendText { index, text } => {
                let len = self.units.len();
                let unit = self
                    .units
                    .get_mut(*index)
                    .ok_or_else(|| Error::InvalidEdit(format!("appendText at {index} (len {len})")))?;
                if !unit.append_text(text) {
                    return Err(Error::InvalidEdit(format!(
                        "appendText at {index}: unit has no text"
                    )));
                }
            }
            Edit::SetGeometry { .. } => {}
        }
        Ok(())
    }

    fn out_of_range(&self, op: &str, index: usize) -> Error {
        Error::InvalidEdit(format!("{op} at {index} (len {})", self.units.len()))
    }
}

/// A unit of flowing content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowUnit {
    /// Body text, breakable between lines
    Paragraph {
        /// Paragraph text
        #[serde(default)]
        text: String,
    },

    /// A heading; kept together and kept with the following unit
    Heading {
        /// Heading text
        #[serde(default)]
        text: String,
        /// Heading level (1-6)
        #[serde(default = "default_heading_level")]
        level: u8,
    },

    /// A table, laid out as one unbreakable block
    Table {
        /// Measured or estimated height in points
        height: f64,
        /// Intrinsic width in points (defaults to the content width)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
    },

    /// An image block
    Image {
        /// Height in points
        height: f64,
        /// Width in points (defaults to the content width)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
    },

    /// Blank lines
    Whitespace {
        /// Number of blank body lines
        #[serde(default = "default_blank_lines")]
        lines: u32,
    },

    /// An explicit page break
    PageBreak,
}

fn default_heading_level() -> u8 {
    1
}

fn default_blank_lines() -> u32 {
    1
}

impl FlowUnit {
    /// Create a paragraph.
    pub fn paragraph(text: impl Into<String>) -> Self {
        FlowUnit::Paragraph { text: text.into() }
    }

    /// Create a heading.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        FlowUnit::Heading {
            text: text.into(),
            level: level.clamp(1, 6),
        }
    }

    /// Create a table block with the given height.
    pub fn table(height: f64) -> Self {
        FlowUnit::Table {
            height,
            width: None,
        }
    }

    /// Create an image block.
    pub fn image(width: f64, height: f64) -> Self {
        FlowUnit::Image {
            height,
            width: Some(width),
        }
    }

    /// Create a single blank line.
    pub fn blank() -> Self {
        FlowUnit::Whitespace { lines: 1 }
    }

    /// Create an explicit page break.
    pub fn page_break() -> Self {
        FlowUnit::PageBreak
    }

    /// Text content, if this unit carries text.
    pub fn text(&self) -> Option<&str> {
        match self {
            FlowUnit::Paragraph { text } | FlowUnit::Heading { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Append text to a text-bearing unit. Returns false for other units.
    pub fn append_text(&mut self, more: &str) -> bool {
        match self {
            FlowUnit::Paragraph { text } | FlowUnit::Heading { text, .. } => {
                text.push_str(more);
                true
            }
            _ => false,
        }
    }

    /// Check if this unit is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, FlowUnit::Heading { .. })
    }

    /// Check if this unit is blank space.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, FlowUnit::Whitespace { .. })
    }

    /// Check if this unit is an explicit page break.
    pub fn is_page_break(&self) -> bool {
        matches!(self, FlowUnit::PageBreak)
    }
}

/// A mutation applied to a live document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Edit {
    /// Insert a unit before `index` (`index == len` appends)
    Insert {
        /// Insertion index
        index: usize,
        /// Unit to insert
        unit: FlowUnit,
    },

    /// Remove the unit at `index`
    Remove {
        /// Unit index
        index: usize,
    },

    /// Replace the unit at `index`
    Replace {
        /// Unit index
        index: usize,
        /// Replacement unit
        unit: FlowUnit,
    },

    /// Type text at the end of a paragraph or heading
    AppendText {
        /// Unit index
        index: usize,
        /// Text to append
        text: String,
    },

    /// Change page size, margins or orientation
    SetGeometry {
        /// New page geometry
        geometry: PageGeometry,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_json() {
        let json = r#"{
            "title": "Draft",
            "units": [
                {"type": "heading", "text": "Intro", "level": 2},
                {"type": "paragraph", "text": "Body"},
                {"type": "table", "height": 120.0},
                {"type": "whitespace"},
                {"type": "page_break"}
            ]
        }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.title.as_deref(), Some("Draft"));
        assert_eq!(doc.len(), 5);
        assert!(doc.units[0].is_heading());
        assert_eq!(doc.units[3], FlowUnit::Whitespace { lines: 1 });
        assert!(doc.units[4].is_page_break());
    }

    #[test]
    fn test_apply_edits() {
        let mut doc = Document::from_units(vec![FlowUnit::paragraph("a")]);
        doc.apply(&Edit::Insert {
            index: 1,
            unit: FlowUnit::paragraph("b"),
        })
        .unwrap();
        doc.apply(&Edit::AppendText {
            index: 0,
            text: "bc".into(),
        })
        .unwrap();
        assert_eq!(doc.units[0].text(), Some("abc"));

        doc.apply(&Edit::Remove { index: 0 }).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.units[0].text(), Some("b"));
    }

    #[test]
    fn test_invalid_edit_leaves_document() {
        let mut doc = Document::from_units(vec![FlowUnit::table(40.0)]);
        let before = doc.clone();

        assert!(doc.apply(&Edit::Remove { index: 3 }).is_err());
        assert!(doc
            .apply(&Edit::AppendText {
                index: 0,
                text: "x".into()
            })
            .is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_edit_json_tags() {
        let edit: Edit =
            serde_json::from_str(r#"{"op": "appendText", "index": 2, "text": " more"}"#).unwrap();
        assert_eq!(
            edit,
            Edit::AppendText {
                index: 2,
                text: " more".into()
            }
        );
    }
}
