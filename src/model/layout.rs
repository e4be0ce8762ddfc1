//! Page assignment types.

use super::Edit;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A structural position in the flow: before line `line` of unit `unit`.
///
/// `line` is always 0 for units that cannot break internally. The end of a
/// document with `n` units is `{unit: n, line: 0}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlowPos {
    /// Unit index
    pub unit: usize,
    /// Line within the unit
    pub line: u32,
}

impl FlowPos {
    /// Start of the flow.
    pub const START: FlowPos = FlowPos { unit: 0, line: 0 };

    /// Create a position.
    pub fn new(unit: usize, line: u32) -> Self {
        Self { unit, line }
    }

    /// Position before a whole unit.
    pub fn before(unit: usize) -> Self {
        Self { unit, line: 0 }
    }

    /// Check if this position falls between two units.
    pub fn is_unit_boundary(&self) -> bool {
        self.line == 0
    }
}

/// A page: the half-open flow range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// First position on the page
    pub start: FlowPos,
    /// First position after the page
    pub end: FlowPos,
}

impl Page {
    /// Create a page.
    pub fn new(start: FlowPos, end: FlowPos) -> Self {
        Self { start, end }
    }

    /// Check if the page holds no content.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The pages of a document, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Pages in flow order
    pub pages: Vec<Page>,
}

impl Layout {
    /// A single empty page, the layout of an empty document.
    pub fn new() -> Self {
        Self {
            pages: vec![Page::new(FlowPos::START, FlowPos::START)],
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by index (0-based).
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Index of the page containing `pos`.
    pub fn page_of(&self, pos: FlowPos) -> Option<usize> {
        self.pages
            .iter()
            .position(|p| p.start <= pos && pos < p.end)
    }

    /// Check that the pages partition `[START, end)` exactly.
    pub fn validate(&self, end: FlowPos) -> Result<()> {
        let (first, last) = match (self.pages.first(), self.pages.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::Other("layout has no pages".into())),
        };
        if first.start != FlowPos::START {
            return Err(Error::Other(format!(
                "first page starts at {:?}",
                first.start
            )));
        }
        if last.end != end {
            return Err(Error::Other(format!(
                "last page ends at {:?}, flow ends at {:?}",
                last.end, end
            )));
        }
        if self.pages.len() == 1 && end == FlowPos::START {
            return Ok(());
        }
        for (i, page) in self.pages.iter().enumerate() {
            if page.start >= page.end {
                return Err(Error::Other(format!("page {i} is empty or reversed")));
            }
            if i > 0 && self.pages[i - 1].end != page.start {
                return Err(Error::Other(format!(
                    "page {i} does not start where page {} ends",
                    i - 1
                )));
            }
        }
        Ok(())
    }

    /// Shift page boundaries to follow a structural edit.
    ///
    /// Line counts are not known here; boundaries that end up past the end
    /// of a unit are clamped at the start of the next pass.
    pub fn apply_edit(&mut self, edit: &Edit) {
        match edit {
            Edit::Insert { index, .. } => {
                let index = *index;
                self.map_boundaries(|pos| {
                    if pos.unit > index || (pos.unit == index && pos.line > 0) {
                        FlowPos::new(pos.unit + 1, pos.line)
                    } else {
                        pos
                    }
                });
            }
            Edit::Remove { index } => {
                let index = *index;
                self.map_boundaries(|pos| {
                    if pos.unit > index {
                        FlowPos::new(pos.unit - 1, pos.line)
                    } else if pos.unit == index {
                        FlowPos::before(index)
                    } else {
                        pos
                    }
                });
            }
            Edit::Replace { .. } | Edit::AppendText { .. } | Edit::SetGeometry { .. } => {}
        }
    }

    fn map_boundaries<F: Fn(FlowPos) -> FlowPos>(&mut self, f: F) {
        for page in &mut self.pages {
            if page.start != FlowPos::START {
                page.start = f(page.start);
            }
            page.end = f(page.end);
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}
