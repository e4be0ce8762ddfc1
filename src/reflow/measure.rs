//! Height measurement for flow units.
//!
//! The engine never measures text itself. It asks a [`Measurer`] for the
//! metrics of each unit once per pass and works on the resulting
//! [`MeasuredFlow`].

use crate::model::{Document, FlowPos, FlowUnit, PageGeometry};
use crate::reflow::ReflowOptions;

/// Tolerance for height comparisons.
pub(crate) const EPSILON: f64 = 1e-6;

/// Measured size of one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitMetrics {
    /// Number of lines (1 for blocks)
    pub lines: u32,
    /// Height of each line
    pub line_height: f64,
    /// Horizontal extent
    pub width: f64,
    /// Whether the unit may break between lines
    pub splittable: bool,
}

impl UnitMetrics {
    /// An unbreakable block.
    pub fn block(height: f64, width: f64) -> Self {
        Self {
            lines: 1,
            line_height: sanitize(height),
            width: sanitize(width),
            splittable: false,
        }
    }

    /// Breakable lines of text.
    pub fn lines(lines: u32, line_height: f64, width: f64) -> Self {
        Self {
            lines: lines.max(1),
            line_height: sanitize(line_height),
            width: sanitize(width),
            splittable: true,
        }
    }

    /// Total height.
    pub fn height(&self) -> f64 {
        self.lines as f64 * self.line_height
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

/// Measurement oracle for flow units.
pub trait Measurer: Send + Sync {
    /// Measure a unit laid out in the content frame of `geometry`.
    fn measure(&self, unit: &FlowUnit, geometry: &PageGeometry) -> UnitMetrics;
}

/// Estimates heights from text length and average glyph width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatingMeasurer {
    /// Body font size in points
    pub font_size: f64,
    /// Line height as a multiple of font size
    pub line_spacing: f64,
    /// Average glyph advance as a fraction of font size
    pub glyph_width: f64,
}

impl EstimatingMeasurer {
    /// Create a measurer with defaults (11pt, 1.25 spacing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Body line height.
    pub fn line_height(&self) -> f64 {
        self.font_size * self.line_spacing
    }

    fn heading_scale(level: u8) -> f64 {
        match level {
            1 => 2.0,
            2 => 1.6,
            3 => 1.35,
            4 => 1.2,
            5 => 1.1,
            _ => 1.0,
        }
    }

    fn text_lines(&self, text: &str, font_size: f64, frame_width: f64) -> u32 {
        let chars = text.chars().count() as f64;
        let per_line = (frame_width / (font_size * self.glyph_width)).floor().max(1.0);
        (chars / per_line).ceil().max(1.0) as u32
    }
}

impl Default for EstimatingMeasurer {
    fn default() -> Self {
        Self {
            font_size: 11.0,
            line_spacing: 1.25,
            glyph_width: 0.5,
        }
    }
}

impl Measurer for EstimatingMeasurer {
    fn measure(&self, unit: &FlowUnit, geometry: &PageGeometry) -> UnitMetrics {
        let frame_width = geometry.content_width();
        match unit {
            FlowUnit::Paragraph { text } => UnitMetrics::lines(
                self.text_lines(text, self.font_size, frame_width),
                self.line_height(),
                frame_width,
            ),
            FlowUnit::Heading { text, level } => {
                let size = self.font_size * Self::heading_scale(*level);
                let lines = self.text_lines(text, size, frame_width);
                UnitMetrics::block(lines as f64 * size * self.line_spacing, frame_width)
            }
            FlowUnit::Table { height, width } | FlowUnit::Image { height, width } => {
                UnitMetrics::block(*height, width.unwrap_or(frame_width))
            }
            FlowUnit::Whitespace { lines } => {
                UnitMetrics::block(*lines as f64 * self.line_height(), 0.0)
            }
            FlowUnit::PageBreak => UnitMetrics::block(0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Text,
    Heading,
    Block,
    Whitespace,
    Break,
}

impl Role {
    fn of(unit: &FlowUnit) -> Self {
        match unit {
            FlowUnit::Paragraph { .. } => Role::Text,
            FlowUnit::Heading { .. } => Role::Heading,
            FlowUnit::Table { .. } | FlowUnit::Image { .. } => Role::Block,
            FlowUnit::Whitespace { .. } => Role::Whitespace,
            FlowUnit::PageBreak => Role::Break,
        }
    }
}

/// A document measured against one geometry, with prefix offsets.
#[derive(Debug, Clone)]
pub struct MeasuredFlow {
    metrics: Vec<UnitMetrics>,
    roles: Vec<Role>,
    offsets: Vec<f64>,
}

impl MeasuredFlow {
    /// Measure every unit of `doc`.
    pub fn measure(doc: &Document, geometry: &PageGeometry, measurer: &dyn Measurer) -> Self {
        let metrics: Vec<UnitMetrics> = doc
            .units
            .iter()
            .map(|u| measurer.measure(u, geometry))
            .collect();
        let roles = doc.units.iter().map(Role::of).collect();

        let mut offsets = Vec::with_capacity(metrics.len() + 1);
        let mut acc = 0.0;
        offsets.push(acc);
        for m in &metrics {
            acc += m.height();
            offsets.push(acc);
        }

        Self {
            metrics,
            roles,
            offsets,
        }
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Check if the flow has no units.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// End of the flow.
    pub fn end(&self) -> FlowPos {
        FlowPos::before(self.len())
    }

    /// Metrics of a unit.
    pub fn metrics(&self, unit: usize) -> Option<&UnitMetrics> {
        self.metrics.get(unit)
    }

    /// Total flow height.
    pub fn total_height(&self) -> f64 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Widest unit.
    pub fn max_width(&self) -> f64 {
        self.metrics.iter().map(|m| m.width).fold(0.0, f64::max)
    }

    /// Flow offset of a position.
    pub fn offset(&self, pos: FlowPos) -> f64 {
        let pos = self.clamp(pos);
        let base = self.offsets[pos.unit];
        match self.metrics.get(pos.unit) {
            Some(m) => base + pos.line as f64 * m.line_height,
            None => base,
        }
    }

    /// Snap a position onto the flow.
    pub fn clamp(&self, pos: FlowPos) -> FlowPos {
        if pos.unit >= self.len() {
            return self.end();
        }
        if pos.line == 0 {
            return pos;
        }
        let m = &self.metrics[pos.unit];
        if !m.splittable || pos.line >= m.lines {
            FlowPos::before(pos.unit + 1)
        } else {
            pos
        }
    }

    /// Check if a page must start at `pos` (right after a page break).
    pub fn is_hard_boundary(&self, pos: FlowPos) -> bool {
        pos.line == 0
            && pos.unit > 0
            && pos.unit <= self.len()
            && self.roles[pos.unit - 1] == Role::Break
    }

    /// Content height of `[start, end)`, ignoring trailing blank units.
    pub fn content_height(&self, start: FlowPos, end: FlowPos) -> f64 {
        let mut end = self.clamp(end);
        while end.line == 0 && end > start && self.roles[end.unit - 1] == Role::Whitespace {
            end = FlowPos::before(end.unit - 1);
        }
        if end <= start {
            return 0.0;
        }
        self.offset(end) - self.offset(start)
    }

    /// Check if `[start, end)` fits in a frame of height `frame`.
    pub fn fits(&self, start: FlowPos, end: FlowPos, frame: f64) -> bool {
        self.content_height(start, end) <= frame + EPSILON
    }

    /// Check if `[start, end)` holds only blank units.
    pub fn is_whitespace_only(&self, start: FlowPos, end: FlowPos) -> bool {
        if start >= end {
            return false;
        }
        let last = if end.line == 0 { end.unit - 1 } else { end.unit };
        (start.unit..=last.min(self.len().saturating_sub(1)))
            .all(|u| self.roles[u] == Role::Whitespace)
    }

    /// First hard boundary strictly inside `(start, end)`.
    pub fn hard_boundary_within(&self, start: FlowPos, end: FlowPos) -> Option<FlowPos> {
        (start.unit..end.unit.min(self.len()))
            .filter(|&u| self.roles[u] == Role::Break)
            .map(|u| FlowPos::before(u + 1))
            .find(|p| *p > start && *p < end)
    }

    /// Check if a page may end at `pos`.
    ///
    /// With `strict`, breaks right after a heading and breaks that leave
    /// fewer than `orphans`/`widows` lines of a paragraph are rejected.
    pub fn is_valid_break(&self, pos: FlowPos, options: &ReflowOptions, strict: bool) -> bool {
        if pos.unit >= self.len() || pos == FlowPos::START {
            return false;
        }
        if pos.line == 0 {
            if self.is_hard_boundary(pos) {
                return true;
            }
            return !(strict
                && options.keep_headings_with_next
                && self.roles[pos.unit - 1] == Role::Heading);
        }
        let m = &self.metrics[pos.unit];
        if !m.splittable || pos.line >= m.lines {
            return false;
        }
        !strict || (pos.line >= options.orphans && m.lines - pos.line >= options.widows)
    }

    /// The furthest valid break in `(start, end)` such that `[start, break)`
    /// fits in `frame`.
    pub fn best_break(
        &self,
        start: FlowPos,
        end: FlowPos,
        frame: f64,
        options: &ReflowOptions,
        strict: bool,
    ) -> Option<FlowPos> {
        let limit = self.offset(start) + frame + EPSILON;
        let mut best = None;

        let last = end.unit.saturating_add(1).min(self.len());
        for u in start.unit..last {
            let m = &self.metrics[u];
            if m.splittable && m.line_height > 0.0 {
                let lo = if u == start.unit { start.line + 1 } else { 1 };
                let room = ((limit - self.offsets[u]) / m.line_height).floor();
                let mut hi = if room < 0.0 {
                    0
                } else {
                    (room as u64).min(m.lines.saturating_sub(1) as u64) as u32
                };
                if u == end.unit {
                    hi = hi.min(end.line.saturating_sub(1));
                }
                let mut line = hi;
                while line >= lo && line > 0 {
                    let pos = FlowPos::new(u, line);
                    if self.is_valid_break(pos, options, strict) {
                        best = Some(pos);
                        break;
                    }
                    line -= 1;
                }
            }

            let boundary = FlowPos::before(u + 1);
            if boundary >= end {
                break;
            }
            if boundary > start {
                if self.fits(start, boundary, frame) {
                    if self.is_valid_break(boundary, options, strict) {
                        best = Some(boundary);
                    }
                } else if self.roles[u] != Role::Whitespace {
                    break;
                }
            }
        }
        best
    }

    /// The first position after `start` at which any page could end.
    pub fn next_break_after(&self, start: FlowPos) -> FlowPos {
        match self.metrics.get(start.unit) {
            Some(m) if m.splittable && start.line + 1 < m.lines => {
                FlowPos::new(start.unit, start.line + 1)
            }
            Some(_) => FlowPos::before(start.unit + 1),
            None => self.end(),
        }
    }
}
