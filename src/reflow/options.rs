//! Reflow engine options.

use super::trace::SAME_BOUNDARY_TOLERANCE;

/// Options controlling the reference reflow policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflowOptions {
    /// Minimum lines of a paragraph left at the bottom of a page
    pub orphans: u32,

    /// Minimum lines of a paragraph carried to the top of a page
    pub widows: u32,

    /// Never end a page right after a heading when avoidable
    pub keep_headings_with_next: bool,

    /// Operation ceiling per pass (None = scale with document size)
    pub max_operations: Option<usize>,

    /// Boundaries closer than this are treated as the same boundary
    pub loop_tolerance: f64,
}

impl ReflowOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set orphan and widow control.
    pub fn with_widow_control(mut self, orphans: u32, widows: u32) -> Self {
        self.orphans = orphans;
        self.widows = widows;
        self
    }

    /// Disable orphan and widow control.
    pub fn without_widow_control(self) -> Self {
        self.with_widow_control(0, 0)
    }

    /// Enable or disable keep-with-next for headings.
    pub fn with_keep_headings(mut self, keep: bool) -> Self {
        self.keep_headings_with_next = keep;
        self
    }

    /// Set a fixed operation ceiling per pass.
    pub fn with_max_operations(mut self, limit: usize) -> Self {
        self.max_operations = Some(limit);
        self
    }

    /// Operation ceiling for a flow of `units` units.
    pub fn operation_limit(&self, units: usize) -> usize {
        self.max_operations
            .unwrap_or_else(|| 4096usize.max(units.saturating_mul(8)))
    }
}

impl Default for ReflowOptions {
    fn default() -> Self {
        Self {
            orphans: 2,
            widows: 2,
            keep_headings_with_next: true,
            max_operations: None,
            loop_tolerance: SAME_BOUNDARY_TOLERANCE,
        }
    }
}
