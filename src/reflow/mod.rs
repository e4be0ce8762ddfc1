//! Pagination of flowing content into fixed-height pages.
//!
//! The [`Paginator`] trait is the engine contract: given a document and page
//! geometry it maintains a [`Layout`] whose pages partition the flow, and
//! records every operation it performs into a [`TraceRecorder`].
//!
//! A pass must terminate within a bounded number of operations, must not
//! alternate `split`/`join` at the same boundary, and must emit nothing when
//! the document has not changed since the previous pass. A pass that fails
//! to converge returns [`Error::ReflowDiverged`](crate::Error::ReflowDiverged)
//! and leaves the previous layout in place.
//!
//! # Example
//!
//! ```
//! use pagereflow::model::{Document, FlowUnit, PageGeometry};
//! use pagereflow::reflow::{Paginator, ReflowEngine, TraceRecorder};
//!
//! fn main() -> pagereflow::Result<()> {
//!     let doc = Document::from_units(vec![
//!         FlowUnit::heading("Intro", 1),
//!         FlowUnit::paragraph("Lorem ipsum dolor sit amet."),
//!     ]);
//!
//!     let mut engine = ReflowEngine::new(PageGeometry::letter())?;
//!     let mut recorder = TraceRecorder::new();
//!     let summary = engine.reflow(&doc, &mut recorder)?;
//!     assert_eq!(summary.page_count, 1);
//!     Ok(())
//! }
//! ```

mod engine;
mod measure;
mod options;
mod trace;

pub use engine::ReflowEngine;
pub use measure::{EstimatingMeasurer, MeasuredFlow, Measurer, UnitMetrics};
pub use options::ReflowOptions;
pub use trace::{TraceEvent, TraceKind, TraceRecorder, SAME_BOUNDARY_TOLERANCE};

use crate::error::Result;
use crate::model::{Document, Edit, Layout, PageGeometry};
use serde::Serialize;

/// Outcome of one reflow pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    /// Operations performed (0 for an idempotent pass)
    pub operations: usize,

    /// Pages after the pass
    pub page_count: usize,

    /// Height of the whole flow
    pub measured_height: f64,

    /// Content-frame height
    pub frame_height: f64,

    /// Content-frame width
    pub frame_width: f64,

    /// Widest unit in the flow
    pub max_width: f64,

    /// Pages holding more than fits in the content frame
    pub overflow_pages: usize,
}

impl PassSummary {
    /// Page count implied by total height alone.
    pub fn estimated_pages(&self) -> usize {
        if self.frame_height <= 0.0 || self.measured_height <= 0.0 {
            return 1;
        }
        ((self.measured_height / self.frame_height).ceil() as usize).max(1)
    }

    /// Widest unit relative to the content width.
    pub fn width_ratio(&self) -> f64 {
        if self.frame_width > 0.0 {
            self.max_width / self.frame_width
        } else {
            1.0
        }
    }
}

/// A pagination engine.
pub trait Paginator: Send {
    /// Current page geometry.
    fn geometry(&self) -> &PageGeometry;

    /// Change the page geometry; takes effect on the next pass.
    fn set_geometry(&mut self, geometry: PageGeometry) -> Result<()>;

    /// Current page assignment.
    fn layout(&self) -> &Layout;

    /// Inform the engine of a structural edit already applied to the document.
    fn notify_edit(&mut self, edit: &Edit);

    /// Run one pass over `doc`, recording operations into `recorder`.
    fn reflow(&mut self, doc: &Document, recorder: &mut TraceRecorder) -> Result<PassSummary>;
}
