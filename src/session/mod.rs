//! Live editing sessions.
//!
//! A [`Session`] owns a document and a paginator. Every edit mutates the
//! document, runs a reflow pass on the caller's thread, and publishes a
//! [`LayoutSnapshot`] through a shared [`LayoutView`]. A [`Sampler`] reads
//! that view on its own cadence to build a [`Report`].
//!
//! # Example
//!
//! ```
//! use pagereflow::model::{Document, Edit, FlowUnit, PageGeometry};
//! use pagereflow::session::{EditScript, Session};
//!
//! fn main() -> pagereflow::Result<()> {
//!     let doc = Document::from_units(vec![FlowUnit::paragraph("Hello")]);
//!     let mut session = Session::with_engine(doc, PageGeometry::letter())?;
//!
//!     let script = EditScript::new(vec![Edit::AppendText {
//!         index: 0,
//!         text: ", world".into(),
//!     }]);
//!     let run = session.run_script(&script)?;
//!     assert!(!run.report.samples.is_empty());
//!     Ok(())
//! }
//! ```

mod sampler;
mod script;

pub use sampler::{Sampler, SamplerHandle};
pub use script::EditScript;

use crate::error::{Error, Result};
use crate::model::{Document, Edit, Layout, PageGeometry};
use crate::reflow::{Paginator, PassSummary, ReflowEngine, TraceEvent, TraceRecorder};
use crate::report::{Report, Sample};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;

/// What a sampler can observe about the current layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    /// Pages in the current layout
    pub page_count: usize,

    /// Pages implied by total content height
    pub estimated_pages: usize,

    /// Widest unit relative to the content width
    pub width_ratio: f64,

    /// A page overflows its frame, or content is wider than the frame
    pub overflow: bool,

    /// Completed reflow passes
    pub passes: u64,
}

impl LayoutSnapshot {
    /// Snapshot after a pass.
    pub fn from_summary(summary: &PassSummary, passes: u64) -> Self {
        let width_ratio = summary.width_ratio();
        Self {
            page_count: summary.page_count,
            estimated_pages: summary.estimated_pages(),
            width_ratio,
            overflow: summary.overflow_pages > 0 || width_ratio > 1.0 + 1e-6,
            passes,
        }
    }
}

/// Shared, read-only handle to the latest snapshot.
#[derive(Debug, Clone, Default)]
pub struct LayoutView(Arc<RwLock<LayoutSnapshot>>);

impl LayoutView {
    /// Latest published snapshot.
    pub fn read(&self) -> LayoutSnapshot {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, snapshot: LayoutSnapshot) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}

/// Result of replaying an edit script.
#[derive(Debug, Clone)]
pub struct ScriptRun {
    /// Samples and trace collected during the run
    pub report: Report,

    /// Passes aborted for not converging
    pub diverged_passes: usize,
}

/// A document being edited, with its paginator and trace.
pub struct Session {
    document: Document,
    paginator: Box<dyn Paginator>,
    recorder: TraceRecorder,
    view: LayoutView,
    passes: u64,
}

impl Session {
    /// Start a session and lay the document out once.
    pub fn new(document: Document, paginator: Box<dyn Paginator>) -> Result<Self> {
        let mut session = Self {
            document,
            paginator,
            recorder: TraceRecorder::new(),
            view: LayoutView::default(),
            passes: 0,
        };
        session.reflow()?;
        Ok(session)
    }

    /// Start a session using the reference engine.
    pub fn with_engine(document: Document, geometry: PageGeometry) -> Result<Self> {
        Self::new(document, Box::new(ReflowEngine::new(geometry)?))
    }

    /// Apply one edit and reflow.
    pub fn apply(&mut self, edit: &Edit) -> Result<PassSummary> {
        match edit {
            Edit::SetGeometry { geometry } => self.paginator.set_geometry(*geometry)?,
            _ => {
                self.document.apply(edit)?;
                self.paginator.notify_edit(edit);
            }
        }
        self.reflow()
    }

    /// Run a reflow pass and publish the result.
    pub fn reflow(&mut self) -> Result<PassSummary> {
        let summary = self.paginator.reflow(&self.document, &mut self.recorder)?;
        self.passes += 1;
        self.view
            .publish(LayoutSnapshot::from_summary(&summary, self.passes));
        Ok(summary)
    }

    /// Replay a script with a live sampler.
    pub fn run_script(&mut self, script: &EditScript) -> Result<ScriptRun> {
        self.run_script_with(script, |_| {})
    }

    /// Replay a script, calling `on_step` after each step.
    ///
    /// A step whose pass does not converge is counted and the run goes on
    /// with the previous layout. Any other error ends the run.
    pub fn run_script_with<F>(&mut self, script: &EditScript, mut on_step: F) -> Result<ScriptRun>
    where
        F: FnMut(usize),
    {
        if let Some(geometry) = script.geometry {
            self.apply(&Edit::SetGeometry { geometry })?;
        }

        let sampler = Sampler::spawn(self.view.clone(), script.sample_interval())?;
        let mut diverged_passes = 0;
        for (i, edit) in script.steps.iter().enumerate() {
            if i > 0 && !script.interval().is_zero() {
                thread::sleep(script.interval());
            }
            match self.apply(edit) {
                Ok(_) => {}
                Err(Error::ReflowDiverged { .. }) => diverged_passes += 1,
                Err(e) => {
                    sampler.stop();
                    return Err(e);
                }
            }
            on_step(i);
        }
        if !script.settle().is_zero() {
            thread::sleep(script.settle());
        }

        let mut samples = sampler.stop();
        samples.push(self.sample_now());
        log::debug!(
            "script finished: {} steps, {} samples, {} trace events",
            script.steps.len(),
            samples.len(),
            self.recorder.len()
        );

        Ok(ScriptRun {
            report: Report::new(samples, self.recorder.events().to_vec()),
            diverged_passes,
        })
    }

    /// Capture a sample of the current layout.
    pub fn sample_now(&self) -> Sample {
        Sampler::capture(&self.view.read())
    }

    /// A handle for observing this session from another thread.
    pub fn view(&self) -> LayoutView {
        self.view.clone()
    }

    /// Current document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Current page assignment.
    pub fn layout(&self) -> &Layout {
        self.paginator.layout()
    }

    /// Current page geometry.
    pub fn geometry(&self) -> &PageGeometry {
        self.paginator.geometry()
    }

    /// Trace recorded so far.
    pub fn trace(&self) -> &[TraceEvent] {
        self.recorder.events()
    }
}
