//! Reference reflow engine.
//!
//! The engine keeps the current page assignment and, on every pass, walks
//! the pages applying one local operation at a time until none applies:
//!
//! 1. fold empty or blank pages into a neighbour (`mergeWhitespace`)
//! 2. cut at an explicit page break inside the page (`split`)
//! 3. cut an overflowing page at the furthest breakpoint that fits (`split`)
//! 4. merge with the next page when both fit (`join`)
//! 5. pull the rest of a broken paragraph back (`mergeContinuation`)
//! 6. pull the next page's leading unit up (`pullup`)
//!
//! After each operation the walk resumes one page back, since the previous
//! page may now be able to pull content up.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use super::measure::{EstimatingMeasurer, MeasuredFlow, Measurer};
use super::trace::{TraceKind, TraceRecorder};
use super::{Paginator, PassSummary, ReflowOptions};
use crate::error::{Error, Result};
use crate::model::{Document, Edit, FlowPos, Layout, Page, PageGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    MergeWhitespace { into_previous: bool },
    Split { at: FlowPos },
    Join,
    MergeContinuation { to: FlowPos },
    PullUp { to: FlowPos },
}

impl Operation {
    fn kind(&self) -> TraceKind {
        match self {
            Operation::MergeWhitespace { .. } => TraceKind::MergeWhitespace,
            Operation::Split { .. } => TraceKind::Split,
            Operation::Join => TraceKind::Join,
            Operation::MergeContinuation { .. } => TraceKind::MergeContinuation,
            Operation::PullUp { .. } => TraceKind::PullUp,
        }
    }
}

/// Incremental paginator with a bounded fixed-point pass.
#[derive(Clone)]
pub struct ReflowEngine {
    geometry: PageGeometry,
    options: ReflowOptions,
    measurer: Arc<dyn Measurer>,
    layout: Layout,
}

impl fmt::Debug for ReflowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflowEngine")
            .field("geometry", &self.geometry)
            .field("options", &self.options)
            .field("pages", &self.layout.page_count())
            .finish()
    }
}

impl ReflowEngine {
    /// Create an engine for the given geometry with the estimating measurer.
    pub fn new(geometry: PageGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            options: ReflowOptions::default(),
            measurer: Arc::new(EstimatingMeasurer::default()),
            layout: Layout::new(),
        })
    }

    /// Set reflow options.
    pub fn with_options(mut self, options: ReflowOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a different measurement oracle.
    pub fn with_measurer(mut self, measurer: Arc<dyn Measurer>) -> Self {
        self.measurer = measurer;
        self
    }

    /// Current options.
    pub fn options(&self) -> &ReflowOptions {
        &self.options
    }

    /// Measure a document against the current geometry.
    pub fn measure(&self, doc: &Document) -> MeasuredFlow {
        MeasuredFlow::measure(doc, &self.geometry, self.measurer.as_ref())
    }

    /// Snap page boundaries onto the measured flow after edits.
    fn reconcile(&mut self, flow: &MeasuredFlow) {
        let end = flow.end();
        if self.layout.pages.is_empty() {
            self.layout.pages.push(Page::new(FlowPos::START, end));
            return;
        }

        let mut cursor = FlowPos::START;
        for page in &mut self.layout.pages {
            page.start = cursor;
            page.end = flow.clamp(page.end).max(cursor);
            cursor = page.end;
        }
        if let Some(last) = self.layout.pages.last_mut() {
            last.end = end;
        }
    }

    fn next_operation(
        &self,
        flow: &MeasuredFlow,
        i: usize,
        frame: f64,
        split_offsets: &[f64],
    ) -> Option<Operation> {
        let pages = &self.layout.pages;
        let page = pages[i];
        let next = pages.get(i + 1).copied();
        let (start, end) = (page.start, page.end);

        if pages.len() > 1 {
            if page.is_empty() {
                return Some(Operation::MergeWhitespace {
                    into_previous: i > 0,
                });
            }
            if flow.is_whitespace_only(start, end) {
                if i > 0 && !flow.is_hard_boundary(start) {
                    return Some(Operation::MergeWhitespace {
                        into_previous: true,
                    });
                }
                if i == 0
                    && next.is_some_and(|n| {
                        !flow.is_hard_boundary(n.start) && flow.fits(start, n.end, frame)
                    })
                {
                    return Some(Operation::MergeWhitespace {
                        into_previous: false,
                    });
                }
            }
        }

        if let Some(at) = flow.hard_boundary_within(start, end) {
            return Some(Operation::Split { at });
        }

        if !flow.fits(start, end, frame) {
            let at = flow
                .best_break(start, end, frame, &self.options, true)
                .or_else(|| flow.best_break(start, end, frame, &self.options, false))
                .or_else(|| {
                    // Trailing blanks stay with an oversized unit; split off,
                    // they would only be folded back.
                    let p = flow.next_break_after(start);
                    (p < end && !flow.is_whitespace_only(p, end)).then_some(p)
                });
            if let Some(at) = at {
                return Some(Operation::Split { at });
            }
        }

        let next = next?;
        if flow.is_hard_boundary(end) {
            return None;
        }
        let boundary = flow.offset(end);
        if split_offsets
            .iter()
            .any(|p| (p - boundary).abs() <= self.options.loop_tolerance)
        {
            debug!(
                "page {}: holding boundary at {:.1} split earlier in this pass",
                i, boundary
            );
            return None;
        }

        if flow.fits(start, next.end, frame)
            && flow.hard_boundary_within(start, next.end).is_none()
            && (next.end >= flow.end() || flow.is_valid_break(next.end, &self.options, true))
        {
            return Some(Operation::Join);
        }

        if end.line > 0 {
            let whole = FlowPos::before(end.unit + 1);
            if whole < next.end
                && flow.fits(start, whole, frame)
                && flow.is_valid_break(whole, &self.options, true)
            {
                return Some(Operation::MergeContinuation { to: whole });
            }
            return flow
                .best_break(start, whole.min(next.end), frame, &self.options, true)
                .filter(|to| *to > end)
                .map(|to| Operation::MergeContinuation { to });
        }

        let mut to = end;
        loop {
            to = FlowPos::before(to.unit + 1);
            if to >= next.end || !flow.fits(start, to, frame) {
                return None;
            }
            if flow.is_valid_break(to, &self.options, true) {
                return Some(Operation::PullUp { to });
            }
        }
    }

    /// Apply an operation to page `i`; returns the flow offset it acted on.
    fn apply(&mut self, op: Operation, flow: &MeasuredFlow, i: usize) -> f64 {
        let pages = &mut self.layout.pages;
        match op {
            Operation::MergeWhitespace { into_previous } => {
                let page = pages.remove(i);
                if into_previous {
                    pages[i - 1].end = page.end;
                } else {
                    pages[i].start = page.start;
                }
                flow.offset(page.start)
            }
            Operation::Split { at } => {
                let old_end = pages[i].end;
                pages[i].end = at;
                if i + 1 < pages.len() && !flow.is_hard_boundary(old_end) {
                    pages[i + 1].start = at;
                } else {
                    pages.insert(i + 1, Page::new(at, old_end));
                }
                flow.offset(at)
            }
            Operation::Join => {
                let next = pages.remove(i + 1);
                let boundary = pages[i].end;
                pages[i].end = next.end;
                flow.offset(boundary)
            }
            Operation::MergeContinuation { to } | Operation::PullUp { to } => {
                let boundary = pages[i].end;
                pages[i].end = to;
                pages[i + 1].start = to;
                flow.offset(boundary)
            }
        }
    }

    fn summarize(&self, flow: &MeasuredFlow, operations: usize) -> PassSummary {
        let frame = self.geometry.content_height();
        let overflow_pages = self
            .layout
            .pages
            .iter()
            .filter(|p| !flow.fits(p.start, p.end, frame))
            .count();
        if overflow_pages > 0 && operations > 0 {
            warn!(
                "{} page(s) hold a unit taller than the {:.1}pt content frame",
                overflow_pages, frame
            );
        }

        PassSummary {
            operations,
            page_count: self.layout.page_count(),
            measured_height: flow.total_height(),
            frame_height: frame,
            frame_width: self.geometry.content_width(),
            max_width: flow.max_width(),
            overflow_pages,
        }
    }
}

impl Paginator for ReflowEngine {
    fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    fn set_geometry(&mut self, geometry: PageGeometry) -> Result<()> {
        geometry.validate()?;
        self.geometry = geometry;
        Ok(())
    }

    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn notify_edit(&mut self, edit: &Edit) {
        self.layout.apply_edit(edit);
    }

    fn reflow(&mut self, doc: &Document, recorder: &mut TraceRecorder) -> Result<PassSummary> {
        let flow = self.measure(doc);
        let frame = self.geometry.content_height();
        let limit = self.options.operation_limit(flow.len());
        let last_good = self.layout.clone();
        self.reconcile(&flow);

        let mut operations = 0usize;
        let mut split_offsets = Vec::new();
        let mut i = 0usize;
        while i < self.layout.pages.len() {
            let Some(op) = self.next_operation(&flow, i, frame, &split_offsets) else {
                i += 1;
                continue;
            };
            if operations >= limit {
                warn!(
                    "reflow pass aborted after {} operations; keeping previous layout",
                    operations
                );
                self.layout = last_good;
                return Err(Error::ReflowDiverged { operations, limit });
            }

            let pos = self.apply(op, &flow, i);
            if let Operation::Split { .. } = op {
                split_offsets.push(pos);
            }
            recorder.record(op.kind(), pos, i);
            operations += 1;
            i = i.saturating_sub(1);
        }

        debug!(
            "reflow pass: {} operations, {} pages",
            operations,
            self.layout.page_count()
        );
        Ok(self.summarize(&flow, operations))
    }
}
