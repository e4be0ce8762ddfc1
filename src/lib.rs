//! # pagereflow
//!
//! Pagination reflow for continuously edited documents, with the tooling to
//! prove it does not thrash.
//!
//! The crate has two halves:
//!
//! - a pagination engine ([`reflow`]) that re-lays a flowing [`Document`]
//!   into fixed-height pages through `split`, `join`, `pullup` and merge
//!   operations, recording each one in a trace;
//! - a verification pipeline: a [`session`] sampler that observes a live
//!   layout, a pure stability [`analyze`]r, and an oscillation [`guard`]
//!   that runs a host session end to end and gates on the result.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagereflow::{analyze_file, AnalyzeOptions};
//!
//! fn main() -> pagereflow::Result<()> {
//!     let analysis = analyze_file(
//!         "target/pagination-debug-report.json",
//!         &AnalyzeOptions::from_env(),
//!     )?;
//!     print!("{}", pagereflow::analyze::to_text(&analysis));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bounded reflow**: every pass converges or is rolled back
//! - **Widow/orphan control** and keep-with-next headings
//! - **Read-only sampling** on a separate thread
//! - **Lenient report parsing**: sparse or malformed fields never crash
//! - **Parallel analysis** of many reports with Rayon

pub mod analyze;
pub mod error;
pub mod guard;
pub mod model;
pub mod reflow;
pub mod report;
pub mod session;

// Re-export commonly used types
pub use analyze::{analyze, analyze_all, Analysis, AnalyzeOptions, JsonFormat};
pub use error::{Error, Result};
pub use guard::{GuardConfig, GuardOutcome, HostStatus};
pub use model::{Document, Edit, FlowPos, FlowUnit, Layout, Page, PageGeometry};
pub use reflow::{
    EstimatingMeasurer, Measurer, Paginator, PassSummary, ReflowEngine, ReflowOptions,
    TraceEvent, TraceKind, TraceRecorder,
};
pub use report::{Report, Sample};
pub use session::{EditScript, LayoutSnapshot, Sampler, ScriptRun, Session};

use std::path::Path;

/// Read a report file and analyze it.
///
/// # Example
///
/// ```no_run
/// use pagereflow::{analyze_file, AnalyzeOptions};
///
/// let analysis = analyze_file("report.json", &AnalyzeOptions::default()).unwrap();
/// println!("stable: {}", analysis.ok);
/// ```
pub fn analyze_file<P: AsRef<Path>>(path: P, options: &AnalyzeOptions) -> Result<Analysis> {
    let report = Report::from_path(path)?;
    Ok(analyze(&report, options))
}

/// Lay a document out once with the reference engine.
///
/// # Example
///
/// ```
/// use pagereflow::{paginate, Document, FlowUnit, PageGeometry};
///
/// let doc = Document::from_units(vec![FlowUnit::paragraph("Hello")]);
/// let layout = paginate(&doc, PageGeometry::a4()).unwrap();
/// assert_eq!(layout.page_count(), 1);
/// ```
pub fn paginate(doc: &Document, geometry: PageGeometry) -> Result<Layout> {
    let mut engine = ReflowEngine::new(geometry)?;
    engine.reflow(doc, &mut TraceRecorder::new())?;
    Ok(engine.layout().clone())
}

/// Load a document file and lay it out with the reference engine.
pub fn paginate_file<P: AsRef<Path>>(path: P, geometry: PageGeometry) -> Result<Layout> {
    let doc = Document::from_path(path)?;
    paginate(&doc, geometry)
}

/// Replay an edit script against a document and return the session report.
///
/// # Example
///
/// ```no_run
/// use pagereflow::{simulate_files, PageGeometry};
///
/// let run = simulate_files("doc.json", "script.json", PageGeometry::letter()).unwrap();
/// run.report.write_to("target/report.json").unwrap();
/// ```
pub fn simulate_files<P, Q>(doc_path: P, script_path: Q, geometry: PageGeometry) -> Result<ScriptRun>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let doc = Document::from_path(doc_path)?;
    let script = EditScript::from_path(script_path)?;
    let mut session = Session::with_engine(doc, geometry)?;
    session.run_script(&script)
}
