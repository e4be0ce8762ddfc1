//! Stability analysis of pagination sessions.
//!
//! [`analyze`] classifies a [`Report`] as stable or thrashing. It is a pure
//! function: the same report and options always give the same
//! [`Analysis`], and malformed or missing fields never make it fail.
//!
//! # Example
//!
//! ```
//! use pagereflow::analyze::{analyze, AnalyzeOptions};
//! use pagereflow::report::Report;
//!
//! let report = Report::from_json(r#"{"samples": [], "trace": []}"#).unwrap();
//! let analysis = analyze(&report, &AnalyzeOptions::default());
//! assert!(!analysis.ok);
//! assert_eq!(analysis.reasons[0], "no samples in debug report");
//! ```

mod options;
mod summary;

pub use options::{
    AnalyzeOptions, ENV_ALIAS_PREFIX, ENV_MAX_CHANGES, ENV_MAX_RANGE, ENV_MAX_SCROLL_RATIO, ENV_MIN_PAGE_COUNT,
    ENV_WARMUP_RATIO,
};
pub use summary::{to_json, to_text, JsonFormat};

use crate::reflow::{TraceKind, SAME_BOUNDARY_TOLERANCE};
use crate::report::{Report, Sample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use summary::fmt_num;

/// Scroll ratio above which overflow is reported regardless of options.
pub const OVERFLOW_HARD_LIMIT: f64 = 1.02;

/// Page count statistics over the stable window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageCountStats {
    /// Smallest page count
    pub min: f64,
    /// Largest page count
    pub max: f64,
    /// `max - min`
    pub range: f64,
    /// Adjacent samples with different counts
    pub changes: usize,
}

impl PageCountStats {
    fn from_series(series: &[f64]) -> Self {
        if series.is_empty() {
            return Self::default();
        }
        let min = series.iter().copied().fold(f64::INFINITY, f64::min);
        let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let changes = series.windows(2).filter(|w| w[0] != w[1]).count();
        Self {
            min,
            max,
            range: max - min,
            changes,
        }
    }
}

/// Operation counts from the trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    /// `split` events
    pub split: usize,
    /// `join` events
    pub join: usize,
    /// `pullup` events
    pub pullup: usize,
    /// `mergeContinuation` and `mergeWhitespace` events
    pub merge: usize,
    /// All well-formed events
    pub total: usize,
    /// `split` immediately undone by a `join` at the same boundary
    pub loops: usize,
}

impl TraceStats {
    fn from_report(report: &Report) -> Self {
        let mut stats = Self {
            total: report.trace.len(),
            ..Self::default()
        };
        for event in &report.trace {
            match event.event {
                TraceKind::Split => stats.split += 1,
                TraceKind::Join => stats.join += 1,
                TraceKind::PullUp => stats.pullup += 1,
                ref kind if kind.is_merge() => stats.merge += 1,
                _ => {}
            }
        }

        stats.loops = report
            .trace
            .windows(2)
            .filter(|pair| {
                let (prev, curr) = (&pair[0], &pair[1]);
                if prev.event != TraceKind::Split || curr.event != TraceKind::Join {
                    return false;
                }
                match (prev.finite_pos(), curr.finite_pos()) {
                    (Some(a), Some(b)) => (a - b).abs() <= SAME_BOUNDARY_TOLERANCE,
                    _ => false,
                }
            })
            .count();
        stats
    }
}

/// Verdict and statistics for one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// True when no threshold was violated
    pub ok: bool,

    /// Leading samples discarded
    pub warmup: usize,

    /// Total samples
    pub samples: usize,

    /// Samples after warmup
    pub stable_samples: usize,

    /// Page count statistics
    pub page_count: PageCountStats,

    /// Peak scroll ratio over the stable window
    pub max_scroll_ratio: Option<f64>,

    /// Horizontal overflow observed in the stable window
    pub overflow_active: bool,

    /// Trace operation counts
    pub trace: TraceStats,

    /// One message per violated threshold
    pub reasons: Vec<String>,
}

/// Number of leading samples treated as warmup.
pub fn warmup_len(samples: usize, ratio: f64) -> usize {
    if samples <= 3 {
        return 0;
    }
    // NaN and negative ratios floor to 0 here, then the max(1) applies.
    let n = (samples as f64 * ratio).floor() as usize;
    n.max(1).min(samples)
}

fn positive_counts<'a, I>(samples: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Sample>,
{
    samples
        .into_iter()
        .map(Sample::page_count)
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect()
}

/// Classify a report against `options`.
pub fn analyze(report: &Report, options: &AnalyzeOptions) -> Analysis {
    let samples = report.samples.len();
    let warmup = warmup_len(samples, options.warmup_ratio);
    let stable = &report.samples[warmup..];

    let mut series = positive_counts(stable);
    if series.is_empty() {
        series = positive_counts(&report.samples);
    }
    let page_count = PageCountStats::from_series(&series);

    let max_scroll_ratio = stable
        .iter()
        .filter_map(|s| s.max_scroll_ratio)
        .filter(|r| r.is_finite())
        .fold(None, |peak: Option<f64>, r| Some(peak.map_or(r, |p| p.max(r))));
    let overflow_active = stable.iter().any(|s| s.overflow_active == Some(true))
        || max_scroll_ratio.is_some_and(|r| r > OVERFLOW_HARD_LIMIT);

    let trace = TraceStats::from_report(report);

    let mut reasons = Vec::new();
    if samples == 0 {
        reasons.push("no samples in debug report".to_string());
    }
    if page_count.max <= options.min_page_count {
        reasons.push(format!(
            "max page count {} is not above {}",
            fmt_num(page_count.max),
            fmt_num(options.min_page_count)
        ));
    }
    if page_count.range > options.max_range {
        reasons.push(format!(
            "page count range {} exceeds {}",
            fmt_num(page_count.range),
            fmt_num(options.max_range)
        ));
    }
    if page_count.changes > options.max_changes {
        reasons.push(format!(
            "page count changed {} times (max {})",
            page_count.changes, options.max_changes
        ));
    }
    if let Some(peak) = max_scroll_ratio.filter(|p| *p > options.max_scroll_ratio) {
        reasons.push(format!(
            "max scroll ratio {} exceeds {}",
            fmt_num(peak),
            fmt_num(options.max_scroll_ratio)
        ));
    }
    if overflow_active {
        reasons.push("horizontal overflow detected".to_string());
    }
    if trace.loops > 0 {
        reasons.push(format!("split/join loops detected: {}", trace.loops));
    }

    Analysis {
        ok: reasons.is_empty(),
        warmup,
        samples,
        stable_samples: stable.len(),
        page_count,
        max_scroll_ratio,
        overflow_active,
        trace,
        reasons,
    }
}

/// Analyze several reports in parallel; results keep input order.
pub fn analyze_all(reports: &[Report], options: &AnalyzeOptions) -> Vec<Analysis> {
    reports
        .par_iter()
        .map(|report| analyze(report, options))
        .collect()
}
