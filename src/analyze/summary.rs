//! Rendering of analysis results.

use super::Analysis;
use crate::error::Result;
use std::fmt::Write;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert an analysis to JSON.
pub fn to_json(analysis: &Analysis, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(analysis)?,
        JsonFormat::Compact => serde_json::to_string(analysis)?,
    };
    Ok(json)
}

/// Human-readable summary of an analysis.
pub fn to_text(analysis: &Analysis) -> String {
    let mut out = String::new();
    let status = if analysis.ok { "OK" } else { "FAILED" };
    let pc = &analysis.page_count;
    let trace = &analysis.trace;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Pagination stability: {}", status);
    let _ = writeln!(
        out,
        "  samples:      {} (warmup {}, stable {})",
        analysis.samples, analysis.warmup, analysis.stable_samples
    );
    let _ = writeln!(
        out,
        "  page count:   min {}, max {}, range {}, changes {}",
        fmt_num(pc.min),
        fmt_num(pc.max),
        fmt_num(pc.range),
        pc.changes
    );
    let ratio = analysis
        .max_scroll_ratio
        .map(fmt_num)
        .unwrap_or_else(|| "n/a".to_string());
    let _ = writeln!(
        out,
        "  scroll ratio: {} (overflow {})",
        ratio,
        if analysis.overflow_active { "yes" } else { "no" }
    );
    let _ = writeln!(
        out,
        "  trace:        split {}, join {}, pullup {}, merge {}, total {}, loops {}",
        trace.split, trace.join, trace.pullup, trace.merge, trace.total, trace.loops
    );

    if !analysis.reasons.is_empty() {
        let _ = writeln!(out, "  reasons:");
        for reason in &analysis.reasons {
            let _ = writeln!(out, "    - {}", reason);
        }
    }
    out
}

/// Format a number, dropping the fraction when it is integral.
pub(crate) fn fmt_num(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
