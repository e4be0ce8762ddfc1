//! Append-only record of reflow operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Positions closer than this (in content units) are the same page boundary.
pub const SAME_BOUNDARY_TOLERANCE: f64 = 20.0;

/// The operation a trace entry records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TraceKind {
    /// Content cut at a breakpoint and pushed to the next page
    Split,
    /// Two pages merged into one
    Join,
    /// Leading unit of the next page moved up
    PullUp,
    /// Paragraph continuation pulled back across a boundary
    MergeContinuation,
    /// Degenerate whitespace-only page removed
    MergeWhitespace,
    /// An event name this crate does not know
    Other(String),
}

impl TraceKind {
    /// Wire name of the event.
    pub fn as_str(&self) -> &str {
        match self {
            TraceKind::Split => "split",
            TraceKind::Join => "join",
            TraceKind::PullUp => "pullup",
            TraceKind::MergeContinuation => "mergeContinuation",
            TraceKind::MergeWhitespace => "mergeWhitespace",
            TraceKind::Other(name) => name,
        }
    }

    /// Parse a wire name; a `dispatch:` prefix is accepted.
    pub fn parse(name: &str) -> Self {
        let name = name.strip_prefix("dispatch:").unwrap_or(name);
        match name {
            "split" => TraceKind::Split,
            "join" => TraceKind::Join,
            "pullup" => TraceKind::PullUp,
            "mergeContinuation" => TraceKind::MergeContinuation,
            "mergeWhitespace" => TraceKind::MergeWhitespace,
            other => TraceKind::Other(other.to_string()),
        }
    }

    /// Check if this is one of the two merge operations.
    pub fn is_merge(&self) -> bool {
        matches!(
            self,
            TraceKind::MergeContinuation | TraceKind::MergeWhitespace
        )
    }
}

impl From<String> for TraceKind {
    fn from(name: String) -> Self {
        TraceKind::parse(&name)
    }
}

impl From<TraceKind> for String {
    fn from(kind: TraceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reflow operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Operation kind
    pub event: TraceKind,

    /// Flow offset of the affected boundary, in content units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<f64>,

    /// Index of the page the operation was applied to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Milliseconds since recording started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl TraceEvent {
    /// Create an event with a position and no page or timestamp.
    pub fn new(event: TraceKind, pos: Option<f64>) -> Self {
        Self {
            event,
            pos,
            page: None,
            timestamp: None,
        }
    }

    /// Finite position, if any.
    pub fn finite_pos(&self) -> Option<f64> {
        self.pos.filter(|p| p.is_finite())
    }
}

/// Single-writer, append-only trace log.
#[derive(Debug)]
pub struct TraceRecorder {
    events: Vec<TraceEvent>,
    started: Instant,
}

impl TraceRecorder {
    /// Create an empty recorder; timestamps count from now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Append an operation.
    pub fn record(&mut self, event: TraceKind, pos: f64, page: usize) {
        log::trace!("dispatch:{} pos={:.1} page={}", event, pos, page);
        let timestamp = self.started.elapsed().as_secs_f64() * 1000.0;
        self.events.push(TraceEvent {
            event,
            pos: Some(pos),
            page: u32::try_from(page).ok(),
            timestamp: Some(timestamp),
        });
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume the recorder, returning its events.
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(TraceKind::parse("split"), TraceKind::Split);
        assert_eq!(TraceKind::parse("dispatch:pullup"), TraceKind::PullUp);
        assert_eq!(
            TraceKind::parse("mergeWhitespace"),
            TraceKind::MergeWhitespace
        );
        assert_eq!(
            TraceKind::parse("relayout"),
            TraceKind::Other("relayout".into())
        );
        assert!(TraceKind::MergeContinuation.is_merge());
        assert!(!TraceKind::Join.is_merge());
    }

    #[test]
    fn test_event_serialization() {
        let event = TraceEvent::new(TraceKind::MergeContinuation, Some(12.5));
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"mergeContinuation","pos":12.5}"#);
    }

    #[test]
    fn test_recorder_appends_in_order() {
        let mut recorder = TraceRecorder::new();
        recorder.record(TraceKind::Split, 648.0, 0);
        recorder.record(TraceKind::Join, 648.0, 0);

        assert_eq!(recorder.len(), 2);
        let events = recorder.into_events();
        assert_eq!(events[0].event, TraceKind::Split);
        assert_eq!(events[1].page, Some(0));
        assert!(events[0].timestamp.unwrap() <= events[1].timestamp.unwrap());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_page_index_out_of_range_is_dropped() {
        let mut recorder = TraceRecorder::new();
        recorder.record(TraceKind::Split, 1.0, u32::MAX as usize + 1);
        recorder.record(TraceKind::Split, 2.0, u32::MAX as usize);

        assert_eq!(recorder.events()[0].page, None);
        assert_eq!(recorder.events()[1].page, Some(u32::MAX));
    }
}
