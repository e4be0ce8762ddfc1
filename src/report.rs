//! Debug report schema.
//!
//! A report is the only artifact crossing from a live session into
//! analysis:
//!
//! ```json
//! { "samples": [{ "pageCountDom": 42, "maxScrollRatio": 1.0 }],
//!   "trace": [{ "event": "split", "pos": 648 }] }
//! ```
//!
//! Reading is lenient. Every sample field is optional; numbers that are not
//! finite and flags that are not booleans read as absent, and trace entries
//! without a string `event` are dropped. Only a report whose top level is
//! not an object, or whose `samples`/`trace` are not arrays, is rejected.

use crate::error::{Error, Result};
use crate::reflow::{TraceEvent, TraceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// One observation of a live session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Page count of the rendered layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count_dom: Option<f64>,

    /// Page count estimated from the logical model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count_doc: Option<f64>,

    /// Widest scroll extent relative to the visible width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scroll_ratio: Option<f64>,

    /// Whether horizontal overflow was visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_active: Option<bool>,
}

impl Sample {
    /// Page count with fallback: rendered, else logical, else 0.
    pub fn page_count(&self) -> f64 {
        self.page_count_dom.or(self.page_count_doc).unwrap_or(0.0)
    }

    /// Read a sample, ignoring fields of the wrong type.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            page_count_dom: finite(obj, "pageCountDom"),
            page_count_doc: finite(obj, "pageCountDoc"),
            max_scroll_ratio: finite(obj, "maxScrollRatio"),
            overflow_active: obj.get("overflowActive").and_then(Value::as_bool),
        }
    }
}

fn finite(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

fn trace_event(value: &Value) -> Option<TraceEvent> {
    let obj = value.as_object()?;
    let event = obj.get("event")?.as_str()?;
    Some(TraceEvent {
        event: TraceKind::parse(event),
        pos: finite(obj, "pos"),
        page: obj
            .get("page")
            .and_then(Value::as_u64)
            .and_then(|p| u32::try_from(p).ok()),
        timestamp: finite(obj, "timestamp"),
    })
}

fn array<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a [Value]> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::ReportShape(format!("`{key}` must be an array"))),
    }
}

/// Samples and trace collected from one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Observations in capture order
    pub samples: Vec<Sample>,

    /// Engine operations in emission order
    pub trace: Vec<TraceEvent>,

    /// When the report was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Create a report stamped with the current time.
    pub fn new(samples: Vec<Sample>, trace: Vec<TraceEvent>) -> Self {
        Self {
            samples,
            trace,
            created_at: Some(Utc::now()),
        }
    }

    /// Read a report from parsed JSON.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::ReportShape("top level must be an object".into()))?;

        let samples = array(obj, "samples")?
            .iter()
            .map(Sample::from_value)
            .collect();
        let trace = array(obj, "trace")?
            .iter()
            .filter_map(trace_event)
            .collect();
        let created_at = obj
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));

        Ok(Self {
            samples,
            trace,
            created_at,
        })
    }

    /// Parse a report from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Read a report file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Report {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Report::from_value(&value).map_err(serde::de::Error::custom)
    }
}
