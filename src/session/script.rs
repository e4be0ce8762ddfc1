//! Scripted edit sessions.

use crate::error::Result;
use crate::model::{Edit, PageGeometry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// A paced sequence of edits replayed against a live session.
///
/// ```json
/// { "intervalMs": 25, "settleMs": 200, "sampleIntervalMs": 10,
///   "steps": [{ "op": "appendText", "index": 3, "text": "more" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditScript {
    /// Geometry to start from (document default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<PageGeometry>,

    /// Pause between steps
    #[serde(default)]
    pub interval_ms: u64,

    /// Pause after the last step before sampling stops
    #[serde(default)]
    pub settle_ms: u64,

    /// Sampler cadence
    #[serde(default = "default_sample_interval")]
    pub sample_interval_ms: u64,

    /// Edits in order
    #[serde(default)]
    pub steps: Vec<Edit>,
}

fn default_sample_interval() -> u64 {
    10
}

impl EditScript {
    /// Create a script with no pacing.
    pub fn new(steps: Vec<Edit>) -> Self {
        Self {
            geometry: None,
            interval_ms: 0,
            settle_ms: 0,
            sample_interval_ms: default_sample_interval(),
            steps,
        }
    }

    /// Load a script from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Set the pause between steps and after the last one.
    pub fn with_pacing(mut self, interval_ms: u64, settle_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self.settle_ms = settle_ms;
        self
    }

    /// Pause between steps.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Pause after the last step.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Sampler cadence, at least 1 ms.
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }
}
