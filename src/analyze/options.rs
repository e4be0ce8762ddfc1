//! Analyzer thresholds.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Environment variable for [`AnalyzeOptions::warmup_ratio`].
pub const ENV_WARMUP_RATIO: &str = "PAGINATION_DEBUG_WARMUP_RATIO";
/// Environment variable for [`AnalyzeOptions::min_page_count`].
pub const ENV_MIN_PAGE_COUNT: &str = "MIN_PAGE_COUNT";
/// Environment variable for [`AnalyzeOptions::max_range`].
pub const ENV_MAX_RANGE: &str = "MAX_PAGECOUNT_RANGE";
/// Environment variable for [`AnalyzeOptions::max_changes`].
pub const ENV_MAX_CHANGES: &str = "MAX_PAGECOUNT_CHANGES";
/// Environment variable for [`AnalyzeOptions::max_scroll_ratio`].
pub const ENV_MAX_SCROLL_RATIO: &str = "MAX_SCROLL_RATIO";

/// Prefix accepted in front of the unprefixed threshold names.
///
/// `PAGINATION_DEBUG_MIN_PAGE_COUNT` is read when `MIN_PAGE_COUNT` is unset.
pub const ENV_ALIAS_PREFIX: &str = "PAGINATION_DEBUG_";

/// Thresholds a session must stay within to count as stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeOptions {
    /// Fraction of leading samples discarded as warmup
    pub warmup_ratio: f64,

    /// The document must reach more pages than this
    pub min_page_count: f64,

    /// Largest allowed spread of page counts
    pub max_range: f64,

    /// Largest allowed number of page count changes
    pub max_changes: usize,

    /// Largest allowed scroll ratio
    pub max_scroll_ratio: f64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            warmup_ratio: 0.2,
            min_page_count: 20.0,
            max_range: 1.0,
            max_changes: 4,
            max_scroll_ratio: 1.05,
        }
    }
}

impl AnalyzeOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read thresholds from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read thresholds through `lookup`; missing or bad values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            warmup_ratio: parse_or(&lookup, ENV_WARMUP_RATIO, defaults.warmup_ratio),
            min_page_count: parse_or(&lookup, ENV_MIN_PAGE_COUNT, defaults.min_page_count),
            max_range: parse_or(&lookup, ENV_MAX_RANGE, defaults.max_range),
            max_changes: parse_or(&lookup, ENV_MAX_CHANGES, defaults.max_changes),
            max_scroll_ratio: parse_or(&lookup, ENV_MAX_SCROLL_RATIO, defaults.max_scroll_ratio),
        }
    }

    /// Set the warmup ratio.
    pub fn with_warmup_ratio(mut self, ratio: f64) -> Self {
        self.warmup_ratio = ratio;
        self
    }

    /// Set the minimum page count.
    pub fn with_min_page_count(mut self, count: f64) -> Self {
        self.min_page_count = count;
        self
    }

    /// Set the allowed page count range.
    pub fn with_max_range(mut self, range: f64) -> Self {
        self.max_range = range;
        self
    }

    /// Set the allowed number of page count changes.
    pub fn with_max_changes(mut self, changes: usize) -> Self {
        self.max_changes = changes;
        self
    }

    /// Set the allowed scroll ratio.
    pub fn with_max_scroll_ratio(mut self, ratio: f64) -> Self {
        self.max_scroll_ratio = ratio;
        self
    }
}

trait Threshold: FromStr + Copy {
    fn usable(&self) -> bool;
}

impl Threshold for f64 {
    fn usable(&self) -> bool {
        self.is_finite()
    }
}

impl Threshold for usize {
    fn usable(&self) -> bool {
        true
    }
}

/// First non-empty value of `key`, then of its prefixed alias.
fn lookup_with_alias<F>(lookup: &F, key: &str) -> Option<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let alias = (!key.starts_with(ENV_ALIAS_PREFIX)).then(|| format!("{ENV_ALIAS_PREFIX}{key}"));
    std::iter::once(key.to_string())
        .chain(alias)
        .find_map(|name| {
            lookup(&name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(|raw| (name, raw))
        })
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: Threshold,
    F: Fn(&str) -> Option<String>,
{
    let Some((name, raw)) = lookup_with_alias(lookup, key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if value.usable() => value,
        _ => {
            log::warn!("ignoring {}={:?}: not a usable number", name, raw);
            default
        }
    }
}
