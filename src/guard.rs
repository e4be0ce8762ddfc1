//! End-to-end oscillation guard.
//!
//! The guard launches a host process that replays an edit script against a
//! document and writes a debug report, then analyzes that report. The
//! report is the only source of truth: a host that exits non-zero but
//! leaves a report behind is a warning, not a failure.
//!
//! ```no_run
//! use pagereflow::guard::{self, GuardConfig};
//!
//! fn main() -> pagereflow::Result<()> {
//!     let outcome = guard::run(&GuardConfig::from_env())?;
//!     std::process::exit(if outcome.analysis.ok { 0 } else { 1 });
//! }
//! ```

use crate::analyze::{analyze, Analysis, AnalyzeOptions};
use crate::error::{Error, Result};
use crate::report::Report;
use log::{debug, warn};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};

/// Environment variable overriding the host executable.
pub const ENV_HOST: &str = "PAGINATION_GUARD_HOST";
/// Environment variable overriding the watcher script.
pub const ENV_WATCHER: &str = "PAGINATION_GUARD_WATCHER";
/// Environment variable overriding the host timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "PAGINATION_GUARD_TIMEOUT_SECS";

/// Document replayed when none is given.
pub const DEFAULT_DOC: &str = "fixtures/pagination-long.json";
/// Report path when none is given.
pub const DEFAULT_REPORT: &str = "target/pagination-debug-report.json";
/// Watcher script when none is configured.
pub const DEFAULT_WATCHER: &str = "scripts/pagination-watch.json";
/// Host timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// File name of the bundled host executable.
pub const HOST_BINARY_NAME: &str = "pagereflow-host";

/// Variable added to the host environment.
pub const SANDBOX_ENV_VAR: &str = "ELECTRON_DISABLE_SANDBOX";

/// Guard settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardConfig {
    /// Host executable
    pub host_binary: PathBuf,

    /// Edit script passed to the host
    pub watcher_script: PathBuf,

    /// Document passed to the host
    pub doc_path: PathBuf,

    /// Where the host writes the report
    pub output_path: PathBuf,

    /// Wall-clock limit for the host
    pub timeout: Duration,

    /// How often the host is polled for exit
    pub poll_interval: Duration,

    /// Analyzer thresholds
    pub options: AnalyzeOptions,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            host_binary: default_host_binary(),
            watcher_script: PathBuf::from(DEFAULT_WATCHER),
            doc_path: PathBuf::from(DEFAULT_DOC),
            output_path: PathBuf::from(DEFAULT_REPORT),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::from_millis(50),
            options: AnalyzeOptions::default(),
        }
    }
}

/// `pagereflow-host` next to the running executable.
pub fn default_host_binary() -> PathBuf {
    let name = format!("{}{}", HOST_BINARY_NAME, env::consts::EXE_SUFFIX);
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(&name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

impl GuardConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read host, watcher, timeout and thresholds from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`; missing or bad values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            options: AnalyzeOptions::from_lookup(&lookup),
            ..Self::default()
        };
        if let Some(host) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
            config.host_binary = PathBuf::from(host);
        }
        if let Some(watcher) = lookup(ENV_WATCHER).filter(|v| !v.trim().is_empty()) {
            config.watcher_script = PathBuf::from(watcher);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!("ignoring {}={:?}: not a positive integer", ENV_TIMEOUT_SECS, raw),
            }
        }
        config
    }

    /// Set the host executable.
    pub fn with_host_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.host_binary = path.into();
        self
    }

    /// Set the watcher script.
    pub fn with_watcher_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.watcher_script = path.into();
        self
    }

    /// Set the document.
    pub fn with_doc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.doc_path = path.into();
        self
    }

    /// Set the report path.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Set the host timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the analyzer thresholds.
    pub fn with_options(mut self, options: AnalyzeOptions) -> Self {
        self.options = options;
        self
    }

    /// Arguments the host is launched with.
    pub fn host_args(&self) -> Vec<OsString> {
        vec![
            "--disable-setuid-sandbox".into(),
            "--no-sandbox".into(),
            self.watcher_script.clone().into_os_string(),
            self.doc_path.clone().into_os_string(),
            self.output_path.clone().into_os_string(),
        ]
    }
}

/// How the host process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// Exited with a status code
    Exited(i32),
    /// Terminated by a signal
    Signaled,
    /// Killed after exceeding the timeout
    TimedOut,
}

impl HostStatus {
    /// Check if the host exited with status 0.
    pub fn success(&self) -> bool {
        matches!(self, HostStatus::Exited(0))
    }
}

/// Result of a guard run.
#[derive(Debug, Clone)]
pub struct GuardOutcome {
    /// How the host ended
    pub host: HostStatus,

    /// The report the host wrote
    pub report: Report,

    /// Analysis of the report
    pub analysis: Analysis,
}

/// Launch the host, wait for it, and analyze its report.
///
/// Fails before launching anything if the host executable is missing.
/// Fails if no report was written or the report cannot be parsed.
pub fn run(config: &GuardConfig) -> Result<GuardOutcome> {
    if !config.host_binary.is_file() {
        return Err(Error::HostMissing(config.host_binary.clone()));
    }
    remove_stale_report(&config.output_path)?;

    debug!(
        "launching {} {:?}",
        config.host_binary.display(),
        config.host_args()
    );
    let mut child = Command::new(&config.host_binary)
        .args(config.host_args())
        .env(SANDBOX_ENV_VAR, "1")
        .spawn()
        .map_err(|source| Error::HostSpawn {
            path: config.host_binary.clone(),
            source,
        })?;

    let host = wait_with_timeout(&mut child, config.timeout, config.poll_interval)?;
    match host {
        HostStatus::Exited(0) => debug!("host exited cleanly"),
        HostStatus::Exited(code) => warn!("host exited with status {}; using its report", code),
        HostStatus::Signaled => warn!("host was terminated by a signal; using its report"),
        HostStatus::TimedOut => warn!(
            "host did not finish within {}s and was killed",
            config.timeout.as_secs()
        ),
    }

    if !config.output_path.is_file() {
        return Err(Error::ReportMissing(config.output_path.clone()));
    }
    let report = Report::from_path(&config.output_path)?;
    let analysis = analyze(&report, &config.options);

    Ok(GuardOutcome {
        host,
        report,
        analysis,
    })
}

fn remove_stale_report(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed stale report {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn wait_with_timeout(child: &mut Child, timeout: Duration, poll: Duration) -> Result<HostStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status.code().map_or(HostStatus::Signaled, HostStatus::Exited));
        }
        let now = Instant::now();
        if now >= deadline {
            // The host may exit between try_wait and kill.
            let _ = child.kill();
            let _ = child.wait();
            return Ok(HostStatus::TimedOut);
        }
        let nap = poll.min(deadline - now).max(Duration::from_millis(1));
        thread::sleep(nap);
    }
}
