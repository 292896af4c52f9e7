//! TLS grade oracle: obtains a finished TLS assessment for a host from a
//! remote assessment service, either reusing a cached one or forcing a new
//! scan, and polling until the service reports a terminal status.

pub mod scan;
pub mod ssllabs;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Error, Result};
pub use scan::{ScanQuery, ScanResult, ScanStatus};

/// Longest single sleep while pausing, so cancellation is noticed quickly.
const PAUSE_SLICE: Duration = Duration::from_millis(250);

/// Performs one `analyze` round trip.
pub trait ScanTransport {
    fn analyze(&self, host: &str, query: ScanQuery) -> Result<ScanResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Cached,
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between polls of a fresh scan.
    pub interval: Duration,
    /// Pause between polls of a cached lookup.
    pub cached_interval: Duration,
    /// Give up once another pause would exceed this much total waiting.
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            cached_interval: Duration::from_secs(30),
            max_wait: Duration::from_secs(30 * 60),
        }
    }
}

impl PollPolicy {
    fn interval_for(&self, mode: ScanMode) -> Duration {
        match mode {
            ScanMode::Cached => self.cached_interval,
            ScanMode::Fresh => self.interval,
        }
    }
}

/// Shared stop flag, set from the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

pub struct TlsGradeOracle {
    transport: Box<dyn ScanTransport>,
    policy: PollPolicy,
    cancel: CancelToken,
}

impl TlsGradeOracle {
    pub fn new(transport: Box<dyn ScanTransport>, policy: PollPolicy, cancel: CancelToken) -> Self {
        Self {
            transport,
            policy,
            cancel,
        }
    }

    /// One cache-preferring lookup. May return a non-terminal status.
    pub fn fetch_cached(&self, host: &str) -> Result<ScanResult> {
        self.request(host, ScanQuery::Cached)
    }

    /// Ask for a brand-new assessment. May return a non-terminal status.
    pub fn fetch_fresh(&self, host: &str) -> Result<ScanResult> {
        self.request(host, ScanQuery::StartNew)
    }

    fn request(&self, host: &str, query: ScanQuery) -> Result<ScanResult> {
        self.cancel.check()?;
        debug!(host, ?query, "requesting TLS assessment");
        self.transport.analyze(host, query)
    }

    /// Poll until the assessment is `READY` or `ERROR`.
    ///
    /// A fresh scan is started once; later polls only ask for its progress.
    /// Busy replies are waited out like unfinished scans. Fails with
    /// `Timeout` when the wait budget runs out and `Cancelled` when the
    /// token is set.
    pub fn poll_until_terminal(&self, host: &str, mode: ScanMode) -> Result<ScanResult> {
        let started = Instant::now();
        let interval = self.policy.interval_for(mode);

        let mut result = match mode {
            ScanMode::Cached => self.fetch_cached(host)?,
            ScanMode::Fresh => self.fetch_fresh(host)?,
        };
        let mut scan_started = mode == ScanMode::Fresh && !result.busy;

        loop {
            if result.status.is_terminal() {
                info!(host, status = %result.status, grades = ?result.grades(), "TLS assessment finished");
                return Ok(result);
            }

            let waited = started.elapsed();
            if waited + interval > self.policy.max_wait {
                return Err(Error::Timeout {
                    host: host.to_string(),
                    waited,
                });
            }
            debug!(
                host,
                status = %result.status,
                message = result.status_message.as_deref().unwrap_or(""),
                waited_secs = waited.as_secs(),
                "TLS assessment not finished, waiting"
            );
            self.pause(interval)?;

            result = match mode {
                ScanMode::Cached => self.fetch_cached(host)?,
                ScanMode::Fresh if scan_started => self.request(host, ScanQuery::FollowUp)?,
                ScanMode::Fresh => self.fetch_fresh(host)?,
            };
            if mode == ScanMode::Fresh && !result.busy {
                scan_started = true;
            }
        }
    }

    fn pause(&self, duration: Duration) -> Result<()> {
        let deadline = Instant::now() + duration;
        loop {
            self.cancel.check()?;
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep((deadline - now).min(PAUSE_SLICE));
        }
    }
}
