use crate::report::BenchmarkReport;
use log::{debug, warn};

/// Identifies one pipeline run. Only the newest token may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvocationToken(u64);

impl InvocationToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Holds the report currently on display and discards results from runs
/// that were superseded by a newer upload or industry choice.
#[derive(Debug, Default)]
pub struct ReportSession {
    latest: u64,
    current: Option<BenchmarkReport>,
}

impl ReportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a run, invalidating every earlier token.
    pub fn begin(&mut self) -> InvocationToken {
        self.latest += 1;
        debug!("Starting report invocation {}", self.latest);
        InvocationToken(self.latest)
    }

    pub fn is_current(&self, token: InvocationToken) -> bool {
        token.0 == self.latest
    }

    /// Stores `report` if `token` is still the latest. Returns whether it was kept.
    pub fn commit(&mut self, token: InvocationToken, report: BenchmarkReport) -> bool {
        if !self.is_current(token) {
            warn!(
                "Discarding stale report from invocation {} (latest is {})",
                token.0, self.latest
            );
            return false;
        }
        self.current = Some(report);
        true
    }

    pub fn current(&self) -> Option<&BenchmarkReport> {
        self.current.as_ref()
    }

    /// Drops the displayed report and invalidates in-flight runs.
    pub fn clear(&mut self) {
        self.latest += 1;
        self.current = None;
    }
}
