//! # Per-System Runtime Diagnostics
//!
//! The system registry times every `update()` and, on a fixed wall-clock
//! interval, hands a [`RuntimeReport`] to a [`DiagnosticsSink`]. Reporting
//! is best-effort and never blocks the frame.

use std::time::Duration;

/// Accumulated runtime of one system since the previous report.
#[derive(Clone, Debug, PartialEq)]
pub struct SystemRuntime {
    /// System type name.
    pub name: &'static str,
    /// Time spent in `update()`.
    pub elapsed: Duration,
    /// Share of the total, in percent (0-100).
    pub percent: f64,
}

/// Snapshot of where frame time went, one entry per registered system in
/// registration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeReport {
    /// Per-system entries.
    pub systems: Vec<SystemRuntime>,
    /// Sum of all entries.
    pub total: Duration,
}

impl RuntimeReport {
    /// Builds a report from `(name, elapsed)` pairs.
    ///
    /// When nothing ran (total of zero) every percentage is zero.
    #[must_use]
    pub fn from_times<I>(times: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Duration)>,
    {
        let entries: Vec<_> = times.into_iter().collect();
        let total: Duration = entries.iter().map(|(_, d)| *d).sum();
        let total_secs = total.as_secs_f64();

        let systems = entries
            .into_iter()
            .map(|(name, elapsed)| SystemRuntime {
                name,
                elapsed,
                percent: if total_secs > 0.0 {
                    elapsed.as_secs_f64() / total_secs * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        Self { systems, total }
    }

    /// Entry of the named system, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SystemRuntime> {
        self.systems.iter().find(|s| s.name == name)
    }
}

/// Receiver of periodic runtime reports.
pub trait DiagnosticsSink {
    /// Called once per reporting interval.
    fn report(&mut self, report: &RuntimeReport);
}

/// Default sink: one `tracing` event per system.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&mut self, report: &RuntimeReport) {
        for system in &report.systems {
            tracing::info!(
                system = system.name,
                elapsed_us = system.elapsed.as_micros() as u64,
                percent = system.percent,
                "system runtime"
            );
        }
    }
}

/// Sink that drops every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl DiagnosticsSink for NullDiagnostics {
    fn report(&mut self, _report: &RuntimeReport) {}
}
