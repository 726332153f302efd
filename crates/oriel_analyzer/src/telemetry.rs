//! Per-operation stopwatches.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use oriel_span::ResolvedUrl;

/// One timed operation.
#[derive(Debug, Clone)]
pub struct Measurement {
    /// Operation kind (`load`, `parse`, `scan`, `scan-dependencies`,
    /// `analyze`, `resolve`).
    pub kind: &'static str,
    pub url: ResolvedUrl,
    /// Start time, relative to analyzer construction.
    pub start: Duration,
    pub duration: Duration,
}

/// Collects measurements across the analyzer's lifetime; shared between
/// cache forks.
#[derive(Debug)]
pub(crate) struct Telemetry {
    epoch: Instant,
    measurements: Mutex<Vec<Measurement>>,
}

impl Telemetry {
    pub(crate) fn new() -> Self {
        Self {
            epoch: Instant::now(),
            measurements: Mutex::new(Vec::new()),
        }
    }

    /// Start a stopwatch; the measurement records when the guard drops.
    pub(crate) fn start(&self, kind: &'static str, url: &ResolvedUrl) -> Stopwatch<'_> {
        Stopwatch {
            telemetry: self,
            kind,
            url: url.clone(),
            started: Instant::now(),
        }
    }

    pub(crate) fn measurements(&self) -> Vec<Measurement> {
        self.measurements.lock().clone()
    }
}

pub(crate) struct Stopwatch<'t> {
    telemetry: &'t Telemetry,
    kind: &'static str,
    url: ResolvedUrl,
    started: Instant,
}

impl Drop for Stopwatch<'_> {
    fn drop(&mut self) {
        let measurement = Measurement {
            kind: self.kind,
            url: self.url.clone(),
            start: self.started - self.telemetry.epoch,
            duration: self.started.elapsed(),
        };
        self.telemetry.measurements.lock().push(measurement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_records_on_drop() {
        let telemetry = Telemetry::new();
        {
            let _guard = telemetry.start("parse", &ResolvedUrl::from("a.html"));
        }
        let measurements = telemetry.measurements();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].kind, "parse");
        assert_eq!(measurements[0].url.as_str(), "a.html");
    }
}
