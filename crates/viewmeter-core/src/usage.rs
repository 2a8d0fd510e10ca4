//! Per-request CPU and memory accounting.
//!
//! [`UsageMeter::start`] takes a "before" reading and returns a [`UsageGuard`].
//! When the guard is finished or dropped it takes the "after" reading, attributes
//! the difference to the current view and emits:
//!
//! - `cpu.<view>`: CPU seconds consumed by the process
//! - `memory.<view>.<category>.total`: bytes after the request
//! - `memory.<view>.<category>.change`: signed bytes gained during the request
//!
//! Teardown lives in `Drop`, so it runs exactly once on return, error, panic,
//! or cancellation of the measured future.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::memory::{MemoryCategory, MemoryDelta, MemorySnapshot};
use crate::probe::ResourceProbe;
use crate::stats::StatsClient;

/// Resolves the name of the view currently handling the request.
pub trait ViewLookup: Debug + Send + Sync + 'static {
    fn view_name(&self) -> String;
}

/// Always reports the same view. Useful outside of a request router.
#[derive(Debug, Clone)]
pub struct FixedView(pub String);

impl ViewLookup for FixedView {
    fn view_name(&self) -> String {
        self.0.clone()
    }
}

/// A single point-in-time reading. Fields are `None` when the probe failed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reading {
    pub cpu: Option<Duration>,
    pub memory: Option<MemorySnapshot>,
}

/// Difference between two readings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageReport {
    pub cpu: Option<Duration>,
    pub memory: Option<(MemorySnapshot, MemoryDelta)>,
}

impl UsageReport {
    pub fn between(before: &Reading, after: &Reading) -> Self {
        let cpu = match (before.cpu, after.cpu) {
            (Some(b), Some(a)) => Some(a.saturating_sub(b)),
            _ => None,
        };
        let memory = match (before.memory, after.memory) {
            (Some(b), Some(a)) => Some((a, a.delta_since(&b))),
            _ => None,
        };
        Self { cpu, memory }
    }

    /// Emit the gauges for this report under `view`.
    pub fn emit(&self, view: &str, stats: &dyn StatsClient) {
        if let Some(cpu) = self.cpu {
            stats.gauge(&format!("cpu.{view}"), cpu.as_secs_f64());
        }
        if let Some((after, delta)) = &self.memory {
            for category in MemoryCategory::ALL {
                let base = format!("memory.{view}.{}", category.as_str());
                stats.gauge(&format!("{base}.total"), after.get(category) as f64);
                stats.gauge(&format!("{base}.change"), delta.get(category) as f64);
            }
        }
    }
}

/// Shared handle that starts measurements. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UsageMeter {
    probe: Arc<dyn ResourceProbe>,
    stats: Arc<dyn StatsClient>,
    views: Arc<dyn ViewLookup>,
}

impl UsageMeter {
    pub fn new(
        probe: Arc<dyn ResourceProbe>,
        stats: Arc<dyn StatsClient>,
        views: Arc<dyn ViewLookup>,
    ) -> Self {
        Self { probe, stats, views }
    }

    /// Take the "before" reading.
    pub fn start(&self) -> UsageGuard {
        UsageGuard {
            meter: self.clone(),
            before: self.read(),
            armed: true,
        }
    }

    /// Run `f` under measurement and return its result unchanged.
    pub fn measure<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        f()
    }

    /// Await `fut` under measurement and return its output unchanged.
    ///
    /// Both readings run synchronously on the polling worker, one
    /// `/proc/self/smaps` read each. Accepted as a per-request cost.
    pub async fn measure_async<F: Future>(&self, fut: F) -> F::Output {
        let _guard = self.start();
        fut.await
    }

    fn read(&self) -> Reading {
        let cpu = self
            .probe
            .cpu_time()
            .map_err(|e| tracing::warn!(error = %e, "cpu time unavailable"))
            .ok();
        let memory = self
            .probe
            .memory()
            .map_err(|e| tracing::warn!(error = %e, "memory map unavailable"))
            .ok();
        Reading { cpu, memory }
    }
}

/// Pending measurement. Emits once, on [`finish`](Self::finish) or drop.
#[must_use = "dropping the guard immediately measures nothing"]
#[derive(Debug)]
pub struct UsageGuard {
    meter: UsageMeter,
    before: Reading,
    armed: bool,
}

impl UsageGuard {
    /// Take the "after" reading and emit now instead of at drop.
    pub fn finish(mut self) -> UsageReport {
        self.armed = false;
        self.complete()
    }

    fn complete(&self) -> UsageReport {
        let after = self.meter.read();
        let report = UsageReport::between(&self.before, &after);
        let view = self.meter.views.view_name();
        report.emit(&view, self.meter.stats.as_ref());
        tracing::debug!(
            view = %view,
            cpu_us = report.cpu.map(|d| d.as_micros() as u64),
            rss_change = report.memory.map(|(_, d)| d.rss),
            "request usage recorded"
        );
        report
    }
}

impl Drop for UsageGuard {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            self.complete();
        }
    }
}
