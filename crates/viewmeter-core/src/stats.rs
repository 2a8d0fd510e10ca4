//! Stats client abstraction (statsd-style gauges, counters, timings).
//!
//! All calls are fire-and-forget: implementations swallow transport errors and
//! never block the request path.

use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait StatsClient: Debug + Send + Sync + 'static {
    /// Point-in-time value.
    fn gauge(&self, key: &str, value: f64);

    /// Increment a counter by one.
    fn incr(&self, key: &str);

    /// Record an elapsed duration.
    fn timing(&self, key: &str, elapsed: Duration);
}

/// Forwards every call to each inner client in order.
#[derive(Debug, Default, Clone)]
pub struct Fanout {
    clients: Vec<Arc<dyn StatsClient>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, client: Arc<dyn StatsClient>) -> Self {
        self.clients.push(client);
        self
    }
}

impl StatsClient for Fanout {
    fn gauge(&self, key: &str, value: f64) {
        for c in &self.clients {
            c.gauge(key, value);
        }
    }

    fn incr(&self, key: &str) {
        for c in &self.clients {
            c.incr(key);
        }
    }

    fn timing(&self, key: &str, elapsed: Duration) {
        for c in &self.clients {
            c.timing(key, elapsed);
        }
    }
}

/// One captured call on a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Gauge(String, f64),
    Incr(String),
    Timing(String, Duration),
}

impl Sample {
    pub fn key(&self) -> &str {
        match self {
            Sample::Gauge(k, _) | Sample::Incr(k) | Sample::Timing(k, _) => k,
        }
    }
}

/// Keeps every call in memory, in order. Used by tests and local debugging.
#[derive(Debug, Default)]
pub struct Recorder {
    samples: Mutex<Vec<Sample>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.lock().clone()
    }

    /// Last gauge value recorded under `key`.
    pub fn gauge_value(&self, key: &str) -> Option<f64> {
        self.lock().iter().rev().find_map(|s| match s {
            Sample::Gauge(k, v) if k == key => Some(*v),
            _ => None,
        })
    }

    /// Number of calls of any kind recorded under `key`.
    pub fn count(&self, key: &str) -> usize {
        self.lock().iter().filter(|s| s.key() == key).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sample>> {
        // Poisoning is ignored: samples recorded before a panic stay readable.
        self.samples.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StatsClient for Recorder {
    fn gauge(&self, key: &str, value: f64) {
        self.lock().push(Sample::Gauge(key.to_string(), value));
    }

    fn incr(&self, key: &str) {
        self.lock().push(Sample::Incr(key.to_string()));
    }

    fn timing(&self, key: &str, elapsed: Duration) {
        self.lock().push(Sample::Timing(key.to_string(), elapsed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fanout_reaches_every_client() {
        let a = Arc::new(Recorder::new());
        let b = Arc::new(Recorder::new());
        let fan = Fanout::new().with(a.clone()).with(b.clone());

        fan.gauge("cpu.index", 0.25);
        fan.incr("response.200");

        for r in [&a, &b] {
            assert_eq!(r.gauge_value("cpu.index"), Some(0.25));
            assert_eq!(r.count("response.200"), 1);
        }
    }
}
