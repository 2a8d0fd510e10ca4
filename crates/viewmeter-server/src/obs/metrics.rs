//! In-process stats board.
//!
//! Keeps the latest value of every statsd-style key the app emits and renders
//! them in Prometheus text format at `/metrics`. The statsd key becomes a
//! `key` label so dotted names survive unchanged. Rows are sorted by key for
//! deterministic output.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use viewmeter_core::stats::StatsClient;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn sorted<V, T>(map: &DashMap<String, V>, read: impl Fn(&V) -> T) -> Vec<(String, T)> {
    let mut rows: Vec<(String, T)> = map.iter().map(|r| (r.key().clone(), read(r.value()))).collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

/// Last-write-wins gauge values, stored as `f64` bits.
#[derive(Default)]
pub struct GaugeSet {
    map: DashMap<String, AtomicU64>,
}

impl GaugeSet {
    pub fn set(&self, key: &str, v: f64) {
        if let Some(g) = self.map.get(key) {
            g.store(v.to_bits(), Ordering::Relaxed);
            return;
        }
        self.map
            .entry(key.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.map.get(key).map(|g| f64::from_bits(g.load(Ordering::Relaxed)))
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for (key, bits) in sorted(&self.map, |g| g.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{}{{key=\"{}\"}} {}", name, escape_label(&key), f64::from_bits(bits));
        }
    }
}

#[derive(Default)]
pub struct CounterSet {
    map: DashMap<String, AtomicU64>,
}

impl CounterSet {
    pub fn inc(&self, key: &str) {
        let counter = self.map.entry(key.to_string()).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, key: &str) -> u64 {
        self.map.get(key).map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for (key, val) in sorted(&self.map, |c| c.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{}{{key=\"{}\"}} {}", name, escape_label(&key), val);
        }
    }
}

#[derive(Default)]
struct AtomicTiming {
    count: AtomicU64,
    sum_micros: AtomicU64,
}

/// Timing observations as a Prometheus summary (count + sum, microseconds).
#[derive(Default)]
pub struct TimingSet {
    map: DashMap<String, AtomicTiming>,
}

impl TimingSet {
    pub fn observe(&self, key: &str, elapsed: Duration) {
        let t = self.map.entry(key.to_string()).or_default();
        t.count.fetch_add(1, Ordering::Relaxed);
        t.sum_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn count(&self, key: &str) -> u64 {
        self.map.get(key).map(|t| t.count.load(Ordering::Relaxed)).unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} summary", name);
        let rows = sorted(&self.map, |t| {
            (t.count.load(Ordering::Relaxed), t.sum_micros.load(Ordering::Relaxed))
        });
        for (key, (count, sum)) in rows {
            let label = escape_label(&key);
            let _ = writeln!(out, "{}_sum{{key=\"{}\"}} {}", name, label, sum);
            let _ = writeln!(out, "{}_count{{key=\"{}\"}} {}", name, label, count);
        }
    }
}

/// Everything emitted through [`StatsClient`], kept in memory.
#[derive(Default)]
pub struct GaugeBoard {
    pub gauges: GaugeSet,
    pub counters: CounterSet,
    pub timings: TimingSet,
}

impl std::fmt::Debug for GaugeBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaugeBoard")
            .field("gauges", &self.gauges.map.len())
            .field("counters", &self.counters.map.len())
            .field("timings", &self.timings.map.len())
            .finish()
    }
}

impl GaugeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render all series in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.gauges.render("viewmeter_gauge", &mut out);
        self.counters.render("viewmeter_counter_total", &mut out);
        self.timings.render("viewmeter_timing_micros", &mut out);
        out
    }
}

impl StatsClient for GaugeBoard {
    fn gauge(&self, key: &str, value: f64) {
        self.gauges.set(key, value);
    }

    fn incr(&self, key: &str) {
        self.counters.inc(key);
    }

    fn timing(&self, key: &str, elapsed: Duration) {
        self.timings.observe(key, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauges_keep_last_value() {
        let board = GaugeBoard::new();
        board.gauge("memory.inbox.rss.total", 150.0);
        board.gauge("memory.inbox.rss.total", 175.0);
        assert_eq!(board.gauges.get("memory.inbox.rss.total"), Some(175.0));
        assert_eq!(board.gauges.get("cpu.inbox"), None);
    }

    #[test]
    fn renders_sorted_series_with_key_labels() {
        let board = GaugeBoard::new();
        board.gauge("memory.seen.rss.change", -4096.0);
        board.gauge("cpu.seen", 0.5);
        board.incr("response.200");
        board.incr("response.200");
        board.timing("view.GET", Duration::from_millis(3));

        let text = board.render();
        let cpu = text.find("viewmeter_gauge{key=\"cpu.seen\"} 0.5").unwrap_or(usize::MAX);
        let mem = text
            .find("viewmeter_gauge{key=\"memory.seen.rss.change\"} -4096")
            .unwrap_or(usize::MAX);
        assert!(cpu < mem && mem != usize::MAX);
        assert!(text.contains("viewmeter_counter_total{key=\"response.200\"} 2"));
        assert!(text.contains("viewmeter_timing_micros_sum{key=\"view.GET\"} 3000"));
        assert!(text.contains("viewmeter_timing_micros_count{key=\"view.GET\"} 1"));
    }
}
