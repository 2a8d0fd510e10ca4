//! Stats sinks.
//!
//! - `metrics`: in-process board rendered at `/metrics`
//! - `statsd`: UDP line protocol to an external daemon

pub mod metrics;
pub mod statsd;

pub use metrics::GaugeBoard;
pub use statsd::StatsdClient;
