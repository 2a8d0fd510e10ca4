//! viewmeter core: runtime-free request accounting primitives.
//!
//! This crate defines the memory-map model, the process probes, the stats
//! client abstraction, and the usage meter that turns a before/after pair of
//! readings into per-view gauges. It carries no web framework or async runtime
//! dependency so it can wrap any request handler.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `ViewMeterError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod memory;
pub mod probe;
pub mod stats;
pub mod usage;

/// Shared result type.
pub use error::{Result, ViewMeterError};
pub use memory::{MappedRegion, MemoryCategory, MemoryDelta, MemorySnapshot};
pub use probe::{ProcProbe, ResourceProbe};
pub use stats::{Fanout, Recorder, Sample, StatsClient};
pub use usage::{FixedView, UsageGuard, UsageMeter, UsageReport, ViewLookup};
