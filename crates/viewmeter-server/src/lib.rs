//! viewmeter server library entry.
//!
//! Wires request-context propagation, per-view resource measurement, the
//! Graphite compatibility hooks and the stats sinks into an axum stack. Used
//! by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod compat;
pub mod config;
pub mod context;
pub mod error;
pub mod middleware;
pub mod obs;
pub mod ops;
pub mod router;
pub mod views;
