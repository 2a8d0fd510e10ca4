//! Request middleware.
//!
//! Layer order, outermost first:
//! - [`request_context::propagate`]: task-local request context + request span
//! - [`resource_usage::measure`]: per-view CPU and memory gauges
//! - `compat::drive`: legacy hook adapters (response codes, view timing)
//! - [`view::resolve`]: per-route, binds the view name into the context

pub mod request_context;
pub mod resource_usage;
pub mod view;
