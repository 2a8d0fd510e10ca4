//! Top-level facade crate for viewmeter.
//!
//! Re-exports the core measurement types and the axum integration so users can
//! depend on a single crate.

pub mod core {
    pub use viewmeter_core::*;
}

pub mod server {
    pub use viewmeter_server::*;
}
