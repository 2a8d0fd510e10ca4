//! viewmeter demo server.
//!
//! Serves the demo workload views with the full instrumentation stack:
//! request context, per-view CPU/memory gauges, Graphite response counters
//! and view timings. Config path comes from `VIEWMETER_CONFIG`.

use tracing_subscriber::{fmt, EnvFilter};

use viewmeter_server::{app_state, config, router};

const DEFAULT_CONFIG: &str = "viewmeter.yaml";

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("VIEWMETER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen = cfg.server.listen_addr().expect("server.listen validated at load");

    let state = app_state::AppState::new(cfg).expect("app state init failed");
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "viewmeter-server starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
