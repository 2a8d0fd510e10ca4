//! Shared application state.
//!
//! Wires the stats sinks (in-process board, optional statsd), the usage meter
//! and the compatibility hooks from config. Startup errors are returned, not
//! panicked.

use std::sync::Arc;

use viewmeter_core::error::Result;
use viewmeter_core::probe::{ProcProbe, ResourceProbe};
use viewmeter_core::stats::{Fanout, StatsClient};
use viewmeter_core::usage::UsageMeter;

use crate::compat::{GraphiteMiddleware, GraphiteRequestTimingMiddleware, Hooks};
use crate::config::AppConfig;
use crate::context::TaskLocalViews;
use crate::obs::{GaugeBoard, StatsdClient};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    board: Arc<GaugeBoard>,
    meter: UsageMeter,
    hooks: Vec<Hooks>,
}

impl AppState {
    /// Build state reading the real process counters.
    pub fn new(cfg: AppConfig) -> Result<Self> {
        Self::with_probe(cfg, Arc::new(ProcProbe::new()), Vec::new())
    }

    /// Build state with a custom probe and additional stats clients.
    pub fn with_probe(
        cfg: AppConfig,
        probe: Arc<dyn ResourceProbe>,
        extra: Vec<Arc<dyn StatsClient>>,
    ) -> Result<Self> {
        // 1) Sinks
        let board = Arc::new(GaugeBoard::new());
        let mut fanout = Fanout::new().with(board.clone());

        if let Some(statsd) = &cfg.statsd {
            let client = StatsdClient::from_config(statsd)?;
            tracing::info!(host = %statsd.host, port = statsd.port, "statsd emission enabled");
            fanout = fanout.with(Arc::new(client));
        }
        for client in extra {
            fanout = fanout.with(client);
        }
        let stats: Arc<dyn StatsClient> = Arc::new(fanout);

        // 2) Usage meter, keyed by the view in the task-local context
        let views = Arc::new(TaskLocalViews::new(cfg.views.unresolved.clone()));
        let meter = UsageMeter::new(probe, Arc::clone(&stats), views);

        // 3) Compatibility hooks, outermost first
        let hooks: Vec<Hooks> = vec![
            Arc::new(GraphiteMiddleware::new(Arc::clone(&stats))),
            Arc::new(GraphiteRequestTimingMiddleware::new(Arc::clone(&stats))),
        ];

        Ok(Self {
            inner: Arc::new(AppStateInner { board, meter, hooks }),
        })
    }

    pub fn board(&self) -> Arc<GaugeBoard> {
        Arc::clone(&self.inner.board)
    }

    pub fn meter(&self) -> UsageMeter {
        self.inner.meter.clone()
    }

    pub fn hooks(&self) -> &[Hooks] {
        &self.inner.hooks
    }
}
