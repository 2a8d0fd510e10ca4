//! Statsd line-protocol client over UDP.
//!
//! Best effort: one datagram per call, socket in non-blocking mode, send
//! failures logged at debug and dropped.

use std::net::UdpSocket;
use std::time::Duration;

use viewmeter_core::error::Result;
use viewmeter_core::stats::StatsClient;

use crate::config::StatsdSection;

#[derive(Debug)]
pub struct StatsdClient {
    socket: UdpSocket,
    prefix: Option<String>,
}

impl StatsdClient {
    /// Bind an ephemeral local port and connect it to the statsd daemon.
    pub fn connect(host: &str, port: u16, prefix: Option<String>) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect((host, port))?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, prefix })
    }

    pub fn from_config(cfg: &StatsdSection) -> Result<Self> {
        Self::connect(&cfg.host, cfg.port, cfg.prefix.clone())
    }

    fn key(&self, key: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.to_string(),
        }
    }

    fn send(&self, line: &str) {
        if let Err(e) = self.socket.send(line.as_bytes()) {
            tracing::debug!(error = %e, "statsd send failed");
        }
    }
}

/// Encode a gauge. A leading sign means "adjust" to statsd, so negative
/// absolute values are sent as a reset to zero followed by the decrement.
pub fn gauge_line(key: &str, value: f64) -> String {
    if value < 0.0 {
        format!("{key}:0|g\n{key}:{value}|g")
    } else {
        format!("{key}:{value}|g")
    }
}

pub fn counter_line(key: &str) -> String {
    format!("{key}:1|c")
}

pub fn timing_line(key: &str, elapsed: Duration) -> String {
    format!("{key}:{:.3}|ms", elapsed.as_secs_f64() * 1000.0)
}

impl StatsClient for StatsdClient {
    fn gauge(&self, key: &str, value: f64) {
        self.send(&gauge_line(&self.key(key), value));
    }

    fn incr(&self, key: &str) {
        self.send(&counter_line(&self.key(key)));
    }

    fn timing(&self, key: &str, elapsed: Duration) {
        self.send(&timing_line(&self.key(key), elapsed));
    }
}
