use std::net::SocketAddr;

use serde::Deserialize;
use viewmeter_core::error::{Result, ViewMeterError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    /// Absent: stats stay in-process (`/metrics`) only.
    #[serde(default)]
    pub statsd: Option<StatsdSection>,

    #[serde(default)]
    pub views: ViewsSection,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ViewMeterError::UnsupportedVersion);
        }

        self.server.validate()?;
        if let Some(statsd) = &self.statsd {
            statsd.validate()?;
        }
        self.views.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            ViewMeterError::BadRequest(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsdSection {
    #[serde(default = "default_statsd_host")]
    pub host: String,

    #[serde(default = "default_statsd_port")]
    pub port: u16,

    /// Prepended to every key as `<prefix>.<key>`.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl StatsdSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ViewMeterError::BadRequest("statsd.host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ViewMeterError::BadRequest("statsd.port must not be 0".into()));
        }
        if let Some(p) = &self.prefix {
            if p.is_empty() || p.starts_with('.') || p.ends_with('.') {
                return Err(ViewMeterError::BadRequest(
                    "statsd.prefix must be non-empty without leading or trailing dots".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_statsd_host() -> String {
    "127.0.0.1".into()
}
fn default_statsd_port() -> u16 {
    8125
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewsSection {
    /// Key segment used when no view is bound to the request (unrouted
    /// requests, or code running outside a request context).
    #[serde(default = "default_unresolved")]
    pub unresolved: String,
}

impl Default for ViewsSection {
    fn default() -> Self {
        Self {
            unresolved: default_unresolved(),
        }
    }
}

impl ViewsSection {
    pub fn validate(&self) -> Result<()> {
        if self.unresolved.is_empty() || self.unresolved.contains(&['.', ':', '|'][..]) {
            return Err(ViewMeterError::BadRequest(
                "views.unresolved must be a single non-empty key segment".into(),
            ));
        }
        Ok(())
    }
}

fn default_unresolved() -> String {
    "unknown".into()
}
