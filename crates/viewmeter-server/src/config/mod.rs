//! Server config loader (strict parsing).

pub mod schema;

use std::fs;

use viewmeter_core::error::{Result, ViewMeterError};

pub use schema::{AppConfig, ServerSection, StatsdSection, ViewsSection};

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let s = fs::read_to_string(path)?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s)
        .map_err(|e| ViewMeterError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
