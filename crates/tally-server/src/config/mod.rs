//! Service config loader (strict YAML, then environment overrides).

pub mod schema;

use std::fs;

use tally_core::error::{Result, TallyError};

pub use schema::{AppConfig, AppSection, CorsSection, LogSection, MetricsSection};

/// Env var naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "TALLY_CONFIG";

/// Load `.env` (if present), the YAML file named by `TALLY_CONFIG` (if set),
/// then apply process environment overrides and validate.
pub fn load() -> Result<AppConfig> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => parse_str(&read(&path)?)?,
        _ => AppConfig::default(),
    };
    cfg.apply_env(std::env::vars())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    load_from_str(&read(path)?)
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg = parse_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn read(path: &str) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| TallyError::Internal(format!("read config failed ({path}): {e}")))
}

fn parse_str(s: &str) -> Result<AppConfig> {
    serde_yaml::from_str(s).map_err(|e| TallyError::BadRequest(format!("invalid yaml: {e}")))
}
