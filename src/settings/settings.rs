use crate::application_port::Mode;
use anyhow::{anyhow, Result};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub mode: Mode, // "debug" or "prod"
    pub keys: Keys,
    pub store: Store,
    pub bus: Bus,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Keys {
    pub private_key_path: String,
    pub public_key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "cache", "redis" or "sqlite"
    pub redis_dsn: String,
    pub sqlite_dsn: String,
}

#[derive(Debug, Deserialize)]
pub struct Bus {
    pub amqp_dsn: String,
    pub queue_name: String,
    pub poll_period_ms: u64,
    pub messages_buffer_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
