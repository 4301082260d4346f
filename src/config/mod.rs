use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::websocket::KeepaliveConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

/// Upgrade endpoint and per-connection timing.
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub ping_period_secs: u64,
    pub pong_wait_secs: u64,
    pub write_wait_secs: u64,
    pub outbound_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    pub enabled: bool,
    pub dir: String,
    pub index: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub filter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
}

impl RelayConfig {
    pub fn keepalive(&self) -> KeepaliveConfig {
        KeepaliveConfig {
            ping_period: Duration::from_secs(self.ping_period_secs),
            pong_wait: Duration::from_secs(self.pong_wait_secs),
            write_wait: Duration::from_secs(self.write_wait_secs),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    environment: &str,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    builder
        .set_default("environment", environment)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("relay.host", "127.0.0.1")?
        .set_default("relay.port", 8080)?
        .set_default("relay.path", "/ws")?
        .set_default("relay.ping_period_secs", 60)?
        .set_default("relay.pong_wait_secs", 70)?
        .set_default("relay.write_wait_secs", 10)?
        .set_default("relay.outbound_capacity", 64)?
        .set_default("assets.enabled", true)?
        .set_default("assets.dir", "./static")?
        .set_default("assets.index", "index.html")?
        .set_default("logging.filter", "info")
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings: Settings = with_defaults(Config::builder(), "development")?
            // Add in settings from the config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_RELAY__PORT=9000` would set `Settings.relay.port`
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults only; no files and no environment.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        with_defaults(Config::builder(), "test")?
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let relay = &self.relay;
        if relay.ping_period_secs == 0 {
            return Err(ConfigError::Message("relay.ping_period_secs must be positive".into()));
        }
        if relay.pong_wait_secs <= relay.ping_period_secs {
            return Err(ConfigError::Message(
                "relay.pong_wait_secs must be greater than relay.ping_period_secs".into(),
            ));
        }
        if relay.write_wait_secs == 0 {
            return Err(ConfigError::Message("relay.write_wait_secs must be positive".into()));
        }
        // room for the color and gameState greeting
        if relay.outbound_capacity < 2 {
            return Err(ConfigError::Message("relay.outbound_capacity must be at least 2".into()));
        }
        if !relay.path.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "relay.path must start with '/', got {:?}",
                relay.path
            )));
        }
        Ok(())
    }
}
