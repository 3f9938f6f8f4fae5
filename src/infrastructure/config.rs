use crate::application::feed_session::{DEFAULT_RECONNECT_DELAY, DEFAULT_TOPIC, SessionSettings};
use crate::domain::history::DEFAULT_HISTORY_CAPACITY;
use crate::domain::window::DEFAULT_WINDOW_CAPACITY;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://10.79.12.142:8080/iot-websocket";

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub feed: FeedSettings,
    pub window: CapacitySettings,
    pub history: CapacitySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub endpoint: String,
    pub topic: String,
    /// Speak SockJS framing; when false the endpoint is a plain ws:// URL.
    pub sockjs: bool,
    pub reconnect_delay_ms: u64,
    /// Outgoing STOMP heart-beat interval; 0 disables.
    pub heartbeat_ms: u64,
    pub handshake_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CapacitySettings {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub file: String,
}

impl FeedSettings {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            endpoint: self.endpoint.clone(),
            topic: self.topic.clone(),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
        }
    }

    pub fn heartbeat(&self) -> Option<Duration> {
        (self.heartbeat_ms > 0).then(|| Duration::from_millis(self.heartbeat_ms))
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// Host part of the endpoint, for display.
    pub fn server_host(&self) -> String {
        let without_scheme = self
            .endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint);
        let authority = without_scheme.split('/').next().unwrap_or(without_scheme);
        match authority.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host.to_string(),
            _ => authority.to_string(),
        }
    }
}

impl DashboardConfig {
    fn validate(self) -> anyhow::Result<Self> {
        if self.feed.endpoint.trim().is_empty() {
            anyhow::bail!("feed.endpoint must not be empty");
        }
        if self.feed.topic.trim().is_empty() {
            anyhow::bail!("feed.topic must not be empty");
        }
        if self.feed.reconnect_delay_ms == 0 {
            anyhow::bail!("feed.reconnect_delay_ms must be greater than zero");
        }
        if self.window.capacity == 0 {
            anyhow::bail!("window.capacity must be at least 1");
        }
        if self.history.capacity == 0 {
            anyhow::bail!("history.capacity must be at least 1");
        }
        Ok(self)
    }
}

fn builder_with_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("feed.endpoint", DEFAULT_ENDPOINT)?
        .set_default("feed.topic", DEFAULT_TOPIC)?
        .set_default("feed.sockjs", true)?
        .set_default("feed.reconnect_delay_ms", DEFAULT_RECONNECT_DELAY.as_millis() as u64)?
        .set_default("feed.heartbeat_ms", 10_000u64)?
        .set_default("feed.handshake_timeout_ms", 10_000u64)?
        .set_default("window.capacity", DEFAULT_WINDOW_CAPACITY as u64)?
        .set_default("history.capacity", DEFAULT_HISTORY_CAPACITY as u64)?
        .set_default("logging.level", "info")?
        .set_default("logging.file", "windvane.log")?)
}

/// Defaults, then `config/dashboard.*` if present, then `WINDVANE__SECTION__KEY` variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = builder_with_defaults()?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(
            config::Environment::with_prefix("WINDVANE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize::<DashboardConfig>()?.validate()
}
