//! Engine configuration parsed from environment variables.
//!
//! Every key is optional; a missing key takes its default. A key that is
//! present but does not parse is an error rather than a silent fallback.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use crate::consts::{
    DEFAULT_BASE_URL, DEFAULT_CELL_SIZE_PX, DEFAULT_ZOOM_MAX, DEFAULT_ZOOM_MIN, HEARTBEAT_SECS, RECONNECT_MAX_MS,
    RECONNECT_MIN_MS, REQUEST_TIMEOUT_SECS,
};
use crate::feed::FeedConfig;
use crate::viewport::{Viewport, ViewportError, ZoomLimits};

pub const ENV_BASE_URL: &str = "PIXELBOARD_BASE_URL";
pub const ENV_RECONNECT_MIN_MS: &str = "PIXELBOARD_RECONNECT_MIN_MS";
pub const ENV_RECONNECT_MAX_MS: &str = "PIXELBOARD_RECONNECT_MAX_MS";
pub const ENV_HEARTBEAT_SECS: &str = "PIXELBOARD_HEARTBEAT_SECS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PIXELBOARD_REQUEST_TIMEOUT_SECS";
pub const ENV_CELL_SIZE: &str = "PIXELBOARD_CELL_SIZE";
pub const ENV_ZOOM_MIN: &str = "PIXELBOARD_ZOOM_MIN";
pub const ENV_ZOOM_MAX: &str = "PIXELBOARD_ZOOM_MAX";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Parse { key: &'static str, value: String },
    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("invalid base URL {0:?} (expected http:// or https://)")]
    BaseUrl(String),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// HTTP origin of the server, without trailing slash.
    pub base_url: String,
    pub reconnect_min: Duration,
    pub reconnect_max: Duration,
    pub heartbeat_interval: Duration,
    pub request_timeout: Duration,
    pub cell_size: f64,
    pub zoom: ZoomLimits,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            reconnect_min: Duration::from_millis(RECONNECT_MIN_MS),
            reconnect_max: Duration::from_millis(RECONNECT_MAX_MS),
            heartbeat_interval: Duration::from_secs(HEARTBEAT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            cell_size: DEFAULT_CELL_SIZE_PX,
            zoom: ZoomLimits::default(),
        }
    }
}

impl SyncConfig {
    /// Build config from the process environment.
    ///
    /// - `PIXELBOARD_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `PIXELBOARD_RECONNECT_MIN_MS` / `_MAX_MS`: default 1000 / 10000
    /// - `PIXELBOARD_HEARTBEAT_SECS`: default 15
    /// - `PIXELBOARD_REQUEST_TIMEOUT_SECS`: default 10
    /// - `PIXELBOARD_CELL_SIZE`: default 10
    /// - `PIXELBOARD_ZOOM_MIN` / `_MAX`: default 0.1 / 40
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Some(value),
            Err(_) => None,
        })
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let base_url = get(ENV_BASE_URL).unwrap_or(defaults.base_url).trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(base_url));
        }

        let reconnect_min =
            parse_or(get(ENV_RECONNECT_MIN_MS), ENV_RECONNECT_MIN_MS, RECONNECT_MIN_MS).map(Duration::from_millis)?;
        let reconnect_max =
            parse_or(get(ENV_RECONNECT_MAX_MS), ENV_RECONNECT_MAX_MS, RECONNECT_MAX_MS).map(Duration::from_millis)?;
        if reconnect_min.is_zero() {
            return Err(ConfigError::Invalid { key: ENV_RECONNECT_MIN_MS, reason: "must be positive".into() });
        }
        if reconnect_max < reconnect_min {
            return Err(ConfigError::Invalid {
                key: ENV_RECONNECT_MAX_MS,
                reason: format!("must be at least {ENV_RECONNECT_MIN_MS}"),
            });
        }

        let heartbeat_interval =
            parse_or(get(ENV_HEARTBEAT_SECS), ENV_HEARTBEAT_SECS, HEARTBEAT_SECS).map(Duration::from_secs)?;
        if heartbeat_interval.is_zero() {
            return Err(ConfigError::Invalid { key: ENV_HEARTBEAT_SECS, reason: "must be positive".into() });
        }
        let request_timeout = parse_or(get(ENV_REQUEST_TIMEOUT_SECS), ENV_REQUEST_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS)
            .map(Duration::from_secs)?;

        let cell_size = parse_or(get(ENV_CELL_SIZE), ENV_CELL_SIZE, DEFAULT_CELL_SIZE_PX)?;
        let zoom_min = parse_or(get(ENV_ZOOM_MIN), ENV_ZOOM_MIN, DEFAULT_ZOOM_MIN)?;
        let zoom_max = parse_or(get(ENV_ZOOM_MAX), ENV_ZOOM_MAX, DEFAULT_ZOOM_MAX)?;
        let zoom = ZoomLimits::new(zoom_min, zoom_max)?;
        // Validates the cell size.
        Viewport::new(cell_size, zoom)?;

        Ok(Self { base_url, reconnect_min, reconnect_max, heartbeat_interval, request_timeout, cell_size, zoom })
    }

    /// WebSocket endpoint derived from the base URL.
    #[must_use]
    pub fn ws_url(&self) -> String {
        if let Some(rest) = self.base_url.strip_prefix("https://") {
            return format!("wss://{rest}/api/ws");
        }
        let rest = self.base_url.strip_prefix("http://").unwrap_or(&self.base_url);
        format!("ws://{rest}/api/ws")
    }

    #[must_use]
    pub fn cells_url(&self) -> String {
        format!("{}/api/cells", self.base_url)
    }

    #[must_use]
    pub fn feed(&self) -> FeedConfig {
        FeedConfig {
            reconnect_min: self.reconnect_min,
            reconnect_max: self.reconnect_max,
            heartbeat_interval: self.heartbeat_interval,
        }
    }

    /// Fresh viewport with this config's cell size and zoom limits.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError`] when the cell size is not positive.
    pub fn viewport(&self) -> Result<Viewport, ViewportError> {
        Viewport::new(self.cell_size, self.zoom)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|_| ConfigError::Parse { key, value }),
    }
}
