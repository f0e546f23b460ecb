use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Spreadsheet used when `DASHBOARD_SPREADSHEET_ID` is not set.
pub const DEFAULT_SPREADSHEET_ID: &str = "1C_rDL6Y2vFlhxjQZTeOAliQNAGxPY6bUpAkoMv2M_xU";
pub const DEFAULT_SHEET_NAME: &str = "Raw Data";
pub const DEFAULT_REFRESH_MS: u64 = 15_000;
pub const DEFAULT_FEED_BASE_URL: &str = "https://docs.google.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Where the Row Source Adapter reads its rows from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// The long id from the `/d/<ID>/` part of the sheet URL.
    pub spreadsheet_id: String,
    /// Tab name; must match exactly.
    pub sheet_name: String,
    /// Scheme and host of the feed endpoint. Tests point this at a local stub.
    pub base_url: String,
    /// Optional client-side request timeout. `None` leaves it to the transport.
    pub timeout_ms: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            base_url: DEFAULT_FEED_BASE_URL.to_string(),
            timeout_ms: None,
        }
    }
}

impl FeedConfig {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Top-level runtime configuration, read once at startup and passed down
/// explicitly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub feed: FeedConfig,
    /// Polling interval for near-live updates.
    pub refresh_ms: u64,
    /// Address the web API listens on.
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            refresh_ms: DEFAULT_REFRESH_MS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Build the configuration from `DASHBOARD_*` environment variables,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`DashboardConfig::from_env`] but with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let feed = FeedConfig {
            spreadsheet_id: non_empty("DASHBOARD_SPREADSHEET_ID")
                .unwrap_or(defaults.feed.spreadsheet_id),
            sheet_name: non_empty("DASHBOARD_SHEET_NAME").unwrap_or(defaults.feed.sheet_name),
            base_url: non_empty("DASHBOARD_FEED_BASE_URL").unwrap_or(defaults.feed.base_url),
            timeout_ms: non_empty("DASHBOARD_FEED_TIMEOUT_MS")
                .and_then(|raw| parse_millis("DASHBOARD_FEED_TIMEOUT_MS", &raw)),
        };

        Self {
            feed,
            refresh_ms: non_empty("DASHBOARD_REFRESH_MS")
                .and_then(|raw| parse_millis("DASHBOARD_REFRESH_MS", &raw))
                .unwrap_or(defaults.refresh_ms),
            bind_addr: non_empty("DASHBOARD_BIND_ADDR").unwrap_or(defaults.bind_addr),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

fn parse_millis(key: &str, raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: not a whole number of milliseconds");
            None
        }
    }
}
