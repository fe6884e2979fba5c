//! Runtime settings for the map orchestrator.

use std::time::Duration;

use crate::color::DisplayMode;
use crate::config::{MapConfig, DEFAULT_DISPLAY_INTERVAL_MS, DEFAULT_REFRESH_INTERVAL_SECS};

/// Settings for the refresh and display loops.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Time between observation refreshes.
    pub refresh_interval: Duration,
    /// Time between display cycles.
    pub display_interval: Duration,
    /// Default color policy for every station.
    pub display: DisplayMode,
    /// Blink stations gusting at or above this many knots.
    pub gust_alert_kt: Option<f64>,
    /// Force a full LED rewrite this often.
    pub resync_interval: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            display_interval: Duration::from_millis(DEFAULT_DISPLAY_INTERVAL_MS),
            display: DisplayMode::default(),
            gust_alert_kt: None,
            resync_interval: None,
        }
    }
}

impl OrchestratorConfig {
    /// Set the refresh interval.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the display interval.
    pub fn with_display_interval(mut self, interval: Duration) -> Self {
        self.display_interval = interval;
        self
    }

    /// Set the display mode.
    pub fn with_display(mut self, display: DisplayMode) -> Self {
        self.display = display;
        self
    }

    /// Enable the gust alert.
    pub fn with_gust_alert(mut self, knots: f64) -> Self {
        self.gust_alert_kt = Some(knots);
        self
    }

    /// Enable periodic full rewrites.
    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = Some(interval);
        self
    }
}

impl From<&MapConfig> for OrchestratorConfig {
    fn from(config: &MapConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval,
            display_interval: config.display_interval,
            display: config.display,
            gust_alert_kt: config.gust_alert_kt,
            resync_interval: config.resync_interval,
        }
    }
}
