//! Map configuration.
//!
//! Configuration lives in an INI file, by default `~/.ledvfrmap/config.ini`:
//!
//! ```ini
//! [map]
//! led_count = 50
//! refresh_interval_secs = 60
//! display_interval_ms = 500
//! auto_neighbors = 0
//! display = flight_category
//! gust_alert_kt = 25
//! resync_interval_secs = 0
//!
//! [station.KHPN]
//! led = 0
//! latitude = 41.067
//! longitude = -73.707
//! name = Westchester County
//! neighbors = KBDR, KLGA
//! ```
//!
//! Every `[map]` key is optional. Each `[station.CODE]` section needs
//! `led`, `latitude` and `longitude`.

mod defaults;
mod file;
mod parser;

pub use defaults::*;
pub use file::{config_directory, default_config_path, ConfigFileError, MapConfig};
