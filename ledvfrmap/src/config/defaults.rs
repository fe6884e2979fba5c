//! Default configuration values.

/// Seconds between observation refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Milliseconds between display cycles.
pub const DEFAULT_DISPLAY_INTERVAL_MS: u64 = 500;

/// Automatic neighbors per station (disabled).
pub const DEFAULT_AUTO_NEIGHBORS: usize = 0;

/// Prefix of station section names.
pub const STATION_SECTION_PREFIX: &str = "station.";

/// Config directory name under the home directory.
pub const CONFIG_DIR_NAME: &str = ".ledvfrmap";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";
