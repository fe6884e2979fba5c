//! JSON snapshot file source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::{select, FetchError, ObservationSource};
use crate::observation::Observation;

/// Reads observations from a JSON file mapping station codes to
/// observations.
///
/// ```json
/// {
///   "KHPN": { "flight_category": "VFR", "wind_speed_kt": 8 },
///   "KBDR": { "ceiling_ft_agl": 800, "visibility_statute_mi": 2.5 }
/// }
/// ```
///
/// The file is re-read on every fetch, so another process can keep it
/// current.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObservationSource for JsonFileSource {
    fn fetch(&self, station_ids: &[String]) -> Result<HashMap<String, Observation>, FetchError> {
        let content = std::fs::read_to_string(&self.path)?;
        let observations: HashMap<String, Observation> = serde_json::from_str(&content)?;
        debug!(
            path = %self.path.display(),
            observations = observations.len(),
            "Read observation file"
        );
        Ok(select(&observations, station_ids))
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::FlightCategory;
    use tempfile::TempDir;

    #[test]
    fn test_reads_snapshot_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metars.json");
        std::fs::write(
            &path,
            r#"{
                "KHPN": { "flight_category": "MVFR" },
                "KBDR": { "ceiling_ft_agl": 800, "visibility_statute_mi": 2.5 }
            }"#,
        )
        .unwrap();

        let source = JsonFileSource::new(&path);
        let observations = source.fetch(&["KHPN".to_string(), "KBDR".to_string()]).unwrap();
        assert_eq!(
            observations["KHPN"].flight_category,
            Some(FlightCategory::Mvfr)
        );
        assert_eq!(observations["KBDR"].ceiling_ft_agl, Some(800.0));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = JsonFileSource::new(temp_dir.path().join("missing.json"));
        assert!(matches!(source.fetch(&[]), Err(FetchError::Io(_))));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileSource::new(path).fetch(&[]),
            Err(FetchError::Parse(_))
        ));
    }
}
