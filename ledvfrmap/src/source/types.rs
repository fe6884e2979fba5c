//! Source trait and shared types.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::observation::Observation;

/// Errors fetching observations. Never fatal to the control loop.
#[derive(Debug, Error)]
pub enum FetchError {
    /// I/O failure reading the feed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Feed content could not be parsed.
    #[error("Failed to parse observations: {0}")]
    Parse(#[from] serde_json::Error),

    /// The feed is unreachable or returned nothing usable.
    #[error("Observation feed unavailable: {0}")]
    Unavailable(String),
}

/// Supplier of observations for a set of stations.
///
/// Implementations may block; callers run them on a blocking thread.
pub trait ObservationSource: Send + Sync {
    /// Fetch the latest observation for each requested station.
    ///
    /// Stations the feed does not cover are simply absent from the result.
    fn fetch(&self, station_ids: &[String]) -> Result<HashMap<String, Observation>, FetchError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

impl<S: ObservationSource + ?Sized> ObservationSource for Arc<S> {
    fn fetch(&self, station_ids: &[String]) -> Result<HashMap<String, Observation>, FetchError> {
        (**self).fetch(station_ids)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// In-memory source whose content can be swapped at runtime.
///
/// Clones share state, so a handle kept by the caller can change what the
/// refresh loop sees next.
#[derive(Debug, Clone)]
pub struct StaticSource {
    state: Arc<RwLock<Result<HashMap<String, Observation>, String>>>,
}

impl StaticSource {
    /// Create a source serving `observations`.
    pub fn new(observations: HashMap<String, Observation>) -> Self {
        Self {
            state: Arc::new(RwLock::new(Ok(observations))),
        }
    }

    /// Serve `observations` from now on.
    pub fn set(&self, observations: HashMap<String, Observation>) {
        *self.state.write() = Ok(observations);
    }

    /// Fail every fetch with `reason` until [`set`](Self::set) is called.
    pub fn fail(&self, reason: impl Into<String>) {
        *self.state.write() = Err(reason.into());
    }
}

impl Default for StaticSource {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

impl ObservationSource for StaticSource {
    fn fetch(&self, station_ids: &[String]) -> Result<HashMap<String, Observation>, FetchError> {
        match &*self.state.read() {
            Ok(observations) => Ok(select(observations, station_ids)),
            Err(reason) => Err(FetchError::Unavailable(reason.clone())),
        }
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Keep only the requested stations. An empty request keeps everything.
pub(super) fn select(
    observations: &HashMap<String, Observation>,
    station_ids: &[String],
) -> HashMap<String, Observation> {
    if station_ids.is_empty() {
        return observations.clone();
    }
    station_ids
        .iter()
        .filter_map(|id| observations.get(id).map(|o| (id.clone(), o.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::FlightCategory;

    fn sample() -> HashMap<String, Observation> {
        HashMap::from([
            ("KHPN".to_string(), Observation::new().with_category(FlightCategory::Vfr)),
            ("KBDR".to_string(), Observation::new().with_category(FlightCategory::Ifr)),
        ])
    }

    #[test]
    fn test_static_source_filters_requested() {
        let source = StaticSource::new(sample());
        let result = source.fetch(&["KHPN".to_string(), "KXXX".to_string()]).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("KHPN"));
    }

    #[test]
    fn test_empty_request_returns_everything() {
        let source = StaticSource::new(sample());
        assert_eq!(source.fetch(&[]).unwrap().len(), 2);
    }

    #[test]
    fn test_static_source_failure_and_recovery() {
        let source = StaticSource::new(sample());
        let handle = source.clone();

        handle.fail("feed down");
        let err = source.fetch(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Observation feed unavailable: feed down");

        handle.set(HashMap::new());
        assert!(source.fetch(&[]).unwrap().is_empty());
    }
}
