//! Observation sources.
//!
//! A source turns some upstream feed into a station → [`Observation`] map.
//! The refresh loop treats it as a blocking black box and runs it off the
//! async runtime.
//!
//! [`Observation`]: crate::observation::Observation

mod json;
mod types;

pub use json::JsonFileSource;
pub use types::{FetchError, ObservationSource, StaticSource};
