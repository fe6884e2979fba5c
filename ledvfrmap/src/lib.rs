//! ledvfrmap - LED aviation weather map
//!
//! Drives an addressable LED strip where each LED is an airport. Stations
//! are colored by flight category (VFR, MVFR, IFR, LIFR), estimated from
//! neighboring stations when a report is incomplete, or by a gradient over
//! temperature or wind.
//!
//! # Modules
//!
//! - [`spatial`] - 2-d tree for nearest-station queries
//! - [`station`] - validated station registry with neighbor resolution
//! - [`observation`] - observation types and the shared snapshot store
//! - [`estimator`] - flight category classification
//! - [`color`] - color policies and gradients
//! - [`display`] - diff-based LED synchronizer and drivers
//! - [`orchestrator`] - refresh and display loops
//! - [`config`] - INI configuration
//! - [`source`] - observation sources
//! - [`traffic`] - aircraft density per station
//! - [`geo`] - great-circle distances
//! - [`logging`] - tracing setup

pub mod color;
pub mod config;
pub mod display;
pub mod estimator;
pub mod geo;
pub mod logging;
pub mod observation;
pub mod orchestrator;
pub mod source;
pub mod spatial;
pub mod station;
pub mod traffic;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
