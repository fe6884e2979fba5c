//! Fixed set of stations, their LED slots and resolved neighbors.
//!
//! The registry is built once at startup and is read-only afterwards, so it
//! can be shared behind an `Arc` without locking.
//!
//! # Build Passes
//!
//! 1. Validate every descriptor and create all [`Station`]s (LED slot range
//!    and uniqueness, unique codes, valid coordinates).
//! 2. Build the [`SpatialIndex`](crate::spatial::SpatialIndex) over station
//!    locations.
//! 3. Resolve declared neighbor codes into station references, or fill in
//!    the nearest stations when auto-neighbors are enabled and none are
//!    declared.

mod error;
mod registry;

pub use error::RegistryError;
pub use registry::{RegistryConfig, Station, StationDescriptor, StationRegistry};
