//! Weather observations and the shared observation cache.
//!
//! # Architecture
//!
//! ```text
//! ObservationSource ──fetch──► refresh task ──refresh()──► ObservationStore
//!                                                            │
//!                              display task ◄──snapshot()────┘
//! ```
//!
//! The store swaps a whole [`ObservationSnapshot`] at a time. Readers take an
//! `Arc` to the current snapshot and keep reading it even while a refresh
//! installs the next one, so nobody ever sees a half-written set.

mod store;
mod types;

pub use store::{ObservationLookup, ObservationSnapshot, ObservationStore};
pub use types::{FlightCategory, Observation, ParseCategoryError, CLEAR_SKY_COVER};
