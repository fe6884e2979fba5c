//! LED display synchronization.
//!
//! # Architecture
//!
//! ```text
//! display cycle ──update(led, color, on)──► DisplaySynchronizer
//!                                             │ desired vs applied
//!                                             ▼
//!                         flush ──set_pixels(batch)──► LedDriver
//!                                └─commit (only if changed)─┘
//! ```
//!
//! The synchronizer never depends on the driver's transport. Drivers
//! provided here are [`LogDriver`] for running without hardware and
//! [`MemoryDriver`] for inspection.

mod driver;
mod synchronizer;

pub use driver::{DriverError, LedDriver, LogDriver, MemoryDriver};
pub use synchronizer::{DisplaySynchronizer, FlushReport, LedState};
