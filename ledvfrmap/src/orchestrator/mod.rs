//! Map orchestration.
//!
//! # Architecture
//!
//! ```text
//!  ObservationSource ──fetch (blocking thread)──┐
//!                                               ▼
//!   refresh loop ─────── refresh ────► ObservationStore (Arc snapshot swap)
//!   (every ~60 s)                               │
//!                                               ▼ snapshot
//!   display loop ── classify + color ──► DisplaySynchronizer ──► LedDriver
//!   (every ~0.5 s)     per station           update… flush
//! ```
//!
//! Both loops wait on a shared [`CancellationToken`] with their period as
//! timeout. Shutdown cancels them, waits for them to finish, then flushes
//! every LED off.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod config;
mod map;
mod types;

pub use config::OrchestratorConfig;
pub use map::MapOrchestrator;
pub use types::{MapStats, OrchestratorError, StationStatus};
