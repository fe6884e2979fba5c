//! Diff-based LED synchronizer.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::color::{palette, Rgb};

use super::driver::{DriverError, LedDriver};

/// Logical state of one LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedState {
    /// Color shown while on.
    pub color: Rgb,
    /// Whether the LED is lit.
    pub on: bool,
}

impl LedState {
    /// Create a state.
    pub fn new(color: Rgb, on: bool) -> Self {
        Self { color, on }
    }

    /// What the hardware should show. Off LEDs are black whatever their
    /// logical color.
    pub fn hardware_color(&self) -> Rgb {
        if self.on {
            self.color
        } else {
            palette::OFF
        }
    }
}

/// Outcome of a successful flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Pixels written to the driver.
    pub written: usize,
    /// Whether a commit was issued.
    pub committed: bool,
    /// Whether this was a forced full rewrite.
    pub resync: bool,
}

/// Keeps the strip in step with the desired per-LED state while writing
/// only what changed.
///
/// # State per LED
///
/// ```text
///            update + flush
///   Unset ───────────────────► Applied
///                               │   ▲
///          update (different)   │   │ flush
///                               ▼   │
///                              Pending
/// ```
///
/// An update equal to the last applied state clears any pending write for
/// that LED. `flush` writes every pending LED in one batch and then commits
/// once; nothing pending means no writes and no commit. When the driver
/// fails, the desired state and pending set are kept and retried on the
/// next flush.
#[derive(Debug)]
pub struct DisplaySynchronizer<D> {
    driver: D,
    desired: Vec<Option<LedState>>,
    applied: Vec<Option<LedState>>,
    pending: BTreeSet<usize>,
    resync_interval: Option<Duration>,
    last_full_write: Option<Instant>,
}

impl<D: LedDriver> DisplaySynchronizer<D> {
    /// Wrap a driver. Every LED starts unset.
    pub fn new(driver: D) -> Self {
        let len = driver.pixel_count();
        Self {
            driver,
            desired: vec![None; len],
            applied: vec![None; len],
            pending: BTreeSet::new(),
            resync_interval: None,
            last_full_write: None,
        }
    }

    /// Rewrite every set LED once this much time has passed since the last
    /// full write.
    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = Some(interval).filter(|i| !i.is_zero());
        self
    }

    /// Number of LEDs managed.
    pub fn len(&self) -> usize {
        self.desired.len()
    }

    /// Whether the strip has no LEDs.
    pub fn is_empty(&self) -> bool {
        self.desired.is_empty()
    }

    /// Record the desired state of one LED. Touches no hardware.
    pub fn update(&mut self, index: usize, color: Rgb, on: bool) -> Result<(), DriverError> {
        let len = self.desired.len();
        let slot = self
            .desired
            .get_mut(index)
            .ok_or(DriverError::OutOfRange { index, len })?;
        let state = LedState::new(color, on);
        *slot = Some(state);

        if self.applied[index] == Some(state) {
            self.pending.remove(&index);
        } else {
            self.pending.insert(index);
        }
        Ok(())
    }

    /// Set the on flag of every LED that has a state, keeping colors.
    pub fn set_all_on(&mut self, on: bool) {
        for index in 0..self.desired.len() {
            if let Some(state) = self.desired[index] {
                // Index comes from our own range
                let _ = self.update(index, state.color, on);
            }
        }
    }

    /// Turn every LED off. Takes effect on the next flush.
    ///
    /// LEDs never set are set to off so the whole strip goes dark.
    pub fn all_off(&mut self) {
        for index in 0..self.desired.len() {
            let color = self.desired[index].map_or(palette::OFF, |s| s.color);
            let _ = self.update(index, color, false);
        }
    }

    /// Flush using the current time.
    pub fn flush(&mut self) -> Result<FlushReport, DriverError> {
        self.flush_at(Instant::now())
    }

    /// Write pending LEDs and commit once if anything changed.
    pub fn flush_at(&mut self, now: Instant) -> Result<FlushReport, DriverError> {
        let resync = self.resync_due(now);
        let targets: Vec<usize> = if resync {
            (0..self.desired.len())
                .filter(|&i| self.desired[i].is_some())
                .collect()
        } else {
            self.pending.iter().copied().collect()
        };

        if targets.is_empty() {
            trace!("Nothing to flush");
            if resync || self.last_full_write.is_none() {
                self.last_full_write = Some(now);
            }
            return Ok(FlushReport {
                resync,
                ..FlushReport::default()
            });
        }

        let writes: Vec<(usize, Rgb)> = targets
            .iter()
            .filter_map(|&i| self.desired[i].map(|s| (i, s.hardware_color())))
            .collect();

        if let Err(e) = self.driver.set_pixels(&writes).and_then(|_| self.driver.commit()) {
            warn!(pending = self.pending.len(), error = %e, "Flush failed, will retry");
            return Err(e);
        }

        for &index in &targets {
            self.applied[index] = self.desired[index];
        }
        self.pending.clear();
        if resync || self.last_full_write.is_none() {
            self.last_full_write = Some(now);
        }

        debug!(written = writes.len(), resync, "Flushed LEDs");
        Ok(FlushReport {
            written: writes.len(),
            committed: true,
            resync,
        })
    }

    fn resync_due(&self, now: Instant) -> bool {
        match (self.resync_interval, self.last_full_write) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
            _ => false,
        }
    }

    /// Desired state of an LED.
    pub fn desired(&self, index: usize) -> Option<LedState> {
        self.desired.get(index).copied().flatten()
    }

    /// Last state successfully flushed for an LED.
    pub fn applied(&self, index: usize) -> Option<LedState> {
        self.applied.get(index).copied().flatten()
    }

    /// Number of LEDs waiting for a flush.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The wrapped driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
