//! Hardware driver seam.
//!
//! The synchronizer talks to the strip only through [`LedDriver`]. Drivers
//! own their transport; the synchronizer never sees it.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, trace};

use crate::color::{palette, Rgb};

/// Errors reported by an LED driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// Index past the end of the strip.
    #[error("LED {index} out of range (strip has {len} pixels)")]
    OutOfRange { index: usize, len: usize },

    /// A pixel write failed.
    #[error("failed to write LED {index}: {reason}")]
    Write { index: usize, reason: String },

    /// Showing the frame failed.
    #[error("failed to commit frame: {0}")]
    Commit(String),
}

/// Minimal LED strip interface.
///
/// Writes may block on the bus; the orchestrator calls drivers from a
/// blocking thread.
pub trait LedDriver: Send {
    /// Number of addressable pixels.
    fn pixel_count(&self) -> usize;

    /// Stage one pixel. Not visible until [`commit`](Self::commit).
    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), DriverError>;

    /// Stage a batch of pixels.
    ///
    /// Drivers with a bulk transfer should override this; the default stages
    /// pixels one at a time and stops at the first failure.
    fn set_pixels(&mut self, pixels: &[(usize, Rgb)]) -> Result<(), DriverError> {
        for &(index, color) in pixels {
            self.set_pixel(index, color)?;
        }
        Ok(())
    }

    /// Show everything staged so far.
    fn commit(&mut self) -> Result<(), DriverError>;
}

impl<D: LedDriver + ?Sized> LedDriver for Box<D> {
    fn pixel_count(&self) -> usize {
        (**self).pixel_count()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), DriverError> {
        (**self).set_pixel(index, color)
    }

    fn set_pixels(&mut self, pixels: &[(usize, Rgb)]) -> Result<(), DriverError> {
        (**self).set_pixels(pixels)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        (**self).commit()
    }
}

/// Driver that only logs, for running without hardware.
#[derive(Debug, Clone)]
pub struct LogDriver {
    pixel_count: usize,
    staged: usize,
}

impl LogDriver {
    /// Create a log driver for a strip of `pixel_count` pixels.
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixel_count,
            staged: 0,
        }
    }
}

impl LedDriver for LogDriver {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), DriverError> {
        if index >= self.pixel_count {
            return Err(DriverError::OutOfRange {
                index,
                len: self.pixel_count,
            });
        }
        debug!(led = index, color = %color, "Set pixel");
        self.staged += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        trace!(pixels = self.staged, "Show frame");
        self.staged = 0;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    staged: Vec<Rgb>,
    shown: Vec<Rgb>,
    writes: usize,
    commits: usize,
    fail_writes: bool,
    fail_pixel: Option<usize>,
    fail_commits: bool,
}

/// In-memory strip with write and commit counters.
///
/// Clones share the same buffer, so one handle can be given to the
/// synchronizer while another inspects what was shown.
///
/// # Example
///
/// ```
/// use ledvfrmap::color::palette;
/// use ledvfrmap::display::{LedDriver, MemoryDriver};
///
/// let strip = MemoryDriver::new(3);
/// let mut driver = strip.clone();
/// driver.set_pixel(1, palette::RED).unwrap();
/// driver.commit().unwrap();
///
/// assert_eq!(strip.pixel(1), Some(palette::RED));
/// assert_eq!(strip.write_count(), 1);
/// assert_eq!(strip.commit_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDriver {
    /// Create a strip with every pixel off.
    pub fn new(pixel_count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                staged: vec![palette::OFF; pixel_count],
                shown: vec![palette::OFF; pixel_count],
                ..MemoryState::default()
            })),
        }
    }

    /// Last committed color of a pixel.
    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        self.state.lock().shown.get(index).copied()
    }

    /// All committed colors.
    pub fn shown(&self) -> Vec<Rgb> {
        self.state.lock().shown.clone()
    }

    /// Successful pixel writes so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.state.lock().commits
    }

    /// Make subsequent pixel writes fail.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make writes to one pixel fail, leaving earlier pixels of a batch staged.
    pub fn fail_pixel(&self, index: Option<usize>) {
        self.state.lock().fail_pixel = index;
    }

    /// Make subsequent commits fail.
    pub fn fail_commits(&self, fail: bool) {
        self.state.lock().fail_commits = fail;
    }
}

impl LedDriver for MemoryDriver {
    fn pixel_count(&self) -> usize {
        self.state.lock().staged.len()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.fail_writes || state.fail_pixel == Some(index) {
            return Err(DriverError::Write {
                index,
                reason: "simulated bus error".to_string(),
            });
        }
        let len = state.staged.len();
        let slot = state
            .staged
            .get_mut(index)
            .ok_or(DriverError::OutOfRange { index, len })?;
        *slot = color;
        state.writes += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.fail_commits {
            return Err(DriverError::Commit("simulated bus error".to_string()));
        }
        state.shown = state.staged.clone();
        state.commits += 1;
        Ok(())
    }
}
