//! Mapping station conditions to LED colors.
//!
//! A [`ColorPolicy`] turns a [`StationSample`] (station, classification and
//! raw observation) into an [`Rgb`]. Two policies cover every display mode:
//!
//! - [`CategoryPolicy`] - VFR green, MVFR blue, IFR red, LIFR magenta,
//!   unknown off.
//! - [`GradientPolicy`] - a scalar [`Metric`] looked up in a [`Gradient`].
//!
//! Policies are trait objects so the display can swap them globally or per
//! station at runtime.

mod gradient;
mod policy;
mod rgb;

pub use gradient::{
    linear_gradient, multi_gradient, Gradient, GradientError, DEFAULT_GRADIENT_STEPS,
};
pub use policy::{
    CategoryPolicy, ColorPolicy, DisplayMode, GradientPolicy, Metric, ParseDisplayModeError,
    StationSample,
};
pub use rgb::{palette, Rgb};
