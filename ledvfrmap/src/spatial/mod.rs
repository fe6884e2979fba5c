//! Two-dimensional spatial index for nearest-station queries.
//!
//! [`SpatialIndex`] is a balanced k-d tree built once from a snapshot of
//! points. It answers nearest and k-nearest queries with an iterative
//! branch-and-bound search.
//!
//! # Distance
//!
//! Distances are Euclidean over the two raw coordinate axes. For stations
//! this means degrees of latitude/longitude treated as a flat plane: good
//! enough to pick the closest airport, wrong for anything that needs miles.
//! Use [`crate::geo`] for real distances.
//!
//! # Ties
//!
//! When several points share the minimal distance, the first one reached by
//! the traversal wins (the best-so-far only changes on a strictly smaller
//! distance). The traversal order is fixed by the build order, so repeated
//! queries against the same index always return the same point.
//!
//! # Example
//!
//! ```
//! use ledvfrmap::spatial::SpatialIndex;
//!
//! let index = SpatialIndex::build(vec![
//!     ([7.0, 2.0], "a"),
//!     ([5.0, 4.0], "b"),
//!     ([9.0, 6.0], "c"),
//! ]);
//!
//! let (distance, payload) = index.nearest([7.0, 3.0]).unwrap();
//! assert_eq!(*payload, "a");
//! assert_eq!(distance, 1.0);
//! ```

mod kdtree;

pub use kdtree::{Neighbor, SpatialIndex};
