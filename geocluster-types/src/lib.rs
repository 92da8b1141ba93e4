//! # geocluster-types
//!
//! Value types exchanged between the `geocluster` engine and its collaborators:
//!
//! - **Points**: `MarkerPoint`, `PointId`, `Properties`
//! - **Bounds**: `GeoBounds`, a west/south/east/north rectangle that may wrap
//!   the antimeridian
//! - **Viewport**: `Viewport`, the visible bounds plus the map zoom
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use geocluster_types::bbox::GeoBounds;
//! use geocluster_types::point::{MarkerPoint, PointId};
//!
//! let cafe = MarkerPoint::new(PointId::from(7), -122.4194, 37.7749);
//! let bounds = GeoBounds::new(-123.0, 37.0, -122.0, 38.0);
//! assert!(bounds.contains(cafe.position()));
//! ```

pub mod bbox;
pub mod point;
pub mod viewport;
