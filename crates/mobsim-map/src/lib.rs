//! # mobsim-map
//!
//! Cellular coverage for MobSim scenarios.
//!
//! A [`CoverageIndex`] owns the coverage polygons of a scenario map and
//! answers whether a point in the plane is covered. Zones may be concave or
//! even self-intersecting; membership is a deterministic boolean either way,
//! and points on a zone boundary count as covered.
//!
//! ```
//! use mobsim_common::Point;
//! use mobsim_map::CoverageIndex;
//!
//! let mut index = CoverageIndex::new();
//! index.add_zone([(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)].map(Point::from))?;
//!
//! assert!(index.contains(Point::new(5.0, 5.0)));
//! assert!(index.contains(Point::new(10.0, 5.0))); // boundary
//! assert!(!index.contains(Point::new(11.0, 5.0)));
//! # Ok::<(), mobsim_common::SimError>(())
//! ```

mod index;
mod map_file;
mod zone;

pub use index::CoverageIndex;
pub use map_file::MapDefinition;
pub use zone::{CoverageZone, ZoneId};
