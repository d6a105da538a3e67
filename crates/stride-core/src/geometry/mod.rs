//! Geometric primitives
//!
//! Boxes, obstacles and fixed separating planes. All primitives are
//! immutable after construction; the planner only ever reads them.

pub mod cuboid;
pub mod fixed_plane;

pub use cuboid::{Cuboid, Obstacle, INITIAL_BOX_INDEX};
pub use fixed_plane::FixedPlane;
