//! Boxes and obstacles
//!
//! A [`Cuboid`] is a rigid box described by its center and eight local
//! vertex offsets. Boxes in the plan are identified by their position in the
//! global box list; index -1 denotes the fixed initial pose, which carries
//! no decision variables.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Index of the fixed initial pose in box references
pub const INITIAL_BOX_INDEX: isize = -1;

/// Rigid oriented box defined by a center and fixed local vertex offsets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cuboid {
    center: Vector3<f64>,
    vertices: Vec<Vector3<f64>>,
    index: isize,
    fixed: bool,
}

impl Cuboid {
    /// Create a box from half-extents, with the eight vertices of
    /// `[-hx, hx] × [-hy, hy] × [-hz, hz]` in the local frame.
    pub fn from_half_extents(
        half_extents: Vector3<f64>,
        center: Vector3<f64>,
        index: isize,
        fixed: bool,
    ) -> Self {
        let h = half_extents;
        let mut vertices = Vec::with_capacity(8);
        for &sx in &[-1.0, 1.0] {
            for &sy in &[-1.0, 1.0] {
                for &sz in &[-1.0, 1.0] {
                    vertices.push(Vector3::new(sx * h.x, sy * h.y, sz * h.z));
                }
            }
        }
        Self {
            center,
            vertices,
            index,
            fixed,
        }
    }

    /// Unit cube (half-extent 0.5 in every direction)
    pub fn unit_cube(center: Vector3<f64>, index: isize, fixed: bool) -> Self {
        Self::from_half_extents(Vector3::new(0.5, 0.5, 0.5), center, index, fixed)
    }

    /// Local vertex offsets, in a fixed order
    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    /// Center point in the local parent frame
    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }

    /// Position of this box in the global box list; -1 is the initial pose
    pub fn index(&self) -> isize {
        self.index
    }

    /// Whether the box position is pinned (no decision variables contribute
    /// constraint rows for it)
    pub fn fixed(&self) -> bool {
        self.fixed
    }
}

/// Box-shaped obstacle region
///
/// Virtual obstacles may be relaxed at a distinct, typically higher, penalty
/// than real ones; the flag selects which relaxation column their constraint
/// rows are wired to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    shape: Cuboid,
    is_virtual: bool,
}

impl Obstacle {
    pub fn new(shape: Cuboid, is_virtual: bool) -> Self {
        Self { shape, is_virtual }
    }

    pub fn shape(&self) -> &Cuboid {
        &self.shape
    }

    pub fn center(&self) -> &Vector3<f64> {
        self.shape.center()
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        self.shape.vertices()
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }
}
