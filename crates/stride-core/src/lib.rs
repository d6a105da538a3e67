//! # Stride Core
//!
//! Geometry and constraint-function layer for sequential box-pose planning.
//!
//! A plan is a sequence of rigid boxes (supports/footsteps) that must stay
//! separated from a set of box-shaped obstacles by planes. Each adjacent pair
//! of boxes shares one separating plane with the obstacle below it. This
//! crate provides the pieces the QP-formulation layer is built from:
//!
//! - [`math`]: quaternion/rotation-matrix evaluation and analytic derivatives
//! - [`geometry`]: boxes ([`Cuboid`]), obstacles and fixed separating planes
//! - [`functions`]: constraint functions with residuals, Jacobians and
//!   linearized QP rows
//! - [`problem`]: the read-only problem container consumed by the planner

pub mod functions;
pub mod geometry;
pub mod math;
pub mod problem;

pub use geometry::{Cuboid, FixedPlane, Obstacle, INITIAL_BOX_INDEX};
pub use problem::{CostFunction, PathSmoothnessCost, Plan, ProblemError, TrajectoryProblem};

// Common type aliases
use nalgebra::{Matrix3, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 4-component quaternion coordinate vector, ordered (w, x, y, z)
pub type QuatVec = Vector4<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;
