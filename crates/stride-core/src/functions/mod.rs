//! Constraint functions
//!
//! Each function relates one box to one separating plane and produces either
//! residuals with analytic Jacobians (for the nonlinear view) or a single
//! linearized row usable directly inside a larger QP.
//!
//! - [`BoxAbovePlane`]: residuals/Jacobians for an arbitrary plane
//! - [`BoxAboveFixedPlane`]: plane parameters baked in at construction
//! - [`PlaneBetweenBoxAndObstacle`]: mobile plane whose parameters are QP
//!   variables of the other alternation step
//! - [`FixedBoxPosition`]: equality rows pinning a box to a target

pub mod box_above_plane;
pub mod fixed_box_position;
pub mod plane_between;

pub use box_above_plane::{BoxAboveFixedPlane, BoxAbovePlane};
pub use fixed_box_position::FixedBoxPosition;
pub use plane_between::PlaneBetweenBoxAndObstacle;

use nalgebra::RowVector3;

/// Capability of producing one linearized separation row for a box's
/// 3-column position block: `row · t ≥ lb`.
pub trait LinearizableConstraint {
    /// Lower bound and row coefficients of the linearized constraint,
    /// conservative over all vertices of the box.
    fn fill_lin_cstr(&self, security_distance: f64) -> (f64, RowVector3<f64>);
}
