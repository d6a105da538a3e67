//! Final-position lock
//!
//! Produces the three equality-style rows pinning a box's position block to
//! a target point, written with identical lower and upper bounds.

use nalgebra::{Matrix3, Vector3};

/// Equality rows `l = C·t = u` with `C = I` and `l = u = target`
#[derive(Debug, Clone)]
pub struct FixedBoxPosition;

impl FixedBoxPosition {
    /// Rows, lower bounds and upper bounds locking a box to `target`
    pub fn fill_lin_cstr(target: &Vector3<f64>) -> (Vector3<f64>, Matrix3<f64>, Vector3<f64>) {
        (*target, Matrix3::identity(), *target)
    }
}
