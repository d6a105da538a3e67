//! Mobile separating plane between a box and an obstacle
//!
//! Unlike [`super::BoxAboveFixedPlane`], the plane parameters here are
//! decision variables of the other alternation step. During the
//! boxes-variable step they are read out of the flattened plane-parameter
//! vector and treated as constants, which makes the separation constraint
//! affine in the box position.

use nalgebra::{RowVector3, Vector3};

use crate::geometry::{Cuboid, Obstacle};

use super::LinearizableConstraint;

/// Separation constraint between one mobile box and one obstacle through a
/// plane with given current parameters (d, n)
#[derive(Debug, Clone)]
pub struct PlaneBetweenBoxAndObstacle<'a> {
    cuboid: &'a Cuboid,
    plan_d: f64,
    plan_n: Vector3<f64>,
}

impl<'a> PlaneBetweenBoxAndObstacle<'a> {
    pub fn new(cuboid: &'a Cuboid, plan_d: f64, plan_n: Vector3<f64>) -> Self {
        Self {
            cuboid,
            plan_d,
            plan_n,
        }
    }

    /// Recompute the plane offset so the plane sits just clear of the
    /// obstacle along the current normal:
    ///
    /// ```text
    /// d = max_i n·(c_obs + v_i) + security
    /// ```
    ///
    /// Called once per outer iteration after the planes-variable solve.
    pub fn update_plan_d(obstacle: &Obstacle, plan_n: &Vector3<f64>, security_distance: f64) -> f64 {
        let support = obstacle
            .vertices()
            .iter()
            .map(|v| plan_n.dot(&(obstacle.center() + v)))
            .fold(f64::NEG_INFINITY, f64::max);

        support + security_distance
    }
}

impl LinearizableConstraint for PlaneBetweenBoxAndObstacle<'_> {
    /// One affine row in the box position: `n · t ≥ d + security - min_i n·v_i`
    fn fill_lin_cstr(&self, security_distance: f64) -> (f64, RowVector3<f64>) {
        let min_support = self
            .cuboid
            .vertices()
            .iter()
            .map(|v| self.plan_n.dot(v))
            .fold(f64::INFINITY, f64::min);

        let lb = self.plan_d + security_distance - min_support;
        (lb, self.plan_n.transpose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_update_plan_d_unit_cube() {
        let obstacle = Obstacle::new(
            Cuboid::unit_cube(Vector3::new(0.0, 0.0, -1.0), 0, true),
            false,
        );
        let n = Vector3::new(0.0, 0.0, 1.0);

        let d = PlaneBetweenBoxAndObstacle::update_plan_d(&obstacle, &n, 0.05);

        // Obstacle top face is at z = -0.5
        assert_relative_eq!(d, -0.45, epsilon = 1e-12);
    }

    #[test]
    fn test_fill_lin_cstr_keeps_box_clear() {
        let cuboid = Cuboid::unit_cube(Vector3::zeros(), 1, false);
        let n = Vector3::new(0.0, 0.0, 1.0);
        let plan_d = -0.45;
        let security = 0.05;

        let fct = PlaneBetweenBoxAndObstacle::new(&cuboid, plan_d, n);
        let (lb, row) = fct.fill_lin_cstr(security);

        assert_relative_eq!(row.transpose(), n, epsilon = 1e-12);
        // min_i n·v_i = -0.5 for the unit cube, so the box center must sit
        // at z >= 0.1 for the bottom face to clear the plane by `security`
        assert_relative_eq!(lb, 0.1, epsilon = 1e-12);

        let pos = Vector3::new(0.3, -0.2, lb);
        let lowest_vertex = pos.z - 0.5;
        assert_relative_eq!(lowest_vertex - plan_d, security, epsilon = 1e-12);
    }
}
