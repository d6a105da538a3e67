//! Rotation matrices from quaternion coordinates
//!
//! The planner carries orientations as raw 4-vectors q = (w, x, y, z) so that
//! constraint Jacobians can be taken with respect to each component
//! independently. For a quaternion with vector part v = (x, y, z):
//!
//! ```text
//! R(q) = (w² - v·v) I + 2 v vᵀ + 2 w [v]×
//! ```
//!
//! which reduces to the usual rotation matrix when ‖q‖ = 1. The partial
//! derivatives below differentiate this expression coordinate-wise, which is
//! exactly what a finite-difference check of the residual functions recovers.

use nalgebra::{Matrix3, Vector3, Vector4};

/// Skew-symmetric matrix from vector (hat operator)
///
/// For v = [x, y, z]ᵀ:
/// ```text
/// [v]× = [ 0  -z   y]
///        [ z   0  -x]
///        [-y   x   0]
/// ```
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// Rotation matrix R(q) from quaternion coordinates q = (w, x, y, z)
///
/// Valid rotation for unit q; for non-unit q this is the homogeneous
/// quadratic form whose coordinate-wise derivatives
/// [`rotation_matrix_derivative`] returns.
pub fn rotation_matrix(q: &Vector4<f64>) -> Matrix3<f64> {
    let w = q[0];
    let v = Vector3::new(q[1], q[2], q[3]);

    (w * w - v.dot(&v)) * Matrix3::identity()
        + 2.0 * v * v.transpose()
        + 2.0 * w * skew(&v)
}

/// Partial derivative ∂R/∂q_k of [`rotation_matrix`] for component k ∈ 0..4
///
/// With e_k the k-th basis vector of the vector part:
/// ```text
/// ∂R/∂w   = 2w I + 2 [v]×
/// ∂R/∂v_k = -2 v_k I + 2 (e_k vᵀ + v e_kᵀ) + 2w [e_k]×
/// ```
pub fn rotation_matrix_derivative(q: &Vector4<f64>, k: usize) -> Matrix3<f64> {
    let w = q[0];
    let v = Vector3::new(q[1], q[2], q[3]);

    if k == 0 {
        return 2.0 * w * Matrix3::identity() + 2.0 * skew(&v);
    }

    let mut e = Vector3::zeros();
    e[k - 1] = 1.0;

    -2.0 * v[k - 1] * Matrix3::identity()
        + 2.0 * (e * v.transpose() + v * e.transpose())
        + 2.0 * w * skew(&e)
}

/// Rotate a vector by quaternion coordinates
///
/// p' = R(q) p
pub fn rotate_vector(q: &Vector4<f64>, p: &Vector3<f64>) -> Vector3<f64> {
    rotation_matrix(q) * p
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn quat_from_axis_angle(axis: Vector3<f64>, angle: f64) -> Vector4<f64> {
        let a = axis.normalize() * (angle / 2.0).sin();
        Vector4::new((angle / 2.0).cos(), a.x, a.y, a.z)
    }

    #[test]
    fn test_skew_symmetric() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let s = skew(&v);

        assert_relative_eq!(s, -s.transpose(), epsilon = 1e-12);
        assert_relative_eq!(s * v, Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_identity_quaternion() {
        let q = Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(rotation_matrix(&q), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_matrix_orthogonal() {
        let q = quat_from_axis_angle(Vector3::new(1.0, 1.0, 1.0), 1.0);
        let r = rotation_matrix(&q);

        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-10);
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_rotation_90deg_z() {
        let q = quat_from_axis_angle(Vector3::new(0.0, 0.0, 1.0), PI / 2.0);
        let p = rotate_vector(&q, &Vector3::new(1.0, 0.0, 0.0));

        // x-axis maps to y-axis
        assert_relative_eq!(p, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-10);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let q = quat_from_axis_angle(Vector3::new(0.3, -1.0, 0.5), 0.8);
        let h = 1e-6;

        for k in 0..4 {
            let mut qp = q;
            let mut qm = q;
            qp[k] += h;
            qm[k] -= h;

            let fd = (rotation_matrix(&qp) - rotation_matrix(&qm)) / (2.0 * h);
            let analytic = rotation_matrix_derivative(&q, k);

            assert_relative_eq!(analytic, fd, epsilon = 1e-6);
        }
    }
}
