//! Box-above-plane constraint functions
//!
//! For a box with local vertices vᵢ, translation t and quaternion
//! coordinates q, the signed clearance of vertex i from a plane (n, d) is
//!
//! ```text
//! residual_i(t, q) = n · (R(q) vᵢ + t) - d
//! ```
//!
//! positive when the vertex lies above the plane. The Jacobians are
//!
//! ```text
//! ∂residual_i/∂t   = nᵀ
//! ∂residual_i/∂q_k = n · (∂R/∂q_k) vᵢ
//! ```
//!
//! with ∂R/∂q_k the coordinate-wise analytic derivative from
//! [`crate::math::rotation`].

use nalgebra::{RowVector3, RowVector4, SMatrix, SVector, Vector3, Vector4};

use crate::geometry::{Cuboid, FixedPlane};
use crate::math::rotation::{rotation_matrix, rotation_matrix_derivative};

use super::LinearizableConstraint;

/// Number of vertices of a box
pub const NUM_VERTICES: usize = 8;

/// Residuals and Jacobians of one box against an arbitrary plane
#[derive(Debug, Clone)]
pub struct BoxAbovePlane {
    cuboid: Cuboid,
}

impl BoxAbovePlane {
    pub fn new(cuboid: Cuboid) -> Self {
        debug_assert_eq!(cuboid.vertices().len(), NUM_VERTICES);
        Self { cuboid }
    }

    pub fn cuboid(&self) -> &Cuboid {
        &self.cuboid
    }

    /// Signed clearance of every vertex from the plane, in vertex order
    pub fn compute(
        &self,
        normal: &Vector3<f64>,
        d: f64,
        trans: &Vector3<f64>,
        quat: &Vector4<f64>,
    ) -> SVector<f64, NUM_VERTICES> {
        let r = rotation_matrix(quat);
        SVector::from_fn(|i, _| {
            let v = &self.cuboid.vertices()[i];
            normal.dot(&(r * v + trans)) - d
        })
    }

    /// 8x3 Jacobian of the residuals with respect to the translation
    ///
    /// Every row equals the plane normal; the signature mirrors the rotated
    /// case so callers can treat both Jacobians uniformly.
    pub fn diff_trans(
        &self,
        normal: &Vector3<f64>,
        _trans: &Vector3<f64>,
        _quat: &Vector4<f64>,
    ) -> SMatrix<f64, NUM_VERTICES, 3> {
        SMatrix::from_fn(|_, j| normal[j])
    }

    /// 8x4 Jacobian of the residuals with respect to the quaternion
    /// coordinates
    pub fn diff_quat(
        &self,
        normal: &Vector3<f64>,
        _trans: &Vector3<f64>,
        quat: &Vector4<f64>,
    ) -> SMatrix<f64, NUM_VERTICES, 4> {
        let dr: [_; 4] = core::array::from_fn(|k| rotation_matrix_derivative(quat, k));
        SMatrix::from_fn(|i, k| {
            let v = &self.cuboid.vertices()[i];
            normal.dot(&(dr[k] * v))
        })
    }

    /// Translation Jacobian row of a single vertex
    pub fn diff_trans_row(
        &self,
        normal: &Vector3<f64>,
        _trans: &Vector3<f64>,
        _quat: &Vector4<f64>,
        _index: usize,
    ) -> RowVector3<f64> {
        normal.transpose()
    }

    /// Quaternion Jacobian row of a single vertex
    pub fn diff_quat_row(
        &self,
        normal: &Vector3<f64>,
        _trans: &Vector3<f64>,
        quat: &Vector4<f64>,
        index: usize,
    ) -> RowVector4<f64> {
        let v = &self.cuboid.vertices()[index];
        RowVector4::from_fn(|_, k| {
            normal.dot(&(rotation_matrix_derivative(quat, k) * v))
        })
    }
}

/// Box-above-plane constraint bound to a pre-computed, immutable plane
#[derive(Debug, Clone)]
pub struct BoxAboveFixedPlane {
    base: BoxAbovePlane,
    normal: Vector3<f64>,
    d: f64,
}

impl BoxAboveFixedPlane {
    pub fn new(cuboid: Cuboid, normal: Vector3<f64>, d: f64) -> Self {
        Self {
            base: BoxAbovePlane::new(cuboid),
            normal: normal.normalize(),
            d,
        }
    }

    pub fn from_plane(cuboid: Cuboid, plane: &FixedPlane) -> Self {
        Self::new(cuboid, *plane.normal(), plane.d())
    }

    pub fn cuboid(&self) -> &Cuboid {
        self.base.cuboid()
    }

    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    pub fn d(&self) -> f64 {
        self.d
    }

    /// Signed clearance of every vertex from the fixed plane
    pub fn compute(&self, trans: &Vector3<f64>, quat: &Vector4<f64>) -> SVector<f64, NUM_VERTICES> {
        self.base.compute(&self.normal, self.d, trans, quat)
    }

    /// 8x3 translation Jacobian
    pub fn diff_trans(
        &self,
        trans: &Vector3<f64>,
        quat: &Vector4<f64>,
    ) -> SMatrix<f64, NUM_VERTICES, 3> {
        self.base.diff_trans(&self.normal, trans, quat)
    }

    /// 8x4 quaternion Jacobian
    pub fn diff_quat(
        &self,
        trans: &Vector3<f64>,
        quat: &Vector4<f64>,
    ) -> SMatrix<f64, NUM_VERTICES, 4> {
        self.base.diff_quat(&self.normal, trans, quat)
    }

    /// Translation Jacobian row of vertex `index`
    pub fn diff_trans_row(
        &self,
        trans: &Vector3<f64>,
        quat: &Vector4<f64>,
        index: usize,
    ) -> RowVector3<f64> {
        self.base.diff_trans_row(&self.normal, trans, quat, index)
    }

    /// Quaternion Jacobian row of vertex `index`
    pub fn diff_quat_row(
        &self,
        trans: &Vector3<f64>,
        quat: &Vector4<f64>,
        index: usize,
    ) -> RowVector4<f64> {
        self.base.diff_quat_row(&self.normal, trans, quat, index)
    }
}

impl LinearizableConstraint for BoxAboveFixedPlane {
    /// One affine row in the box's translation: `n · t ≥ lb` with
    /// `lb = d + security - min_i n·v_i`, so that every vertex of the
    /// axis-aligned box clears the plane by the security distance.
    fn fill_lin_cstr(&self, security_distance: f64) -> (f64, RowVector3<f64>) {
        let min_support = self
            .cuboid()
            .vertices()
            .iter()
            .map(|v| self.normal.dot(v))
            .fold(f64::INFINITY, f64::min);

        let lb = self.d + security_distance - min_support;
        (lb, self.normal.transpose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn test_plane_fct() -> BoxAboveFixedPlane {
        let cuboid = Cuboid::from_half_extents(
            Vector3::new(0.3, 0.2, 0.1),
            Vector3::zeros(),
            0,
            false,
        );
        BoxAboveFixedPlane::new(cuboid, Vector3::new(0.1, -0.3, 1.0), 0.25)
    }

    fn random_unit_quat(rng: &mut StdRng) -> Vector4<f64> {
        let q = Vector4::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        q / q.norm()
    }

    #[test]
    fn test_compute_at_identity() {
        let fct = test_plane_fct();
        let res = fct.compute(&Vector3::zeros(), &Vector4::new(1.0, 0.0, 0.0, 0.0));

        // At t = 0, q = identity, residuals are exactly n·v_i - d
        for (i, v) in fct.cuboid().vertices().iter().enumerate() {
            assert_relative_eq!(res[i], fct.normal().dot(v) - fct.d(), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_compute_translation_shift() {
        let fct = test_plane_fct();
        let q = Vector4::new(1.0, 0.0, 0.0, 0.0);

        let base = fct.compute(&Vector3::zeros(), &q);
        let shifted = fct.compute(&Vector3::new(0.0, 0.0, 1.0), &q);

        // Translating along z shifts every residual by n_z
        for i in 0..NUM_VERTICES {
            assert_relative_eq!(shifted[i] - base[i], fct.normal().z, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_diff_trans_rows_equal_normal() {
        let fct = test_plane_fct();
        let t = Vector3::new(0.5, -0.2, 1.3);
        let q = Vector4::new(0.9, 0.1, -0.3, 0.27).normalize();

        let jac = fct.diff_trans(&t, &q);
        for i in 0..NUM_VERTICES {
            assert_relative_eq!(jac.row(i).transpose(), *fct.normal(), epsilon = 1e-12);
            assert_relative_eq!(
                fct.diff_trans_row(&t, &q, i),
                jac.row(i).into_owned(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_diff_trans_finite_difference() {
        let mut rng = StdRng::seed_from_u64(7);
        let fct = test_plane_fct();
        let h = 1e-6;

        for _ in 0..5 {
            let t = Vector3::new(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
            );
            let q = random_unit_quat(&mut rng);
            let jac = fct.diff_trans(&t, &q);

            for j in 0..3 {
                let mut tp = t;
                let mut tm = t;
                tp[j] += h;
                tm[j] -= h;
                let fd = (fct.compute(&tp, &q) - fct.compute(&tm, &q)) / (2.0 * h);
                for i in 0..NUM_VERTICES {
                    assert_relative_eq!(jac[(i, j)], fd[i], epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_diff_quat_finite_difference() {
        let mut rng = StdRng::seed_from_u64(13);
        let fct = test_plane_fct();
        let h = 1e-6;

        for _ in 0..5 {
            let t = Vector3::new(
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
                rng.gen_range(-2.0..2.0),
            );
            let q = random_unit_quat(&mut rng);
            let jac = fct.diff_quat(&t, &q);

            for k in 0..4 {
                let mut qp = q;
                let mut qm = q;
                qp[k] += h;
                qm[k] -= h;
                let fd = (fct.compute(&t, &qp) - fct.compute(&t, &qm)) / (2.0 * h);
                for i in 0..NUM_VERTICES {
                    assert_relative_eq!(jac[(i, k)], fd[i], epsilon = 1e-5);
                }
            }
        }
    }

    #[test]
    fn test_diff_quat_single_row_matches_full() {
        let fct = test_plane_fct();
        let t = Vector3::new(0.1, 0.2, 0.3);
        let q = Vector4::new(0.7, -0.1, 0.5, 0.2).normalize();

        let full = fct.diff_quat(&t, &q);
        for i in 0..NUM_VERTICES {
            assert_relative_eq!(
                fct.diff_quat_row(&t, &q, i),
                full.row(i).into_owned(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_fill_lin_cstr_conservative() {
        let fct = test_plane_fct();
        let security = 0.05;
        let (lb, row) = fct.fill_lin_cstr(security);

        assert_relative_eq!(row.transpose(), *fct.normal(), epsilon = 1e-12);

        // Any translation satisfying the row keeps every vertex clear
        let t = Vector3::new(0.0, 0.0, lb / fct.normal().z + 0.01);
        assert!((row * t)[0] >= lb);
        let res = fct.compute(&t, &Vector4::new(1.0, 0.0, 0.0, 0.0));
        for i in 0..NUM_VERTICES {
            assert!(res[i] >= security - 1e-9);
        }
    }
}
