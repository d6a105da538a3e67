//! Fixed separating planes
//!
//! A plane `normal·x = d` computed once (e.g. from a previous alternation
//! round) and held constant for the lifetime of the constraint functions
//! referring to it.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Separating plane with constant parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedPlane {
    normal: Vector3<f64>,
    d: f64,
}

impl FixedPlane {
    /// Create a plane `normal·x = d`; the normal is normalized on entry
    pub fn new(normal: Vector3<f64>, d: f64) -> Self {
        Self {
            normal: normal.normalize(),
            d,
        }
    }

    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    pub fn d(&self) -> f64 {
        self.d
    }

    /// Signed distance of a point from the plane (positive = above)
    pub fn signed_distance(&self, point: &Vector3<f64>) -> f64 {
        self.normal.dot(point) - self.d
    }
}
