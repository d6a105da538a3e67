//! Mathematical utilities
//!
//! Rotation-matrix evaluation from quaternion coordinates together with the
//! analytic partial derivatives needed by the constraint Jacobians.

pub mod rotation;

pub use rotation::{rotation_matrix, rotation_matrix_derivative, skew};
