//! Dense QP problem representation
//!
//! Standard form consumed by the solver:
//!
//! ```text
//! minimize    1/2 xᵀAx + cᵀx
//! subject to  l ≤ Cx ≤ u
//!             l_var ≤ x ≤ u_var
//! ```
//!
//! Dimensions are fixed once per sub-problem instance via
//! [`QpProblem::with_dimensions`] and must not change afterwards. `reset`
//! restores all buffers to their defaults so repeated `form_qp` calls with
//! identical inputs produce identical matrices.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use stride_core::ProblemError;

/// Errors raised while forming a QP
#[derive(Debug, Error)]
pub enum FormError {
    /// Declared dimensions do not match the rows actually laid out; a
    /// configuration defect, not a runtime condition.
    #[error("declared {declared} constraint rows but laid out {filled}")]
    DimensionMismatch { declared: usize, filled: usize },
    /// Underlying problem data is defective
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// Dense QP buffers with fixed dimensions
#[derive(Debug, Clone)]
pub struct QpProblem {
    a: DMatrix<f64>,
    c: DVector<f64>,
    cstr: DMatrix<f64>,
    l: DVector<f64>,
    u: DVector<f64>,
    l_var: DVector<f64>,
    u_var: DVector<f64>,
}

impl QpProblem {
    /// Allocate buffers for `n_vars` variables and `n_cstr` constraint rows
    pub fn with_dimensions(n_vars: usize, n_cstr: usize) -> Self {
        let mut qp = Self {
            a: DMatrix::zeros(n_vars, n_vars),
            c: DVector::zeros(n_vars),
            cstr: DMatrix::zeros(n_cstr, n_vars),
            l: DVector::zeros(n_cstr),
            u: DVector::zeros(n_cstr),
            l_var: DVector::zeros(n_vars),
            u_var: DVector::zeros(n_vars),
        };
        qp.reset();
        qp
    }

    /// Zero all cost/constraint coefficients and restore default bounds
    /// (constraints and variables unbounded on both sides)
    pub fn reset(&mut self) {
        self.a.fill(0.0);
        self.c.fill(0.0);
        self.cstr.fill(0.0);
        self.l.fill(f64::NEG_INFINITY);
        self.u.fill(f64::INFINITY);
        self.l_var.fill(f64::NEG_INFINITY);
        self.u_var.fill(f64::INFINITY);
    }

    pub fn n_vars(&self) -> usize {
        self.c.len()
    }

    pub fn n_cstr(&self) -> usize {
        self.l.len()
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn a_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.a
    }

    pub fn c(&self) -> &DVector<f64> {
        &self.c
    }

    pub fn c_mut(&mut self) -> &mut DVector<f64> {
        &mut self.c
    }

    /// Simultaneous mutable access to the quadratic and linear cost buffers
    pub fn cost_mut(&mut self) -> (&mut DMatrix<f64>, &mut DVector<f64>) {
        (&mut self.a, &mut self.c)
    }

    pub fn cstr(&self) -> &DMatrix<f64> {
        &self.cstr
    }

    pub fn cstr_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.cstr
    }

    pub fn l(&self) -> &DVector<f64> {
        &self.l
    }

    pub fn l_mut(&mut self) -> &mut DVector<f64> {
        &mut self.l
    }

    pub fn u(&self) -> &DVector<f64> {
        &self.u
    }

    pub fn u_mut(&mut self) -> &mut DVector<f64> {
        &mut self.u
    }

    pub fn l_var(&self) -> &DVector<f64> {
        &self.l_var
    }

    pub fn l_var_mut(&mut self) -> &mut DVector<f64> {
        &mut self.l_var
    }

    pub fn u_var(&self) -> &DVector<f64> {
        &self.u_var
    }

    pub fn u_var_mut(&mut self) -> &mut DVector<f64> {
        &mut self.u_var
    }

    /// Objective value `1/2 xᵀAx + cᵀx`
    pub fn objective(&self, x: &DVector<f64>) -> f64 {
        0.5 * (x.transpose() * &self.a * x)[(0, 0)] + self.c.dot(x)
    }

    /// Largest violation of any constraint row or variable bound at `x`
    /// (zero when `x` is feasible)
    pub fn max_violation(&self, x: &DVector<f64>) -> f64 {
        let mut worst: f64 = 0.0;

        let rows = &self.cstr * x;
        for i in 0..self.n_cstr() {
            worst = worst.max(self.l[i] - rows[i]).max(rows[i] - self.u[i]);
        }
        for j in 0..self.n_vars() {
            worst = worst.max(self.l_var[j] - x[j]).max(x[j] - self.u_var[j]);
        }

        worst
    }
}
