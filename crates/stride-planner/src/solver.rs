//! Fallback QP solver
//!
//! First-order solver for the dense sub-problems: projected gradient on
//! `1/2 xᵀAx + cᵀx` with a corrected cyclic projection (Dykstra) onto the
//! variable box and the slab of each constraint row. Intended for in-tree
//! solves and tests; a production interior-point or active-set solver can
//! consume the same [`QpProblem`] buffers instead.

use nalgebra::DVector;
use thiserror::Error;

use crate::config::SolverConfig;
use crate::qp::QpProblem;

/// Solver errors
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("no feasible point found after {iterations} iterations (max violation {max_violation:.3e})")]
    Infeasible {
        iterations: usize,
        max_violation: f64,
    },
}

/// Statistics of one solve call
#[derive(Debug, Clone, Default)]
pub struct SolveStatistics {
    /// Projected-gradient iterations performed
    pub iterations: usize,
    /// Objective value at the returned point
    pub objective: f64,
    /// Largest constraint/bound violation at the returned point
    pub max_violation: f64,
}

/// Solution vector plus statistics
#[derive(Debug, Clone)]
pub struct QpSolution {
    pub x: DVector<f64>,
    pub stats: SolveStatistics,
}

/// Configuration for a single solve call
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Maximum projected-gradient iterations
    pub max_iterations: usize,
    /// Projection sweeps per gradient step
    pub projection_sweeps: usize,
    /// Feasibility tolerance on the returned point
    pub tolerance: f64,
    /// Warm-start point; zeros otherwise
    pub warm_start: Option<DVector<f64>>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self::from(&SolverConfig::default())
    }
}

impl From<&SolverConfig> for SolveOptions {
    fn from(config: &SolverConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            projection_sweeps: config.projection_sweeps,
            tolerance: config.tolerance,
            warm_start: None,
        }
    }
}

/// Project onto the slab `l ≤ a·x ≤ u` of constraint row `i`
fn project_row(qp: &QpProblem, x: &mut DVector<f64>, i: usize) {
    let row = qp.cstr().row(i);
    let aa = row.norm_squared();
    if aa <= 1.0e-12 {
        return;
    }
    let t = row.dot(&x.transpose());
    if t < qp.l()[i] {
        for j in 0..x.len() {
            x[j] += row[j] * (qp.l()[i] - t) / aa;
        }
    } else if t > qp.u()[i] {
        for j in 0..x.len() {
            x[j] += row[j] * (qp.u()[i] - t) / aa;
        }
    }
}

/// Clamp onto the variable box `l_var ≤ x ≤ u_var`
fn project_box(qp: &QpProblem, x: &mut DVector<f64>) {
    for j in 0..x.len() {
        x[j] = x[j].clamp(qp.l_var()[j], qp.u_var()[j]);
    }
}

/// Dykstra projection onto the intersection of the variable box and all
/// row slabs, with one correction term per set
fn project(qp: &QpProblem, x_nom: &DVector<f64>, sweeps: usize) -> DVector<f64> {
    let n_sets = qp.n_cstr() + 1;
    let mut x = x_nom.clone();
    let mut corr = vec![DVector::zeros(x.len()); n_sets];

    for _ in 0..sweeps.max(1) {
        // Box projection
        let y = &x + &corr[0];
        let mut x_new = y.clone();
        project_box(qp, &mut x_new);
        corr[0] = &y - &x_new;
        x = x_new;

        // Row slabs
        for i in 0..qp.n_cstr() {
            let slot = i + 1;
            let y = &x + &corr[slot];
            let mut x_new = y.clone();
            project_row(qp, &mut x_new, i);
            corr[slot] = &y - &x_new;
            x = x_new;
        }
    }
    x
}

/// Solve the QP with projected gradient steps
///
/// The step size is scaled by the cost magnitudes and decays with the
/// iteration count; the final iterate is polished by a long projection
/// phase before the feasibility check.
pub fn solve(qp: &QpProblem, options: &SolveOptions) -> Result<QpSolution, SolverError> {
    let mut x = match &options.warm_start {
        Some(x0) => x0.clone(),
        None => DVector::zeros(qp.n_vars()),
    };
    project_box(qp, &mut x);

    let base_step = 1.0 / (qp.a().norm() + qp.c().norm() + 1.0);

    let mut iterations = 0;
    for k in 0..options.max_iterations {
        iterations = k + 1;
        let grad = qp.a() * &x + qp.c();
        let step = base_step / ((k + 1) as f64).sqrt();
        let candidate = &x - step * grad;
        x = project(qp, &candidate, options.projection_sweeps);
    }

    // Polish: projection alone, so the returned point is as feasible as the
    // constraint geometry allows
    x = project(qp, &x, options.projection_sweeps.max(1) * 20);

    let max_violation = qp.max_violation(&x);
    if max_violation > options.tolerance {
        eprintln!(
            "qp solver: max violation {:.3e} above tolerance {:.3e}",
            max_violation, options.tolerance
        );
        return Err(SolverError::Infeasible {
            iterations,
            max_violation,
        });
    }

    let objective = qp.objective(&x);
    Ok(QpSolution {
        x,
        stats: SolveStatistics {
            iterations,
            objective,
            max_violation,
        },
    })
}
