//! Planner configuration
//!
//! Penalty weights for the relaxation variables and options for the
//! fallback QP solver. All dimensions derived from a configuration are
//! computed once at sub-problem construction and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Main planner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Relaxation penalties
    pub relaxation: RelaxationConfig,
    /// Fallback solver options
    pub solver: SolverConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            relaxation: RelaxationConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

/// Relaxation (slack) penalty weights
///
/// Every relaxable constraint row carries a +1 coefficient in the slack
/// column matching its obstacle's virtuality; the slack itself is bounded
/// below by zero and penalized linearly, so infeasibility can only be paid
/// for, never exploited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxationConfig {
    /// Linear penalty on the real-obstacle slack in the joint
    /// planes-fixed sub-problem
    pub alpha: f64,
    /// Linear penalty on the virtual-obstacle slack (typically higher:
    /// virtual obstacles are soft but should give way last)
    pub alpha_virtual: f64,
    /// Linear penalty on the single slack of the per-triple
    /// boxes-fixed sub-problem; a tunable weight, not a physical constant
    pub individual_alpha: f64,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            alpha: 10.0,
            alpha_virtual: 100.0,
            individual_alpha: 10.0,
        }
    }
}

/// Fallback solver options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum projected-gradient iterations
    pub max_iterations: usize,
    /// Projection sweeps per gradient step
    pub projection_sweeps: usize,
    /// Feasibility tolerance on the returned point
    pub tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            projection_sweeps: 50,
            tolerance: 1e-6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();

        assert!(config.relaxation.alpha_virtual > config.relaxation.alpha);
        assert!(config.relaxation.individual_alpha > 0.0);
        assert!(config.solver.tolerance > 0.0);
    }
}
