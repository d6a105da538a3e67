//! # Stride Planner
//!
//! QP-formulation layer for alternating box-pose / separating-plane
//! planning.
//!
//! The planner alternates between two convex sub-problems:
//!
//! ```text
//! box positions --(QpPlanesFixed)--> plane parameters
//! plane parameters --(QpBoxesFixedIndividual)--> box positions
//! ```
//!
//! Each direction is one QP solve per outer iteration. This crate builds the
//! dense matrices those solves consume, keeps row/column block indices
//! consistent across box, plane and slack variables, and ships a small
//! first-order fallback solver for in-tree use.
//!
//! # Components
//!
//! - [`qp`]: dense QP problem representation (cost, constraints, bounds)
//! - [`layout`]: declarative constraint-row layout with dimension checks
//! - [`boxes_fixed`]: per-adjacency-triple sub-problem over plane parameters
//! - [`planes_fixed`]: joint sub-problem over all mobile box positions
//! - [`solver`]: projected-gradient fallback QP solver
//! - [`config`]: planner configuration (penalties, solver options)

pub mod boxes_fixed;
pub mod config;
pub mod layout;
pub mod planes_fixed;
pub mod qp;
pub mod solver;

pub use boxes_fixed::QpBoxesFixedIndividual;
pub use config::PlannerConfig;
pub use layout::{ConstraintBlock, ConstraintKind, ConstraintLayout};
pub use planes_fixed::QpPlanesFixed;
pub use qp::{FormError, QpProblem};
pub use solver::{solve, QpSolution, SolveOptions, SolveStatistics, SolverError};
