//! Trajectory problem container
//!
//! Owns the full list of boxes, obstacles, adjacency plans and fixed
//! separating planes, plus the scalar parameters and cost function the
//! QP sub-problems read. The container is immutable once built: both
//! alternation steps borrow it for the duration of a `form_qp` call and
//! never mutate shared geometry.

use nalgebra::{DMatrixViewMut, DVectorViewMut, Vector3};
use thiserror::Error;

use crate::functions::BoxAboveFixedPlane;
use crate::geometry::{Cuboid, FixedPlane, Obstacle, INITIAL_BOX_INDEX};

/// Problem configuration errors
#[derive(Debug, Error)]
pub enum ProblemError {
    /// A box reference below -1; the adjacency data is defective and the
    /// caller must not proceed with a partially-defined position.
    #[error("no box with index {index}")]
    InvalidBoxIndex { index: isize },
    /// An adjacency plan references a box outside the box list
    #[error("plan {plan} references box {index} outside the box list")]
    BoxIndexOutOfRange { plan: usize, index: isize },
    /// An adjacency plan references an obstacle outside the obstacle list
    #[error("plan {plan} references obstacle {index} outside the obstacle list")]
    ObstacleIndexOutOfRange { plan: usize, index: usize },
    /// A box's stored index does not match its position in the list
    #[error("box at position {position} carries index {index}")]
    InconsistentBoxIndex { position: usize, index: isize },
}

/// Adjacency record: two boxes above and one obstacle below a shared
/// separating plane
///
/// Box references may be -1 for the fixed initial pose; the obstacle
/// reference indexes the obstacle list.
#[derive(Debug, Clone, Copy)]
pub struct Plan {
    pub box0_above: isize,
    pub box1_above: isize,
    pub box_below: usize,
}

/// Quadratic/linear cost contribution for the box-position block
///
/// Writes into the top-left `dim_boxes x dim_boxes` block of the QP cost
/// matrix and the first `dim_boxes` entries of the linear cost, under the
/// convention `J = 1/2 xᵀAx + cᵀx`.
pub trait CostFunction {
    fn fill_quad_cost(&self, a: DMatrixViewMut<'_, f64>, c: DVectorViewMut<'_, f64>);
}

/// Penalizes squared distance between successive box positions and anchors
/// the first box to the initial position
#[derive(Debug, Clone)]
pub struct PathSmoothnessCost {
    pub weight: f64,
    pub init_pos: Vector3<f64>,
}

impl CostFunction for PathSmoothnessCost {
    fn fill_quad_cost(&self, mut a: DMatrixViewMut<'_, f64>, mut c: DVectorViewMut<'_, f64>) {
        let n_boxes = c.len() / 3;
        let w = self.weight;

        // ||p_0 - init||^2
        for k in 0..3 {
            a[(k, k)] += 2.0 * w;
            c[k] += -2.0 * w * self.init_pos[k];
        }

        // sum_i ||p_i - p_{i-1}||^2
        for i in 1..n_boxes {
            for k in 0..3 {
                let r = 3 * i + k;
                let p = 3 * (i - 1) + k;
                a[(r, r)] += 2.0 * w;
                a[(p, p)] += 2.0 * w;
                a[(r, p)] -= 2.0 * w;
                a[(p, r)] -= 2.0 * w;
            }
        }
    }
}

/// Read-only problem descriptor consumed by the QP sub-problems
pub struct TrajectoryProblem {
    boxes: Vec<Cuboid>,
    obstacles: Vec<Obstacle>,
    plans: Vec<Plan>,
    fixed_planes: Vec<FixedPlane>,
    box_above_fixed_plane_fcts: Vec<BoxAboveFixedPlane>,
    initial_box: Cuboid,
    security_distance: f64,
    init_pos: Vector3<f64>,
    final_pos: Vector3<f64>,
    cost_fct: Box<dyn CostFunction>,
}

impl TrajectoryProblem {
    /// Build and validate a problem instance
    ///
    /// One [`BoxAboveFixedPlane`] function is instantiated per
    /// (fixed plane, box) pair, in plane-major order, which fixes the row
    /// order of the fixed-plane constraint block.
    pub fn new(
        boxes: Vec<Cuboid>,
        obstacles: Vec<Obstacle>,
        plans: Vec<Plan>,
        fixed_planes: Vec<FixedPlane>,
        security_distance: f64,
        init_pos: Vector3<f64>,
        final_pos: Vector3<f64>,
        cost_fct: Box<dyn CostFunction>,
    ) -> Result<Self, ProblemError> {
        for (position, b) in boxes.iter().enumerate() {
            if b.index() != position as isize {
                return Err(ProblemError::InconsistentBoxIndex {
                    position,
                    index: b.index(),
                });
            }
        }
        let n_boxes = boxes.len() as isize;
        for (i, plan) in plans.iter().enumerate() {
            for index in [plan.box0_above, plan.box1_above] {
                if index < INITIAL_BOX_INDEX || index >= n_boxes {
                    return Err(ProblemError::BoxIndexOutOfRange { plan: i, index });
                }
            }
            if plan.box_below >= obstacles.len() {
                return Err(ProblemError::ObstacleIndexOutOfRange {
                    plan: i,
                    index: plan.box_below,
                });
            }
        }

        let box_above_fixed_plane_fcts = fixed_planes
            .iter()
            .flat_map(|plane| {
                boxes
                    .iter()
                    .map(move |b| BoxAboveFixedPlane::from_plane(b.clone(), plane))
            })
            .collect();

        let initial_box = Cuboid::unit_cube(init_pos, INITIAL_BOX_INDEX, true);

        Ok(Self {
            boxes,
            obstacles,
            plans,
            fixed_planes,
            box_above_fixed_plane_fcts,
            initial_box,
            security_distance,
            init_pos,
            final_pos,
            cost_fct,
        })
    }

    pub fn boxes(&self) -> &[Cuboid] {
        &self.boxes
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn fixed_planes(&self) -> &[FixedPlane] {
        &self.fixed_planes
    }

    /// Fixed-plane constraint functions, one per (plane, box) pair
    pub fn box_above_fixed_plane_fcts(&self) -> &[BoxAboveFixedPlane] {
        &self.box_above_fixed_plane_fcts
    }

    /// Resolve a box reference; -1 is the fixed initial pose
    pub fn get_box(&self, index: isize) -> Result<&Cuboid, ProblemError> {
        if index == INITIAL_BOX_INDEX {
            Ok(&self.initial_box)
        } else if index >= 0 && (index as usize) < self.boxes.len() {
            Ok(&self.boxes[index as usize])
        } else {
            Err(ProblemError::InvalidBoxIndex { index })
        }
    }

    pub fn n_boxes(&self) -> usize {
        self.boxes.len()
    }

    pub fn n_plans(&self) -> usize {
        self.plans.len()
    }

    /// Number of adjacency triples contributing mobile-plane rows
    pub fn n_mobile_plan_cstr(&self) -> usize {
        self.plans.len()
    }

    pub fn n_fixed_planes(&self) -> usize {
        self.fixed_planes.len()
    }

    /// Dimension of the flattened box-position vector
    pub fn dim_boxes(&self) -> usize {
        3 * self.boxes.len()
    }

    pub fn has_virtual_obstacles(&self) -> bool {
        self.obstacles.iter().any(|o| o.is_virtual())
    }

    pub fn security_distance(&self) -> f64 {
        self.security_distance
    }

    pub fn init_pos(&self) -> &Vector3<f64> {
        &self.init_pos
    }

    pub fn final_pos(&self) -> &Vector3<f64> {
        &self.final_pos
    }

    pub fn cost_fct(&self) -> &dyn CostFunction {
        self.cost_fct.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn two_box_problem() -> TrajectoryProblem {
        let boxes = vec![
            Cuboid::unit_cube(Vector3::zeros(), 0, true),
            Cuboid::unit_cube(Vector3::new(1.0, 0.0, 0.0), 1, false),
        ];
        let obstacles = vec![Obstacle::new(
            Cuboid::unit_cube(Vector3::new(0.0, 0.0, -1.0), 0, true),
            false,
        )];
        let plans = vec![Plan {
            box0_above: 0,
            box1_above: 1,
            box_below: 0,
        }];
        TrajectoryProblem::new(
            boxes,
            obstacles,
            plans,
            vec![FixedPlane::new(Vector3::new(0.0, 0.0, 1.0), -0.4)],
            0.05,
            Vector3::zeros(),
            Vector3::new(2.0, 0.0, 0.0),
            Box::new(PathSmoothnessCost {
                weight: 1.0,
                init_pos: Vector3::zeros(),
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let pb = two_box_problem();

        assert_eq!(pb.n_boxes(), 2);
        assert_eq!(pb.dim_boxes(), 6);
        assert_eq!(pb.n_plans(), 1);
        assert_eq!(pb.n_fixed_planes(), 1);
        // One function per (plane, box) pair
        assert_eq!(pb.box_above_fixed_plane_fcts().len(), 2);
        assert!(!pb.has_virtual_obstacles());
    }

    #[test]
    fn test_get_box_initial_pose() {
        let pb = two_box_problem();

        let initial = pb.get_box(-1).unwrap();
        assert_eq!(initial.index(), -1);
        assert!(initial.fixed());
        assert_relative_eq!(*initial.center(), *pb.init_pos(), epsilon = 1e-12);

        assert_eq!(pb.get_box(1).unwrap().index(), 1);
        assert!(pb.get_box(-2).is_err());
        assert!(pb.get_box(2).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_plan() {
        let boxes = vec![Cuboid::unit_cube(Vector3::zeros(), 0, true)];
        let obstacles = vec![];
        let plans = vec![Plan {
            box0_above: -1,
            box1_above: 0,
            box_below: 0,
        }];
        let result = TrajectoryProblem::new(
            boxes,
            obstacles,
            plans,
            vec![],
            0.05,
            Vector3::zeros(),
            Vector3::zeros(),
            Box::new(PathSmoothnessCost {
                weight: 1.0,
                init_pos: Vector3::zeros(),
            }),
        );
        assert!(matches!(
            result,
            Err(ProblemError::ObstacleIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_smoothness_cost_gradient_zero_on_straight_path() {
        let cost = PathSmoothnessCost {
            weight: 2.0,
            init_pos: Vector3::zeros(),
        };
        let n = 9;
        let mut a = DMatrix::zeros(n, n);
        let mut c = DVector::zeros(n);
        cost.fill_quad_cost(a.view_mut((0, 0), (n, n)), c.rows_mut(0, n));

        // A is symmetric
        assert_relative_eq!(a.clone(), a.transpose(), epsilon = 1e-12);

        // Gradient A x + c vanishes when every box sits at the init position
        let x = DVector::zeros(n);
        let grad = &a * &x + &c;
        assert_relative_eq!(grad.norm(), 0.0, epsilon = 1e-12);
    }
}
