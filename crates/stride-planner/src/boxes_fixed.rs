//! Per-adjacency-triple sub-problem with box positions fixed
//!
//! Given fixed box positions, solves for the separating-plane parameters of
//! one adjacency triple. Variables, in column order:
//!
//! ```text
//! [distance, normal_x, normal_y, normal_z, relaxation]
//! ```
//!
//! Constraints (25 rows): every vertex of the two "above" boxes must clear
//! the plane from above, every vertex of the "below" obstacle from below,
//! plus one band row linearizing the unit-norm constraint on the normal
//! around the previous iteration's value.

use nalgebra::{DVector, Vector3};

use stride_core::problem::Plan;
use stride_core::{ProblemError, TrajectoryProblem, INITIAL_BOX_INDEX};

use crate::config::PlannerConfig;
use crate::layout::{ConstraintKind, ConstraintLayout};
use crate::qp::{FormError, QpProblem};

/// Column of the plane-distance scalar
pub const DISTANCE_INDEX: usize = 0;
/// First column of the plane-normal 3-vector
pub const NORMAL_INDEX: usize = 1;
/// Column of the relaxation scalar
pub const RELAXATION_INDEX: usize = 4;

const NUM_VARS: usize = 5;
const NUM_CSTR: usize = 3 * 8 + 1;

/// QP over the plane parameters of one adjacency triple
pub struct QpBoxesFixedIndividual<'a> {
    pb: &'a TrajectoryProblem,
    qp: QpProblem,
    relaxation_weight: f64,
}

impl<'a> QpBoxesFixedIndividual<'a> {
    /// Each box-above-plane constraint contributes 8 one-dimensional rows,
    /// 24 per triple, and the norm band contributes one more.
    pub fn new(pb: &'a TrajectoryProblem, config: &PlannerConfig) -> Self {
        Self {
            pb,
            qp: QpProblem::with_dimensions(NUM_VARS, NUM_CSTR),
            relaxation_weight: config.relaxation.individual_alpha,
        }
    }

    pub fn qp(&self) -> &QpProblem {
        &self.qp
    }

    /// Resolve a box reference to a world position
    ///
    /// -1 maps to the problem's fixed initial position; any index >= 0
    /// slices a 3-vector out of the flattened box-position vector. More
    /// negative indices are defects in the adjacency data.
    pub fn get_box_pos(
        &self,
        i_box: isize,
        x_boxes: &DVector<f64>,
    ) -> Result<Vector3<f64>, ProblemError> {
        if i_box == INITIAL_BOX_INDEX {
            Ok(*self.pb.init_pos())
        } else if i_box >= 0 {
            let i = i_box as usize;
            Ok(x_boxes.fixed_rows::<3>(3 * i).into_owned())
        } else {
            Err(ProblemError::InvalidBoxIndex { index: i_box })
        }
    }

    /// Relaxation cost, +1 coefficient on every clearance row, and box
    /// bounds [-1, 1] on the normal components (a necessary proxy for the
    /// unit-norm requirement, completed by the band row).
    fn add_relaxation_term(&mut self, alpha: f64) {
        self.qp.c_mut()[RELAXATION_INDEX] = alpha;
        for i in 0..self.qp.n_cstr() {
            self.qp.cstr_mut()[(i, RELAXATION_INDEX)] = 1.0;
        }
        self.qp.l_var_mut()[RELAXATION_INDEX] = 0.0;
        for k in NORMAL_INDEX..NORMAL_INDEX + 3 {
            self.qp.l_var_mut()[k] = -1.0;
            self.qp.u_var_mut()[k] = 1.0;
        }
    }

    fn layout_for(plan: &Plan) -> ConstraintLayout {
        let mut layout = ConstraintLayout::new();
        layout.push(
            ConstraintKind::VertexClearanceAbove {
                box_index: plan.box0_above,
            },
            8,
        );
        layout.push(
            ConstraintKind::VertexClearanceAbove {
                box_index: plan.box1_above,
            },
            8,
        );
        layout.push(
            ConstraintKind::VertexClearanceBelow {
                obstacle: plan.box_below,
            },
            8,
        );
        layout.push(ConstraintKind::NormalBand, 1);
        layout
    }

    /// Build the QP for triple `i_plan` at the given box positions,
    /// linearizing the norm band around `x_previous_planes`.
    pub fn form_qp(
        &mut self,
        i_plan: usize,
        x_boxes: &DVector<f64>,
        x_previous_planes: &DVector<f64>,
    ) -> Result<(), FormError> {
        self.qp.reset();
        self.add_relaxation_term(self.relaxation_weight);

        let plan = self.pb.plans()[i_plan];
        let layout = Self::layout_for(&plan);
        layout.verify_total(self.qp.n_cstr())?;

        let security = self.pb.security_distance();

        for block in layout.blocks() {
            match block.kind {
                ConstraintKind::VertexClearanceAbove { box_index } => {
                    let cuboid = self.pb.get_box(box_index)?;
                    let pos = self.get_box_pos(box_index, x_boxes)?;
                    for (i, v) in cuboid.vertices().iter().enumerate() {
                        let row = block.offset + i;
                        self.qp.cstr_mut()[(row, DISTANCE_INDEX)] = -1.0;
                        let world = pos + v;
                        for k in 0..3 {
                            self.qp.cstr_mut()[(row, NORMAL_INDEX + k)] = world[k];
                        }
                        self.qp.l_mut()[row] = security;
                    }
                }
                ConstraintKind::VertexClearanceBelow { obstacle } => {
                    let obs = &self.pb.obstacles()[obstacle];
                    let pos = *obs.center();
                    for (i, v) in obs.vertices().iter().enumerate() {
                        let row = block.offset + i;
                        self.qp.cstr_mut()[(row, DISTANCE_INDEX)] = 1.0;
                        let world = -pos - v;
                        for k in 0..3 {
                            self.qp.cstr_mut()[(row, NORMAL_INDEX + k)] = world[k];
                        }
                        self.qp.l_mut()[row] = security;
                    }
                }
                ConstraintKind::NormalBand => {
                    // previousNormal · normal ∈ [0.5, 1.0]: convex outer
                    // approximation of ||normal|| = 1 that keeps the normal
                    // from collapsing or flipping between iterations
                    let row = block.offset;
                    let prev = x_previous_planes.rows(4 * i_plan + 1, 3);
                    for k in 0..3 {
                        self.qp.cstr_mut()[(row, NORMAL_INDEX + k)] = prev[k];
                    }
                    self.qp.cstr_mut()[(row, RELAXATION_INDEX)] = 0.0;
                    self.qp.l_mut()[row] = 0.5;
                    self.qp.u_mut()[row] = 1.0;
                }
                _ => {
                    return Err(FormError::DimensionMismatch {
                        declared: self.qp.n_cstr(),
                        filled: block.offset,
                    })
                }
            }
        }

        Ok(())
    }
}
