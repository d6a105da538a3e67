//! Joint sub-problem with plane parameters fixed
//!
//! Given all separating-plane parameters, solves for every mobile box
//! position at once. Variables are the flattened box positions (box i at
//! columns `[3i, 3i+3)`) followed by one relaxation scalar, or two when
//! virtual obstacles exist (real slack first, virtual slack last).
//!
//! Constraint rows come from three sources, concatenated in fixed order:
//! one row per (fixed plane, box) pair, up to two rows per mobile adjacency
//! triple (sides whose box is fixed contribute none), and three rows locking
//! the final box position.

use nalgebra::{DVector, Vector3};

use stride_core::functions::{
    FixedBoxPosition, LinearizableConstraint, PlaneBetweenBoxAndObstacle,
};
use stride_core::TrajectoryProblem;

use crate::config::PlannerConfig;
use crate::layout::{ConstraintKind, ConstraintLayout};
use crate::qp::{FormError, QpProblem};

/// QP over all mobile box positions plus relaxation
pub struct QpPlanesFixed<'a> {
    pb: &'a TrajectoryProblem,
    qp: QpProblem,
    layout: ConstraintLayout,
    n_relaxation: usize,
    alpha: f64,
    alpha_virtual: f64,
}

impl<'a> QpPlanesFixed<'a> {
    /// Build the sub-problem and validate its row layout against
    ///
    /// ```text
    /// n_cstr = n_fixed_planes·n_boxes + 2·n_plans - 1 + 3
    /// ```
    ///
    /// where the -1 accounts for the first box being fixed and therefore
    /// contributing no row for one side of the first triple. A mismatch
    /// between the formula and the rows actually laid out is a fatal
    /// configuration error.
    pub fn new(pb: &'a TrajectoryProblem, config: &PlannerConfig) -> Result<Self, FormError> {
        let n_relaxation = if pb.has_virtual_obstacles() { 2 } else { 1 };
        let n_cstr = pb.n_fixed_planes() * pb.n_boxes() + 2 * pb.n_plans() - 1 + 3;

        let layout = Self::build_layout(pb)?;
        layout.verify_total(n_cstr)?;

        Ok(Self {
            pb,
            qp: QpProblem::with_dimensions(pb.dim_boxes() + n_relaxation, n_cstr),
            layout,
            n_relaxation,
            alpha: config.relaxation.alpha,
            alpha_virtual: config.relaxation.alpha_virtual,
        })
    }

    fn build_layout(pb: &TrajectoryProblem) -> Result<ConstraintLayout, FormError> {
        let mut layout = ConstraintLayout::new();

        for fct in 0..pb.box_above_fixed_plane_fcts().len() {
            layout.push(ConstraintKind::FixedPlaneClearance { fct }, 1);
        }

        for (i_plan, plan) in pb.plans().iter().enumerate() {
            let is_virtual = pb.obstacles()[plan.box_below].is_virtual();
            for box_index in [plan.box0_above, plan.box1_above] {
                if !pb.get_box(box_index)?.fixed() {
                    layout.push(
                        ConstraintKind::MobilePlaneClearance {
                            plan: i_plan,
                            box_index,
                            is_virtual,
                        },
                        1,
                    );
                }
            }
        }

        layout.push(ConstraintKind::FinalPosition, 3);
        Ok(layout)
    }

    pub fn qp(&self) -> &QpProblem {
        &self.qp
    }

    pub fn layout(&self) -> &ConstraintLayout {
        &self.layout
    }

    pub fn n_relaxation(&self) -> usize {
        self.n_relaxation
    }

    /// Mark the relaxation column on rows `[offset, offset+len)`
    ///
    /// The virtual slack is the last variable; the real slack is the
    /// one-to-last when both exist, the last otherwise.
    fn add_relaxation_term(&mut self, offset: usize, len: usize, is_virtual: bool) {
        let dim_var = self.qp.n_vars();
        let col = if self.n_relaxation == 2 && !is_virtual {
            dim_var - 2
        } else {
            dim_var - 1
        };
        for row in offset..offset + len {
            self.qp.cstr_mut()[(row, col)] = 1.0;
        }
    }

    /// Build the QP at the given plane parameters (layout: 4 scalars per
    /// plan, offset then normal)
    pub fn form_qp(&mut self, x_planes: &DVector<f64>) -> Result<(), FormError> {
        self.qp.reset();

        let dim_boxes = self.pb.dim_boxes();
        let pb = self.pb;
        let (a, c) = self.qp.cost_mut();
        pb.cost_fct().fill_quad_cost(
            a.view_mut((0, 0), (dim_boxes, dim_boxes)),
            c.rows_mut(0, dim_boxes),
        );

        // Relaxation cost and non-negativity; the slack can only be paid
        // for, never exploited as a free negative offset
        let n_vars = self.qp.n_vars();
        if self.n_relaxation == 2 {
            self.qp.c_mut()[n_vars - 2] = self.alpha;
            self.qp.c_mut()[n_vars - 1] = self.alpha_virtual;
            self.qp.l_var_mut()[n_vars - 2] = 0.0;
            self.qp.l_var_mut()[n_vars - 1] = 0.0;
        } else {
            self.qp.c_mut()[n_vars - 1] = self.alpha;
            self.qp.l_var_mut()[n_vars - 1] = 0.0;
        }

        let security = self.pb.security_distance();
        let layout = self.layout.clone();
        let mut filled = 0;

        for block in layout.blocks() {
            match block.kind {
                ConstraintKind::FixedPlaneClearance { fct } => {
                    let fct = &self.pb.box_above_fixed_plane_fcts()[fct];
                    let (lb, row) = fct.fill_lin_cstr(security);
                    let col = 3 * fct.cuboid().index() as usize;
                    for k in 0..3 {
                        self.qp.cstr_mut()[(block.offset, col + k)] = row[k];
                    }
                    self.qp.l_mut()[block.offset] = lb;
                    self.add_relaxation_term(block.offset, block.len, false);
                }
                ConstraintKind::MobilePlaneClearance {
                    plan,
                    box_index,
                    is_virtual,
                } => {
                    let plan_d = x_planes[4 * plan];
                    let plan_n: Vector3<f64> = x_planes.fixed_rows::<3>(4 * plan + 1).into_owned();
                    let cuboid = self.pb.get_box(box_index)?;
                    let fct = PlaneBetweenBoxAndObstacle::new(cuboid, plan_d, plan_n);
                    let (lb, row) = fct.fill_lin_cstr(security);
                    let col = 3 * box_index as usize;
                    for k in 0..3 {
                        self.qp.cstr_mut()[(block.offset, col + k)] = row[k];
                    }
                    self.qp.l_mut()[block.offset] = lb;
                    self.add_relaxation_term(block.offset, block.len, is_virtual);
                }
                ConstraintKind::FinalPosition => {
                    let (l, c, u) = FixedBoxPosition::fill_lin_cstr(self.pb.final_pos());
                    let col = 3 * (self.pb.n_boxes() - 1);
                    for r in 0..3 {
                        for k in 0..3 {
                            self.qp.cstr_mut()[(block.offset + r, col + k)] = c[(r, k)];
                        }
                        self.qp.l_mut()[block.offset + r] = l[r];
                        self.qp.u_mut()[block.offset + r] = u[r];
                    }
                }
                _ => {
                    return Err(FormError::DimensionMismatch {
                        declared: self.qp.n_cstr(),
                        filled,
                    })
                }
            }
            filled += block.len;
        }

        if filled != self.qp.n_cstr() {
            return Err(FormError::DimensionMismatch {
                declared: self.qp.n_cstr(),
                filled,
            });
        }

        Ok(())
    }

    /// Recompute every mobile plane's offset so it stays correctly
    /// positioned relative to its obstacle given the current normal; called
    /// once per outer iteration after solving.
    pub fn update_plan_d(&self, x_planes: &mut DVector<f64>) {
        for (i_plan, plan) in self.pb.plans().iter().enumerate() {
            let obstacle = &self.pb.obstacles()[plan.box_below];
            let plan_n: Vector3<f64> = x_planes.fixed_rows::<3>(4 * i_plan + 1).into_owned();
            x_planes[4 * i_plan] = PlaneBetweenBoxAndObstacle::update_plan_d(
                obstacle,
                &plan_n,
                self.pb.security_distance(),
            );
        }
    }
}
