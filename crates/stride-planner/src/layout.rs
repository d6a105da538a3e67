//! Constraint-row layout
//!
//! Instead of advancing an imperative row counter while writing into shared
//! matrix views, each sub-problem computes a list of `(offset, len, kind)`
//! records once at construction. Row assignment then becomes declarative:
//! the fill loop walks the records, and the total is verified against the
//! dimension formula independently of call order.

use crate::qp::FormError;

/// What a block of constraint rows encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// One row from a (fixed plane, box) pair, `fct` indexing the
    /// problem's fixed-plane constraint functions
    FixedPlaneClearance { fct: usize },
    /// One row keeping a mobile box above the plane of adjacency triple
    /// `plan`; the relaxation column is selected by `is_virtual`
    MobilePlaneClearance {
        plan: usize,
        box_index: isize,
        is_virtual: bool,
    },
    /// Three rows locking the final box position, no relaxation
    FinalPosition,
    /// One row per vertex of an "above" box in the per-triple sub-problem
    VertexClearanceAbove { box_index: isize },
    /// One row per vertex of the "below" obstacle
    VertexClearanceBelow { obstacle: usize },
    /// Linearized unit-norm band on the plane normal
    NormalBand,
}

/// Contiguous block of constraint rows
#[derive(Debug, Clone, Copy)]
pub struct ConstraintBlock {
    pub offset: usize,
    pub len: usize,
    pub kind: ConstraintKind,
}

/// Ordered row layout of one sub-problem
#[derive(Debug, Clone, Default)]
pub struct ConstraintLayout {
    blocks: Vec<ConstraintBlock>,
    total: usize,
}

impl ConstraintLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block of `len` rows; offsets advance monotonically
    pub fn push(&mut self, kind: ConstraintKind, len: usize) {
        self.blocks.push(ConstraintBlock {
            offset: self.total,
            len,
            kind,
        });
        self.total += len;
    }

    pub fn blocks(&self) -> &[ConstraintBlock] {
        &self.blocks
    }

    /// Total number of rows laid out
    pub fn total(&self) -> usize {
        self.total
    }

    /// Check the laid-out total against the declared constraint count
    pub fn verify_total(&self, declared: usize) -> Result<(), FormError> {
        if self.total == declared {
            Ok(())
        } else {
            Err(FormError::DimensionMismatch {
                declared,
                filled: self.total,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_monotone_and_packed() {
        let mut layout = ConstraintLayout::new();
        layout.push(ConstraintKind::VertexClearanceAbove { box_index: 0 }, 8);
        layout.push(ConstraintKind::VertexClearanceAbove { box_index: 1 }, 8);
        layout.push(ConstraintKind::VertexClearanceBelow { obstacle: 0 }, 8);
        layout.push(ConstraintKind::NormalBand, 1);

        assert_eq!(layout.total(), 25);
        let offsets: Vec<usize> = layout.blocks().iter().map(|b| b.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16, 24]);
    }

    #[test]
    fn test_verify_total() {
        let mut layout = ConstraintLayout::new();
        layout.push(ConstraintKind::FinalPosition, 3);

        assert!(layout.verify_total(3).is_ok());
        assert!(matches!(
            layout.verify_total(4),
            Err(FormError::DimensionMismatch {
                declared: 4,
                filled: 3
            })
        ));
    }
}
