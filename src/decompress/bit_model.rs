//! Adaptive probability cells and the decoder's model tables.
//!
//! Every coded bit is predicted by one [`BitModel`]: an 11-bit fixed-point
//! estimate of P(bit = 0), nudged toward the observed value after each
//! decode. Cells are grouped into fixed-shape tables indexed by context
//! (state, position phase, previous byte, distance slot) and owned
//! exclusively by one decoder instance.

use super::{
    ALIGN_SIZE, DIST_SLOTS, DIST_SPECIAL_SIZE, DIST_STATES, LITERAL_CONTEXTS, LITERAL_TABLE_SIZE,
    POS_STATES, STATES,
};

/// Fixed-point scale of a probability cell (2^11).
pub const BIT_MODEL_TOTAL_BITS: u32 = 11;

/// Full scale: a probability of 1.0.
pub const BIT_MODEL_TOTAL: u32 = 1 << BIT_MODEL_TOTAL_BITS;

/// Learning-rate shift: each update moves the estimate by 1/32 of the gap.
pub const BIT_MODEL_MOVE_BITS: u32 = 5;

/// One adaptive probability cell, estimating P(bit = 0).
///
/// Initialized to half scale and mutated on every decode. Never reset
/// after construction; a fresh decoder gets fresh cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitModel {
    pub probability: u32,
}

impl BitModel {
    /// Create a cell at half scale (no prior knowledge).
    pub const fn new() -> Self {
        Self {
            probability: BIT_MODEL_TOTAL / 2,
        }
    }

    /// Shift the estimate toward "bit was 0".
    #[inline]
    pub fn update_zero(&mut self) {
        self.probability += (BIT_MODEL_TOTAL - self.probability) >> BIT_MODEL_MOVE_BITS;
    }

    /// Shift the estimate toward "bit was 1".
    #[inline]
    pub fn update_one(&mut self) {
        self.probability -= self.probability >> BIT_MODEL_MOVE_BITS;
    }
}

impl Default for BitModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Three-tier match-length model (lengths 2..=273).
///
/// The low and mid tiers are duplicated per position phase; the high tier
/// is shared. Two independent instances exist: one for ordinary matches,
/// one for repeat matches.
#[derive(Debug, Clone)]
pub struct LenModel {
    pub choice1: BitModel,
    pub choice2: BitModel,
    pub low: [[BitModel; 8]; POS_STATES],
    pub mid: [[BitModel; 8]; POS_STATES],
    pub high: [BitModel; 256],
}

impl LenModel {
    pub fn new() -> Self {
        Self {
            choice1: BitModel::new(),
            choice2: BitModel::new(),
            low: [[BitModel::new(); 8]; POS_STATES],
            mid: [[BitModel::new(); 8]; POS_STATES],
            high: [BitModel::new(); 256],
        }
    }
}

/// Every probability table the decoder owns, initialized to half scale.
///
/// Shapes follow the context dimensions described in the module docs:
/// the opcode tables are `(state, phase)` or `(state)` keyed, literals are
/// keyed by the top bits of the previous output byte, and distances by a
/// length bucket. `dist_special` is deliberately one flat array shared by
/// several slot ranges through overlapping windows.
#[derive(Debug, Clone)]
pub struct Models {
    pub is_match: [[BitModel; POS_STATES]; STATES],
    pub is_rep: [BitModel; STATES],
    pub is_rep0: [BitModel; STATES],
    pub is_rep0_long: [[BitModel; POS_STATES]; STATES],
    pub is_rep1: [BitModel; STATES],
    pub is_rep2: [BitModel; STATES],
    pub literal: Box<[[BitModel; LITERAL_TABLE_SIZE]; LITERAL_CONTEXTS]>,
    pub dist_slot: [[BitModel; DIST_SLOTS]; DIST_STATES],
    pub dist_special: [BitModel; DIST_SPECIAL_SIZE],
    pub dist_align: [BitModel; ALIGN_SIZE],
    pub match_len: LenModel,
    pub rep_len: LenModel,
}

impl Models {
    pub fn new() -> Self {
        Self {
            is_match: [[BitModel::new(); POS_STATES]; STATES],
            is_rep: [BitModel::new(); STATES],
            is_rep0: [BitModel::new(); STATES],
            is_rep0_long: [[BitModel::new(); POS_STATES]; STATES],
            is_rep1: [BitModel::new(); STATES],
            is_rep2: [BitModel::new(); STATES],
            literal: Box::new([[BitModel::new(); LITERAL_TABLE_SIZE]; LITERAL_CONTEXTS]),
            dist_slot: [[BitModel::new(); DIST_SLOTS]; DIST_STATES],
            dist_special: [BitModel::new(); DIST_SPECIAL_SIZE],
            dist_align: [BitModel::new(); ALIGN_SIZE],
            match_len: LenModel::new(),
            rep_len: LenModel::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_probability_is_half_scale() {
        assert_eq!(BitModel::new().probability, 1024);
    }

    #[test]
    fn test_update_directions() {
        let mut bm = BitModel::new();
        bm.update_zero();
        assert!(bm.probability > 1024);

        let mut bm = BitModel::new();
        bm.update_one();
        assert!(bm.probability < 1024);
    }

    #[test]
    fn test_probability_saturates_inside_scale() {
        // Repeated updates must never leave (0, BIT_MODEL_TOTAL)
        let mut bm = BitModel::new();
        for _ in 0..1000 {
            bm.update_zero();
        }
        assert!(bm.probability < BIT_MODEL_TOTAL);

        let mut bm = BitModel::new();
        for _ in 0..1000 {
            bm.update_one();
        }
        assert!(bm.probability > 0);
    }

    #[test]
    fn test_models_allocate_expected_shapes() {
        let m = Models::new();
        assert_eq!(m.literal.len(), 8);
        assert_eq!(m.dist_special.len(), 115);
        assert_eq!(m.dist_align.len(), 16);
        assert_eq!(m.match_len.high.len(), 256);
    }
}
