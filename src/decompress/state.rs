//! The 12-value context state machine.
//!
//! The state tracks a short history of {literal, match, rep, short-rep}
//! events and is used purely as a context selector for the opcode
//! probability tables. The values and transitions are fixed by the LZMA
//! bitstream format and must not be altered:
//!
//! | Value | History |
//! |-------|---------|
//! | 0 | lit, lit, lit |
//! | 1 | match, lit, lit |
//! | 2 | rep, lit, lit |
//! | 3 | short rep, lit, lit |
//! | 4 | match, lit |
//! | 5 | rep, lit |
//! | 6 | short rep, lit |
//! | 7 | lit, match |
//! | 8 | lit, rep |
//! | 9 | lit, short rep |
//! | 10 | non-lit, match |
//! | 11 | non-lit, rep or short rep |
//!
//! Two parallel tracks (7..=9 vs 10..=11) distinguish "literal then match"
//! history from "match then match" history for better prediction.

/// Context-model state, one of 12 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State(u8);

impl State {
    /// The state at stream start: as if preceded by literals only.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Table index of this state.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether the last operation was a literal.
    ///
    /// Selects plain (rather than matched) literal decoding.
    #[inline]
    pub fn is_literal(self) -> bool {
        self.0 < 7
    }

    /// Transition after decoding a literal.
    #[inline]
    pub fn set_literal(&mut self) {
        self.0 = match self.0 {
            0..=3 => 0,
            4..=9 => self.0 - 3,
            _ => self.0 - 6,
        };
    }

    /// Transition after decoding a match with a new distance.
    #[inline]
    pub fn set_match(&mut self) {
        self.0 = if self.0 < 7 { 7 } else { 10 };
    }

    /// Transition after decoding a long repeat.
    #[inline]
    pub fn set_rep(&mut self) {
        self.0 = if self.0 < 7 { 8 } else { 11 };
    }

    /// Transition after decoding a short repeat.
    #[inline]
    pub fn set_short_rep(&mut self) {
        self.0 = if self.0 < 7 { 9 } else { 11 };
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
