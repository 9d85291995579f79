//! Reference LZMA encoder for tests and benchmarks.
//!
//! Not part of the public API. The encoder mirrors the decoder cell for
//! cell — same tables, same state transitions, same normalization — so
//! round-trip tests exercise the real bitstream format without binary
//! fixtures. Operations (literal / match / rep / short rep) are chosen
//! explicitly by the caller rather than by a match finder.

use super::bit_model::{BitModel, LenModel, Models, BIT_MODEL_TOTAL_BITS};
use super::state::State;
use super::{
    ALIGN_BITS, DIST_STATES, END_DIST_MODEL, LEN_LOW_SYMBOLS, LEN_MID_SYMBOLS, MIN_MATCH_LEN,
    START_DIST_MODEL,
};

const RANGE_TOP: u32 = 0x0100_0000;

/// Carry-tracking binary range encoder.
struct RangeEncoder {
    low: u64,
    range: u32,
    cache: u8,
    cache_size: u64,
    out: Vec<u8>,
}

impl RangeEncoder {
    fn new() -> Self {
        Self {
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0,
            cache_size: 1,
            out: Vec::new(),
        }
    }

    fn shift_low(&mut self) {
        let low = self.low;
        if low < 0xFF00_0000 || low > 0xFFFF_FFFF {
            let carry = (low >> 32) as u8;
            let mut byte = self.cache;
            loop {
                self.out.push(byte.wrapping_add(carry));
                byte = 0xFF;
                self.cache_size -= 1;
                if self.cache_size == 0 {
                    break;
                }
            }
            self.cache = (low >> 24) as u8;
        }
        self.cache_size += 1;
        self.low = (low & 0x00FF_FFFF) << 8;
    }

    fn encode_bit(&mut self, bm: &mut BitModel, bit: bool) {
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * bm.probability;
        if bit {
            self.low += u64::from(bound);
            self.range -= bound;
            bm.update_one();
        } else {
            self.range = bound;
            bm.update_zero();
        }
        if self.range < RANGE_TOP {
            self.range <<= 8;
            self.shift_low();
        }
    }

    fn encode_direct(&mut self, value: u32, num_bits: u32) {
        for i in (0..num_bits).rev() {
            self.range >>= 1;
            if (value >> i) & 1 != 0 {
                self.low += u64::from(self.range);
            }
            if self.range < RANGE_TOP {
                self.range <<= 8;
                self.shift_low();
            }
        }
    }

    fn encode_tree(&mut self, bm: &mut [BitModel], num_bits: u32, symbol: u32) {
        let mut model: usize = 1;
        for i in (0..num_bits).rev() {
            let bit = (symbol >> i) & 1 != 0;
            self.encode_bit(&mut bm[model], bit);
            model = (model << 1) | usize::from(bit);
        }
    }

    fn encode_tree_reversed(&mut self, bm: &mut [BitModel], num_bits: u32, symbol: u32) {
        let mut model: usize = 1;
        for i in 0..num_bits {
            let bit = (symbol >> i) & 1 != 0;
            self.encode_bit(&mut bm[model], bit);
            model = (model << 1) | usize::from(bit);
        }
    }

    fn encode_matched(&mut self, bm: &mut [BitModel], match_byte: u8, symbol: u8) {
        let mut model: usize = 1;
        let mut matched = u32::from(match_byte);
        let mut in_sync = true;
        for i in (0..8).rev() {
            let bit = (symbol >> i) & 1 != 0;
            if in_sync {
                matched <<= 1;
                let match_bit = (matched & 0x100) as usize;
                self.encode_bit(&mut bm[0x100 + match_bit + model], bit);
                if (match_bit != 0) != bit {
                    in_sync = false;
                }
            } else {
                self.encode_bit(&mut bm[model], bit);
            }
            model = (model << 1) | usize::from(bit);
        }
    }

    fn encode_len(&mut self, lm: &mut LenModel, pos_state: usize, len: u32) {
        let symbol = len - MIN_MATCH_LEN;
        if symbol < LEN_LOW_SYMBOLS {
            self.encode_bit(&mut lm.choice1, false);
            self.encode_tree(&mut lm.low[pos_state], 3, symbol);
        } else if symbol < LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS {
            self.encode_bit(&mut lm.choice1, true);
            self.encode_bit(&mut lm.choice2, false);
            self.encode_tree(&mut lm.mid[pos_state], 3, symbol - LEN_LOW_SYMBOLS);
        } else {
            self.encode_bit(&mut lm.choice1, true);
            self.encode_bit(&mut lm.choice2, true);
            self.encode_tree(&mut lm.high, 8, symbol - LEN_LOW_SYMBOLS - LEN_MID_SYMBOLS);
        }
    }

    fn flush(mut self) -> Vec<u8> {
        for _ in 0..5 {
            self.shift_low();
        }
        // guard byte: keeps the decoder's final renormalization inside
        // the buffer regardless of where the carry chain ended
        self.out.push(0);
        self.out
    }
}

/// Distance slot for a 0-based distance value.
fn dist_slot_of(distance: u32) -> u32 {
    if distance < START_DIST_MODEL {
        return distance;
    }
    let bits = 32 - distance.leading_zeros();
    ((bits - 1) << 1) | ((distance >> (bits - 2)) & 1)
}

/// Explicit-operation LZMA encoder over the shared model tables.
pub struct ReferenceEncoder {
    rc: RangeEncoder,
    models: Models,
    state: State,
    rep: [u32; 4],
    history: Vec<u8>,
}

impl ReferenceEncoder {
    pub fn new() -> Self {
        Self {
            rc: RangeEncoder::new(),
            models: Models::new(),
            state: State::new(),
            rep: [0; 4],
            history: Vec::new(),
        }
    }

    /// The plaintext produced by the operations so far.
    pub fn plain(&self) -> &[u8] {
        &self.history
    }

    fn pos_state(&self) -> usize {
        self.history.len() & (super::POS_STATES - 1)
    }

    /// Encode one literal byte.
    pub fn literal(&mut self, byte: u8) {
        let pos_state = self.pos_state();
        let st = self.state.index();
        self.rc
            .encode_bit(&mut self.models.is_match[st][pos_state], false);

        let prev = self.history.last().copied().unwrap_or(0);
        let table = &mut self.models.literal[(prev >> (8 - super::LITERAL_CONTEXT_BITS)) as usize];
        if self.state.is_literal() {
            self.rc.encode_tree(&mut table[..0x100], 8, u32::from(byte));
        } else {
            let match_byte = self.history[self.history.len() - 1 - self.rep[0] as usize];
            self.rc.encode_matched(table, match_byte, byte);
        }
        self.history.push(byte);
        self.state.set_literal();
    }

    /// Encode a string of literals.
    pub fn literals(&mut self, data: &[u8]) {
        for &b in data {
            self.literal(b);
        }
    }

    /// Encode a match at `distance` (1-based, must point into the
    /// history) of `len` bytes.
    pub fn match_at(&mut self, distance: u32, len: u32) {
        assert!(distance as usize <= self.history.len(), "match outside history");
        self.encode_match_bits(distance - 1, len);
        self.push_copy(distance as usize, len as usize);
        self.shift_reps(distance - 1);
        self.state.set_match();
    }

    /// Encode the bit pattern of a match without validating the
    /// distance. History is padded with zeros; used to craft corrupt
    /// streams.
    pub fn raw_match(&mut self, distance: u32, len: u32) {
        self.encode_match_bits(distance - 1, len);
        self.history.resize(self.history.len() + len as usize, 0);
        self.shift_reps(distance - 1);
        self.state.set_match();
    }

    /// Encode a long repeat of `rep[n]` with the given length.
    pub fn long_rep(&mut self, n: usize, len: u32) {
        let pos_state = self.pos_state();
        let st = self.state.index();
        self.rc
            .encode_bit(&mut self.models.is_match[st][pos_state], true);
        self.rc.encode_bit(&mut self.models.is_rep[st], true);
        match n {
            0 => {
                self.rc.encode_bit(&mut self.models.is_rep0[st], false);
                self.rc
                    .encode_bit(&mut self.models.is_rep0_long[st][pos_state], true);
            }
            1 => {
                self.rc.encode_bit(&mut self.models.is_rep0[st], true);
                self.rc.encode_bit(&mut self.models.is_rep1[st], false);
                let d = self.rep[1];
                self.rep[1] = self.rep[0];
                self.rep[0] = d;
            }
            2 => {
                self.rc.encode_bit(&mut self.models.is_rep0[st], true);
                self.rc.encode_bit(&mut self.models.is_rep1[st], true);
                self.rc.encode_bit(&mut self.models.is_rep2[st], false);
                let d = self.rep[2];
                self.rep[2] = self.rep[1];
                self.rep[1] = self.rep[0];
                self.rep[0] = d;
            }
            3 => {
                self.rc.encode_bit(&mut self.models.is_rep0[st], true);
                self.rc.encode_bit(&mut self.models.is_rep1[st], true);
                self.rc.encode_bit(&mut self.models.is_rep2[st], true);
                let d = self.rep[3];
                self.rep[3] = self.rep[2];
                self.rep[2] = self.rep[1];
                self.rep[1] = self.rep[0];
                self.rep[0] = d;
            }
            _ => panic!("rep index out of range"),
        }
        self.state.set_rep();
        let pos_state = self.pos_state();
        self.rc.encode_len(&mut self.models.rep_len, pos_state, len);
        self.push_copy(self.rep[0] as usize + 1, len as usize);
    }

    /// Encode a short repeat: one byte from `rep[0]`.
    pub fn short_rep(&mut self) {
        let pos_state = self.pos_state();
        let st = self.state.index();
        self.rc
            .encode_bit(&mut self.models.is_match[st][pos_state], true);
        self.rc.encode_bit(&mut self.models.is_rep[st], true);
        self.rc.encode_bit(&mut self.models.is_rep0[st], false);
        self.rc
            .encode_bit(&mut self.models.is_rep0_long[st][pos_state], false);
        self.push_copy(self.rep[0] as usize + 1, 1);
        self.state.set_short_rep();
    }

    /// Encode the end-of-stream marker and flush.
    pub fn finish(self) -> Vec<u8> {
        self.finish_with_marker_len(MIN_MATCH_LEN)
    }

    /// Encode an end marker carrying an arbitrary length, then flush.
    ///
    /// Lengths other than 2 produce a stream every conforming decoder
    /// must reject.
    pub fn finish_with_marker_len(mut self, len: u32) -> Vec<u8> {
        self.encode_match_bits(super::END_MARKER_DISTANCE, len);
        self.rc.flush()
    }

    fn encode_match_bits(&mut self, rep0: u32, len: u32) {
        let pos_state = self.pos_state();
        let st = self.state.index();
        self.rc
            .encode_bit(&mut self.models.is_match[st][pos_state], true);
        self.rc.encode_bit(&mut self.models.is_rep[st], false);
        self.rc
            .encode_len(&mut self.models.match_len, pos_state, len);

        let len_state = ((len - MIN_MATCH_LEN) as usize).min(DIST_STATES - 1);
        let slot = dist_slot_of(rep0);
        self.rc
            .encode_tree(&mut self.models.dist_slot[len_state], super::DIST_SLOT_BITS, slot);

        if slot >= START_DIST_MODEL {
            let direct_bits = (slot >> 1) - 1;
            let base = (2 | (slot & 1)) << direct_bits;
            let rest = rep0 - base;
            if slot < END_DIST_MODEL {
                let offset = (base - slot) as usize;
                let end = offset + (1usize << direct_bits);
                self.rc.encode_tree_reversed(
                    &mut self.models.dist_special[offset..end],
                    direct_bits,
                    rest,
                );
            } else {
                self.rc
                    .encode_direct(rest >> ALIGN_BITS, direct_bits - ALIGN_BITS);
                self.rc.encode_tree_reversed(
                    &mut self.models.dist_align,
                    ALIGN_BITS,
                    rest & (super::ALIGN_SIZE as u32 - 1),
                );
            }
        }
    }

    fn shift_reps(&mut self, rep0: u32) {
        self.rep[3] = self.rep[2];
        self.rep[2] = self.rep[1];
        self.rep[1] = self.rep[0];
        self.rep[0] = rep0;
    }

    fn push_copy(&mut self, distance: usize, len: usize) {
        for _ in 0..len {
            let byte = self.history[self.history.len() - distance];
            self.history.push(byte);
        }
    }
}

impl Default for ReferenceEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_output_byte_is_zero() {
        let mut enc = ReferenceEncoder::new();
        enc.literals(b"abc");
        let stream = enc.finish();
        assert_eq!(stream[0], 0);
        assert!(stream.len() >= 6);
    }

    #[test]
    fn test_dist_slot_values() {
        assert_eq!(dist_slot_of(0), 0);
        assert_eq!(dist_slot_of(3), 3);
        assert_eq!(dist_slot_of(4), 4);
        assert_eq!(dist_slot_of(5), 4);
        assert_eq!(dist_slot_of(6), 5);
        assert_eq!(dist_slot_of(96), 13);
        assert_eq!(dist_slot_of(0xFFFF_FFFF), 63);
    }

    #[test]
    fn test_history_tracks_operations() {
        let mut enc = ReferenceEncoder::new();
        enc.literals(b"abcd");
        enc.match_at(4, 8);
        assert_eq!(enc.plain(), b"abcdabcdabcd");
        enc.short_rep();
        assert_eq!(enc.plain(), b"abcdabcdabcda");
    }
}
