//! Binary range decoder over an input accumulator.
//!
//! The decoder tracks the arithmetic-coded interval as a `range`/`code`
//! register pair. After normalization `range` always lies in
//! `[2^24, 2^32)` and `code < range`; each normalization step shifts both
//! registers left by 8 bits and pulls one more compressed byte into the
//! low byte of `code`. Pulling a byte is the single point where the
//! decoder can run out of input.
//!
//! Compressed bytes arrive through [`push_input`](RangeDecoder::push_input)
//! and are consumed in order; the driver loop keeps enough bytes buffered
//! that a whole opcode never underflows mid-decode unless the caller has
//! declared end of input with [`finish`](RangeDecoder::finish).

use super::bit_model::{BitModel, LenModel, BIT_MODEL_TOTAL_BITS};
use super::{LEN_LOW_SYMBOLS, LEN_MID_SYMBOLS, MIN_MATCH_LEN};
use crate::error::{LzmaError, Result};

/// Normalization threshold: renormalize whenever `range` drops to 2^24.
const RANGE_TOP: u32 = 0x0100_0000;

/// Consumed-prefix size that triggers compaction of the accumulator.
const COMPACT_THRESHOLD: usize = 64 * 1024;

/// Range decoder state plus the compressed-input accumulator.
pub struct RangeDecoder {
    code: u32,
    range: u32,
    /// Accumulated compressed bytes, compacted as they are consumed.
    input: Vec<u8>,
    /// Read cursor into `input`.
    pos: usize,
    /// Bytes consumed and already discarded by compaction.
    discarded: u64,
    /// Caller promised no further input.
    finished: bool,
}

impl RangeDecoder {
    pub fn new() -> Self {
        Self {
            code: 0,
            range: 0xFFFF_FFFF,
            input: Vec::new(),
            pos: 0,
            discarded: 0,
            finished: false,
        }
    }

    /// Append compressed bytes to the accumulator.
    pub fn push_input(&mut self, data: &[u8]) {
        if self.pos >= COMPACT_THRESHOLD {
            self.input.drain(..self.pos);
            self.discarded += self.pos as u64;
            self.pos = 0;
        }
        self.input.extend_from_slice(data);
    }

    /// Declare that no more input will arrive.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Whether `finish` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Unconsumed bytes currently buffered.
    pub fn available(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Total compressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.discarded + self.pos as u64
    }

    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        match self.input.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(LzmaError::InputUnderflow),
        }
    }

    /// Seed the register pair from the head of the stream.
    ///
    /// Discards one leading byte, then reads 4 big-endian bytes into
    /// `code`. Must run exactly once, before the first opcode.
    pub fn load(&mut self) -> Result<()> {
        self.code = 0;
        self.range = 0xFFFF_FFFF;
        self.read_byte()?;
        for _ in 0..4 {
            self.code = (self.code << 8) | u32::from(self.read_byte()?);
        }
        Ok(())
    }

    /// Bring `range` back above 2^24, pulling one input byte if needed.
    ///
    /// A single step suffices: probabilities are bounded away from 0 and
    /// 1, so one decode shrinks `range` by less than a factor of 256.
    #[inline]
    fn normalize(&mut self) -> Result<()> {
        if self.range < RANGE_TOP {
            self.range <<= 8;
            self.code = (self.code << 8) | u32::from(self.read_byte()?);
        }
        Ok(())
    }

    /// Decode one bit against an adaptive probability cell.
    #[inline]
    pub fn decode_bit(&mut self, bm: &mut BitModel) -> Result<bool> {
        self.normalize()?;
        let bound = (self.range >> BIT_MODEL_TOTAL_BITS) * bm.probability;
        if self.code < bound {
            self.range = bound;
            bm.update_zero();
            Ok(false)
        } else {
            self.code -= bound;
            self.range -= bound;
            bm.update_one();
            Ok(true)
        }
    }

    /// Decode `num_bits` unmodeled bits, MSB first.
    ///
    /// Used for the high-order bits of long distances, where adaptive
    /// modeling would buy nothing.
    pub fn decode_direct(&mut self, num_bits: u32) -> Result<u32> {
        let mut symbol = 0u32;
        for _ in 0..num_bits {
            self.normalize()?;
            self.range >>= 1;
            symbol <<= 1;
            if self.code >= self.range {
                self.code -= self.range;
                symbol |= 1;
            }
        }
        Ok(symbol)
    }

    /// Decode an `num_bits`-wide symbol through a flat binary tree.
    ///
    /// The tree is stored as an array walked from index 1, doubling and
    /// OR-ing the decoded bit at each level; the result is the final index
    /// minus 2^num_bits. Every index is checked against the table — an
    /// out-of-range index means the stream is corrupt.
    pub fn decode_tree(&mut self, bm: &mut [BitModel], num_bits: u32) -> Result<u32> {
        let limit = bm.len();
        let mut symbol: usize = 1;
        for _ in 0..num_bits {
            let cell = bm.get_mut(symbol).ok_or(LzmaError::RangeCheckFailure {
                index: symbol,
                limit,
            })?;
            let bit = self.decode_bit(cell)?;
            symbol = (symbol << 1) | usize::from(bit);
        }
        Ok(symbol as u32 & ((1 << num_bits) - 1))
    }

    /// Tree decode returning the bits in reverse (LSB-first) order.
    ///
    /// Low-order distance bits are coded this way: bit significance runs
    /// opposite to the tree's natural top-down traversal.
    pub fn decode_tree_reversed(&mut self, bm: &mut [BitModel], num_bits: u32) -> Result<u32> {
        let limit = bm.len();
        let mut model: usize = 1;
        let mut symbol = 0u32;
        for i in 0..num_bits {
            let cell = bm.get_mut(model).ok_or(LzmaError::RangeCheckFailure {
                index: model,
                limit,
            })?;
            let bit = self.decode_bit(cell)?;
            model = (model << 1) | usize::from(bit);
            if bit {
                symbol |= 1 << i;
            }
        }
        Ok(symbol)
    }

    /// Decode a literal biased by a predicted byte from the dictionary.
    ///
    /// At each bit, the cell is chosen by the corresponding bit of
    /// `match_byte`; the moment the decoded bit disagrees with the
    /// prediction, the remaining bits fall back to the plain tree. This
    /// accelerates literals that nearly repeat earlier data.
    pub fn decode_matched(&mut self, bm: &mut [BitModel], match_byte: u8) -> Result<u32> {
        let limit = bm.len();
        let mut symbol: usize = 1;
        let mut matched = u32::from(match_byte);
        while symbol < 0x100 {
            matched <<= 1;
            let match_bit = (matched & 0x100) as usize;
            let index = 0x100 + match_bit + symbol;
            let cell = bm.get_mut(index).ok_or(LzmaError::RangeCheckFailure {
                index,
                limit,
            })?;
            let bit = self.decode_bit(cell)?;
            symbol = (symbol << 1) | usize::from(bit);
            if (match_bit != 0) != bit {
                // prediction broken: plain tree for the remaining bits
                while symbol < 0x100 {
                    let cell = bm.get_mut(symbol).ok_or(LzmaError::RangeCheckFailure {
                        index: symbol,
                        limit,
                    })?;
                    let bit = self.decode_bit(cell)?;
                    symbol = (symbol << 1) | usize::from(bit);
                }
                break;
            }
        }
        Ok(symbol as u32 & 0xFF)
    }

    /// Decode a match length (2..=273) from a three-tier length model.
    ///
    /// Two choice bits select low (2..=9), mid (10..=17) or high
    /// (18..=273); low and mid trees are keyed by position phase.
    pub fn decode_len(&mut self, lm: &mut LenModel, pos_state: usize) -> Result<u32> {
        if !self.decode_bit(&mut lm.choice1)? {
            let symbol = self.decode_tree(&mut lm.low[pos_state], 3)?;
            return Ok(symbol + MIN_MATCH_LEN);
        }
        if !self.decode_bit(&mut lm.choice2)? {
            let symbol = self.decode_tree(&mut lm.mid[pos_state], 3)?;
            return Ok(symbol + MIN_MATCH_LEN + LEN_LOW_SYMBOLS);
        }
        let symbol = self.decode_tree(&mut lm.high, 8)?;
        Ok(symbol + MIN_MATCH_LEN + LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_seeds_code_from_bytes_1_to_4() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&[0x00, 0x12, 0x34, 0x56, 0x78]);
        rd.load().unwrap();
        assert_eq!(rd.code, 0x12345678);
        assert_eq!(rd.range, 0xFFFF_FFFF);
        assert_eq!(rd.total_in(), 5);
    }

    #[test]
    fn test_load_underflows_on_short_input() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&[0x00, 0x12]);
        assert!(matches!(rd.load(), Err(LzmaError::InputUnderflow)));
    }

    #[test]
    fn test_decode_direct_consumes_no_bytes_while_range_high() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&[0x00, 0x12, 0x34, 0x56, 0x78]);
        rd.load().unwrap();
        // range starts at 2^32 - 1: three direct bits never renormalize
        rd.decode_direct(3).unwrap();
        assert_eq!(rd.total_in(), 5);
    }

    #[test]
    fn test_direct_bits_underflow_after_finish() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        rd.finish();
        rd.load().unwrap();
        // 64 direct bits must renormalize past the buffered bytes
        assert!(matches!(
            rd.decode_direct(64),
            Err(LzmaError::InputUnderflow)
        ));
    }

    #[test]
    fn test_push_input_compacts_consumed_prefix() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&vec![0u8; COMPACT_THRESHOLD + 16]);
        rd.load().unwrap();
        rd.pos = COMPACT_THRESHOLD + 8;
        rd.push_input(&[1, 2, 3]);
        assert_eq!(rd.pos, 0);
        assert_eq!(rd.total_in(), (COMPACT_THRESHOLD + 8) as u64);
        assert_eq!(rd.available(), 8 + 3);
    }

    #[test]
    fn test_tree_decode_rejects_short_table() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&[0x00, 0x12, 0x34, 0x56, 0x78]);
        rd.load().unwrap();
        // a 3-bit tree needs 8 cells; 4 must trip the range check
        let mut table = [BitModel::new(); 4];
        let err = rd.decode_tree(&mut table, 3);
        assert!(matches!(err, Err(LzmaError::RangeCheckFailure { .. })));
    }

    #[test]
    fn test_reversed_tree_decode_rejects_short_table() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&[0x00, 0x12, 0x34, 0x56, 0x78]);
        rd.load().unwrap();
        let mut table = [BitModel::new(); 4];
        let err = rd.decode_tree_reversed(&mut table, 3);
        assert!(matches!(
            err,
            Err(LzmaError::RangeCheckFailure { limit: 4, .. })
        ));
    }

    #[test]
    fn test_matched_decode_rejects_short_table() {
        let mut rd = RangeDecoder::new();
        rd.push_input(&[0x00, 0x12, 0x34, 0x56, 0x78]);
        rd.load().unwrap();
        // matched decoding indexes from 0x100 upward
        let mut table = [BitModel::new(); 16];
        let err = rd.decode_matched(&mut table, 0xAA);
        assert!(matches!(
            err,
            Err(LzmaError::RangeCheckFailure { limit: 16, .. })
        ));
    }
}
