//! The opcode dispatch loop and the suspend/resume protocol.
//!
//! [`LzmaDecoder`] is best thought of as a resumable coroutine: each call
//! to [`run`](LzmaDecoder::run) decodes whole opcodes until it hits a
//! suspension point and returns a [`DecodeStatus`]. No internal blocking,
//! no I/O; the decoder only moves bytes between the input accumulator and
//! the dictionary window.
//!
//! ```rust
//! use lzma_stream::{DecodeStatus, LzmaDecoder};
//!
//! fn inflate(compressed: &[u8]) -> Result<Vec<u8>, lzma_stream::LzmaError> {
//!     let mut decoder = LzmaDecoder::new(1 << 16)?;
//!     decoder.feed(compressed);
//!     decoder.finish();
//!     let mut out = Vec::new();
//!     loop {
//!         match decoder.run()? {
//!             DecodeStatus::StreamEnd => break,
//!             _ => out.extend_from_slice(decoder.drain()),
//!         }
//!     }
//!     out.extend_from_slice(decoder.drain());
//!     Ok(out)
//! }
//! ```

use super::bit_model::Models;
use super::range_decoder::RangeDecoder;
use super::state::State;
use super::window::Window;
use super::{
    ALIGN_BITS, DIST_STATES, END_DIST_MODEL, END_MARKER_DISTANCE, MAX_DICT_SIZE, MAX_MATCH_LEN,
    MIN_DICT_SIZE, MIN_MATCH_LEN, POS_STATE_MASK, START_DIST_MODEL,
};
use crate::error::{LzmaError, Result};

/// Upper bound on compressed bytes one opcode can pull through
/// normalization (worst case is a long match: 48 bit decodes, one byte
/// each, plus slack).
const OPCODE_INPUT_MARGIN: usize = 64;

/// Outcome of one [`LzmaDecoder::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// The input accumulator ran low. Feed more compressed bytes (or call
    /// [`finish`](LzmaDecoder::finish) if there are none) and run again.
    NeedInput,
    /// The window filled with undrained output. Drain and run again.
    NeedOutput,
    /// The end-of-stream marker was decoded. Drain any remaining output.
    StreamEnd,
}

/// Streaming LZMA decoder.
///
/// Created once per compressed stream; owns every probability table
/// (nothing is shared between instances) and the dictionary window. All
/// errors are terminal: after a failure the handle is poisoned and must
/// be replaced.
pub struct LzmaDecoder {
    rdec: RangeDecoder,
    window: Window,
    models: Models,
    state: State,
    /// Most recently used distances, most recent first.
    rep: [u32; 4],
    /// Range coder seeded from the stream head.
    seeded: bool,
    /// End-of-stream marker decoded; `run` is a sticky no-op.
    done: bool,
    /// A terminal error was returned; the handle is unusable.
    poisoned: bool,
}

impl LzmaDecoder {
    /// Create a decoder with the given dictionary size.
    ///
    /// The dictionary size comes from the container header and bounds
    /// back-reference validity. Sizes outside 4 KiB..=512 MiB are
    /// rejected.
    pub fn new(dict_size: u32) -> Result<Self> {
        if !(MIN_DICT_SIZE..=MAX_DICT_SIZE).contains(&dict_size) {
            return Err(LzmaError::InvalidDictionarySize(dict_size));
        }
        Ok(Self {
            rdec: RangeDecoder::new(),
            window: Window::new(dict_size as usize),
            models: Models::new(),
            state: State::new(),
            rep: [0; 4],
            seeded: false,
            done: false,
            poisoned: false,
        })
    }

    /// Append compressed bytes to the input accumulator.
    pub fn feed(&mut self, data: &[u8]) {
        self.rdec.push_input(data);
    }

    /// Declare that no further compressed bytes will arrive.
    ///
    /// After this, `run` decodes through the remaining buffered bytes and
    /// running out of them becomes [`LzmaError::InputUnderflow`] instead
    /// of [`DecodeStatus::NeedInput`].
    pub fn finish(&mut self) {
        self.rdec.finish();
    }

    /// Hand out the next contiguous run of decoded bytes.
    ///
    /// Returns an empty slice when nothing is pending; after a
    /// `NeedOutput` suspension, call repeatedly until empty.
    pub fn drain(&mut self) -> &[u8] {
        self.window.drain()
    }

    /// Decoded bytes not yet drained.
    pub fn pending_output(&self) -> usize {
        self.window.pending()
    }

    /// Total compressed bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.rdec.total_in()
    }

    /// Total decompressed bytes produced.
    pub fn total_out(&self) -> u64 {
        self.window.total()
    }

    /// Decode until a suspension point.
    ///
    /// Runs whole opcodes; the cursor state between calls is exactly the
    /// fields of this struct, so satisfying a `NeedInput`/`NeedOutput`
    /// and calling again resumes transparently. `StreamEnd` is sticky.
    pub fn run(&mut self) -> Result<DecodeStatus> {
        if self.poisoned {
            return Err(LzmaError::DecoderPoisoned);
        }
        if self.done {
            return Ok(DecodeStatus::StreamEnd);
        }
        match self.run_inner() {
            Ok(status) => {
                if status == DecodeStatus::StreamEnd {
                    self.done = true;
                }
                Ok(status)
            }
            Err(e) => {
                self.poisoned = true;
                Err(e)
            }
        }
    }

    /// One-shot decompression of a complete stream.
    pub fn decompress(data: &[u8], dict_size: u32) -> Result<Vec<u8>> {
        Self::decompress_with_limit(data, dict_size, u64::MAX)
    }

    /// One-shot decompression, failing once `limit` output bytes are
    /// exceeded.
    pub fn decompress_with_limit(data: &[u8], dict_size: u32, limit: u64) -> Result<Vec<u8>> {
        let mut decoder = Self::new(dict_size)?;
        decoder.feed(data);
        decoder.finish();
        let mut out = Vec::new();
        loop {
            let status = decoder.run()?;
            loop {
                let run = decoder.drain();
                if run.is_empty() {
                    break;
                }
                out.extend_from_slice(run);
            }
            if out.len() as u64 > limit {
                return Err(LzmaError::OutputOverflow {
                    produced: out.len() as u64,
                    limit,
                });
            }
            match status {
                DecodeStatus::StreamEnd => return Ok(out),
                // finish() was called: the accumulator cannot refill
                DecodeStatus::NeedInput => return Err(LzmaError::InputUnderflow),
                DecodeStatus::NeedOutput => {}
            }
        }
    }

    fn run_inner(&mut self) -> Result<DecodeStatus> {
        if !self.seeded {
            // 1 discarded byte + 4 code bytes
            if self.rdec.available() < 5 && !self.rdec.is_finished() {
                return Ok(DecodeStatus::NeedInput);
            }
            self.rdec.load()?;
            self.seeded = true;
        }

        loop {
            if self.rdec.available() < OPCODE_INPUT_MARGIN && !self.rdec.is_finished() {
                return Ok(DecodeStatus::NeedInput);
            }
            if self.window.free() < MAX_MATCH_LEN as usize {
                return Ok(DecodeStatus::NeedOutput);
            }
            if self.decode_op()? {
                return Ok(DecodeStatus::StreamEnd);
            }
        }
    }

    /// Decode one opcode. Returns true on the end-of-stream marker.
    fn decode_op(&mut self) -> Result<bool> {
        let pos_state = (self.window.total() & POS_STATE_MASK) as usize;
        let st = self.state.index();

        if !self
            .rdec
            .decode_bit(&mut self.models.is_match[st][pos_state])?
        {
            self.decode_literal()?;
            return Ok(false);
        }

        if self.rdec.decode_bit(&mut self.models.is_rep[st])? {
            self.decode_rep(pos_state)?;
            return Ok(false);
        }

        self.decode_match(pos_state)
    }

    /// Decode one literal byte, plain or matched.
    fn decode_literal(&mut self) -> Result<()> {
        let lit_state = (self.window.prev_byte() >> (8 - super::LITERAL_CONTEXT_BITS)) as usize;
        let table = self
            .models
            .literal
            .get_mut(lit_state)
            .ok_or(LzmaError::RangeCheckFailure {
                index: lit_state,
                limit: super::LITERAL_CONTEXTS,
            })?;

        let byte = if self.state.is_literal() {
            self.rdec.decode_tree(&mut table[..0x100], 8)? as u8
        } else {
            // bias the decode by the byte at the current best-guess
            // distance; literals often nearly repeat earlier data
            let predicted = self.window.read_back(self.rep[0])?;
            self.rdec.decode_matched(&mut table[..], predicted)? as u8
        };

        self.window.push(byte);
        self.state.set_literal();
        Ok(())
    }

    /// Decode a repeat match: short rep or long rep 0..=3.
    fn decode_rep(&mut self, pos_state: usize) -> Result<()> {
        let st = self.state.index();

        if !self.rdec.decode_bit(&mut self.models.is_rep0[st])? {
            if !self
                .rdec
                .decode_bit(&mut self.models.is_rep0_long[st][pos_state])?
            {
                // short rep: exactly one byte from rep0, cache untouched
                let byte = self.window.read_back(self.rep[0])?;
                self.window.push(byte);
                self.state.set_short_rep();
                return Ok(());
            }
        } else {
            // promote rep[n] to the front, shifting the newer entries down
            let distance;
            if !self.rdec.decode_bit(&mut self.models.is_rep1[st])? {
                distance = self.rep[1];
            } else {
                if !self.rdec.decode_bit(&mut self.models.is_rep2[st])? {
                    distance = self.rep[2];
                } else {
                    distance = self.rep[3];
                    self.rep[3] = self.rep[2];
                }
                self.rep[2] = self.rep[1];
            }
            self.rep[1] = self.rep[0];
            self.rep[0] = distance;
        }

        self.state.set_rep();
        let len = self.rdec.decode_len(&mut self.models.rep_len, pos_state)?;
        self.window.copy_match(self.rep[0], len)
    }

    /// Decode a match with a newly coded distance.
    ///
    /// Returns true if the distance was the end-of-stream marker.
    fn decode_match(&mut self, pos_state: usize) -> Result<bool> {
        let len = self
            .rdec
            .decode_len(&mut self.models.match_len, pos_state)?;
        let len_state = ((len - MIN_MATCH_LEN) as usize).min(DIST_STATES - 1);

        let slot = self
            .rdec
            .decode_tree(&mut self.models.dist_slot[len_state], super::DIST_SLOT_BITS)?;

        let mut distance = slot;
        if slot >= START_DIST_MODEL {
            let direct_bits = (slot >> 1) - 1;
            distance = (2 | (slot & 1)) << direct_bits;
            if slot < END_DIST_MODEL {
                // overlapping windows into one shared table; the offset
                // is base distance minus slot, checked per read
                let offset = (distance - slot) as usize;
                let end = offset + (1usize << direct_bits);
                let table = self.models.dist_special.get_mut(offset..end).ok_or(
                    LzmaError::RangeCheckFailure {
                        index: end,
                        limit: super::DIST_SPECIAL_SIZE,
                    },
                )?;
                distance += self.rdec.decode_tree_reversed(table, direct_bits)?;
            } else {
                distance += self.rdec.decode_direct(direct_bits - ALIGN_BITS)? << ALIGN_BITS;
                distance += self
                    .rdec
                    .decode_tree_reversed(&mut self.models.dist_align, ALIGN_BITS)?;
                if distance == END_MARKER_DISTANCE {
                    if len == MIN_MATCH_LEN {
                        return Ok(true);
                    }
                    return Err(LzmaError::BadEndMarker { len });
                }
            }
        }

        self.rep[3] = self.rep[2];
        self.rep[2] = self.rep[1];
        self.rep[1] = self.rep[0];
        self.rep[0] = distance;
        self.state.set_match();
        self.window.copy_match(distance, len)?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_dictionary_sizes() {
        assert!(matches!(
            LzmaDecoder::new(1024),
            Err(LzmaError::InvalidDictionarySize(1024))
        ));
        assert!(matches!(
            LzmaDecoder::new(1 << 30),
            Err(LzmaError::InvalidDictionarySize(_))
        ));
        assert!(LzmaDecoder::new(MIN_DICT_SIZE).is_ok());
        assert!(LzmaDecoder::new(MAX_DICT_SIZE).is_ok());
    }

    #[test]
    fn test_needs_input_before_seed() {
        let mut decoder = LzmaDecoder::new(MIN_DICT_SIZE).unwrap();
        assert_eq!(decoder.run().unwrap(), DecodeStatus::NeedInput);
        decoder.feed(&[0x00, 0x12]);
        assert_eq!(decoder.run().unwrap(), DecodeStatus::NeedInput);
    }

    #[test]
    fn test_finish_with_empty_input_underflows_and_poisons() {
        let mut decoder = LzmaDecoder::new(MIN_DICT_SIZE).unwrap();
        decoder.finish();
        assert!(matches!(decoder.run(), Err(LzmaError::InputUnderflow)));
        assert!(matches!(decoder.run(), Err(LzmaError::DecoderPoisoned)));
    }
}
