//! Streaming LZMA decompression.
//!
//! This module implements a resumable LZMA decoder: an adaptive binary
//! range coder driving a 12-state context model, with the decompression
//! dictionary doubling as the output buffer.
//!
//! ## Components
//!
//! | Module | Role |
//! |--------|------|
//! | [`bit_model`] | Adaptive probability cells and the fixed-shape tables |
//! | [`range_decoder`] | Bit / tree / direct-bit primitives over the coded stream |
//! | [`state`] | The 12-value context state machine |
//! | [`window`] | Ring-buffer dictionary shared with the output |
//! | [`stream`] | Opcode dispatch loop and the suspend/resume protocol |
//!
//! ## Opcode prefix tree
//!
//! Each iteration of the driver loop decodes a short bit prefix that
//! selects the operation:
//!
//! ```text
//! 0                  literal byte
//! 10                 match (new distance)
//! 1100               short rep (1 byte from rep0)
//! 1101               long rep 0
//! 1110               long rep 1
//! 11110              long rep 2
//! 11111              long rep 3
//! ```
//!
//! ## Suspend/resume
//!
//! The decoder never blocks and never performs I/O. `run()` decodes whole
//! opcodes until the input accumulator runs low or the window fills with
//! undrained output, then returns [`DecodeStatus::NeedInput`] or
//! [`DecodeStatus::NeedOutput`]. Feeding more compressed bytes or draining
//! produced bytes and calling `run()` again resumes mid-stream with no
//! further ceremony.

pub mod bit_model;
pub mod range_decoder;
pub mod state;
pub mod stream;
pub mod window;

#[cfg(any(test, feature = "bench-support"))]
#[doc(hidden)]
pub mod reference_encoder;

#[cfg(test)]
mod tests;

pub use stream::{DecodeStatus, LzmaDecoder};

/// Number of position-phase contexts (`output_length mod 4`).
pub(crate) const POS_STATES: usize = 4;

/// Mask extracting the position phase from the output counter.
pub(crate) const POS_STATE_MASK: u64 = POS_STATES as u64 - 1;

/// Number of context-model states.
pub(crate) const STATES: usize = 12;

/// Top bits of the previous output byte used as literal context.
pub(crate) const LITERAL_CONTEXT_BITS: u32 = 3;

/// Number of literal context tables.
pub(crate) const LITERAL_CONTEXTS: usize = 1 << LITERAL_CONTEXT_BITS;

/// Probability slots per literal context (plain tree + matched halves).
pub(crate) const LITERAL_TABLE_SIZE: usize = 0x300;

/// Width of the distance-slot tree.
pub(crate) const DIST_SLOT_BITS: u32 = 6;

/// Number of distance slots.
pub(crate) const DIST_SLOTS: usize = 1 << DIST_SLOT_BITS;

/// Number of match-length buckets selecting a distance-slot table.
pub(crate) const DIST_STATES: usize = 4;

/// First slot whose distance carries extra bits.
pub(crate) const START_DIST_MODEL: u32 = 4;

/// First slot addressed with direct bits instead of the special table.
pub(crate) const END_DIST_MODEL: u32 = 14;

/// Distances fully covered by the special (tree-coded) table.
pub(crate) const MODELED_DISTANCES: usize = 1 << (END_DIST_MODEL as usize / 2);

/// Size of the aliased special-distance table.
///
/// Slots 4..14 share this one array through overlapping windows at
/// `base_distance - slot`; 115 cells cover them exactly.
pub(crate) const DIST_SPECIAL_SIZE: usize = MODELED_DISTANCES - END_DIST_MODEL as usize + 1;

/// Bits in the byte-aligned distance tail.
pub(crate) const ALIGN_BITS: u32 = 4;

/// Size of the align table.
pub(crate) const ALIGN_SIZE: usize = 1 << ALIGN_BITS;

/// Minimum representable match length.
pub(crate) const MIN_MATCH_LEN: u32 = 2;

/// Maximum representable match length (2 + 8 + 8 + 256 - 1).
pub(crate) const MAX_MATCH_LEN: u32 = MIN_MATCH_LEN + 271;

/// Length symbols in each of the low and mid tiers.
pub(crate) const LEN_LOW_SYMBOLS: u32 = 8;

/// Length symbols in the mid tier.
pub(crate) const LEN_MID_SYMBOLS: u32 = 8;

/// The distance value reserved as the end-of-stream marker.
pub(crate) const END_MARKER_DISTANCE: u32 = 0xFFFF_FFFF;

/// Smallest accepted dictionary size (4 KiB).
pub const MIN_DICT_SIZE: u32 = 1 << 12;

/// Largest accepted dictionary size (512 MiB).
pub const MAX_DICT_SIZE: u32 = 1 << 29;
