//! Error types for LZMA stream decoding.
//!
//! This module provides the [`LzmaError`] type which covers all terminal
//! failures of the decoder. Suspension signals (need more input, need more
//! output space) are *not* errors — they are reported through
//! [`DecodeStatus`](crate::DecodeStatus).
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Corruption | [`RangeCheckFailure`], [`BadEndMarker`], [`InvalidBackReference`] | The bitstream is damaged |
//! | Exhaustion | [`InputUnderflow`], [`OutputOverflow`] | A buffer ended where the stream did not |
//! | Usage | [`InvalidDictionarySize`], [`DecoderPoisoned`] | The caller misused the handle |
//! | I/O | [`Io`] | Read/write errors from surrounding glue |
//!
//! Every corruption error poisons the decoder handle: after one is
//! returned, further calls to `run()` fail with [`DecoderPoisoned`]. The
//! core itself never logs or prints; mapping these values to user-facing
//! messages is the container layer's job.
//!
//! [`RangeCheckFailure`]: LzmaError::RangeCheckFailure
//! [`BadEndMarker`]: LzmaError::BadEndMarker
//! [`InvalidBackReference`]: LzmaError::InvalidBackReference
//! [`InputUnderflow`]: LzmaError::InputUnderflow
//! [`OutputOverflow`]: LzmaError::OutputOverflow
//! [`InvalidDictionarySize`]: LzmaError::InvalidDictionarySize
//! [`DecoderPoisoned`]: LzmaError::DecoderPoisoned
//! [`Io`]: LzmaError::Io

use std::fmt;
use std::io;

/// Error type for LZMA decoding operations.
///
/// All variants are terminal for the decoder instance that produced them:
/// there is no retry and no recovery inside the core. Create a fresh
/// decoder to try again.
#[derive(Debug)]
pub enum LzmaError {
    /// The input ended while a byte was still required.
    ///
    /// Raised only after [`finish`](crate::LzmaDecoder::finish) has been
    /// called; before that, an exhausted accumulator suspends with
    /// [`DecodeStatus::NeedInput`](crate::DecodeStatus::NeedInput) instead.
    InputUnderflow,

    /// The output limit was reached before the end-of-stream marker.
    ///
    /// Only produced by the bounded one-shot entry point
    /// [`decompress_with_limit`](crate::LzmaDecoder::decompress_with_limit);
    /// the streaming interface suspends with `NeedOutput` instead.
    OutputOverflow {
        /// Bytes produced so far.
        produced: u64,
        /// The caller-imposed limit.
        limit: u64,
    },

    /// A back-reference points outside the data produced so far.
    ///
    /// Either the distance exceeds the dictionary size, or it reaches
    /// before the first byte ever written.
    InvalidBackReference {
        /// The decoded distance (0-based, as carried in the rep cache).
        distance: u32,
        /// Total bytes produced when the reference was decoded.
        position: u64,
    },

    /// A decoded tree index fell outside its probability table.
    ///
    /// This is the generic "the bitstream is corrupt" signal. Table
    /// indices are checked on every access, never clamped.
    RangeCheckFailure {
        /// The offending index.
        index: usize,
        /// Size of the table being addressed.
        limit: usize,
    },

    /// The end-of-stream distance marker was paired with a bad length.
    ///
    /// A distance of `0xFFFF_FFFF` ends the stream cleanly only when the
    /// accompanying length is exactly the minimum match length (2). Any
    /// other length is corruption.
    BadEndMarker {
        /// The length that accompanied the marker.
        len: u32,
    },

    /// The requested dictionary size is outside the supported range.
    ///
    /// Valid sizes are 4 KiB to 512 MiB.
    InvalidDictionarySize(u32),

    /// The decoder already failed and must not be driven again.
    DecoderPoisoned,

    /// An I/O error occurred in surrounding glue code.
    ///
    /// Wraps [`std::io::Error`]; the core itself performs no I/O.
    Io(io::Error),
}

impl fmt::Display for LzmaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputUnderflow => write!(f, "Input exhausted before end-of-stream marker"),
            Self::OutputOverflow { produced, limit } => {
                write!(
                    f,
                    "Output limit exceeded: {} bytes produced, limit {}",
                    produced, limit
                )
            }
            Self::InvalidBackReference { distance, position } => {
                write!(
                    f,
                    "Invalid back reference: distance {} at output position {}",
                    distance, position
                )
            }
            Self::RangeCheckFailure { index, limit } => {
                write!(f, "Range check failure: index {} in table of {}", index, limit)
            }
            Self::BadEndMarker { len } => {
                write!(f, "End-of-stream marker with length {} (expected 2)", len)
            }
            Self::InvalidDictionarySize(size) => {
                write!(f, "Invalid dictionary size: {} bytes", size)
            }
            Self::DecoderPoisoned => write!(f, "Decoder already failed, create a new instance"),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for LzmaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LzmaError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, LzmaError>;
