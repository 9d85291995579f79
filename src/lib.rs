//! Streaming LZMA decoder.
//!
//! Decompresses raw LZMA bitstreams (as carried inside lzip members)
//! through bounded-size buffers: the caller feeds compressed bytes in
//! chunks of any size and drains decompressed bytes as they appear,
//! without either side ever holding the whole object in memory.
//!
//! ## Features
//! - Core library has **zero dependencies**
//! - Suspend/resume across arbitrarily small input and output windows
//! - The dictionary *is* the output buffer: overlapping self-referential
//!   copies work exactly as the format requires
//! - Corruption is detected, never silently decoded: every table index is
//!   range-checked and every back-reference validated
//!
//! ## Scope
//!
//! Only the bitstream core lives here. The surrounding container (magic
//! bytes, dictionary-size header byte, CRC32/size trailer) is the
//! caller's job; the core just needs to be told the dictionary size that
//! header implies.
//!
//! ## Example
//!
//! ```rust
//! use lzma_stream::{DecodeStatus, LzmaDecoder};
//!
//! # fn demo(compressed: &[u8]) -> Result<(), lzma_stream::LzmaError> {
//! let mut decoder = LzmaDecoder::new(1 << 20)?;
//! let mut out = Vec::new();
//! for chunk in compressed.chunks(4096) {
//!     decoder.feed(chunk);
//!     loop {
//!         match decoder.run()? {
//!             DecodeStatus::NeedInput => break,
//!             DecodeStatus::NeedOutput => out.extend_from_slice(decoder.drain()),
//!             DecodeStatus::StreamEnd => break,
//!         }
//!     }
//! }
//! decoder.finish();
//! while decoder.run()? != DecodeStatus::StreamEnd {
//!     out.extend_from_slice(decoder.drain());
//! }
//! out.extend_from_slice(decoder.drain());
//! # Ok(())
//! # }
//! ```

pub mod decompress;
pub mod error;

pub use decompress::{DecodeStatus, LzmaDecoder, MAX_DICT_SIZE, MIN_DICT_SIZE};
pub use error::{LzmaError, Result};
