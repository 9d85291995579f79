//! Ring-buffer dictionary shared with the output stream.
//!
//! The bytes the decoder produces are the dictionary: back-references copy
//! from data already written into this buffer. The window therefore holds
//! the most recent `dict_size` bytes of output and additionally tracks
//! which of them the caller has already drained, so the driver loop can
//! suspend before undrained output would be overwritten.

use crate::error::{LzmaError, Result};

/// Sliding dictionary window doubling as the output buffer.
pub struct Window {
    /// Ring buffer of `dict_size` bytes, zero-filled at creation.
    buf: Box<[u8]>,
    /// Write cursor.
    pos: usize,
    /// First byte not yet handed to the caller.
    drained: usize,
    /// Bytes written but not yet drained.
    pending: usize,
    /// Total bytes produced over the stream's lifetime.
    total: u64,
}

impl Window {
    /// Create a window of `dict_size` bytes.
    pub fn new(dict_size: usize) -> Self {
        Self {
            buf: vec![0; dict_size].into_boxed_slice(),
            pos: 0,
            drained: 0,
            pending: 0,
            total: 0,
        }
    }

    /// Total bytes produced.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes written but not yet drained by the caller.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Room left before undrained output would be overwritten.
    pub fn free(&self) -> usize {
        self.buf.len() - self.pending
    }

    /// Append one output byte.
    ///
    /// The caller (the driver loop) guarantees free space; see
    /// [`free`](Self::free).
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
        if self.pos == self.buf.len() {
            self.pos = 0;
        }
        self.pending += 1;
        self.total += 1;
    }

    /// The byte immediately preceding the write cursor.
    ///
    /// Returns 0 before the first byte is written (the buffer is
    /// zero-filled, matching the format's defined previous byte).
    #[inline]
    pub fn prev_byte(&self) -> u8 {
        let idx = if self.pos == 0 {
            self.buf.len() - 1
        } else {
            self.pos - 1
        };
        self.buf[idx]
    }

    /// Read the byte `distance + 1` positions behind the write cursor.
    ///
    /// `distance` is the 0-based value carried in the rep cache. Fails if
    /// the reference reaches outside the data produced so far or beyond
    /// the dictionary.
    #[inline]
    pub fn read_back(&self, distance: u32) -> Result<u8> {
        self.check_distance(distance)?;
        let dist = distance as usize;
        let idx = if self.pos > dist {
            self.pos - dist - 1
        } else {
            self.buf.len() + self.pos - dist - 1
        };
        Ok(self.buf[idx])
    }

    /// Copy `len` bytes from `distance + 1` positions back.
    ///
    /// The distance may be smaller than the length: overlapping copies
    /// re-read bytes written earlier in the same match, so the fallback
    /// path runs strictly byte by byte.
    pub fn copy_match(&mut self, distance: u32, len: u32) -> Result<()> {
        self.check_distance(distance)?;
        let len = len as usize;
        let dist = distance as usize;

        // Byte-by-byte when the copy overlaps itself or either cursor
        // wraps; contiguous copy_within otherwise
        if dist < len || self.pos <= dist || self.pos + len > self.buf.len() {
            let mut src = if self.pos > dist {
                self.pos - dist - 1
            } else {
                self.buf.len() + self.pos - dist - 1
            };
            for _ in 0..len {
                self.buf[self.pos] = self.buf[src];
                self.pos += 1;
                if self.pos == self.buf.len() {
                    self.pos = 0;
                }
                src += 1;
                if src == self.buf.len() {
                    src = 0;
                }
            }
        } else {
            let src = self.pos - dist - 1;
            self.buf.copy_within(src..src + len, self.pos);
            self.pos += len;
            if self.pos == self.buf.len() {
                self.pos = 0;
            }
        }

        self.pending += len;
        self.total += len as u64;
        Ok(())
    }

    /// Hand out the next contiguous run of undrained output.
    ///
    /// Returns an empty slice when nothing is pending. A run never crosses
    /// the ring boundary; call again to pick up the remainder after a
    /// wrap.
    pub fn drain(&mut self) -> &[u8] {
        let run = self.pending.min(self.buf.len() - self.drained);
        let start = self.drained;
        self.drained += run;
        if self.drained == self.buf.len() {
            self.drained = 0;
        }
        self.pending -= run;
        &self.buf[start..start + run]
    }

    #[inline]
    fn check_distance(&self, distance: u32) -> Result<()> {
        if u64::from(distance) >= self.total || distance as usize >= self.buf.len() {
            return Err(LzmaError::InvalidBackReference {
                distance,
                position: self.total,
            });
        }
        Ok(())
    }
}
