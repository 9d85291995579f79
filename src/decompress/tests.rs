//! Decoder integration tests.
//!
//! Streams are produced by the in-tree reference encoder, which mirrors
//! the decoder cell for cell, so every test exercises the real bitstream
//! format end to end.

use super::reference_encoder::ReferenceEncoder;
use super::{DecodeStatus, LzmaDecoder};
use crate::error::LzmaError;

const DICT: u32 = 1 << 16;

/// Decode a whole stream in one shot, draining as needed.
fn decode_all(stream: &[u8], dict_size: u32) -> Result<Vec<u8>, LzmaError> {
    LzmaDecoder::decompress(stream, dict_size)
}

/// Decode feeding `chunk` input bytes at a time and draining eagerly.
fn decode_chunked(stream: &[u8], dict_size: u32, chunk: usize) -> Result<Vec<u8>, LzmaError> {
    let mut decoder = LzmaDecoder::new(dict_size)?;
    let mut out = Vec::new();
    let mut fed = 0;
    loop {
        match decoder.run()? {
            DecodeStatus::NeedInput => {
                if fed < stream.len() {
                    let end = (fed + chunk).min(stream.len());
                    decoder.feed(&stream[fed..end]);
                    fed = end;
                } else {
                    decoder.finish();
                }
            }
            DecodeStatus::NeedOutput => {
                out.extend_from_slice(decoder.drain());
            }
            DecodeStatus::StreamEnd => break,
        }
    }
    loop {
        let run = decoder.drain();
        if run.is_empty() {
            break;
        }
        out.extend_from_slice(run);
    }
    Ok(out)
}

/// A stream exercising every opcode: literals, fresh matches at several
/// slot ranges, all four rep indices and short reps.
fn mixed_stream() -> (Vec<u8>, Vec<u8>) {
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"the quick brown fox jumps over the lazy dog. ");
    enc.match_at(45, 45); // whole sentence again
    enc.match_at(4, 12); // small distance, overlapping
    enc.literals(b"0123456789abcdef");
    enc.match_at(16, 30); // slot with special-table bits
    enc.match_at(90, 20);
    enc.long_rep(1, 8); // back to distance 16
    enc.long_rep(0, 5);
    enc.short_rep();
    enc.long_rep(3, 10);
    enc.literals(b"tail");
    enc.long_rep(2, 4);
    let plain = enc.plain().to_vec();
    (enc.finish(), plain)
}

#[test]
fn test_empty_stream_decodes_to_nothing() {
    let stream = ReferenceEncoder::new().finish();
    let out = decode_all(&stream, DICT).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_empty_stream_reports_stream_end() {
    let stream = ReferenceEncoder::new().finish();
    let mut decoder = LzmaDecoder::new(DICT).unwrap();
    decoder.feed(&stream);
    decoder.finish();
    assert_eq!(decoder.run().unwrap(), DecodeStatus::StreamEnd);
    assert_eq!(decoder.total_out(), 0);
    // sticky
    assert_eq!(decoder.run().unwrap(), DecodeStatus::StreamEnd);
}

#[test]
fn test_abc_round_trip() {
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"abc");
    let stream = enc.finish();
    assert_eq!(decode_all(&stream, DICT).unwrap(), b"abc");
}

#[test]
fn test_mixed_opcodes_round_trip() {
    let (stream, plain) = mixed_stream();
    assert_eq!(decode_all(&stream, DICT).unwrap(), plain);
}

#[test]
fn test_long_repetitive_input_round_trips() {
    // ~100 KB of repeated 4-byte patterns: long matches, rep matches
    // and short reps over a small distance
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"wxyz");
    enc.match_at(4, 273);
    enc.long_rep(0, 273);
    for _ in 0..370 {
        enc.long_rep(0, 270);
        enc.short_rep();
        enc.short_rep();
        enc.short_rep();
    }
    enc.literals(b"edge");
    enc.match_at(8, 100);
    let plain = enc.plain().to_vec();
    assert!(plain.len() > 100_000);
    let stream = enc.finish();
    assert_eq!(decode_all(&stream, 1 << 20).unwrap(), plain);
}

#[test]
fn test_matched_literals_after_matches() {
    // literals directly after a match take the matched-literal path
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"abcabc");
    enc.match_at(3, 4);
    enc.literals(b"abd"); // close to the predicted bytes
    enc.match_at(3, 3);
    enc.literals(b"zzz"); // far from the predicted bytes
    let plain = enc.plain().to_vec();
    let stream = enc.finish();
    assert_eq!(decode_all(&stream, DICT).unwrap(), plain);
}

#[test]
fn test_chunking_invariance() {
    let (stream, plain) = mixed_stream();
    let whole = decode_all(&stream, DICT).unwrap();
    let tiny = decode_chunked(&stream, DICT, 1).unwrap();
    let medium = decode_chunked(&stream, DICT, 4096).unwrap();
    assert_eq!(whole, plain);
    assert_eq!(tiny, plain);
    assert_eq!(medium, plain);
}

#[test]
fn test_chunked_decoders_agree_on_cursors() {
    let (stream, _) = mixed_stream();

    let run = |chunk: usize| {
        let mut decoder = LzmaDecoder::new(DICT).unwrap();
        let mut fed = 0;
        loop {
            match decoder.run().unwrap() {
                DecodeStatus::NeedInput => {
                    if fed < stream.len() {
                        let end = (fed + chunk).min(stream.len());
                        decoder.feed(&stream[fed..end]);
                        fed = end;
                    } else {
                        decoder.finish();
                    }
                }
                DecodeStatus::NeedOutput => {
                    decoder.drain();
                }
                DecodeStatus::StreamEnd => break,
            }
        }
        (decoder.total_in(), decoder.total_out())
    };

    assert_eq!(run(1), run(4096));
}

#[test]
fn test_output_drained_in_small_windows() {
    // the window is the minimum size; output must be drained repeatedly
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"0123456789abcdef");
    enc.match_at(16, 273);
    for _ in 0..64 {
        enc.long_rep(0, 250);
    }
    let plain = enc.plain().to_vec();
    let stream = enc.finish();
    let out = decode_chunked(&stream, super::MIN_DICT_SIZE, 512).unwrap();
    assert_eq!(out, plain);
}

#[test]
fn test_end_marker_with_wrong_length_is_rejected() {
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"abc");
    let stream = enc.finish_with_marker_len(7);
    assert!(matches!(
        decode_all(&stream, DICT),
        Err(LzmaError::BadEndMarker { len: 7 })
    ));
}

#[test]
fn test_back_reference_at_first_byte_is_invalid() {
    // a match before any output exists can never be valid
    let mut enc = ReferenceEncoder::new();
    enc.raw_match(1, 4);
    let stream = enc.finish();
    assert!(matches!(
        decode_all(&stream, DICT),
        Err(LzmaError::InvalidBackReference { .. })
    ));
}

#[test]
fn test_back_reference_spanning_whole_dictionary_is_invalid() {
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"ab");
    enc.raw_match(super::MIN_DICT_SIZE, 4);
    let stream = enc.finish();
    assert!(matches!(
        decode_all(&stream, super::MIN_DICT_SIZE),
        Err(LzmaError::InvalidBackReference { .. })
    ));
}

#[test]
fn test_truncated_stream_underflows() {
    let (stream, _) = mixed_stream();
    let cut = &stream[..stream.len() / 2];
    assert!(matches!(
        decode_all(cut, DICT),
        Err(LzmaError::InputUnderflow)
    ));
}

#[test]
fn test_error_poisons_the_handle() {
    let mut enc = ReferenceEncoder::new();
    enc.raw_match(1, 4);
    let stream = enc.finish();

    let mut decoder = LzmaDecoder::new(DICT).unwrap();
    decoder.feed(&stream);
    decoder.finish();
    assert!(decoder.run().is_err());
    assert!(matches!(decoder.run(), Err(LzmaError::DecoderPoisoned)));
}

#[test]
fn test_output_limit_is_enforced() {
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"abcd");
    enc.match_at(4, 200);
    let stream = enc.finish();
    assert!(matches!(
        LzmaDecoder::decompress_with_limit(&stream, DICT, 10),
        Err(LzmaError::OutputOverflow { limit: 10, .. })
    ));
    // exactly at the limit is fine
    let out = LzmaDecoder::decompress_with_limit(&stream, DICT, 204).unwrap();
    assert_eq!(out.len(), 204);
}

#[test]
fn test_single_bit_corruption_never_panics() {
    let (stream, plain) = mixed_stream();
    let mut saw_error = false;
    for byte in 0..stream.len() {
        for bit in 0..8 {
            let mut bad = stream.clone();
            bad[byte] ^= 1 << bit;
            match LzmaDecoder::decompress_with_limit(&bad, DICT, 1 << 20) {
                Ok(out) => {
                    // byte 0 is discarded, so flips there are invisible
                    if byte == 0 {
                        assert_eq!(out, plain);
                    }
                }
                Err(
                    LzmaError::InputUnderflow
                    | LzmaError::OutputOverflow { .. }
                    | LzmaError::InvalidBackReference { .. }
                    | LzmaError::RangeCheckFailure { .. }
                    | LzmaError::BadEndMarker { .. },
                ) => saw_error = true,
                Err(e) => panic!("unexpected error kind: {e}"),
            }
        }
    }
    assert!(saw_error);
}

#[test]
fn test_distances_across_every_slot_range() {
    // distances below 4 (direct slot), 4..128 (special table, including
    // the aliased windows at slot boundaries) and beyond (direct bits)
    let mut enc = ReferenceEncoder::new();
    enc.literals(b"abcdefgh");
    enc.match_at(8, 256); // grow the history
    for _ in 0..40 {
        enc.long_rep(0, 250);
    }
    for d in [1u32, 2, 3, 4, 5, 6, 7, 8, 64, 95, 96, 97, 127, 128, 129, 500, 2000, 9000] {
        enc.match_at(d, 16);
    }
    let plain = enc.plain().to_vec();
    let stream = enc.finish();
    assert_eq!(decode_all(&stream, DICT).unwrap(), plain);
}
