#![no_main]
use libfuzzer_sys::fuzz_target;
use lzma_stream::{DecodeStatus, LzmaDecoder};

const LIMIT: u64 = 16 * 1024 * 1024;

fn decode_chunked(stream: &[u8], dict_size: u32, chunk: usize) -> Result<Vec<u8>, lzma_stream::LzmaError> {
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
                if out.len() as u64 > LIMIT {
                    return Err(lzma_stream::LzmaError::OutputOverflow {
                        produced: out.len() as u64,
                        limit: LIMIT,
                    });
                }
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

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let dict_size = 1u32 << (12 + (data[0] % 12));
    let chunk = 1 + data[1] as usize;
    let stream = &data[2..];

    let whole = LzmaDecoder::decompress_with_limit(stream, dict_size, LIMIT);
    let chunked = decode_chunked(stream, dict_size, chunk);

    // Chunking must not change the outcome
    match (whole, chunked) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("one-shot {a:?} disagrees with chunked {b:?}"),
    }
});
