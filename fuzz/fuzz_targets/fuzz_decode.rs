#![no_main]
use libfuzzer_sys::fuzz_target;
use lzma_stream::LzmaDecoder;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte: dictionary size, 2^12 .. 2^23
    let dict_size = 1u32 << (12 + (data[0] % 12));

    // Cap output so hostile streams cannot expand without bound
    let _ = LzmaDecoder::decompress_with_limit(&data[1..], dict_size, 16 * 1024 * 1024);
});
