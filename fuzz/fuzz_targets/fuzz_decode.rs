#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic.
    let _ = bmpio::decode(data);
    let _ = bmpio::decode_metadata(data);
});
