#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must re-encode, and our own output must
    // decode again with the same geometry.
    let Ok(image) = bmpio::decode(data) else {
        return;
    };
    let mut file = Vec::new();
    bmpio::encode(&mut file, &image).expect("re-encoding a decoded image");
    let again = bmpio::decode(file.as_slice()).expect("decoding our own output");
    assert_eq!(again.width(), image.width());
    assert_eq!(again.height(), image.height());
});
