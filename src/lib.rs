//! # bmpio
//!
//! BMP image format decoder and encoder.
//!
//! ## Decoding
//!
//! The decoder covers the classic Windows/OS2 bitmap family: 1/4/8-bit
//! palette images, 16/24/32-bit direct color with or without channel
//! bitfields, RLE4/RLE8 compression, and the 12-, 40-, 108-, and
//! 124-byte info-header generations — including the top-down row order
//! signaled by a negative height, color tables with 3- or 4-byte
//! entries, and gaps before the pixel data. Palette images decode to
//! [`IndexedImage`] with the palette intact; everything else decodes to
//! non-premultiplied RGBA.
//!
//! ## Encoding
//!
//! The encoder writes the most compact uncompressed representation the
//! source allows: a paletted source becomes a 1-, 4-, or 8-bit file
//! depending on palette size, a grayscale source becomes an 8-bit file
//! with a linear ramp palette, and everything else becomes 24-bit
//! direct color. Output always uses the 40-byte info header, bottom-up
//! rows, and no compression.
//!
//! ## Non-Goals
//!
//! - Compressed output (RLE is decode-only)
//! - JPEG/PNG-in-BMP payloads (rejected as unsupported)
//! - Color quantization — an [`Image`] is encoded as given
//! - Multi-frame/ICO containers
//!
//! ## Usage
//!
//! ```
//! use bmpio::{Image, IndexedImage, RGB8};
//!
//! let palette = vec![RGB8::new(0, 0, 0), RGB8::new(255, 255, 255)];
//! let image = Image::Indexed(IndexedImage::new(2, 2, vec![0, 1, 1, 0], palette));
//!
//! let mut file = Vec::new();
//! bmpio::encode(&mut file, &image)?;
//!
//! let back = bmpio::decode(file.as_slice())?;
//! assert_eq!(back, image);
//! # Ok::<(), bmpio::BmpError>(())
//! ```

#![forbid(unsafe_code)]

mod bitfields;
mod decode;
mod encode;
mod error;
mod image;
mod limits;
mod rle;

// Re-exports
pub use decode::ImageInfo;
pub use encode::EncoderOptions;
pub use error::BmpError;
pub use image::{DirectImage, GrayImage, Image, IndexedImage};
pub use limits::Limits;
pub use rgb::{RGB8, RGBA8};

use std::io::{Read, Write};

/// Decode a BMP stream into an [`Image`].
///
/// Reads the stream sequentially in a single pass; any I/O error from
/// `r` aborts the decode and is returned unchanged.
pub fn decode<R: Read>(r: R) -> Result<Image, BmpError> {
    decode::decode_image(r, &Limits::default())
}

/// Decode a BMP stream with caller-supplied resource limits.
pub fn decode_with_limits<R: Read>(r: R, limits: &Limits) -> Result<Image, BmpError> {
    decode::decode_image(r, limits)
}

/// Read image geometry and color model from the headers alone, without
/// allocating a pixel buffer or touching palette and pixel data.
pub fn decode_metadata<R: Read>(r: R) -> Result<ImageInfo, BmpError> {
    decode::decode_info(r)
}

/// Encode `image` to `w` in BMP format with default options.
pub fn encode<W: Write>(w: W, image: &Image) -> Result<(), BmpError> {
    encode::encode_image(w, image, &EncoderOptions::default())
}

/// Encode `image` to `w` in BMP format, using the settings recorded in
/// `options`.
pub fn encode_with_options<W: Write>(
    w: W,
    image: &Image,
    options: &EncoderOptions,
) -> Result<(), BmpError> {
    encode::encode_image(w, image, options)
}
