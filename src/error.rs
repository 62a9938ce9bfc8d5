use std::io;

/// Errors from BMP decoding and encoding.
///
/// The codec distinguishes two failure kinds of its own — a stream that
/// is not valid BMP, and a stream that is valid BMP but exercises a
/// feature this crate does not implement — and passes I/O errors from
/// the underlying reader or writer through unchanged.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BmpError {
    /// The stream is not a valid BMP file, or violates a structural
    /// invariant of the format (bad magic, non-positive dimensions,
    /// out-of-range palette index, bad pixel-data offset).
    #[error("invalid BMP format: {0}")]
    Format(String),

    /// The stream is structurally valid BMP but uses a feature this
    /// codec does not implement (unrecognized header size, unknown
    /// compression code, dimensions beyond the pixel-count ceiling).
    #[error("unsupported BMP feature: {0}")]
    Unsupported(String),

    /// An I/O error from the underlying stream, including the short
    /// read produced by a truncated file.
    #[error(transparent)]
    Io(#[from] io::Error),
}
