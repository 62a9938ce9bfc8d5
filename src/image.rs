//! The in-memory image model the codec decodes into and encodes from.
//!
//! Palette-indexed and direct-color pixels are kept distinct so that a
//! decode → encode round trip preserves the palette instead of
//! expanding it to true color.

use rgb::{RGB8, RGBA8};

/// A decoded BMP image, or a source image for the encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Image {
    /// Palette-indexed pixels, decoded from 1/4/8-bit files.
    Indexed(IndexedImage),
    /// Direct-color pixels, decoded from 16/24/32-bit files.
    Direct(DirectImage),
    /// 8-bit grayscale. Never produced by the decoder; encodes as an
    /// 8-bit paletted file with a synthesized linear gray ramp.
    Gray(GrayImage),
}

impl Image {
    pub fn width(&self) -> u32 {
        match self {
            Image::Indexed(img) => img.width,
            Image::Direct(img) => img.width,
            Image::Gray(img) => img.width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Image::Indexed(img) => img.height,
            Image::Direct(img) => img.height,
            Image::Gray(img) => img.height,
        }
    }

    /// The pixel at `(x, y)` as non-premultiplied RGBA.
    ///
    /// Indexed pixels resolve through their palette; gray and palette
    /// pixels read as fully opaque. This is the generic accessor the
    /// encoder's true-color path reads through.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    pub fn rgba_at(&self, x: u32, y: u32) -> RGBA8 {
        match self {
            Image::Indexed(img) => {
                let c = img.palette[usize::from(img.index_at(x, y))];
                RGBA8::new(c.r, c.g, c.b, 255)
            }
            Image::Direct(img) => img.pixel_at(x, y),
            Image::Gray(img) => {
                let v = img.luma_at(x, y);
                RGBA8::new(v, v, v, 255)
            }
        }
    }
}

fn check_dimensions(width: u32, height: u32, pixel_count: usize) {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert_eq!(
        pixel_count,
        width as usize * height as usize,
        "pixel buffer length must be width * height"
    );
}

/// Palette-indexed pixels in row-major order with their color table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    palette: Vec<RGB8>,
}

impl IndexedImage {
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, if `pixels.len()` is not
    /// `width * height`, if the palette is empty, or if any pixel
    /// indexes past the end of the palette.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, palette: Vec<RGB8>) -> Self {
        check_dimensions(width, height, pixels.len());
        assert!(!palette.is_empty(), "palette must not be empty");
        assert!(
            pixels.iter().all(|&p| usize::from(p) < palette.len()),
            "pixel indexes past the end of the palette"
        );
        Self { width, height, pixels, palette }
    }

    /// Decoder-internal constructor; the decoder has already validated
    /// every index against the palette.
    pub(crate) fn from_decoded(width: u32, height: u32, pixels: Vec<u8>, palette: Vec<RGB8>) -> Self {
        Self { width, height, pixels, palette }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw palette indices, one byte per pixel, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn palette(&self) -> &[RGB8] {
        &self.palette
    }

    /// The palette index at `(x, y)`. Panics if out of bounds.
    pub fn index_at(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height, "pixel position out of bounds");
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub(crate) fn row(&self, y: usize) -> &[u8] {
        let w = self.width as usize;
        &self.pixels[y * w..(y + 1) * w]
    }
}

/// Direct-color pixels in row-major order, non-premultiplied RGBA.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectImage {
    width: u32,
    height: u32,
    pixels: Vec<RGBA8>,
}

impl DirectImage {
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, or if `pixels.len()` is
    /// not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<RGBA8>) -> Self {
        check_dimensions(width, height, pixels.len());
        Self { width, height, pixels }
    }

    pub(crate) fn from_decoded(width: u32, height: u32, pixels: Vec<RGBA8>) -> Self {
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[RGBA8] {
        &self.pixels
    }

    /// The pixel at `(x, y)`. Panics if out of bounds.
    pub fn pixel_at(&self, x: u32, y: u32) -> RGBA8 {
        assert!(x < self.width && y < self.height, "pixel position out of bounds");
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Zero-copy 2D view of the pixel data.
    #[cfg(feature = "imgref")]
    pub fn as_imgref(&self) -> imgref::ImgRef<'_, RGBA8> {
        imgref::ImgRef::new(&self.pixels, self.width as usize, self.height as usize)
    }
}

/// 8-bit grayscale pixels in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl GrayImage {
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero, or if `pixels.len()` is
    /// not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        check_dimensions(width, height, pixels.len());
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The gray value at `(x, y)`. Panics if out of bounds.
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height, "pixel position out of bounds");
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub(crate) fn row(&self, y: usize) -> &[u8] {
        let w = self.width as usize;
        &self.pixels[y * w..(y + 1) * w]
    }
}
