//! BMP encoder: picks the most compact representation the source image
//! allows, then serializes headers, palette, and pixel rows in one
//! forward pass.

use std::io::Write;

use rgb::RGB8;

use crate::error::BmpError;
use crate::image::{GrayImage, Image, IndexedImage};

/// Density written when no override is configured: 2835 pixels per
/// meter on both axes (the 72 DPI equivalent).
const DEFAULT_DENSITY: u32 = 2835;

/// Options for [`crate::encode_with_options`].
#[derive(Clone, Debug, Default)]
pub struct EncoderOptions {
    density: Option<(u32, u32)>,
    transparency: bool,
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Density metadata to write, in pixels per meter.
    #[must_use]
    pub fn with_density(mut self, x_pels_per_meter: u32, y_pels_per_meter: u32) -> Self {
        self.density = Some((x_pels_per_meter, y_pels_per_meter));
        self
    }

    /// Reserved for alpha-aware palette writing; recorded but currently
    /// without effect on the output.
    #[must_use]
    pub fn with_transparency(mut self, transparency: bool) -> Self {
        self.transparency = transparency;
        self
    }
}

pub(crate) fn encode_image<W: Write>(
    w: W,
    image: &Image,
    options: &EncoderOptions,
) -> Result<(), BmpError> {
    let mut e = Encoder::new(w, image, options);
    e.strategize()?;
    e.write_headers()?;
    e.write_palette()?;
    e.write_bits()?;
    Ok(())
}

// ── Layout planning ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PaletteMode {
    /// 24-bit direct color, no color table.
    None,
    /// The source's own palette, written as-is.
    Indexed,
    /// A synthesized 256-entry linear gray ramp.
    GrayRamp,
}

struct Encoder<'a, W> {
    w: W,
    image: &'a Image,
    options: &'a EncoderOptions,

    width: usize,
    height: usize,
    bit_count: u16,
    stride: usize,
    bits_offset: usize,
    bits_size: usize,
    file_size: usize,
    palette_mode: PaletteMode,
    n_colors: usize,
}

impl<'a, W: Write> Encoder<'a, W> {
    fn new(w: W, image: &'a Image, options: &'a EncoderOptions) -> Self {
        Self {
            w,
            image,
            options,
            width: 0,
            height: 0,
            bit_count: 0,
            stride: 0,
            bits_offset: 0,
            bits_size: 0,
            file_size: 0,
            palette_mode: PaletteMode::None,
            n_colors: 0,
        }
    }

    /// Decide whether the source can be written with a palette. An
    /// indexed source with more than 256 colors falls back to true
    /// color through the generic pixel accessor.
    fn check_paletted(&mut self) {
        match self.image {
            Image::Indexed(img) if (1..=256).contains(&img.palette().len()) => {
                self.palette_mode = PaletteMode::Indexed;
                self.n_colors = img.palette().len();
            }
            Image::Gray(_) => {
                self.palette_mode = PaletteMode::GrayRamp;
                self.n_colors = 256;
            }
            _ => {}
        }
    }

    /// Plot out the structure of the file before any byte is written.
    /// Every derived field is final once computed here.
    fn strategize(&mut self) -> Result<(), BmpError> {
        self.width = self.image.width() as usize;
        self.height = self.image.height() as usize;
        self.check_paletted();

        self.bit_count = match self.palette_mode {
            PaletteMode::None => 24,
            _ if self.n_colors <= 2 => 1,
            _ if self.n_colors <= 16 => 4,
            _ => 8,
        };

        let too_large = || BmpError::Unsupported("dimensions too large".into());
        self.stride = self
            .width
            .checked_mul(usize::from(self.bit_count))
            .and_then(|bits| bits.checked_add(31))
            .map(|bits| bits / 32 * 4)
            .ok_or_else(too_large)?;
        self.bits_offset = 14 + 40 + 4 * self.n_colors;
        self.bits_size = self.stride.checked_mul(self.height).ok_or_else(too_large)?;
        self.file_size = self
            .bits_size
            .checked_add(self.bits_offset)
            .ok_or_else(too_large)?;
        // Every size field in the file is 32 bits.
        if u32::try_from(self.file_size).is_err() {
            return Err(too_large());
        }
        Ok(())
    }

    /// The 14-byte file header and the 40-byte info header, written as
    /// one block. Compression stays BI_RGB; reserved fields stay zero.
    fn write_headers(&mut self) -> Result<(), BmpError> {
        let mut h = [0u8; 54];
        h[0] = b'B';
        h[1] = b'M';
        h[2..6].copy_from_slice(&(self.file_size as u32).to_le_bytes());
        h[10..14].copy_from_slice(&(self.bits_offset as u32).to_le_bytes());

        h[14..18].copy_from_slice(&40u32.to_le_bytes());
        h[18..22].copy_from_slice(&(self.width as u32).to_le_bytes());
        // Positive height: rows are written bottom-up.
        h[22..26].copy_from_slice(&(self.height as u32).to_le_bytes());
        h[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
        h[28..30].copy_from_slice(&self.bit_count.to_le_bytes());
        h[34..38].copy_from_slice(&(self.bits_size as u32).to_le_bytes());
        let (x_density, y_density) = self
            .options
            .density
            .unwrap_or((DEFAULT_DENSITY, DEFAULT_DENSITY));
        h[38..42].copy_from_slice(&x_density.to_le_bytes());
        h[42..46].copy_from_slice(&y_density.to_le_bytes());
        h[46..50].copy_from_slice(&(self.n_colors as u32).to_le_bytes());

        self.w.write_all(&h)?;
        Ok(())
    }

    /// The color table: 4 bytes per entry, B, G, R, reserved.
    fn write_palette(&mut self) -> Result<(), BmpError> {
        if self.palette_mode == PaletteMode::None {
            return Ok(());
        }
        let source_palette = match (self.palette_mode, self.image) {
            (PaletteMode::Indexed, Image::Indexed(img)) => Some(img.palette()),
            _ => None,
        };

        let mut pal = vec![0u8; 4 * self.n_colors];
        for (i, entry) in pal.chunks_exact_mut(4).enumerate() {
            let c = match source_palette {
                Some(p) => p[i],
                // Gray ramp: the index is the intensity.
                None => RGB8::new(i as u8, i as u8, i as u8),
            };
            entry[0] = c.b;
            entry[1] = c.g;
            entry[2] = c.r;
        }
        self.w.write_all(&pal)?;
        Ok(())
    }

    /// Pixel rows, bottom-up, each zero-padded to the stride.
    fn write_bits(&mut self) -> Result<(), BmpError> {
        let row_writer = self.row_writer();
        let mut row_buf = vec![0u8; self.stride];
        for j in (0..self.height).rev() {
            row_buf.fill(0);
            row_writer.generate(j, self.width, &mut row_buf);
            self.w.write_all(&row_buf)?;
        }
        Ok(())
    }

    fn row_writer(&self) -> RowWriter<'a> {
        match (self.palette_mode, self.image) {
            (PaletteMode::Indexed, Image::Indexed(img)) => match self.bit_count {
                1 => RowWriter::Pal1(img),
                4 => RowWriter::Pal4(img),
                _ => RowWriter::Pal8(img),
            },
            (PaletteMode::GrayRamp, Image::Gray(img)) => RowWriter::GrayPal(img),
            _ => RowWriter::Bgr24(self.image),
        }
    }
}

// ── Row packing ─────────────────────────────────────────────────────

/// Per-row packing strategy, the mirror of the decoder's row unpacking,
/// chosen once per encode.
enum RowWriter<'a> {
    Pal1(&'a IndexedImage),
    Pal4(&'a IndexedImage),
    Pal8(&'a IndexedImage),
    GrayPal(&'a GrayImage),
    Bgr24(&'a Image),
}

impl RowWriter<'_> {
    /// Pack source row `j` into `row_buf`, which is already zeroed out
    /// to the full stride.
    fn generate(&self, j: usize, width: usize, row_buf: &mut [u8]) {
        match self {
            RowWriter::Pal1(img) => {
                for (i, &v) in img.row(j).iter().enumerate() {
                    if v != 0 {
                        row_buf[i / 8] |= 1 << (7 - i % 8);
                    }
                }
            }
            RowWriter::Pal4(img) => {
                for (i, &v) in img.row(j).iter().enumerate() {
                    row_buf[i / 2] |= if i % 2 == 0 { v << 4 } else { v };
                }
            }
            RowWriter::Pal8(img) => {
                row_buf[..width].copy_from_slice(img.row(j));
            }
            RowWriter::GrayPal(img) => {
                row_buf[..width].copy_from_slice(img.row(j));
            }
            RowWriter::Bgr24(image) => {
                for i in 0..width {
                    let px = image.rgba_at(i as u32, j as u32);
                    row_buf[i * 3] = px.b;
                    row_buf[i * 3 + 1] = px.g;
                    row_buf[i * 3 + 2] = px.r;
                }
            }
        }
    }
}
