//! BMP decoder: file/info header parsing, palette reading, and
//! uncompressed pixel data.
//!
//! Header field layouts follow the 12-byte BITMAPCOREHEADER, the
//! 40-byte BITMAPINFOHEADER, and the 108/124-byte V4/V5 headers.
//! RLE-compressed pixel data is handled in [`crate::rle`].

use std::io::Read;

use rgb::{RGB8, RGBA8};

use crate::bitfields::BitFields;
use crate::error::BmpError;
use crate::image::{DirectImage, Image, IndexedImage};
use crate::limits::Limits;
use crate::rle::{self, RleKind};

const BI_RGB: u32 = 0;
const BI_RLE8: u32 = 1;
const BI_RLE4: u32 = 2;
const BI_BITFIELDS: u32 = 3;

// ── Little-endian field readers ─────────────────────────────────────

fn get_word(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn get_dword(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

// ── Compression ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Compression {
    Rgb,
    Rle8,
    Rle4,
    Bitfields,
}

impl Compression {
    /// Validate the raw compression code against the declared bit
    /// depth. RLE and bitfield modes are only defined for specific
    /// depths; everything else is either malformed or a scheme (such as
    /// embedded JPEG/PNG) this codec does not read.
    fn from_raw(raw: u32, bit_count: u16) -> Result<Self, BmpError> {
        match raw {
            BI_RGB => Ok(Self::Rgb),
            BI_RLE8 if bit_count == 8 => Ok(Self::Rle8),
            BI_RLE8 => Err(BmpError::Format(format!("bad RLE8 bit count {bit_count}"))),
            BI_RLE4 if bit_count == 4 => Ok(Self::Rle4),
            BI_RLE4 => Err(BmpError::Format(format!("bad RLE4 bit count {bit_count}"))),
            BI_BITFIELDS if bit_count == 16 || bit_count == 32 => Ok(Self::Bitfields),
            BI_BITFIELDS => Err(BmpError::Format(format!(
                "bad BITFIELDS bit count {bit_count}"
            ))),
            other => Err(BmpError::Unsupported(format!(
                "compression or image type {other}"
            ))),
        }
    }
}

// ── Metadata probe ──────────────────────────────────────────────────

/// Image geometry and color model, read from the headers alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Whether the pixel data is palette-indexed (bit depth ≤ 8).
    pub has_palette: bool,
}

/// Parse just enough of the headers for [`ImageInfo`]: geometry and bit
/// depth. Compression, bitfields, and the palette are never touched, so
/// this works even on files whose pixel data would fail a full decode.
pub(crate) fn decode_info<R: Read>(r: R) -> Result<ImageInfo, BmpError> {
    let mut d = Decoder::new(r);
    d.read_headers(true)?;
    Ok(ImageInfo {
        width: d.width as u32,
        height: d.height as u32,
        has_palette: d.dst_has_palette,
    })
}

// ── Full decode ─────────────────────────────────────────────────────

/// Decode a full BMP stream into an [`Image`].
pub(crate) fn decode_image<R: Read>(r: R, limits: &Limits) -> Result<Image, BmpError> {
    let mut d = Decoder::new(r);
    d.read_headers(false)?;

    match d.bit_count {
        1 | 4 | 8 | 16 | 24 | 32 => {}
        0 => return Err(BmpError::Unsupported("bit count 0".into())),
        n => return Err(BmpError::Format(format!("bad bit count {n}"))),
    }
    let compression = Compression::from_raw(d.raw_compression, d.bit_count)?;

    // The output buffer is up to 4 bytes per pixel; cap the pixel count
    // so buffer sizing stays well inside 32-bit arithmetic.
    if d.width > 46340 || d.height > 46340 || d.width * d.height >= 0x2000_0000 {
        return Err(BmpError::Unsupported("dimensions too large".into()));
    }
    limits.check(d.width, d.height)?;

    if d.bitfields_segment_len > 0 {
        d.read_bitfields_segment()?;
    }
    if d.src_pal_entries > 0 {
        d.read_palette()?;
    }
    d.read_gap()?;

    if d.dst_has_palette {
        // Pixels an RLE stream never reaches keep index 0.
        let mut pixels = vec![0u8; d.width * d.height];
        match compression {
            Compression::Rle4 => d.decode_rle(RleKind::Rle4, &mut pixels)?,
            Compression::Rle8 => d.decode_rle(RleKind::Rle8, &mut pixels)?,
            _ => d.decode_indexed_rows(&mut pixels)?,
        }
        Ok(Image::Indexed(IndexedImage::from_decoded(
            d.width as u32,
            d.height as u32,
            pixels,
            d.palette,
        )))
    } else {
        let mut pixels = vec![RGBA8::new(0, 0, 0, 0); d.width * d.height];
        d.decode_direct_rows(&mut pixels)?;
        Ok(Image::Direct(DirectImage::from_decoded(
            d.width as u32,
            d.height as u32,
            pixels,
        )))
    }
}

// ── Decoder state ───────────────────────────────────────────────────

struct Decoder<R> {
    r: R,
    bits_offset: u32,
    header_size: u32,
    width: usize,
    height: usize,
    top_down: bool,
    bit_count: u16,
    raw_compression: u32,
    src_pal_entries: usize,
    src_pal_entry_size: usize,
    dst_pal_entries: usize,
    dst_has_palette: bool,
    palette: Vec<RGB8>,
    bitfields: Option<BitFields>,
    bitfields_segment_len: usize,
}

impl<R: Read> Decoder<R> {
    fn new(r: R) -> Self {
        Self {
            r,
            bits_offset: 0,
            header_size: 0,
            width: 0,
            height: 0,
            top_down: false,
            bit_count: 0,
            raw_compression: BI_RGB,
            src_pal_entries: 0,
            src_pal_entry_size: 0,
            dst_pal_entries: 0,
            dst_has_palette: false,
            palette: Vec::new(),
            bitfields: None,
            bitfields_segment_len: 0,
        }
    }

    /// Read and validate the file header and the info header.
    ///
    /// With `config_only` the parse stops once geometry and bit depth
    /// are known, skipping compression, bitfield, and palette
    /// bookkeeping — enough for a metadata query, nothing more.
    fn read_headers(&mut self, config_only: bool) -> Result<(), BmpError> {
        // The 14-byte file header plus the info header's size field.
        let mut fh = [0u8; 18];
        self.r.read_exact(&mut fh)?;
        if fh[0] != b'B' || fh[1] != b'M' {
            return Err(BmpError::Format("not a BMP file".into()));
        }
        // Bytes 2..6 declare the file size; advisory only, never checked.
        self.bits_offset = get_dword(&fh[10..14]);
        self.header_size = get_dword(&fh[14..18]);

        match self.header_size {
            12 | 40 | 108 | 124 => {}
            other => {
                return Err(BmpError::Unsupported(format!(
                    "BMP version (header size {other})"
                )));
            }
        }

        // Pull the whole declared header into one buffer; a 124-byte
        // header is parsed with the 40-byte logic plus the mask quad,
        // and its trailing colorimetry fields are skipped wholesale.
        let mut h = vec![0u8; self.header_size as usize];
        h[0..4].copy_from_slice(&fh[14..18]);
        self.r.read_exact(&mut h[4..])?;

        let (width, height) = if self.header_size == 12 {
            self.parse_core_header(&h)
        } else {
            self.parse_info_header(&h, config_only)?
        };

        if width < 1 {
            return Err(BmpError::Format(format!("bad width {width}")));
        }
        if height < 1 {
            return Err(BmpError::Format(format!("bad height {height}")));
        }
        self.width = width as usize;
        self.height = height as usize;

        if (1..=8).contains(&self.bit_count) {
            self.dst_has_palette = true;
        }
        Ok(())
    }

    /// The legacy 12-byte header: 16-bit geometry, palette size implied
    /// by the bit depth, 3-byte palette entries.
    fn parse_core_header(&mut self, h: &[u8]) -> (i64, i64) {
        let width = i64::from(get_word(&h[4..6]));
        let height = i64::from(get_word(&h[6..8]));
        self.bit_count = get_word(&h[10..12]);
        self.src_pal_entry_size = 3;
        if (1..=8).contains(&self.bit_count) {
            self.src_pal_entries = 1 << self.bit_count;
        }
        (width, height)
    }

    /// The 40-byte header, also the leading part of the 108/124-byte
    /// headers: signed 32-bit geometry (negative height means top-down),
    /// explicit compression and palette count, 4-byte palette entries.
    fn parse_info_header(&mut self, h: &[u8], config_only: bool) -> Result<(i64, i64), BmpError> {
        let width = i64::from(get_dword(&h[4..8]) as i32);
        let mut height = i64::from(get_dword(&h[8..12]) as i32);
        if height < 0 {
            self.top_down = true;
            height = -height;
        }
        self.bit_count = get_word(&h[14..16]);
        if config_only {
            return Ok((width, height));
        }

        self.raw_compression = get_dword(&h[16..20]);
        if self.raw_compression == BI_BITFIELDS && self.header_size == 40 {
            // The masks follow the header as a separate 12-byte segment.
            self.bitfields_segment_len = 12;
        }

        let colors_used = get_dword(&h[32..36]);
        if colors_used > 10000 {
            return Err(BmpError::Format(format!("bad palette size {colors_used}")));
        }
        self.src_pal_entry_size = 4;
        if (1..=8).contains(&self.bit_count) {
            self.src_pal_entries = if colors_used == 0 {
                1 << self.bit_count
            } else {
                colors_used as usize
            };
        } else {
            self.src_pal_entries = colors_used as usize;
        }

        // V4/V5 headers embed the mask quad; it only means anything
        // when the compression mode says so.
        if self.header_size >= 108 && self.raw_compression == BI_BITFIELDS {
            self.bitfields = Some(BitFields::derive(
                get_dword(&h[40..44]),
                get_dword(&h[44..48]),
                get_dword(&h[48..52]),
                get_dword(&h[52..56]),
            ));
        }
        Ok((width, height))
    }

    /// The 12-byte R, G, B mask segment following a 40-byte header with
    /// BITFIELDS compression. No alpha mask in this form.
    fn read_bitfields_segment(&mut self) -> Result<(), BmpError> {
        let mut buf = [0u8; 12];
        self.r.read_exact(&mut buf)?;
        self.bitfields = Some(BitFields::derive(
            get_dword(&buf[0..4]),
            get_dword(&buf[4..8]),
            get_dword(&buf[8..12]),
            0,
        ));
        Ok(())
    }

    /// Read the color table. Entries are stored B, G, R with a reserved
    /// fourth byte in the 4-byte form. A direct-color file may still
    /// carry a table; it is consumed and discarded.
    fn read_palette(&mut self) -> Result<(), BmpError> {
        let mut buf = vec![0u8; self.src_pal_entries * self.src_pal_entry_size];
        self.r.read_exact(&mut buf)?;

        if !self.dst_has_palette {
            self.dst_pal_entries = 0;
            return Ok(());
        }

        self.dst_pal_entries = self.src_pal_entries.min(256);
        self.palette = buf
            .chunks_exact(self.src_pal_entry_size)
            .take(self.dst_pal_entries)
            .map(|e| RGB8::new(e[2], e[1], e[0]))
            .collect();
        Ok(())
    }

    /// If there is a gap before the pixel data, skip over it.
    fn read_gap(&mut self) -> Result<(), BmpError> {
        let current = 14
            + self.header_size as usize
            + self.bitfields_segment_len
            + self.src_pal_entries * self.src_pal_entry_size;
        let offset = self.bits_offset as usize;
        if current == offset {
            return Ok(());
        }
        if current > offset {
            return Err(BmpError::Format("bad bfOffBits field".into()));
        }
        self.skip_bytes(offset - current)
    }

    fn skip_bytes(&mut self, mut n: usize) -> Result<(), BmpError> {
        let mut buf = [0u8; 1024];
        while n > 0 {
            let take = n.min(buf.len());
            self.r.read_exact(&mut buf[..take])?;
            n -= take;
        }
        Ok(())
    }

    /// Encoded bytes per row: pixel bits padded to a 4-byte boundary.
    fn row_stride(&self) -> usize {
        (self.width * usize::from(self.bit_count) + 31) / 32 * 4
    }

    fn decode_indexed_rows(&mut self, pixels: &mut [u8]) -> Result<(), BmpError> {
        let row_decoder = IndexedRowDecoder::for_depth(self.bit_count);
        let mut buf = vec![0u8; self.row_stride()];
        for src_row in 0..self.height {
            let dst_row = if self.top_down {
                src_row
            } else {
                self.height - 1 - src_row
            };
            self.r.read_exact(&mut buf)?;
            let dst = &mut pixels[dst_row * self.width..(dst_row + 1) * self.width];
            row_decoder.decode_row(&buf, self.dst_pal_entries, dst)?;
        }
        Ok(())
    }

    fn decode_direct_rows(&mut self, pixels: &mut [RGBA8]) -> Result<(), BmpError> {
        let row_decoder = DirectRowDecoder::for_depth(self.bit_count);
        let fields = self
            .bitfields
            .unwrap_or_else(|| BitFields::defaults_for(self.bit_count));
        let mut buf = vec![0u8; self.row_stride()];
        for src_row in 0..self.height {
            let dst_row = if self.top_down {
                src_row
            } else {
                self.height - 1 - src_row
            };
            self.r.read_exact(&mut buf)?;
            let dst = &mut pixels[dst_row * self.width..(dst_row + 1) * self.width];
            row_decoder.decode_row(&buf, &fields, dst);
        }
        Ok(())
    }

    fn decode_rle(&mut self, kind: RleKind, pixels: &mut [u8]) -> Result<(), BmpError> {
        rle::decode(
            &mut self.r,
            kind,
            self.width,
            self.height,
            self.dst_pal_entries,
            pixels,
        )
    }
}

// ── Uncompressed row unpacking ──────────────────────────────────────

/// Row unpacker for palette-indexed depths, chosen once per decode.
enum IndexedRowDecoder {
    One,
    Four,
    Eight,
}

impl IndexedRowDecoder {
    fn for_depth(bit_count: u16) -> Self {
        match bit_count {
            1 => Self::One,
            4 => Self::Four,
            _ => Self::Eight,
        }
    }

    /// Unpack one stride-padded row into `dst` (one byte per pixel).
    /// Every emitted index is checked against the palette; out of range
    /// is a format error, never a clamp.
    fn decode_row(&self, src: &[u8], pal_len: usize, dst: &mut [u8]) -> Result<(), BmpError> {
        match self {
            Self::One => {
                for (i, out) in dst.iter_mut().enumerate() {
                    let v = (src[i / 8] >> (7 - i % 8)) & 1;
                    *out = check_index(v, pal_len)?;
                }
            }
            Self::Four => {
                for (i, out) in dst.iter_mut().enumerate() {
                    let v = if i % 2 == 0 { src[i / 2] >> 4 } else { src[i / 2] & 0x0f };
                    *out = check_index(v, pal_len)?;
                }
            }
            Self::Eight => {
                for (i, out) in dst.iter_mut().enumerate() {
                    *out = check_index(src[i], pal_len)?;
                }
            }
        }
        Ok(())
    }
}

fn check_index(v: u8, pal_len: usize) -> Result<u8, BmpError> {
    if usize::from(v) >= pal_len {
        return Err(BmpError::Format("palette index out of range".into()));
    }
    Ok(v)
}

/// Row unpacker for direct-color depths, chosen once per decode.
enum DirectRowDecoder {
    Packed16,
    Bgr24,
    Packed32,
}

impl DirectRowDecoder {
    fn for_depth(bit_count: u16) -> Self {
        match bit_count {
            16 => Self::Packed16,
            24 => Self::Bgr24,
            _ => Self::Packed32,
        }
    }

    fn decode_row(&self, src: &[u8], fields: &BitFields, dst: &mut [RGBA8]) {
        match self {
            Self::Packed16 => {
                for (i, out) in dst.iter_mut().enumerate() {
                    let v = u32::from(get_word(&src[i * 2..i * 2 + 2]));
                    *out = fields.apply(v);
                }
            }
            // A fixed B, G, R byte triple; alpha forced opaque.
            Self::Bgr24 => {
                for (i, out) in dst.iter_mut().enumerate() {
                    *out = RGBA8::new(src[i * 3 + 2], src[i * 3 + 1], src[i * 3], 255);
                }
            }
            Self::Packed32 => {
                for (i, out) in dst.iter_mut().enumerate() {
                    *out = fields.apply(get_dword(&src[i * 4..i * 4 + 4]));
                }
            }
        }
    }
}
