//! Channel bitfields for 16- and 32-bit direct-color pixels.
//!
//! A bitfield names the bits of a packed pixel word that belong to one
//! channel. From the mask alone we derive the shift down to bit 0 and
//! the linear factor that scales the extracted sample to `0..=255`.

use rgb::RGBA8;

/// One channel of a packed pixel: its mask plus the derived shift and
/// scale. Immutable once derived.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BitField {
    mask: u32,
    shift: u32,
    scale: f64,
}

impl BitField {
    pub(crate) fn derive(mask: u32) -> Self {
        if mask == 0 {
            return Self::default();
        }
        let shift = mask.trailing_zeros();
        Self {
            mask,
            shift,
            scale: 255.0 / f64::from(mask >> shift),
        }
    }

    /// Extract this channel from a packed sample and scale it to 8 bits,
    /// rounding half up.
    ///
    /// An absent channel (zero mask) reads as 255: fully opaque for
    /// alpha, full intensity for color.
    pub(crate) fn apply(self, v: u32) -> u8 {
        if self.mask == 0 {
            return 255;
        }
        (0.5 + f64::from((v & self.mask) >> self.shift) * self.scale) as u8
    }
}

/// The R, G, B, A channel masks of one packed direct-color format.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BitFields {
    r: BitField,
    g: BitField,
    b: BitField,
    a: BitField,
}

impl BitFields {
    pub(crate) fn derive(r: u32, g: u32, b: u32, a: u32) -> Self {
        Self {
            r: BitField::derive(r),
            g: BitField::derive(g),
            b: BitField::derive(b),
            a: BitField::derive(a),
        }
    }

    /// Hardwired masks for files that never declare any: 5-5-5 RGB for
    /// 16-bit, 8-8-8 RGB for 32-bit, no alpha in either case.
    pub(crate) fn defaults_for(bit_count: u16) -> Self {
        if bit_count == 16 {
            Self::derive(0x7c00, 0x03e0, 0x001f, 0)
        } else {
            Self::derive(0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0)
        }
    }

    /// Expand one packed sample to an 8-bit RGBA pixel.
    pub(crate) fn apply(self, v: u32) -> RGBA8 {
        RGBA8::new(self.r.apply(v), self.g.apply(v), self.b.apply(v), self.a.apply(v))
    }
}
