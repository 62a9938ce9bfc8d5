/// Resource limits for decode operations.
///
/// All fields default to `None`, leaving only the decoder's built-in
/// pixel-count ceiling in effect. Limits can only tighten that ceiling;
/// a violation surfaces as [`BmpError::Unsupported`], the same kind the
/// built-in ceiling uses.
///
/// [`BmpError::Unsupported`]: crate::BmpError::Unsupported
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Maximum pixel count (width × height).
    pub max_pixels: Option<u64>,
}

impl Limits {
    /// Check header dimensions against the limits.
    pub(crate) fn check(&self, width: usize, height: usize) -> Result<(), crate::BmpError> {
        if let Some(max_w) = self.max_width {
            if width as u64 > u64::from(max_w) {
                return Err(crate::BmpError::Unsupported(format!(
                    "width {width} exceeds limit {max_w}"
                )));
            }
        }
        if let Some(max_h) = self.max_height {
            if height as u64 > u64::from(max_h) {
                return Err(crate::BmpError::Unsupported(format!(
                    "height {height} exceeds limit {max_h}"
                )));
            }
        }
        if let Some(max_px) = self.max_pixels {
            let pixels = width as u64 * height as u64;
            if pixels > max_px {
                return Err(crate::BmpError::Unsupported(format!(
                    "pixel count {pixels} exceeds limit {max_px}"
                )));
            }
        }
        Ok(())
    }
}
