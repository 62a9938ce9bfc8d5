//! Decode tests over handcrafted BMP byte streams: header generations,
//! malformed inputs, RLE streams, and bitfield variants.

use bmpio::{decode, decode_metadata, decode_with_limits, BmpError, Image, Limits, RGB8, RGBA8};

/// Assemble a BMP stream whose pixel-data offset points right past the
/// headers and `extra` (bitfield segment, palette, gap filler).
fn bmp(info: &[u8], extra: &[u8], bits: &[u8]) -> Vec<u8> {
    bmp_at(14 + info.len() + extra.len(), info, extra, bits)
}

fn bmp_at(bits_offset: usize, info: &[u8], extra: &[u8], bits: &[u8]) -> Vec<u8> {
    let file_size = 14 + info.len() + extra.len() + bits.len();
    let mut out = Vec::with_capacity(file_size);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&(bits_offset as u32).to_le_bytes());
    out.extend_from_slice(info);
    out.extend_from_slice(extra);
    out.extend_from_slice(bits);
    out
}

/// A 40-byte BITMAPINFOHEADER with planes = 1 and the given fields.
fn info40(width: i32, height: i32, bit_count: u16, compression: u32, colors_used: u32) -> Vec<u8> {
    let mut h = vec![0u8; 40];
    h[0..4].copy_from_slice(&40u32.to_le_bytes());
    h[4..8].copy_from_slice(&width.to_le_bytes());
    h[8..12].copy_from_slice(&height.to_le_bytes());
    h[12..14].copy_from_slice(&1u16.to_le_bytes());
    h[14..16].copy_from_slice(&bit_count.to_le_bytes());
    h[16..20].copy_from_slice(&compression.to_le_bytes());
    h[32..36].copy_from_slice(&colors_used.to_le_bytes());
    h
}

/// `n` 4-byte palette entries with B = G = R = index.
fn gray_palette(n: usize) -> Vec<u8> {
    (0..n).flat_map(|i| [i as u8, i as u8, i as u8, 0]).collect()
}

fn expect_indexed(image: Image) -> bmpio::IndexedImage {
    match image {
        Image::Indexed(img) => img,
        other => panic!("expected an indexed image, got {other:?}"),
    }
}

fn expect_direct(image: Image) -> bmpio::DirectImage {
    match image {
        Image::Direct(img) => img,
        other => panic!("expected a direct-color image, got {other:?}"),
    }
}

// ── Header generations ──────────────────────────────────────────────

#[test]
fn minimal_24bit_pixel() {
    // 1x1, one B, G, R triple padded to the 4-byte stride.
    let data = bmp(&info40(1, 1, 24, 0, 0), &[], &[10, 20, 30, 0]);
    let img = expect_direct(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixel_at(0, 0), RGBA8::new(30, 20, 10, 255));
}

#[test]
fn os2_core_header_with_3_byte_palette() {
    let mut info = vec![0u8; 12];
    info[0..4].copy_from_slice(&12u32.to_le_bytes());
    info[4..6].copy_from_slice(&2u16.to_le_bytes()); // width
    info[6..8].copy_from_slice(&2u16.to_le_bytes()); // height
    info[8..10].copy_from_slice(&1u16.to_le_bytes()); // planes
    info[10..12].copy_from_slice(&8u16.to_le_bytes()); // bit depth

    // The 12-byte header implies a full 256-entry table, 3 bytes each.
    let palette: Vec<u8> = (0..=255u8).flat_map(|i| [i, i, i]).collect();
    // Bottom row first: [2, 3] then [0, 1], each padded to stride 4.
    let data = bmp(&info, &palette, &[2, 3, 0, 0, 0, 1, 0, 0]);

    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixels(), &[0, 1, 2, 3]);
    assert_eq!(img.palette().len(), 256);
    assert_eq!(img.palette()[3], RGB8::new(3, 3, 3));
}

#[test]
fn extended_headers_parse_like_the_40_byte_one() {
    for size in [108usize, 124] {
        let mut info = vec![0u8; size];
        info[0..4].copy_from_slice(&(size as u32).to_le_bytes());
        info[4..8].copy_from_slice(&1i32.to_le_bytes());
        info[8..12].copy_from_slice(&1i32.to_le_bytes());
        info[12..14].copy_from_slice(&1u16.to_le_bytes());
        info[14..16].copy_from_slice(&24u16.to_le_bytes());

        let data = bmp(&info, &[], &[10, 20, 30, 0]);
        let img = expect_direct(decode(data.as_slice()).unwrap());
        assert_eq!((img.width(), img.height()), (1, 1));
        assert_eq!(img.pixel_at(0, 0), RGBA8::new(30, 20, 10, 255));
    }
}

#[test]
fn unrecognized_header_sizes_are_unsupported_not_format_errors() {
    for size in [16u32, 52, 64, 200] {
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&70u32.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&54u32.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
        let err = decode(data.as_slice()).unwrap_err();
        assert!(
            matches!(err, BmpError::Unsupported(_)),
            "header size {size}: {err:?}"
        );
    }
}

#[test]
fn negative_height_means_top_down() {
    let bits = [0, 1, 0, 0, 1, 0, 0, 0]; // rows in image order
    let data = bmp(&info40(2, -2, 8, 0, 2), &gray_palette(2), &bits);
    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixels(), &[0, 1, 1, 0]);

    // The same rows with a positive height read bottom-up instead.
    let data = bmp(&info40(2, 2, 8, 0, 2), &gray_palette(2), &bits);
    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixels(), &[1, 0, 0, 1]);
}

// ── Malformed and unsupported streams ───────────────────────────────

#[test]
fn bad_magic_is_a_format_error() {
    let mut data = bmp(&info40(1, 1, 24, 0, 0), &[], &[0, 0, 0, 0]);
    data[0] = b'X';
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Format(_)
    ));
}

#[test]
fn non_positive_dimensions_are_format_errors() {
    for (w, h) in [(0, 1), (1, 0), (-3, 1)] {
        let data = bmp(&info40(w, h, 24, 0, 0), &[], &[]);
        assert!(
            matches!(decode(data.as_slice()).unwrap_err(), BmpError::Format(_)),
            "dimensions {w}x{h}"
        );
    }
}

#[test]
fn bad_bit_counts() {
    let data = bmp(&info40(1, 1, 7, 0, 0), &[], &[]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Format(_)
    ));

    // Zero is "no bit count": unimplemented rather than malformed.
    let data = bmp(&info40(1, 1, 0, 0, 0), &[], &[]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Unsupported(_)
    ));
}

#[test]
fn embedded_jpeg_compression_is_rejected() {
    // BI_JPEG (4) is valid BMP, but this codec does not read it.
    let data = bmp(&info40(1, 1, 24, 4, 0), &[], &[]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Unsupported(_)
    ));
}

#[test]
fn rle_with_wrong_depth_is_a_format_error() {
    let data = bmp(&info40(1, 1, 8, 2, 0), &gray_palette(256), &[]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Format(_)
    ));
}

#[test]
fn oversized_colors_used_is_a_format_error() {
    let data = bmp(&info40(1, 1, 8, 0, 10001), &[], &[]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Format(_)
    ));
}

#[test]
fn out_of_range_palette_index_fails_instead_of_clamping() {
    let data = bmp(&info40(1, 1, 8, 0, 2), &gray_palette(2), &[5, 0, 0, 0]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Format(_)
    ));
}

#[test]
fn truncated_pixel_data_is_an_io_error() {
    let data = bmp(&info40(2, 2, 24, 0, 0), &[], &[1, 2, 3]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Io(_)
    ));
}

#[test]
fn dimension_ceiling_is_unsupported() {
    let data = bmp(&info40(50000, 1, 24, 0, 0), &[], &[]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Unsupported(_)
    ));
}

#[test]
fn caller_limits_tighten_the_ceiling() {
    let data = bmp(&info40(2, 2, 24, 0, 0), &[], &[0u8; 24]);
    let limits = Limits {
        max_pixels: Some(1),
        ..Limits::default()
    };
    assert!(matches!(
        decode_with_limits(data.as_slice(), &limits).unwrap_err(),
        BmpError::Unsupported(_)
    ));
    // Without limits the same stream decodes.
    decode(data.as_slice()).unwrap();
}

// ── Palette handling ────────────────────────────────────────────────

#[test]
fn colors_used_is_clamped_to_256_entries() {
    let data = bmp(
        &info40(1, 1, 8, 0, 300),
        &gray_palette(300),
        &[255, 0, 0, 0],
    );
    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.palette().len(), 256);
    assert_eq!(img.index_at(0, 0), 255);
}

#[test]
fn gratuitous_palette_on_truecolor_is_skipped() {
    // colors-used on a 24-bit file sizes a color table that carries no
    // meaning; it still occupies space before the pixel data.
    let data = bmp(&info40(1, 1, 24, 0, 7), &gray_palette(7), &[1, 2, 3, 0]);
    let img = expect_direct(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixel_at(0, 0), RGBA8::new(3, 2, 1, 255));
}

#[test]
fn gap_before_pixel_data_is_skipped() {
    let mut extra = gray_palette(1);
    extra.extend_from_slice(&[0xAA; 6]); // gap filler
    let data = bmp(&info40(1, 1, 8, 0, 1), &extra, &[0, 0, 0, 0]);
    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixels(), &[0]);
}

#[test]
fn pixel_offset_before_the_palette_end_is_a_format_error() {
    let data = bmp_at(50, &info40(1, 1, 8, 0, 1), &gray_palette(1), &[0, 0, 0, 0]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Format(_)
    ));
}

// ── Bitfields ───────────────────────────────────────────────────────

#[test]
fn bitfields_segment_after_40_byte_header() {
    // 5-6-5 masks in the separate 12-byte segment; sample 0xF800 is
    // pure red.
    let mut extra = Vec::new();
    extra.extend_from_slice(&0xF800u32.to_le_bytes());
    extra.extend_from_slice(&0x07E0u32.to_le_bytes());
    extra.extend_from_slice(&0x001Fu32.to_le_bytes());
    let data = bmp(&info40(1, 1, 16, 3, 0), &extra, &[0x00, 0xF8, 0, 0]);
    let img = expect_direct(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixel_at(0, 0), RGBA8::new(255, 0, 0, 255));
}

#[test]
fn sixteen_bit_without_masks_defaults_to_555() {
    let data = bmp(&info40(1, 1, 16, 0, 0), &[], &[0x00, 0x7C, 0, 0]);
    let img = expect_direct(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixel_at(0, 0), RGBA8::new(255, 0, 0, 255));
}

#[test]
fn thirty_two_bit_without_masks_is_opaque_xrgb() {
    let data = bmp(&info40(1, 1, 32, 0, 0), &[], &[0x56, 0x34, 0x12, 0x00]);
    let img = expect_direct(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixel_at(0, 0), RGBA8::new(0x12, 0x34, 0x56, 255));
}

#[test]
fn v4_header_embeds_masks_with_alpha() {
    let mut info = vec![0u8; 108];
    info[0..4].copy_from_slice(&108u32.to_le_bytes());
    info[4..8].copy_from_slice(&1i32.to_le_bytes());
    info[8..12].copy_from_slice(&1i32.to_le_bytes());
    info[12..14].copy_from_slice(&1u16.to_le_bytes());
    info[14..16].copy_from_slice(&32u16.to_le_bytes());
    info[16..20].copy_from_slice(&3u32.to_le_bytes()); // BI_BITFIELDS
    info[40..44].copy_from_slice(&0x00FF_0000u32.to_le_bytes());
    info[44..48].copy_from_slice(&0x0000_FF00u32.to_le_bytes());
    info[48..52].copy_from_slice(&0x0000_00FFu32.to_le_bytes());
    info[52..56].copy_from_slice(&0xFF00_0000u32.to_le_bytes());

    let data = bmp(&info, &[], &[0x99, 0x66, 0x33, 0x80]);
    let img = expect_direct(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixel_at(0, 0), RGBA8::new(0x33, 0x66, 0x99, 0x80));
}

// ── RLE streams ─────────────────────────────────────────────────────

#[test]
fn rle8_run_end_of_row_end_of_bitmap() {
    let data = bmp(
        &info40(2, 1, 8, 1, 0),
        &gray_palette(256),
        &[2, 5, 0, 0, 0, 1],
    );
    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixels(), &[5, 5]);
}

#[test]
fn rle4_alternates_nibbles() {
    let data = bmp(&info40(4, 1, 4, 2, 0), &gray_palette(16), &[4, 0x12, 0, 1]);
    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixels(), &[1, 2, 1, 2]);
}

#[test]
fn rle_decode_is_deterministic() {
    // A delta move leaves a hole; decoding twice must agree everywhere,
    // including the pixels the stream never wrote.
    let data = bmp(
        &info40(2, 2, 8, 1, 2),
        &gray_palette(2),
        &[1, 1, 0, 2, 0, 1, 1, 1, 0, 1],
    );
    let first = expect_indexed(decode(data.as_slice()).unwrap());
    let second = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(first, second);
    assert_eq!(first.pixels(), &[0, 1, 1, 0]);
}

#[test]
fn truncated_rle_stream_decodes_what_it_has() {
    let data = bmp(&info40(2, 2, 8, 1, 256), &gray_palette(256), &[1, 3]);
    let img = expect_indexed(decode(data.as_slice()).unwrap());
    assert_eq!(img.pixels(), &[0, 0, 3, 0]);
}

#[test]
fn rle_palette_index_out_of_range_is_a_format_error() {
    let data = bmp(&info40(2, 1, 8, 1, 4), &gray_palette(4), &[2, 9, 0, 1]);
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Format(_)
    ));
}

// ── Metadata probe ──────────────────────────────────────────────────

#[test]
fn metadata_reads_geometry_only() {
    let data = bmp(&info40(3, 2, 8, 0, 0), &gray_palette(256), &[0u8; 8]);
    let info = decode_metadata(data.as_slice()).unwrap();
    assert_eq!((info.width, info.height), (3, 2));
    assert!(info.has_palette);

    let data = bmp(&info40(3, 2, 24, 0, 0), &[], &[0u8; 24]);
    let info = decode_metadata(data.as_slice()).unwrap();
    assert!(!info.has_palette);
}

#[test]
fn metadata_ignores_fields_a_full_decode_rejects() {
    // Compression 99 fails a decode but the probe never reads it.
    let data = bmp(&info40(3, 2, 8, 99, 0), &[], &[]);
    let info = decode_metadata(data.as_slice()).unwrap();
    assert_eq!((info.width, info.height), (3, 2));
    assert!(matches!(
        decode(data.as_slice()).unwrap_err(),
        BmpError::Unsupported(_)
    ));
}
