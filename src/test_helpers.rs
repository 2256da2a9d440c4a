//! Shared test utilities.
//!
//! `image` can write JPEGs but not EXIF, so fixtures that need camera
//! metadata get a little-endian TIFF block spliced in as an APP1 segment
//! right after SOI.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

const TAG_ORIENTATION: u16 = 0x0112;
const TAG_EXIF_IFD: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;

/// Size of an IFD holding `entries` entries: count, entries, next-IFD offset
fn ifd_len(entries: usize) -> u32 {
    (2 + 12 * entries + 4) as u32
}

fn push_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    out.extend(tag.to_le_bytes());
    out.extend(kind.to_le_bytes());
    out.extend(count.to_le_bytes());
    // SHORT values sit in the first two bytes, which little-endian gives for free
    out.extend(value.to_le_bytes());
}

/// TIFF block with an optional Orientation in IFD0 and an optional
/// DateTimeOriginal (`YYYY:MM:DD HH:MM:SS`) in the Exif sub-IFD.
pub fn exif_tiff(orientation: Option<u16>, date_time_original: Option<&str>) -> Vec<u8> {
    let ifd0_entries = orientation.is_some() as usize + date_time_original.is_some() as usize;
    let exif_ifd_offset = 8 + ifd_len(ifd0_entries);
    let date_offset = exif_ifd_offset + ifd_len(1);

    let mut tiff = Vec::new();
    tiff.extend(b"II");
    tiff.extend(42u16.to_le_bytes());
    tiff.extend(8u32.to_le_bytes());

    // IFD0, entries sorted by tag
    tiff.extend((ifd0_entries as u16).to_le_bytes());
    if let Some(orientation) = orientation {
        push_entry(&mut tiff, TAG_ORIENTATION, TYPE_SHORT, 1, orientation as u32);
    }
    if date_time_original.is_some() {
        push_entry(&mut tiff, TAG_EXIF_IFD, TYPE_LONG, 1, exif_ifd_offset);
    }
    tiff.extend(0u32.to_le_bytes());

    if let Some(date) = date_time_original {
        let mut value = date.as_bytes().to_vec();
        value.push(0);
        tiff.extend(1u16.to_le_bytes());
        push_entry(&mut tiff, TAG_DATE_TIME_ORIGINAL, TYPE_ASCII, value.len() as u32, date_offset);
        tiff.extend(0u32.to_le_bytes());
        tiff.extend(value);
    }
    tiff
}

/// A `width`x`height` JPEG carrying the given EXIF fields.
pub fn jpeg_with_exif(width: u32, height: u32, orientation: Option<u16>, date_time_original: Option<&str>) -> Vec<u8> {
    let pixels = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 6) as u8, (y * 6) as u8, 60]));
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, 90)
        .encode_image(&pixels)
        .unwrap();

    let tiff = exif_tiff(orientation, date_time_original);
    let mut app1 = vec![0xFF, 0xE1];
    app1.extend(((2 + 6 + tiff.len()) as u16).to_be_bytes());
    app1.extend(b"Exif\0\0");
    app1.extend(tiff);

    let mut out = jpeg[..2].to_vec();
    out.extend(app1);
    out.extend(&jpeg[2..]);
    out
}
