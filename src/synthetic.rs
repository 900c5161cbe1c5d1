//! Synthetic ground scenes and EXIF-stamped JPEGs for fixtures and benchmarks.

use std::io::Cursor;
use std::path::Path;

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma};
use time::PrimitiveDateTime;

use crate::error::{Result, SpeedError};
use crate::timestamp::format_capture_time;

/// Side of the square patches the scene is made of.
pub const CELL_SIZE: i64 = 11;

/// Intensity of the scene at world coordinate `(x, y)`.
///
/// The scene is an unbounded grid of patches with pseudo-random brightness.
pub fn scene_intensity(x: i64, y: i64, seed: u64) -> u8 {
    let cx = x.div_euclid(CELL_SIZE) as u64;
    let cy = y.div_euclid(CELL_SIZE) as u64;
    let mut h = seed
        ^ cx.wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ cy.wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    16 + (h % 224) as u8
}

/// Renders a `width` x `height` view of the scene whose top left corner is at `(origin_x, origin_y)`.
pub fn render_scene(width: u32, height: u32, origin_x: i64, origin_y: i64, seed: u64) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        Luma([scene_intensity(
            origin_x + x as i64,
            origin_y + y as i64,
            seed,
        )])
    })
}

/// Two views of the same scene, the second one taken after the platform moved by `(shift_x, shift_y)`.
///
/// Ground features therefore appear displaced by `(-shift_x, -shift_y)` in the second image.
pub fn shifted_pair(
    width: u32,
    height: u32,
    shift_x: i64,
    shift_y: i64,
    seed: u64,
) -> (GrayImage, GrayImage) {
    (
        render_scene(width, height, 0, 0, seed),
        render_scene(width, height, shift_x, shift_y, seed),
    )
}

/// TIFF-encoded EXIF block carrying `DateTime` and `DateTimeOriginal`.
pub fn exif_block(capture_time: &PrimitiveDateTime) -> Result<Vec<u8>> {
    let text = format_capture_time(capture_time)
        .map_err(|e| SpeedError::InvalidInput(format!("capture time: {}", e)))?;
    let value = Value::Ascii(vec![text.into_bytes()]);
    let modified = Field {
        tag: Tag::DateTime,
        ifd_num: In::PRIMARY,
        value: value.clone(),
    };
    let original = Field {
        tag: Tag::DateTimeOriginal,
        ifd_num: In::PRIMARY,
        value,
    };
    let mut writer = Writer::new();
    writer.push_field(&modified);
    writer.push_field(&original);
    let mut tiff = Cursor::new(Vec::new());
    writer
        .write(&mut tiff, false)
        .map_err(|e| SpeedError::Io(std::io::Error::other(e.to_string())))?;
    Ok(tiff.into_inner())
}

/// Encodes `img` as JPEG with an APP1 EXIF segment right after the start-of-image marker.
pub fn encode_jpeg_with_capture_time(
    img: &GrayImage,
    capture_time: &PrimitiveDateTime,
    quality: u8,
) -> Result<Vec<u8>> {
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(img)
        .map_err(|e| SpeedError::Io(std::io::Error::other(e.to_string())))?;

    let tiff = exif_block(capture_time)?;
    let segment_len = u16::try_from(2 + 6 + tiff.len())
        .map_err(|_| SpeedError::InvalidInput("EXIF block too large".to_string()))?;

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xff, 0xe1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    Ok(out)
}

pub fn write_jpeg_with_capture_time(
    path: &Path,
    img: &GrayImage,
    capture_time: &PrimitiveDateTime,
) -> Result<()> {
    let bytes = encode_jpeg_with_capture_time(img, capture_time, 100)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
