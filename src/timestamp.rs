use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::error::{Result, SpeedError};

/// EXIF `DateTimeOriginal` layout, e.g. `2024:02:19 13:45:07`.
pub const CAPTURE_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");

/// Parses an EXIF capture time string.
///
/// Cameras pad ASCII tags with NUL bytes, so trailing NULs and whitespace are ignored.
pub fn parse_capture_time(text: &str) -> std::result::Result<PrimitiveDateTime, time::error::Parse> {
    let trimmed = text.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    PrimitiveDateTime::parse(trimmed, CAPTURE_TIME_FORMAT)
}

pub fn format_capture_time(
    time: &PrimitiveDateTime,
) -> std::result::Result<String, time::error::Format> {
    time.format(CAPTURE_TIME_FORMAT)
}

/// Reads the capture time of an image from its EXIF `DateTimeOriginal` tag.
pub fn capture_time(path: &Path) -> Result<PrimitiveDateTime> {
    let file = File::open(path).map_err(|e| SpeedError::metadata(path, e.to_string()))?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| SpeedError::metadata(path, e.to_string()))?;
    let field = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .ok_or_else(|| SpeedError::metadata(path, "EXIF data does not contain DateTimeOriginal"))?;
    let text = match &field.value {
        exif::Value::Ascii(values) => values
            .first()
            .map(|v| String::from_utf8_lossy(v).into_owned()),
        _ => None,
    }
    .ok_or_else(|| SpeedError::metadata(path, "DateTimeOriginal is not an ASCII value"))?;
    let time = parse_capture_time(&text)
        .map_err(|e| SpeedError::metadata(path, format!("cannot parse '{}': {}", text, e)))?;
    log::trace!("{} captured at {}", path.display(), text.trim_end_matches('\0'));
    Ok(time)
}

/// Absolute time between the captures of two images, in seconds.
pub fn elapsed_seconds(first: &Path, second: &Path) -> Result<f64> {
    let t0 = capture_time(first)?;
    let t1 = capture_time(second)?;
    Ok((t1 - t0).abs().as_seconds_f64())
}
