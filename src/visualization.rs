use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayImage};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::{RecordingStream, TimeCell};

use crate::features::load_grayscale;
use crate::pipeline::PairEstimate;

pub fn log_image_as_compressed(recording: &RecordingStream, topic: &str, img: &GrayImage) {
    let mut bytes: Vec<u8> = Vec::new();
    if let Err(e) = DynamicImage::ImageLuma8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
    {
        log::warn!("cannot encode {} for rerun: {}", topic, e);
        return;
    }
    if let Err(e) = recording.log(
        format!("{}/image", topic),
        &rerun::EncodedImage::from_file_contents(bytes),
    ) {
        log::warn!("rerun log failed: {}", e);
    }
}

pub fn id_to_color(id: usize) -> rerun::Color {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    rerun::Color::from_rgb(
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
    )
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p: glam::Vec2) -> [f32; 2] {
    [p.x + 0.5, p.y + 0.5]
}

/// Logs the matched keypoints of one cycle and the motion between them.
pub fn log_correspondences(recording: &RecordingStream, topic: &str, estimate: &PairEstimate) {
    let colors: Vec<_> = (0..estimate.correspondences.len()).map(id_to_color).collect();
    let (pts, strips): (Vec<_>, Vec<_>) = estimate
        .correspondences
        .pairs()
        .map(|(p0, p1)| (rerun_shift(p1), [rerun_shift(p0), rerun_shift(p1)]))
        .unzip();

    let result = recording
        .log(
            format!("{}/pts", topic),
            &rerun::Points2D::new(pts)
                .with_colors(colors.clone())
                .with_radii([rerun::Radius::new_ui_points(3.0)]),
        )
        .and_then(|_| {
            recording.log(
                format!("{}/motion", topic),
                &rerun::LineStrips2D::new(strips).with_colors(colors),
            )
        });
    if let Err(e) = result {
        log::warn!("rerun log failed: {}", e);
    }
}

/// Logs both frames of a cycle, with the correspondences drawn over the second one.
pub fn log_pair_estimate(
    recording: &RecordingStream,
    cycle: usize,
    first_image: &Path,
    second_image: &Path,
    estimate: &PairEstimate,
) {
    recording.set_time("cycle", TimeCell::from_sequence(cycle as i64));
    for (topic, path) in [("first", first_image), ("second", second_image)] {
        match load_grayscale(path) {
            Ok(img) => log_image_as_compressed(recording, topic, &img),
            Err(e) => log::warn!("{}", e),
        }
    }
    log_correspondences(recording, "second", estimate);
}
