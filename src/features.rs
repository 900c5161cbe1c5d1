use std::f32::consts::PI;
use std::path::Path;

use glam::Vec2;
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageReader};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeedError};

pub const DESCRIPTOR_BYTES: usize = 32;
pub const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

/// 256-bit binary descriptor.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

const PATCH_RADIUS: i32 = 15;
/// Test points stay inside this disc so rotated pairs never leave the patch.
const PATTERN_RADIUS: i32 = 13;
const PATTERN_SEED: u64 = 0x0b5e_7a1e;
/// 12 degree orientation steps.
const ANGLE_BINS: usize = 30;
const HARRIS_RADIUS: i32 = 3;
const BLUR_SIGMA: f32 = 2.0;
const FAST_ARC: u32 = 9;
const MIN_BORDER: u32 = PATCH_RADIUS as u32 + 1;

/// Bresenham circle of radius 3, clockwise from the top.
const FAST_CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// ORB detector parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbParams {
    /// Upper bound on the number of returned features.
    pub max_features: usize,
    /// Intensity difference for the FAST segment test.
    pub fast_threshold: u8,
    pub num_levels: usize,
    pub scale_factor: f32,
    /// Pixels along each image side where no keypoint is reported.
    pub edge_threshold: u32,
    pub harris_k: f32,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            max_features: 1000,
            fast_threshold: 20,
            num_levels: 2,
            scale_factor: 2.0,
            edge_threshold: 19,
            harris_k: 0.04,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Position in full-resolution pixel coordinates.
    pub pt: Vec2,
    pub response: f32,
    /// Orientation in radians, `(-pi, pi]`.
    pub angle: f32,
    pub level: u8,
}

/// Keypoints with their descriptors; index `i` of one belongs to index `i` of the other.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Loads an image file and converts it to 8-bit grayscale.
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let img = ImageReader::open(path)
        .map_err(|e| SpeedError::image_load(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| SpeedError::image_load(path, e.to_string()))?
        .decode()
        .map_err(|e| SpeedError::image_load(path, e.to_string()))?;
    Ok(img.to_luma8())
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    level: usize,
    x: u32,
    y: u32,
    response: f32,
}

/// Oriented FAST keypoints with steered BRIEF descriptors.
pub struct OrbExtractor {
    params: OrbParams,
    /// Test point pairs for each orientation bin.
    patterns: Vec<Vec<[(i32, i32); 2]>>,
}

impl OrbExtractor {
    pub fn new(params: OrbParams) -> OrbExtractor {
        let base = base_pattern();
        let patterns = (0..ANGLE_BINS)
            .map(|bin| {
                let theta = bin as f32 * 2.0 * PI / ANGLE_BINS as f32;
                let (s, c) = theta.sin_cos();
                let rotate = |(x, y): (i32, i32)| {
                    let (x, y) = (x as f32, y as f32);
                    ((x * c - y * s).round() as i32, (x * s + y * c).round() as i32)
                };
                base.iter()
                    .map(|&[p0, p1]| [rotate(p0), rotate(p1)])
                    .collect()
            })
            .collect();
        OrbExtractor { params, patterns }
    }

    pub fn params(&self) -> &OrbParams {
        &self.params
    }

    fn border(&self) -> u32 {
        self.params.edge_threshold.max(MIN_BORDER)
    }

    /// Detects up to `max_features` keypoints and computes their descriptors.
    ///
    /// The result only depends on the pixel values and the parameters.
    pub fn detect_and_compute(&self, image: &GrayImage) -> FeatureSet {
        let border = self.border();
        let pyramid = self.build_pyramid(image, border);

        let mut candidates: Vec<Candidate> = pyramid
            .iter()
            .enumerate()
            .flat_map(|(level, level_img)| {
                fast_corners(level_img, self.params.fast_threshold, border)
                    .into_iter()
                    .map(move |(x, y)| Candidate {
                        level,
                        x,
                        y,
                        response: harris_response(level_img, x, y, self.params.harris_k),
                    })
            })
            .collect();
        log::trace!(
            "{} corner candidates over {} pyramid levels",
            candidates.len(),
            pyramid.len()
        );

        candidates.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.level.cmp(&b.level))
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        candidates.truncate(self.params.max_features);

        let smoothed: Vec<GrayImage> = pyramid
            .iter()
            .map(|level_img| imageops::blur(level_img, BLUR_SIGMA))
            .collect();

        let mut features = FeatureSet::default();
        for c in candidates {
            let angle = intensity_centroid_angle(&pyramid[c.level], c.x, c.y);
            let descriptor = self.describe(&smoothed[c.level], c.x, c.y, angle);
            let scale = self.params.scale_factor.powi(c.level as i32);
            features.keypoints.push(Keypoint {
                pt: Vec2::new(
                    (c.x as f32 + 0.5) * scale - 0.5,
                    (c.y as f32 + 0.5) * scale - 0.5,
                ),
                response: c.response,
                angle,
                level: c.level as u8,
            });
            features.descriptors.push(descriptor);
        }
        features
    }

    fn build_pyramid(&self, image: &GrayImage, border: u32) -> Vec<GrayImage> {
        let min_side = 2 * border + 1;
        let mut pyramid = Vec::new();
        if image.width() < min_side || image.height() < min_side {
            return pyramid;
        }
        pyramid.push(image.clone());
        for level in 1..self.params.num_levels {
            let scale = self.params.scale_factor.powi(level as i32);
            let w = (image.width() as f32 / scale).round() as u32;
            let h = (image.height() as f32 / scale).round() as u32;
            if w < min_side || h < min_side {
                break;
            }
            pyramid.push(imageops::resize(image, w, h, FilterType::Triangle));
        }
        pyramid
    }

    fn describe(&self, smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
        let step = 2.0 * PI / ANGLE_BINS as f32;
        let bin = ((angle / step).round() as i32).rem_euclid(ANGLE_BINS as i32) as usize;
        let w = smoothed.width() as i32;
        let raw = smoothed.as_raw();
        let at = |dx: i32, dy: i32| raw[((y as i32 + dy) * w + x as i32 + dx) as usize];

        let mut descriptor = [0u8; DESCRIPTOR_BYTES];
        for (i, [(x0, y0), (x1, y1)]) in self.patterns[bin].iter().enumerate() {
            if at(*x0, *y0) < at(*x1, *y1) {
                descriptor[i / 8] |= 1 << (i % 8);
            }
        }
        descriptor
    }
}

impl Default for OrbExtractor {
    fn default() -> Self {
        Self::new(OrbParams::default())
    }
}

/// Fixed pseudo-random BRIEF test pattern inside a disc of `PATTERN_RADIUS`.
fn base_pattern() -> Vec<[(i32, i32); 2]> {
    fn sample(rng: &mut ChaCha8Rng) -> (i32, i32) {
        loop {
            let x = rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
            let y = rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
            if x * x + y * y <= PATTERN_RADIUS * PATTERN_RADIUS {
                return (x, y);
            }
        }
    }
    let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
    (0..DESCRIPTOR_BITS)
        .map(|_| loop {
            let p0 = sample(&mut rng);
            let p1 = sample(&mut rng);
            if p0 != p1 {
                break [p0, p1];
            }
        })
        .collect()
}

/// True when the circular 16-bit mask holds a run of at least `n` set bits.
fn has_arc(mask: u16, n: u32) -> bool {
    let doubled = (mask as u32) | ((mask as u32) << 16);
    let mut run = 0;
    for i in 0..32 {
        if doubled >> i & 1 == 1 {
            run += 1;
            if run >= n {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// FAST-9 segment test score, or `None` if the pixel is not a corner.
fn fast_score(raw: &[u8], w: i32, x: i32, y: i32, threshold: i32) -> Option<f32> {
    let center = raw[(y * w + x) as usize] as i32;
    let mut bright = 0u16;
    let mut dark = 0u16;
    let mut bright_sum = 0;
    let mut dark_sum = 0;
    for (i, (dx, dy)) in FAST_CIRCLE.iter().enumerate() {
        let v = raw[((y + dy) * w + x + dx) as usize] as i32;
        if v > center + threshold {
            bright |= 1 << i;
            bright_sum += v - center - threshold;
        } else if v < center - threshold {
            dark |= 1 << i;
            dark_sum += center - v - threshold;
        }
    }
    if bright.count_ones() < FAST_ARC && dark.count_ones() < FAST_ARC {
        return None;
    }
    let score = match (has_arc(bright, FAST_ARC), has_arc(dark, FAST_ARC)) {
        (true, true) => bright_sum.max(dark_sum),
        (true, false) => bright_sum,
        (false, true) => dark_sum,
        (false, false) => return None,
    };
    Some(score as f32)
}

/// FAST corners inside the border, after 3x3 non-maximum suppression.
///
/// Equal neighbouring scores keep the first pixel in raster order.
fn fast_corners(image: &GrayImage, threshold: u8, border: u32) -> Vec<(u32, u32)> {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let b = border as i32;
    if w < 2 * b + 1 || h < 2 * b + 1 {
        return Vec::new();
    }
    let raw = image.as_raw();
    let threshold = threshold as i32;

    // one extra pixel around the border so every candidate has a full neighbourhood
    let mut scores = vec![0f32; (w * h) as usize];
    for y in (b - 1)..(h - b + 1) {
        for x in (b - 1)..(w - b + 1) {
            if let Some(s) = fast_score(raw, w, x, y, threshold) {
                scores[(y * w + x) as usize] = s;
            }
        }
    }

    let mut corners = Vec::new();
    for y in b..(h - b) {
        for x in b..(w - b) {
            let s = scores[(y * w + x) as usize];
            if s <= 0.0 {
                continue;
            }
            let mut is_max = true;
            'outer: for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let n = scores[((y + dy) * w + x + dx) as usize];
                    let precedes = dy < 0 || (dy == 0 && dx < 0);
                    if (precedes && n >= s) || (!precedes && n > s) {
                        is_max = false;
                        break 'outer;
                    }
                }
            }
            if is_max {
                corners.push((x as u32, y as u32));
            }
        }
    }
    corners
}

/// Harris corner response over a 7x7 window of Sobel gradients.
fn harris_response(image: &GrayImage, x: u32, y: u32, k: f32) -> f32 {
    let w = image.width() as i32;
    let raw = image.as_raw();
    let at = |px: i32, py: i32| raw[(py * w + px) as usize] as f64;
    let (mut a, mut b, mut c) = (0f64, 0f64, 0f64);
    for py in (y as i32 - HARRIS_RADIUS)..=(y as i32 + HARRIS_RADIUS) {
        for px in (x as i32 - HARRIS_RADIUS)..=(x as i32 + HARRIS_RADIUS) {
            let gx = (at(px + 1, py - 1) + 2.0 * at(px + 1, py) + at(px + 1, py + 1))
                - (at(px - 1, py - 1) + 2.0 * at(px - 1, py) + at(px - 1, py + 1));
            let gy = (at(px - 1, py + 1) + 2.0 * at(px, py + 1) + at(px + 1, py + 1))
                - (at(px - 1, py - 1) + 2.0 * at(px, py - 1) + at(px + 1, py - 1));
            a += gx * gx;
            b += gy * gy;
            c += gx * gy;
        }
    }
    // keep the response in a comfortable f32 range
    let norm = 1.0 / (4.0 * 255.0 * (2 * HARRIS_RADIUS + 1) as f64).powi(2);
    let (a, b, c) = (a * norm, b * norm, c * norm);
    (a * b - c * c - k as f64 * (a + b) * (a + b)) as f32
}

/// Orientation from the intensity centroid of the circular patch.
fn intensity_centroid_angle(image: &GrayImage, x: u32, y: u32) -> f32 {
    let w = image.width() as i32;
    let raw = image.as_raw();
    let (mut m01, mut m10) = (0i64, 0i64);
    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        for dx in -PATCH_RADIUS..=PATCH_RADIUS {
            if dx * dx + dy * dy > PATCH_RADIUS * PATCH_RADIUS {
                continue;
            }
            let v = raw[((y as i32 + dy) * w + x as i32 + dx) as usize] as i64;
            m10 += dx as i64 * v;
            m01 += dy as i64 * v;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}
