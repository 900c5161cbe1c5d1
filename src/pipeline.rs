use std::path::Path;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::config::EstimatorConfig;
use crate::displacement::{Correspondences, resolve_correspondences};
use crate::error::Result;
use crate::features::{OrbExtractor, load_grayscale};
use crate::matcher::BruteForceMatcher;
use crate::speed::speed_km_per_sec;
use crate::timestamp::elapsed_seconds;

/// Output of one image pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub time_difference_secs: f64,
    pub mean_pixel_displacement: f64,
    pub speed_km_per_sec: f64,
    pub match_count: usize,
}

#[derive(Debug, Clone)]
pub struct PairEstimate {
    pub measurement: Measurement,
    pub correspondences: Correspondences,
}

/// Feature extraction, matching, displacement and speed conversion for an image pair.
pub struct Pipeline {
    extractor: OrbExtractor,
    matcher: BruteForceMatcher,
    gsd_cm_per_px: f64,
}

impl Pipeline {
    pub fn new(config: &EstimatorConfig) -> Pipeline {
        Pipeline {
            extractor: OrbExtractor::new(config.orb.clone()),
            matcher: BruteForceMatcher::new(config.max_match_distance),
            gsd_cm_per_px: config.gsd_cm_per_px,
        }
    }

    pub fn gsd_cm_per_px(&self) -> f64 {
        self.gsd_cm_per_px
    }

    /// Runs the whole pipeline on two image files.
    ///
    /// Capture times are read first, then both images are decoded before any
    /// feature extraction, so a bad second file is reported without work on the first.
    pub fn estimate_pair(&self, first: &Path, second: &Path) -> Result<PairEstimate> {
        let elapsed = elapsed_seconds(first, second)?;
        let img1 = load_grayscale(first)?;
        let img2 = load_grayscale(second)?;
        self.estimate_images(&img1, &img2, elapsed)
    }

    /// Runs the pipeline on decoded images with a known capture interval.
    pub fn estimate_images(
        &self,
        first: &GrayImage,
        second: &GrayImage,
        elapsed_secs: f64,
    ) -> Result<PairEstimate> {
        let features_1 = self.extractor.detect_and_compute(first);
        let features_2 = self.extractor.detect_and_compute(second);
        log::debug!(
            "extracted {} and {} features",
            features_1.len(),
            features_2.len()
        );

        let matches = self
            .matcher
            .match_descriptors(&features_1.descriptors, &features_2.descriptors)?;
        let correspondences =
            resolve_correspondences(&features_1.keypoints, &features_2.keypoints, &matches);
        let displacement = correspondences.mean_displacement();
        let speed = speed_km_per_sec(displacement, self.gsd_cm_per_px, elapsed_secs)?;

        Ok(PairEstimate {
            measurement: Measurement {
                time_difference_secs: elapsed_secs,
                mean_pixel_displacement: displacement,
                speed_km_per_sec: speed,
                match_count: correspondences.len(),
            },
            correspondences,
        })
    }
}
