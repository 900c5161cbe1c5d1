use std::path::{Path, PathBuf};

use indicatif::ProgressIterator;

use crate::error::Result;
use crate::io::list_images;
use crate::pipeline::{Measurement, Pipeline};
use crate::sampling::average_speed;

pub struct BatchEntry {
    pub first: PathBuf,
    pub second: PathBuf,
    pub outcome: Result<Measurement>,
}

/// Groups images as capture pairs (1, 2), (3, 4), ... A trailing odd image is ignored.
pub fn pair_up(paths: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    if paths.len() % 2 == 1 {
        log::warn!(
            "ignoring unpaired image {}",
            paths[paths.len() - 1].display()
        );
    }
    paths
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Estimates every capture pair found in `dir`, one after the other.
pub fn estimate_directory(dir: &Path, pipeline: &Pipeline) -> Result<Vec<BatchEntry>> {
    let pairs = pair_up(&list_images(dir)?);
    let count = pairs.len() as u64;
    let entries = pairs
        .into_iter()
        .progress_count(count)
        .map(|(first, second)| {
            let outcome = pipeline
                .estimate_pair(&first, &second)
                .map(|estimate| estimate.measurement);
            if let Err(e) = &outcome {
                log::error!("pair {} / {} skipped: {}", first.display(), second.display(), e);
            }
            BatchEntry {
                first,
                second,
                outcome,
            }
        })
        .collect();
    Ok(entries)
}

/// Mean speed over the successful entries, `0.0` if none succeeded.
pub fn batch_average(entries: &[BatchEntry]) -> f64 {
    let speeds: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.outcome.as_ref().ok())
        .map(|m| m.speed_km_per_sec)
        .collect();
    average_speed(&speeds)
}
