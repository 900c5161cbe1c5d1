use glam::Vec2;

use crate::features::Keypoint;
use crate::matcher::Match;

/// Matched coordinates; `from[i]` in the first image corresponds to `to[i]` in the second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correspondences {
    pub from: Vec<Vec2>,
    pub to: Vec<Vec2>,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.from.len().min(self.to.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mean_displacement(&self) -> f64 {
        mean_displacement(&self.from, &self.to)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.from.iter().copied().zip(self.to.iter().copied())
    }
}

/// Looks up the keypoint coordinates referenced by each match.
///
/// A match whose index is out of range on either side is dropped with a warning.
pub fn resolve_correspondences(
    keypoints_1: &[Keypoint],
    keypoints_2: &[Keypoint],
    matches: &[Match],
) -> Correspondences {
    let (from, to) = matches
        .iter()
        .filter_map(|m| {
            match (keypoints_1.get(m.query_idx), keypoints_2.get(m.train_idx)) {
                (Some(k1), Some(k2)) => Some((k1.pt, k2.pt)),
                _ => {
                    log::warn!(
                        "skipping match {} -> {}: index out of range ({} / {} keypoints)",
                        m.query_idx,
                        m.train_idx,
                        keypoints_1.len(),
                        keypoints_2.len()
                    );
                    None
                }
            }
        })
        .unzip();
    Correspondences { from, to }
}

/// Mean Euclidean distance between paired coordinates, in pixels.
///
/// Returns `0.0` when either side is empty or the lengths differ.
pub fn mean_displacement(from: &[Vec2], to: &[Vec2]) -> f64 {
    if from.is_empty() || to.is_empty() || from.len() != to.len() {
        return 0.0;
    }
    let total: f64 = from
        .iter()
        .zip(to)
        .map(|(a, b)| a.as_dvec2().distance(b.as_dvec2()))
        .sum();
    total / from.len() as f64
}
