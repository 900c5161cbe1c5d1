//! Cross-checked brute-force matching of binary descriptors.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeedError};
use crate::features::Descriptor;

/// Correspondence between descriptor `query_idx` of the first set and
/// descriptor `train_idx` of the second set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    /// Hamming distance; lower is more similar.
    pub distance: u32,
}

/// Number of differing bits between two descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[derive(Debug, Clone, Default)]
pub struct BruteForceMatcher {
    /// Matches farther apart than this are dropped after cross-checking.
    pub max_distance: Option<u32>,
}

impl BruteForceMatcher {
    pub fn new(max_distance: Option<u32>) -> Self {
        Self { max_distance }
    }

    /// Keeps a pair only if each descriptor is the other's nearest neighbour.
    ///
    /// Ties resolve to the lowest index. The result is sorted by ascending
    /// distance, then by query index.
    pub fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Result<Vec<Match>> {
        if query.is_empty() || train.is_empty() {
            return Err(SpeedError::InvalidInput(format!(
                "descriptors cannot be empty for matching (query: {}, train: {})",
                query.len(),
                train.len()
            )));
        }

        let cols = train.len();
        let distances: Vec<u32> = query
            .iter()
            .flat_map(|q| train.iter().map(move |t| hamming_distance(q, t)))
            .collect();

        let best_train: Vec<usize> = (0..query.len())
            .map(|i| argmin((0..cols).map(|j| distances[i * cols + j])))
            .collect();
        let best_query: Vec<usize> = (0..cols)
            .map(|j| argmin((0..query.len()).map(|i| distances[i * cols + j])))
            .collect();

        let mut matches: Vec<Match> = best_train
            .iter()
            .enumerate()
            .filter(|&(i, &j)| best_query[j] == i)
            .map(|(i, &j)| Match {
                query_idx: i,
                train_idx: j,
                distance: distances[i * cols + j],
            })
            .filter(|m| self.max_distance.is_none_or(|max| m.distance <= max))
            .collect();
        matches.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.query_idx.cmp(&b.query_idx)));

        log::trace!(
            "{} cross-checked matches from {} x {} descriptors",
            matches.len(),
            query.len(),
            train.len()
        );
        Ok(matches)
    }
}

/// Index of the first minimum.
fn argmin(values: impl Iterator<Item = u32>) -> usize {
    values
        .enumerate()
        .min_by_key(|&(_, d)| d)
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

/// Cross-checked Hamming matching without a distance threshold.
pub fn match_descriptors(query: &[Descriptor], train: &[Descriptor]) -> Result<Vec<Match>> {
    BruteForceMatcher::default().match_descriptors(query, train)
}
