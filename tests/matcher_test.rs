use std::collections::HashSet;

use ground_speed_estimation::SpeedError;
use ground_speed_estimation::features::{Descriptor, OrbExtractor};
use ground_speed_estimation::matcher::{BruteForceMatcher, hamming_distance, match_descriptors};
use ground_speed_estimation::synthetic::shifted_pair;

fn descriptor(fill: u8) -> Descriptor {
    [fill; 32]
}

#[test]
fn test_hamming_distance() {
    assert_eq!(hamming_distance(&descriptor(0), &descriptor(0)), 0);
    assert_eq!(hamming_distance(&descriptor(0), &descriptor(0xff)), 256);
    let mut one_bit = descriptor(0);
    one_bit[17] = 0b0000_0100;
    assert_eq!(hamming_distance(&descriptor(0), &one_bit), 1);
}

#[test]
fn test_empty_descriptors_are_invalid() {
    let some = vec![descriptor(1)];
    assert!(matches!(match_descriptors(&[], &some), Err(SpeedError::InvalidInput(_))));
    assert!(matches!(match_descriptors(&some, &[]), Err(SpeedError::InvalidInput(_))));
}

#[test]
fn test_cross_check_rejects_one_sided_matches() {
    // query 0 and 1 both prefer train 0, only the closer one survives
    let query = vec![descriptor(0b0000_0001), descriptor(0b0000_0011)];
    let train = vec![descriptor(0b0000_0001), descriptor(0xff)];

    let matches = match_descriptors(&query, &train).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].query_idx, 0);
    assert_eq!(matches[0].train_idx, 0);
    assert_eq!(matches[0].distance, 0);
}

#[test]
fn test_identical_sets_match_identity() {
    let (img, _) = shifted_pair(320, 240, 0, 0, 11);
    let features = OrbExtractor::default().detect_and_compute(&img);

    let matches = match_descriptors(&features.descriptors, &features.descriptors).unwrap();
    assert!(!matches.is_empty());
    for m in &matches {
        assert_eq!(m.query_idx, m.train_idx);
        assert_eq!(m.distance, 0);
    }
}

#[test]
fn test_matches_are_one_to_one_and_sorted() {
    let (img1, img2) = shifted_pair(320, 240, 23, 7, 4);
    let extractor = OrbExtractor::default();
    let f1 = extractor.detect_and_compute(&img1);
    let f2 = extractor.detect_and_compute(&img2);

    let matches = match_descriptors(&f1.descriptors, &f2.descriptors).unwrap();
    assert!(!matches.is_empty());

    let queries: HashSet<_> = matches.iter().map(|m| m.query_idx).collect();
    let trains: HashSet<_> = matches.iter().map(|m| m.train_idx).collect();
    assert_eq!(queries.len(), matches.len());
    assert_eq!(trains.len(), matches.len());

    for pair in matches.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    for m in &matches {
        assert!(m.query_idx < f1.len() && m.train_idx < f2.len());
        assert_eq!(
            m.distance,
            hamming_distance(&f1.descriptors[m.query_idx], &f2.descriptors[m.train_idx])
        );
    }
}

#[test]
fn test_max_distance_filter() {
    let query = vec![descriptor(0), descriptor(0x0f)];
    let train = vec![descriptor(0), descriptor(0x1f)];

    let all = BruteForceMatcher::default().match_descriptors(&query, &train).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].distance, 32);

    let strict = BruteForceMatcher::new(Some(10)).match_descriptors(&query, &train).unwrap();
    assert_eq!(strict.len(), 1);
    assert_eq!(strict[0].query_idx, 0);
}
