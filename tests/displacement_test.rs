use glam::Vec2;
use ground_speed_estimation::displacement::{mean_displacement, resolve_correspondences};
use ground_speed_estimation::features::Keypoint;
use ground_speed_estimation::matcher::Match;

fn keypoint(x: f32, y: f32) -> Keypoint {
    Keypoint {
        pt: Vec2::new(x, y),
        response: 1.0,
        angle: 0.0,
        level: 0,
    }
}

#[test]
fn test_three_four_five() {
    let d = mean_displacement(&[Vec2::new(0.0, 0.0)], &[Vec2::new(3.0, 4.0)]);
    assert!((d - 5.0).abs() < 1e-12);
}

#[test]
fn test_mean_over_pairs() {
    let from = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
    let to = [Vec2::new(3.0, 4.0), Vec2::new(10.0, 25.0)];
    assert!((mean_displacement(&from, &to) - 10.0).abs() < 1e-12);
}

#[test]
fn test_empty_and_mismatched_are_zero() {
    assert_eq!(mean_displacement(&[], &[]), 0.0);
    assert_eq!(mean_displacement(&[Vec2::ZERO], &[]), 0.0);
    assert_eq!(mean_displacement(&[], &[Vec2::ONE]), 0.0);
    assert_eq!(
        mean_displacement(&[Vec2::ZERO, Vec2::ONE], &[Vec2::new(3.0, 4.0)]),
        0.0
    );
}

#[test]
fn test_resolve_skips_out_of_range_indices() {
    let kp1 = vec![keypoint(0.0, 0.0), keypoint(1.0, 1.0)];
    let kp2 = vec![keypoint(3.0, 4.0)];
    let matches = vec![
        Match {
            query_idx: 0,
            train_idx: 0,
            distance: 3,
        },
        Match {
            query_idx: 1,
            train_idx: 5,
            distance: 4,
        },
        Match {
            query_idx: 9,
            train_idx: 0,
            distance: 5,
        },
    ];

    let c = resolve_correspondences(&kp1, &kp2, &matches);
    assert_eq!(c.len(), 1);
    assert_eq!(c.from, vec![Vec2::new(0.0, 0.0)]);
    assert_eq!(c.to, vec![Vec2::new(3.0, 4.0)]);
    assert!((c.mean_displacement() - 5.0).abs() < 1e-12);
}

#[test]
fn test_resolve_without_matches() {
    let kp = vec![keypoint(0.0, 0.0)];
    let c = resolve_correspondences(&kp, &kp, &[]);
    assert!(c.is_empty());
    assert_eq!(c.mean_displacement(), 0.0);
}
