use ground_speed_estimation::synthetic::{render_scene, shifted_pair, write_jpeg_with_capture_time};
use ground_speed_estimation::{EstimatorConfig, Pipeline, SpeedError};
use tempfile::TempDir;
use time::macros::datetime;

fn config(gsd_cm_per_px: f64, max_match_distance: Option<u32>) -> EstimatorConfig {
    EstimatorConfig {
        gsd_cm_per_px,
        max_match_distance,
        ..Default::default()
    }
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values[values.len() / 2]
}

#[test]
fn test_identical_images_have_no_displacement() {
    let img = render_scene(320, 240, 0, 0, 21);
    let pipeline = Pipeline::new(&EstimatorConfig::default());

    let estimate = pipeline.estimate_images(&img, &img, 9.0).unwrap();
    assert!(estimate.measurement.match_count > 0);
    assert_eq!(estimate.measurement.mean_pixel_displacement, 0.0);
    assert_eq!(estimate.measurement.speed_km_per_sec, 0.0);
    assert_eq!(estimate.measurement.time_difference_secs, 9.0);
}

#[test]
fn test_known_shift_gives_known_speed() {
    let (img1, img2) = shifted_pair(480, 240, 50, 0, 2);
    let pipeline = Pipeline::new(&config(2000.0, Some(40)));

    let estimate = pipeline.estimate_images(&img1, &img2, 10.0).unwrap();
    let m = &estimate.measurement;
    assert!(m.match_count > 20, "only {} matches", m.match_count);
    assert_eq!(m.match_count, estimate.correspondences.len());

    // 50 px * 2000 cm/px over 10 s
    assert!(
        (m.mean_pixel_displacement - 50.0).abs() < 5.0,
        "displacement {}",
        m.mean_pixel_displacement
    );
    assert!((m.speed_km_per_sec - 0.1).abs() < 0.01, "speed {}", m.speed_km_per_sec);

    for (from, to) in estimate.correspondences.pairs() {
        assert!(from.x >= to.x, "{:?} -> {:?}", from, to);
    }
}

#[test]
fn test_default_matching_on_shifted_scene() {
    let (img1, img2) = shifted_pair(480, 240, 30, 20, 8);
    let pipeline = Pipeline::new(&EstimatorConfig::default());

    let estimate = pipeline.estimate_images(&img1, &img2, 9.0).unwrap();
    let distances: Vec<f64> = estimate
        .correspondences
        .pairs()
        .map(|(a, b)| a.as_dvec2().distance(b.as_dvec2()))
        .collect();
    assert!(!distances.is_empty());

    let expected = (30.0f64).hypot(20.0);
    assert!((median(distances) - expected).abs() < 1.0);
}

#[test]
fn test_estimate_pair_from_files() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("image1.jpg");
    let second = temp_dir.path().join("image2.jpg");
    let (img1, img2) = shifted_pair(480, 240, 48, 0, 5);
    write_jpeg_with_capture_time(&first, &img1, &datetime!(2024-02-19 13:45:00)).unwrap();
    write_jpeg_with_capture_time(&second, &img2, &datetime!(2024-02-19 13:45:12)).unwrap();

    let pipeline = Pipeline::new(&config(1000.0, Some(64)));
    let estimate = pipeline.estimate_pair(&first, &second).unwrap();
    let m = &estimate.measurement;

    assert_eq!(m.time_difference_secs, 12.0);
    let distances: Vec<f64> = estimate
        .correspondences
        .pairs()
        .map(|(a, b)| a.as_dvec2().distance(b.as_dvec2()))
        .collect();
    assert!(!distances.is_empty());
    assert!((median(distances) - 48.0).abs() < 2.0);
    // 48 px * 1000 cm/px over 12 s
    assert!((m.speed_km_per_sec - 0.04).abs() < 0.01, "speed {}", m.speed_km_per_sec);
}

#[test]
fn test_missing_second_image() {
    let temp_dir = TempDir::new().unwrap();
    let first = temp_dir.path().join("image1.jpg");
    let second = temp_dir.path().join("image2.jpg");
    let img = render_scene(128, 96, 0, 0, 1);
    write_jpeg_with_capture_time(&first, &img, &datetime!(2024-02-19 13:45:00)).unwrap();

    let pipeline = Pipeline::new(&EstimatorConfig::default());
    match pipeline.estimate_pair(&first, &second) {
        Err(SpeedError::Metadata { path, .. }) => assert_eq!(path, second),
        other => panic!("expected metadata error, got {:?}", other.map(|e| e.measurement)),
    }
}

#[test]
fn test_same_capture_time_is_division_by_zero() {
    let (img1, img2) = shifted_pair(320, 240, 10, 0, 3);
    let pipeline = Pipeline::new(&EstimatorConfig::default());
    assert!(matches!(
        pipeline.estimate_images(&img1, &img2, 0.0),
        Err(SpeedError::DivisionByZero)
    ));
}

#[test]
fn test_featureless_image_is_invalid_input() {
    let flat = image::GrayImage::from_pixel(320, 240, image::Luma([128]));
    let textured = render_scene(320, 240, 0, 0, 3);
    let pipeline = Pipeline::new(&EstimatorConfig::default());
    assert!(matches!(
        pipeline.estimate_images(&flat, &textured, 9.0),
        Err(SpeedError::InvalidInput(_))
    ));
}
