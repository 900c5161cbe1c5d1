use ground_speed_estimation::SpeedError;
use ground_speed_estimation::config::DEFAULT_GSD_CM_PER_PX;
use ground_speed_estimation::speed::speed_km_per_sec;

#[test]
fn test_unit_conversion() {
    let speed = speed_km_per_sec(10.0, 100_000.0, 10.0).unwrap();
    assert!((speed - 1.0).abs() < 1e-12);

    let speed = speed_km_per_sec(50.0, 2000.0, 10.0).unwrap();
    assert!((speed - 0.1).abs() < 1e-12);
}

#[test]
fn test_zero_elapsed_time_is_an_error() {
    assert!(matches!(
        speed_km_per_sec(10.0, 100_000.0, 0.0),
        Err(SpeedError::DivisionByZero)
    ));
    // even with nothing moving
    assert!(matches!(
        speed_km_per_sec(0.0, DEFAULT_GSD_CM_PER_PX, 0.0),
        Err(SpeedError::DivisionByZero)
    ));
}

#[test]
fn test_no_displacement_is_zero_speed() {
    assert_eq!(speed_km_per_sec(0.0, DEFAULT_GSD_CM_PER_PX, 9.0).unwrap(), 0.0);
}

#[test]
fn test_orbital_scale() {
    // ~29 px over 9 s with the default GSD is in the range of a low orbit
    let speed = speed_km_per_sec(28.0, DEFAULT_GSD_CM_PER_PX, 9.0).unwrap();
    assert!(speed > 7.0 && speed < 8.0, "speed {}", speed);
}
