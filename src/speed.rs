use crate::error::{Result, SpeedError};

pub const CM_PER_KM: f64 = 100_000.0;

/// Converts a pixel displacement into ground speed in km/s.
///
/// `gsd_cm_per_px` is the ground distance covered by one pixel, in centimetres.
pub fn speed_km_per_sec(displacement_px: f64, gsd_cm_per_px: f64, elapsed_secs: f64) -> Result<f64> {
    if elapsed_secs == 0.0 {
        return Err(SpeedError::DivisionByZero);
    }
    let distance_km = displacement_px * gsd_cm_per_px / CM_PER_KM;
    Ok(distance_km / elapsed_secs)
}
