use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeedError};
use crate::features::OrbParams;
use crate::io::object_from_json;
use crate::sampling::SamplingSettings;

/// Ground sample distance of the reference payload camera, cm per pixel.
pub const DEFAULT_GSD_CM_PER_PX: f64 = 24451.525;
const DEFAULT_INTER_CAPTURE_PAUSE_SECS: f64 = 9.0;
const DEFAULT_LOOP_PACING_DELAY_SECS: f64 = 1.0;
const DEFAULT_TOTAL_RUN_DURATION_SECS: f64 = 5.0 * 60.0;
const DEFAULT_RESULT_PATH: &str = "results.txt";

/// Tunables of a measurement session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Feature detector settings, including the per-image feature cap.
    pub orb: OrbParams,
    pub gsd_cm_per_px: f64,
    /// Optional Hamming distance ceiling applied after cross-checking.
    pub max_match_distance: Option<u32>,
    pub inter_capture_pause_secs: f64,
    pub loop_pacing_delay_secs: f64,
    pub total_run_duration_secs: f64,
    /// Folder the camera writes `image{i}.jpg` into.
    pub capture_dir: PathBuf,
    pub result_path: PathBuf,
    pub report_path: Option<PathBuf>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            orb: OrbParams::default(),
            gsd_cm_per_px: DEFAULT_GSD_CM_PER_PX,
            max_match_distance: None,
            inter_capture_pause_secs: DEFAULT_INTER_CAPTURE_PAUSE_SECS,
            loop_pacing_delay_secs: DEFAULT_LOOP_PACING_DELAY_SECS,
            total_run_duration_secs: DEFAULT_TOTAL_RUN_DURATION_SECS,
            capture_dir: PathBuf::from("."),
            result_path: PathBuf::from(DEFAULT_RESULT_PATH),
            report_path: None,
        }
    }
}

impl EstimatorConfig {
    /// Reads the JSON file if given, otherwise uses defaults. Either way the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: EstimatorConfig = match path {
            Some(p) => object_from_json(p)?,
            None => EstimatorConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gsd_cm_per_px.is_finite() && self.gsd_cm_per_px > 0.0) {
            return Err(SpeedError::Config(format!(
                "gsd_cm_per_px must be positive, got {}",
                self.gsd_cm_per_px
            )));
        }
        if self.orb.max_features == 0 {
            return Err(SpeedError::Config("orb.max_features must be at least 1".to_string()));
        }
        if self.orb.num_levels == 0 {
            return Err(SpeedError::Config("orb.num_levels must be at least 1".to_string()));
        }
        if !(self.orb.scale_factor.is_finite() && self.orb.scale_factor > 1.0) {
            return Err(SpeedError::Config(format!(
                "orb.scale_factor must be greater than 1, got {}",
                self.orb.scale_factor
            )));
        }
        for (name, secs) in [
            ("inter_capture_pause_secs", self.inter_capture_pause_secs),
            ("loop_pacing_delay_secs", self.loop_pacing_delay_secs),
            ("total_run_duration_secs", self.total_run_duration_secs),
        ] {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(SpeedError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, secs
                )));
            }
        }
        Ok(())
    }

    pub fn sampling_settings(&self) -> Result<SamplingSettings> {
        let secs = |name: &str, value: f64| {
            Duration::try_from_secs_f64(value)
                .map_err(|e| SpeedError::Config(format!("{}: {}", name, e)))
        };
        Ok(SamplingSettings {
            inter_capture_pause: secs("inter_capture_pause_secs", self.inter_capture_pause_secs)?,
            loop_pacing_delay: secs("loop_pacing_delay_secs", self.loop_pacing_delay_secs)?,
            total_run_duration: secs("total_run_duration_secs", self.total_run_duration_secs)?,
            capture_dir: self.capture_dir.clone(),
        })
    }
}
