//! Time-bounded capture and measurement loop.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::camera::Camera;
use crate::error::Result;
use crate::pipeline::{Measurement, Pipeline};
use crate::visualization::log_pair_estimate;

/// Time source and sleeper used by the loop.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Capturing,
    Measuring,
    Accumulating,
    Skipping,
    Finalizing,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSettings {
    pub inter_capture_pause: Duration,
    pub loop_pacing_delay: Duration,
    pub total_run_duration: Duration,
    pub capture_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub average_speed_km_per_sec: f64,
    pub measurements: Vec<Measurement>,
    pub skipped_cycles: usize,
    pub cycles: usize,
}

/// Arithmetic mean of the collected speeds, `0.0` if there are none.
pub fn average_speed(speeds: &[f64]) -> f64 {
    if speeds.is_empty() {
        0.0
    } else {
        speeds.iter().sum::<f64>() / speeds.len() as f64
    }
}

pub struct SamplingLoop<'a, C: Camera, K: Clock> {
    camera: &'a mut C,
    clock: &'a K,
    settings: SamplingSettings,
    state: LoopState,
    next_image: usize,
}

impl<'a, C: Camera, K: Clock> SamplingLoop<'a, C, K> {
    pub fn new(camera: &'a mut C, clock: &'a K, settings: SamplingSettings) -> Self {
        Self {
            camera,
            clock,
            settings,
            state: LoopState::Idle,
            next_image: 1,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs the estimation pipeline on every captured pair until the window closes.
    pub fn run(
        &mut self,
        pipeline: &Pipeline,
        recording: Option<&rerun::RecordingStream>,
    ) -> SessionSummary {
        self.run_with(|cycle, first, second| {
            let estimate = pipeline.estimate_pair(first, second)?;
            if let Some(recording) = recording {
                log_pair_estimate(recording, cycle, first, second, &estimate);
            }
            Ok(estimate.measurement)
        })
    }

    /// Same as [`SamplingLoop::run`] with a custom measurement step.
    ///
    /// `measure` receives the 1-based cycle number and both image paths. A
    /// failing capture or measurement skips the cycle; the loop itself never fails.
    pub fn run_with<F>(&mut self, mut measure: F) -> SessionSummary
    where
        F: FnMut(usize, &Path, &Path) -> Result<Measurement>,
    {
        let deadline = self.clock.now() + self.settings.total_run_duration;
        let mut measurements = Vec::new();
        let mut skipped_cycles = 0;
        let mut cycles = 0;

        while self.clock.now() < deadline {
            cycles += 1;
            match self.run_cycle(cycles, &mut measure) {
                Ok(m) => {
                    self.transition(LoopState::Accumulating);
                    log::info!(
                        "cycle {}: time difference {:.3} s, feature distance {:.3} px, speed {:.5} km/s",
                        cycles,
                        m.time_difference_secs,
                        m.mean_pixel_displacement,
                        m.speed_km_per_sec
                    );
                    measurements.push(m);
                }
                Err(e) => {
                    self.transition(LoopState::Skipping);
                    log::error!("cycle {} skipped: {}", cycles, e);
                    skipped_cycles += 1;
                }
            }
            self.clock.sleep(self.settings.loop_pacing_delay);
        }

        self.transition(LoopState::Finalizing);
        let speeds: Vec<f64> = measurements.iter().map(|m| m.speed_km_per_sec).collect();
        let average = average_speed(&speeds);
        log::info!(
            "{} of {} cycles measured, average speed {:.5} km/s",
            measurements.len(),
            cycles,
            average
        );
        self.transition(LoopState::Done);

        SessionSummary {
            average_speed_km_per_sec: average,
            measurements,
            skipped_cycles,
            cycles,
        }
    }

    fn run_cycle<F>(&mut self, cycle: usize, measure: &mut F) -> Result<Measurement>
    where
        F: FnMut(usize, &Path, &Path) -> Result<Measurement>,
    {
        self.transition(LoopState::Capturing);
        let first = self.capture()?;
        self.clock.sleep(self.settings.inter_capture_pause);
        let second = self.capture()?;
        self.transition(LoopState::Measuring);
        measure(cycle, &first, &second)
    }

    fn capture(&mut self) -> Result<PathBuf> {
        let path = self
            .settings
            .capture_dir
            .join(format!("image{}.jpg", self.next_image));
        self.next_image += 1;
        self.camera.take_photo(&path)
    }

    fn transition(&mut self, next: LoopState) {
        log::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
