//! Ground speed estimation from two time-separated photographs.
//!
//! Features are detected in both images, matched by descriptor, and their mean
//! pixel displacement is converted to km/s with the ground sample distance and
//! the EXIF capture interval.

pub mod batch;
pub mod camera;
pub mod config;
pub mod displacement;
pub mod error;
pub mod features;
pub mod io;
pub mod matcher;
pub mod pipeline;
pub mod sampling;
pub mod speed;
pub mod synthetic;
pub mod timestamp;
pub mod visualization;

pub use config::EstimatorConfig;
pub use error::{Result, SpeedError};
pub use pipeline::{Measurement, PairEstimate, Pipeline};
pub use sampling::{SamplingLoop, SessionSummary};
