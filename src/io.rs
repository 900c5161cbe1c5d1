use std::io::Write;
use std::path::{Path, PathBuf};

use glob::glob;
use serde::{Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::config::EstimatorConfig;
use crate::error::{Result, SpeedError};
use crate::sampling::SessionSummary;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &Path, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(file_path).map_err(|e| {
        SpeedError::Config(format!("cannot read '{}': {}", file_path.display(), e))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        let lower = p.as_os_str().to_string_lossy().to_lowercase();
        for ext in &[".jpg", ".jpeg", ".png"] {
            if lower.ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NameChunk {
    Number(u64),
    Text(String),
}

/// Splits a file name into text and number runs so `image2` sorts before `image10`.
fn natural_key(path: &Path) -> Vec<NameChunk> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut chunks = Vec::new();
    let mut rest = name.as_str();
    while let Some(c) = rest.chars().next() {
        let is_digit = c.is_ascii_digit();
        let end = rest
            .find(|ch: char| ch.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        chunks.push(match run.parse::<u64>() {
            Ok(n) if is_digit => NameChunk::Number(n),
            _ => NameChunk::Text(run.to_string()),
        });
        rest = tail;
    }
    chunks
}

/// Image files directly inside `dir`, in natural file name order.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", glob::Pattern::escape(&dir.to_string_lossy()));
    let paths = glob(&pattern).map_err(|e| SpeedError::Config(format!("{}: {}", pattern, e)))?;
    let mut sorted_path: Vec<PathBuf> = paths.into_iter().filter_map(img_filter).collect();
    sorted_path.sort_by_cached_key(|p| natural_key(p));
    Ok(sorted_path)
}

/// Text written to the result file, five decimals.
pub fn format_result(speed_km_per_sec: f64) -> String {
    format!("{:.5}", speed_km_per_sec)
}

/// Creates the result file, truncating a previous one.
pub fn create_result_file(path: &Path) -> Result<()> {
    std::fs::File::create(path)?;
    Ok(())
}

pub fn write_result(path: &Path, speed_km_per_sec: f64) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(format_result(speed_km_per_sec).as_bytes())?;
    Ok(())
}

#[derive(Serialize)]
struct SessionReport<'a> {
    started_at: String,
    config: &'a EstimatorConfig,
    #[serde(flatten)]
    summary: &'a SessionSummary,
}

/// Writes the configuration and every measurement of a session as JSON.
pub fn write_session_report(
    output_path: &Path,
    started_at: OffsetDateTime,
    config: &EstimatorConfig,
    summary: &SessionSummary,
) -> Result<()> {
    let report = SessionReport {
        started_at: started_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| started_at.unix_timestamp().to_string()),
        config,
        summary,
    };
    object_to_json(output_path, &report)
}
