use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, SpeedError};
use crate::io::list_images;

/// Source of still images.
pub trait Camera {
    /// Captures one image to `path` and returns where it was written.
    fn take_photo(&mut self, path: &Path) -> Result<PathBuf>;
}

/// Replays previously captured images from a folder, in file name order.
pub struct ReplayCamera {
    frames: VecDeque<PathBuf>,
}

impl ReplayCamera {
    pub fn from_dir(dir: &Path) -> Result<ReplayCamera> {
        let frames = list_images(dir)?;
        log::info!("replaying {} images from {}", frames.len(), dir.display());
        Ok(ReplayCamera {
            frames: frames.into(),
        })
    }

    pub fn from_paths(frames: Vec<PathBuf>) -> ReplayCamera {
        ReplayCamera {
            frames: frames.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Camera for ReplayCamera {
    fn take_photo(&mut self, path: &Path) -> Result<PathBuf> {
        let source = self
            .frames
            .pop_front()
            .ok_or_else(|| SpeedError::capture(path, "no more images to replay"))?;
        std::fs::copy(&source, path).map_err(|e| {
            SpeedError::capture(path, format!("copy from '{}': {}", source.display(), e))
        })?;
        log::trace!("replayed {} as {}", source.display(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Runs an external still-capture program, e.g. `rpicam-still -n -o {path}`.
///
/// Every `{path}` in the arguments is replaced with the requested output file.
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn from_template(template: &str) -> Result<CommandCamera> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| SpeedError::Config("empty capture command".to_string()))?;
        Ok(CommandCamera {
            program,
            args: parts.collect(),
        })
    }

    fn args_for(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.args.iter().map(|a| a.replace("{path}", &path)).collect()
    }
}

impl Camera for CommandCamera {
    fn take_photo(&mut self, path: &Path) -> Result<PathBuf> {
        let status = Command::new(&self.program)
            .args(self.args_for(path))
            .status()
            .map_err(|e| SpeedError::capture(path, format!("{}: {}", self.program, e)))?;
        if !status.success() {
            return Err(SpeedError::capture(
                path,
                format!("{} exited with {}", self.program, status),
            ));
        }
        if !path.exists() {
            return Err(SpeedError::capture(path, "command did not write the image"));
        }
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_template_substitutes_path() {
        let camera = CommandCamera::from_template("rpicam-still -n -o {path}").unwrap();
        assert_eq!(camera.program, "rpicam-still");
        assert_eq!(
            camera.args_for(Path::new("/tmp/image1.jpg")),
            vec!["-n", "-o", "/tmp/image1.jpg"]
        );
    }

    #[test]
    fn empty_template_is_rejected() {
        assert!(matches!(
            CommandCamera::from_template("   "),
            Err(SpeedError::Config(_))
        ));
    }
}
