//! Frame dumps of the first environment.
use super::{DummyVecEnv, VecEnvWrapper};
use anyhow::{anyhow, Result};
use foosball_rl_core::{Observation, Step, VecEnv};
use image::{ImageBuffer, Rgb};
use log::{info, warn};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Configuration of [`VecVideoRecorder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Number of frames of a recording.
    pub video_length: usize,

    /// A recording starts every `video_interval` steps.
    pub video_interval: usize,

    /// Subdirectory of the recordings under the directory of the seed.
    pub video_log_path_suffix: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            video_length: 2000,
            video_interval: 100_000,
            video_log_path_suffix: "videos".to_string(),
        }
    }
}

/// Writes frames rendered from the first environment as PNG files.
///
/// A recording is started at the first reset and then every `video_interval` steps.
/// Frames of a recording go to `rl-run-video-step-<a>-to-step-<b>/frame-<n>.png`
/// under the given directory. Failures of writing are logged and ignored.
pub struct VecVideoRecorder {
    folder: PathBuf,
    config: VideoConfig,
    step_id: usize,
    recording: Option<PathBuf>,
    recorded_frames: usize,
}

impl VecVideoRecorder {
    /// Builds the stage writing in `folder`.
    pub fn new(folder: impl AsRef<Path>, config: VideoConfig) -> Self {
        Self {
            folder: folder.as_ref().to_path_buf(),
            config,
            step_id: 0,
            recording: None,
            recorded_frames: 0,
        }
    }

    /// Returns `true` while frames are being recorded.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    fn start(&mut self, venv: &mut DummyVecEnv) {
        let dir = self.folder.join(format!(
            "rl-run-video-step-{}-to-step-{}",
            self.step_id,
            self.step_id + self.config.video_length
        ));
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("Failed to create the video directory {:?}: {}", dir, e);
            return;
        }
        info!("Recording video to {:?}", dir);
        self.recording = Some(dir);
        self.recorded_frames = 0;
        self.capture(venv);
    }

    fn capture(&mut self, venv: &mut DummyVecEnv) {
        let dir = match &self.recording {
            Some(dir) => dir.clone(),
            None => return,
        };
        match venv.render() {
            Some(frame) => {
                let path = dir.join(format!("frame-{:05}.png", self.recorded_frames));
                if let Err(e) = save_frame(&frame, &path) {
                    warn!("Failed to write the frame {:?}: {}", path, e);
                }
            }
            None => warn!("The environment does not render frames"),
        }
        self.recorded_frames += 1;
    }

    fn stop(&mut self) {
        if let Some(dir) = self.recording.take() {
            info!("Saved {} frames in {:?}", self.recorded_frames, dir);
        }
        self.recorded_frames = 0;
    }
}

fn save_frame(frame: &Array3<u8>, path: &Path) -> Result<()> {
    let (h, w) = (frame.shape()[0] as u32, frame.shape()[1] as u32);
    let buf = frame.iter().copied().collect::<Vec<u8>>();
    let img = ImageBuffer::<Rgb<u8>, _>::from_vec(w, h, buf)
        .ok_or_else(|| anyhow!("frame of shape {:?} is not an RGB image", frame.shape()))?;
    img.save(path)?;
    Ok(())
}

impl VecEnvWrapper for VecVideoRecorder {
    fn name(&self) -> &'static str {
        "VecVideoRecorder"
    }

    fn reset(&mut self, obs: Vec<Observation>, venv: &mut DummyVecEnv) -> Result<Vec<Observation>> {
        self.stop();
        self.start(venv);
        Ok(obs)
    }

    fn step(&mut self, step: Step, venv: &mut DummyVecEnv) -> Result<Step> {
        self.step_id += 1;
        if self.is_recording() {
            self.capture(venv);
            if self.recorded_frames > self.config.video_length {
                self.stop();
            }
        } else if self.config.video_interval > 0 && self.step_id % self.config.video_interval == 0 {
            self.start(venv);
        }
        Ok(step)
    }

    fn close(&mut self) {
        self.stop();
    }
}
