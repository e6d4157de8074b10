//! Scripted in-memory source and estimator.
//!
//! Deterministic [`MediaSource`] / [`PoseEstimator`] implementations that
//! play back a synthetic figure on a fixed cadence. The engine's own tests
//! run against these, and backend crates can reuse them to exercise their
//! integration without decoding real video.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use strokelab_common::{StrokeLabError, StrokeLabResult};
use strokelab_pose_model::{JointId, Keypoint, PoseResult, Topology};

use crate::source::{MediaSource, PoseEstimator, PresentedFrame, VideoFrame};

/// A seekable synthetic source with a fixed duration and cadence.
pub struct ScriptedSource {
    duration: f64,
    fps: f64,
    position: f64,
    playing: bool,
    seek_delay: Duration,
    seek_hangs: bool,
    presentation_signal: bool,
}

impl ScriptedSource {
    pub fn new(duration_secs: f64, fps: f64) -> Self {
        Self {
            duration: duration_secs,
            fps,
            position: 0.0,
            playing: false,
            seek_delay: Duration::ZERO,
            seek_hangs: false,
            presentation_signal: true,
        }
    }

    /// Make every seek take this long before resolving.
    pub fn with_seek_delay(mut self, delay: Duration) -> Self {
        self.seek_delay = delay;
        self
    }

    /// Pretend the backend never completes a seek.
    pub fn with_hanging_seek(mut self) -> Self {
        self.seek_hangs = true;
        self
    }

    /// Pretend the backend has no per-frame presentation signal.
    pub fn without_presentation_signal(mut self) -> Self {
        self.presentation_signal = false;
        self
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn position_secs(&self) -> f64 {
        self.position
    }
}

#[async_trait]
impl MediaSource for ScriptedSource {
    async fn duration_secs(&self) -> StrokeLabResult<f64> {
        Ok(self.duration)
    }

    async fn current_time_secs(&self) -> f64 {
        self.position
    }

    async fn seek(&mut self, secs: f64) -> StrokeLabResult<()> {
        if self.seek_hangs {
            std::future::pending::<()>().await;
        }
        if !self.seek_delay.is_zero() {
            tokio::time::sleep(self.seek_delay).await;
        }
        self.position = secs.clamp(0.0, self.duration);
        Ok(())
    }

    async fn play(&mut self) -> StrokeLabResult<()> {
        self.playing = true;
        Ok(())
    }

    async fn pause(&mut self) -> StrokeLabResult<()> {
        self.playing = false;
        Ok(())
    }

    async fn grab_frame(&mut self) -> StrokeLabResult<VideoFrame> {
        Ok(VideoFrame {
            media_time_secs: self.position,
            width: 1280,
            height: 720,
            data: Vec::new(),
        })
    }

    async fn next_presented_frame(&mut self) -> Option<PresentedFrame> {
        if !self.presentation_signal || !self.playing {
            return None;
        }
        let step = 1.0 / self.fps;
        tokio::time::sleep(Duration::from_secs_f64(step)).await;
        self.position = (self.position + step).min(self.duration);
        Some(PresentedFrame {
            media_time_secs: self.position,
        })
    }
}

/// Deterministic estimator producing a single figure whose right wrist
/// oscillates outward over time.
pub struct ScriptedEstimator {
    topology: Topology,
    model: String,
    smoothing: bool,
    fps_hint: f64,
    fail_at: HashSet<u64>,
    /// Smoothing state observed at each `estimate` call, for assertions.
    pub smoothing_seen: Vec<bool>,
}

impl ScriptedEstimator {
    /// `fps_hint` maps media times back to frame indices for failure
    /// scripting.
    pub fn new(fps_hint: f64) -> Self {
        Self {
            topology: Topology::Coco17,
            model: "scripted".to_string(),
            smoothing: true,
            fps_hint,
            fail_at: HashSet::new(),
            smoothing_seen: Vec::new(),
        }
    }

    /// Fail inference on these frame indices.
    pub fn failing_at(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.fail_at = frames.into_iter().collect();
        self
    }
}

#[async_trait]
impl PoseEstimator for ScriptedEstimator {
    async fn estimate(&mut self, frame: &VideoFrame) -> StrokeLabResult<Vec<PoseResult>> {
        self.smoothing_seen.push(self.smoothing);
        let index = (frame.media_time_secs * self.fps_hint).round() as u64;
        if self.fail_at.contains(&index) {
            return Err(StrokeLabError::estimator(format!(
                "scripted inference failure at frame {index}"
            )));
        }
        Ok(vec![swing_pose(frame.media_time_secs)])
    }

    fn set_temporal_smoothing(&mut self, enabled: bool) {
        self.smoothing = enabled;
    }

    fn temporal_smoothing(&self) -> bool {
        self.smoothing
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn topology(&self) -> Topology {
        self.topology
    }
}

/// A 17-joint figure at `t` seconds: torso fixed, right wrist swinging.
pub fn swing_pose(t: f64) -> PoseResult {
    let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.0); 17];
    let mut set = |joint: JointId, x: f64, y: f64| {
        keypoints[Topology::Coco17.joint_index(joint)] = Keypoint::new(x, y, 0.9);
    };
    set(JointId::LeftShoulder, 130.0, 50.0);
    set(JointId::RightShoulder, 70.0, 50.0);
    set(JointId::LeftHip, 120.0, 150.0);
    set(JointId::RightHip, 80.0, 150.0);
    set(JointId::LeftWrist, 145.0, 130.0);
    let reach = 40.0 * (std::f64::consts::TAU * t * 0.5).sin().max(0.0);
    set(JointId::RightWrist, 55.0 - reach, 130.0);
    PoseResult::new(keypoints)
}
