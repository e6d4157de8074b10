//! Trait seams toward the media layer and the pose estimator.
//!
//! The extraction engine never touches codecs or inference runtimes
//! directly. A playback backend implements [`MediaSource`], an inference
//! backend implements [`PoseEstimator`], and everything above works
//! against the traits.

use async_trait::async_trait;

use strokelab_common::StrokeLabResult;
use strokelab_pose_model::{PoseResult, Topology};

/// A decoded video frame handed to the estimator.
///
/// `data` is an opaque pixel buffer owned by the backend; the engine only
/// threads it through.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Media time of this frame in seconds.
    pub media_time_secs: f64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A per-frame presentation notification from the media source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentedFrame {
    /// Media time at which the frame was presented, in seconds.
    pub media_time_secs: f64,
}

/// A seekable media source the extractor can walk frame by frame.
///
/// Implementations must resolve `seek` only once the requested position
/// has actually been presented; the extractor relies on that to grab the
/// exact frame it asked for.
#[async_trait]
pub trait MediaSource: Send {
    /// Total duration in seconds.
    async fn duration_secs(&self) -> StrokeLabResult<f64>;

    /// Current playback position in seconds.
    async fn current_time_secs(&self) -> f64;

    /// Seek to the given media time, resolving when the seek has completed.
    async fn seek(&mut self, secs: f64) -> StrokeLabResult<()>;

    async fn play(&mut self) -> StrokeLabResult<()>;

    async fn pause(&mut self) -> StrokeLabResult<()>;

    /// Grab the currently presented frame.
    async fn grab_frame(&mut self) -> StrokeLabResult<VideoFrame>;

    /// Await the next per-frame presentation signal.
    ///
    /// Returns `None` when the source cannot deliver precise per-frame
    /// notifications; callers must then fall back to nominal timing.
    async fn next_presented_frame(&mut self) -> Option<PresentedFrame>;
}

/// A pose estimation backend.
#[async_trait]
pub trait PoseEstimator: Send {
    /// Run inference on one frame. May legitimately return an empty list
    /// when nobody is in view.
    async fn estimate(&mut self, frame: &VideoFrame) -> StrokeLabResult<Vec<PoseResult>>;

    /// Toggle the backend's temporal smoothing across frames.
    ///
    /// Smoothing helps live preview but blends information between frames;
    /// frame-accurate extraction turns it off.
    fn set_temporal_smoothing(&mut self, enabled: bool);

    fn temporal_smoothing(&self) -> bool;

    /// Identifier of the loaded model, recorded into archives.
    fn model_id(&self) -> &str;

    fn topology(&self) -> Topology;
}
