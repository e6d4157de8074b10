//! The frame-accurate extraction loop.
//!
//! Seeks the source to every frame position in turn, grabs the presented
//! frame, runs the estimator, and collects results into a [`PoseMap`].
//! The loop is cooperative: it checks a shared abort flag every frame and
//! yields back to the runtime at a fixed cadence so a UI task stays
//! responsive while extraction runs on a worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use strokelab_common::{AnalysisClock, StrokeLabError, StrokeLabResult};
use strokelab_pose_model::{PoseArchive, PoseMap};

use crate::fps::{FrameRate, FrameRateProbe};
use crate::source::{MediaSource, PoseEstimator};

/// Configuration for a full-source extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Frame rate assumed when probing resolves nothing.
    pub default_fps: f64,

    /// How the source's frame rate is determined.
    pub probe: FrameRateProbe,

    /// Budget for a single seek; a timed-out seek logs and the loop grabs
    /// whatever frame is presented.
    pub seek_timeout: Duration,

    /// Yield to the runtime every this many frames.
    pub yield_interval: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_fps: 30.0,
            probe: FrameRateProbe::default(),
            seek_timeout: Duration::from_millis(750),
            yield_interval: 8,
        }
    }
}

/// Numeric progress reported during extraction. Partial pose data is never
/// exposed through this channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionProgress {
    pub frames_done: u64,
    pub frames_total: u64,
    pub fps: f64,
}

impl ExtractionProgress {
    pub fn fraction(&self) -> f64 {
        if self.frames_total == 0 {
            return 0.0;
        }
        self.frames_done as f64 / self.frames_total as f64
    }
}

/// How an extraction run ended.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// The whole source was processed.
    Completed(PoseArchive),

    /// The abort flag was raised mid-run. The partial map is returned to
    /// the caller undiscarded but is not published as an archive.
    Aborted { partial: PoseMap, frames_done: u64 },
}

/// Drives one extraction run over a source/estimator pair.
pub struct Extractor {
    config: ExtractionConfig,
    abort: Arc<AtomicBool>,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExtractionConfig::default())
    }

    /// Shared abort flag; raise it from any task to stop the run at the
    /// next frame boundary.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        self.abort.clone()
    }

    /// Extract poses for every frame of the source.
    ///
    /// The source's playback position and the estimator's temporal
    /// smoothing setting are restored on every exit path, including abort.
    pub async fn extract<S, E, F>(
        &self,
        source: &mut S,
        estimator: &mut E,
        mut progress: F,
    ) -> StrokeLabResult<ExtractionOutcome>
    where
        S: MediaSource + ?Sized,
        E: PoseEstimator + ?Sized,
        F: FnMut(ExtractionProgress),
    {
        let original_position = source.current_time_secs().await;
        let smoothing_was = estimator.temporal_smoothing();
        // Temporal smoothing blends neighboring frames; frame-accurate
        // extraction needs each frame judged on its own.
        estimator.set_temporal_smoothing(false);

        let result = self
            .run(source, estimator, &mut progress)
            .await;

        estimator.set_temporal_smoothing(smoothing_was);
        // The restore seek gets the same budget as in-loop seeks; a hung
        // backend must not stall the exit path either.
        match tokio::time::timeout(self.config.seek_timeout, source.seek(original_position)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, original_position, "Failed to restore playback position");
            }
            Err(_) => {
                tracing::warn!(original_position, "Restoring playback position timed out");
            }
        }

        result
    }

    async fn run<S, E, F>(
        &self,
        source: &mut S,
        estimator: &mut E,
        progress: &mut F,
    ) -> StrokeLabResult<ExtractionOutcome>
    where
        S: MediaSource + ?Sized,
        E: PoseEstimator + ?Sized,
        F: FnMut(ExtractionProgress),
    {
        let clock = AnalysisClock::start();
        let duration = source.duration_secs().await?;
        if duration <= 0.0 {
            return Err(StrokeLabError::extraction(format!(
                "source has non-positive duration {duration}"
            )));
        }

        let FrameRate { fps, source: fps_source } = self
            .config
            .probe
            .resolve(source, self.config.default_fps)
            .await;
        let total = (duration * fps).floor() as u64;

        tracing::info!(duration, fps, ?fps_source, total, "Starting extraction");

        let mut map = PoseMap::new();
        for i in 0..total {
            if self.abort.load(Ordering::SeqCst) {
                tracing::info!(frames_done = i, total, "Extraction aborted");
                return Ok(ExtractionOutcome::Aborted {
                    partial: map,
                    frames_done: i,
                });
            }

            let target = i as f64 / fps;
            match tokio::time::timeout(self.config.seek_timeout, source.seek(target)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(frame = i, target, error = %e, "Seek failed; grabbing current frame");
                }
                Err(_) => {
                    tracing::warn!(frame = i, target, "Seek timed out; grabbing current frame");
                }
            }

            let poses = match source.grab_frame().await {
                Ok(frame) => match estimator.estimate(&frame).await {
                    Ok(poses) => poses,
                    Err(e) => {
                        // Inference failures become gaps, never aborts.
                        tracing::warn!(frame = i, error = %e, "Estimation failed; recording gap");
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::warn!(frame = i, error = %e, "Frame grab failed; recording gap");
                    Vec::new()
                }
            };
            map.insert(i, poses);

            progress(ExtractionProgress {
                frames_done: i + 1,
                frames_total: total,
                fps,
            });

            if self.config.yield_interval > 0 && (i + 1) % self.config.yield_interval == 0 {
                tokio::task::yield_now().await;
            }
        }

        tracing::info!(
            frames = map.len(),
            elapsed_secs = clock.elapsed_secs(),
            "Extraction complete"
        );
        Ok(ExtractionOutcome::Completed(PoseArchive::new(
            estimator.model_id().to_string(),
            estimator.topology(),
            fps,
            map,
        )))
    }
}
