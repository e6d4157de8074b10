//! Joint stabilization: per-joint velocity-based noise suppression.
//!
//! Small detection jitter on a joint that is actually at rest makes drawn
//! skeletons shimmer. The stabilizer watches each joint's recent velocity;
//! a joint moving below an adaptive threshold locks onto the mean of its
//! recent window, and genuine motion releases the lock immediately.
//!
//! The stabilizer keeps frame-sequential history and must only be driven
//! by calls in increasing time order against a single tracked person.

use std::collections::VecDeque;
use std::time::Instant;

use strokelab_pose_model::{Point, PoseResult};

/// Configuration for the joint stabilizer.
#[derive(Debug, Clone)]
pub struct StabilizerConfig {
    /// Master switch; when off `process` is a pass-through.
    pub enabled: bool,

    /// Stabilization strength in `[0.0, 1.0]`. Zero disables stabilization;
    /// higher values treat more motion as noise and release locks more
    /// smoothly.
    pub strength: f64,

    /// Sliding window length (frames) for velocity and lock-point estimation.
    pub window: usize,

    /// Fraction by which an emitted position is pulled toward its lock point
    /// per frame, bounded at 1.0.
    pub lock_strength: f64,

    /// Baseline stationary threshold (px/frame). The effective threshold is
    /// scaled by `strength`, so stronger settings lock more joints.
    pub base_threshold_px: f64,

    /// Keypoint confidence floor; below-floor joints pass through unmodified.
    pub confidence_floor: f64,

    /// Wall-clock gap between calls beyond which all histories are cleared
    /// (the source was paused or scrubbed).
    pub stale_after_ms: u64,

    /// Zero-based index of the tracked person within each frame.
    pub person_index: usize,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.5,
            window: 5,
            lock_strength: 0.6,
            base_threshold_px: 3.0,
            confidence_floor: 0.3,
            stale_after_ms: 200,
            person_index: 0,
        }
    }
}

/// Per-joint frame-sequential state.
#[derive(Debug, Default)]
struct JointTrack {
    /// Recent raw positions, newest last.
    history: VecDeque<Point>,
    /// Lock point while the joint is held stationary.
    lock: Option<Point>,
    /// Last emitted position, used to blend lock releases.
    emitted: Option<Point>,
}

/// The joint stabilizer.
pub struct JointStabilizer {
    config: StabilizerConfig,
    tracks: Vec<JointTrack>,
    last_call: Option<Instant>,
}

impl JointStabilizer {
    /// Create a stabilizer with the given configuration.
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            last_call: None,
        }
    }

    /// Create a stabilizer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(StabilizerConfig::default())
    }

    /// De-noise the current frame's poses using history from prior frames.
    ///
    /// Only the configured person is stabilized; other detections pass
    /// through unchanged.
    pub fn process(&mut self, poses: &[PoseResult]) -> Vec<PoseResult> {
        self.process_at(poses, Instant::now())
    }

    /// `process` with an explicit now-instant (deterministic for tests).
    pub fn process_at(&mut self, poses: &[PoseResult], now: Instant) -> Vec<PoseResult> {
        if !self.config.enabled || self.config.strength <= 0.0 {
            return poses.to_vec();
        }

        if let Some(last) = self.last_call {
            let gap_ms = now.duration_since(last).as_millis() as u64;
            if gap_ms > self.config.stale_after_ms {
                tracing::debug!(gap_ms, "Stale joint histories cleared");
                self.reset();
            }
        }
        self.last_call = Some(now);

        let mut out = poses.to_vec();
        let Some(pose) = out.get_mut(self.config.person_index) else {
            return out;
        };

        if self.tracks.len() != pose.keypoints.len() {
            self.tracks = (0..pose.keypoints.len())
                .map(|_| JointTrack::default())
                .collect();
        }

        let threshold = self.config.base_threshold_px * (2.0 * self.config.strength);
        let release_threshold = threshold * 2.0;

        for (joint, kp) in pose.keypoints.iter_mut().enumerate() {
            let track = &mut self.tracks[joint];

            if !kp.passes(self.config.confidence_floor) {
                // Low-confidence detections pass through and poison no history.
                *track = JointTrack::default();
                continue;
            }

            let raw = kp.point();
            track.history.push_back(raw);
            while track.history.len() > self.config.window {
                track.history.pop_front();
            }

            let velocity = average_displacement(&track.history);

            let emitted = if velocity > release_threshold {
                // Genuine motion: release the lock, blend toward the raw
                // detection. Higher strength releases more smoothly.
                track.lock = None;
                let alpha = (1.0 - 0.7 * self.config.strength).clamp(0.05, 1.0);
                match track.emitted {
                    Some(prev) => prev + (raw - prev).scale(alpha),
                    None => raw,
                }
            } else if velocity < threshold && track.history.len() >= self.config.window {
                // Stationary: lock to the window mean, then pull the emitted
                // position toward the lock point.
                let lock = *track
                    .lock
                    .get_or_insert_with(|| Point::mean(track.history.make_contiguous()).unwrap());
                let pull = self.config.lock_strength.min(1.0);
                match track.emitted {
                    Some(prev) => prev + (lock - prev).scale(pull),
                    None => lock,
                }
            } else {
                // In between: follow the detection, held by any active lock.
                match track.lock {
                    Some(lock) => {
                        let pull = self.config.lock_strength.min(1.0);
                        raw + (lock - raw).scale(pull)
                    }
                    None => raw,
                }
            };

            track.emitted = Some(emitted);
            kp.x = emitted.x;
            kp.y = emitted.y;
        }

        out
    }

    /// Clear all joint histories and locks.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.last_call = None;
    }
}

/// Average inter-frame displacement over a position window.
fn average_displacement(history: &VecDeque<Point>) -> f64 {
    if history.len() < 2 {
        return f64::MAX;
    }
    let mut total = 0.0;
    let mut prev: Option<&Point> = None;
    for p in history {
        if let Some(q) = prev {
            total += q.distance(p);
        }
        prev = Some(p);
    }
    total / (history.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use strokelab_pose_model::Keypoint;

    fn pose_at(x: f64, y: f64) -> PoseResult {
        PoseResult::new(vec![Keypoint::new(x, y, 0.9); 17])
    }

    fn run_frames(stabilizer: &mut JointStabilizer, positions: &[(f64, f64)]) -> Vec<PoseResult> {
        let epoch = Instant::now();
        let mut last = vec![];
        for (i, (x, y)) in positions.iter().enumerate() {
            let now = epoch + Duration::from_millis(33 * i as u64);
            last = stabilizer.process_at(&[pose_at(*x, *y)], now);
        }
        last
    }

    #[test]
    fn test_disabled_is_passthrough() {
        let mut stabilizer = JointStabilizer::new(StabilizerConfig {
            enabled: false,
            ..Default::default()
        });
        let poses = vec![pose_at(10.0, 10.0)];
        assert_eq!(stabilizer.process(&poses), poses);
    }

    #[test]
    fn test_zero_strength_is_passthrough() {
        let mut stabilizer = JointStabilizer::new(StabilizerConfig {
            strength: 0.0,
            ..Default::default()
        });
        let poses = vec![pose_at(10.0, 10.0)];
        assert_eq!(stabilizer.process(&poses), poses);
    }

    #[test]
    fn test_jitter_around_rest_point_locks() {
        let mut stabilizer = JointStabilizer::with_defaults();
        let jitter = [
            (100.0, 100.0),
            (100.6, 99.5),
            (99.5, 100.4),
            (100.3, 99.8),
            (99.8, 100.2),
            (100.1, 99.9),
            (100.2, 100.1),
            (99.9, 100.0),
        ];
        let out = run_frames(&mut stabilizer, &jitter);
        let kp = &out[0].keypoints[0];
        // Emitted position should hug the rest point tighter than raw jitter.
        assert!((kp.x - 100.0).abs() < 0.4, "x={}", kp.x);
        assert!((kp.y - 100.0).abs() < 0.4, "y={}", kp.y);
    }

    #[test]
    fn test_fast_motion_releases_lock() {
        let mut stabilizer = JointStabilizer::with_defaults();
        let mut positions: Vec<(f64, f64)> = (0..6).map(|_| (100.0, 100.0)).collect();
        // Joint takes off at 40 px/frame.
        positions.extend((1..8).map(|i| (100.0 + 40.0 * i as f64, 100.0)));
        let out = run_frames(&mut stabilizer, &positions);
        let kp = &out[0].keypoints[0];
        // Should be tracking the moving joint, well clear of the lock point.
        assert!(kp.x > 250.0, "x={}", kp.x);
    }

    #[test]
    fn test_low_confidence_passes_through() {
        let mut stabilizer = JointStabilizer::with_defaults();
        let mut pose = pose_at(100.0, 100.0);
        pose.keypoints[0] = Keypoint::new(7.0, 8.0, 0.1);
        let out = stabilizer.process(&[pose]);
        assert_eq!(out[0].keypoints[0].x, 7.0);
        assert_eq!(out[0].keypoints[0].y, 8.0);
    }

    #[test]
    fn test_long_pause_clears_history() {
        let mut stabilizer = JointStabilizer::with_defaults();
        let epoch = Instant::now();
        for i in 0..6 {
            stabilizer.process_at(&[pose_at(100.0, 100.0)], epoch + Duration::from_millis(33 * i));
        }
        // After a pause well past stale_after_ms the history must not hold
        // the joint at the old lock point.
        let out = stabilizer.process_at(&[pose_at(500.0, 500.0)], epoch + Duration::from_secs(5));
        let kp = &out[0].keypoints[0];
        assert_eq!(kp.x, 500.0);
        assert_eq!(kp.y, 500.0);
    }
}
