//! Swing detection: peak extraction over a body-relative velocity series.
//!
//! # Algorithm
//!
//! 1. **Anchor** each frame at the body center (mean of valid core joints).
//! 2. **Velocity**: frame-to-frame displacement of each wrist *relative to
//!    the anchor*, cancelling camera and whole-body translation; magnitudes
//!    of both wrists sum into one scalar series, signed radial components
//!    into a second.
//! 3. **Smooth** the combined series with a centered moving average.
//! 4. **Threshold** at a percentile of the valid smoothed values.
//! 5. **Peaks** above threshold survive non-maximum suppression, a
//!    velocity-greedy minimum-distance pass, a ratio filter against the
//!    best surviving peak, and an optional outward-direction filter.
//! 6. **Score** each survivor: dominant side, symmetry, confidence, and an
//!    estimated real-world speed.
//!
//! Frames without a usable anchor produce gaps (`None`) in the series;
//! gaps are never interpolated.

use strokelab_common::{StrokeLabError, StrokeLabResult};
use strokelab_pose_model::{Point, PoseArchive, PoseMap, PoseResult, Topology};

use crate::anchor::{body_center, torso_height};

/// Configuration for the swing detector.
///
/// Every threshold is product tuning, not algorithmic truth; callers may
/// adjust any of them.
#[derive(Debug, Clone)]
pub struct SwingConfig {
    /// Zero-based index of the tracked person within each frame.
    pub person_index: usize,

    /// Keypoint confidence floor.
    pub confidence_floor: f64,

    /// Centered moving-average window (samples) for the velocity series.
    pub smoothing_window: usize,

    /// Percentile of valid smoothed values used as minimum peak height.
    pub peak_percentile: f64,

    /// Non-maximum suppression window (seconds) around a higher peak.
    pub nms_window_secs: f64,

    /// Minimum spacing (seconds) between kept events, enforced
    /// velocity-greedily.
    pub min_distance_secs: f64,

    /// Discard survivors below `best * min_velocity_ratio`.
    pub min_velocity_ratio: f64,

    /// Require genuine outward extension at the peak.
    pub direction_filter: bool,

    /// Minimum combined radial velocity (px/frame) when the direction
    /// filter is enabled.
    pub min_radial_velocity: f64,

    /// Wrist-contribution symmetry above which an event counts as `Both`.
    pub symmetry_both_threshold: f64,

    /// Person height ≈ torso height × this multiplier, for speed estimation.
    pub body_height_multiplier: f64,

    /// Assumed real-world person height in meters, for speed estimation.
    pub assumed_height_m: f64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            person_index: 0,
            confidence_floor: 0.3,
            smoothing_window: 3,
            peak_percentile: 75.0,
            nms_window_secs: 1.25,
            min_distance_secs: 1.5,
            min_velocity_ratio: 1.0 / 3.0,
            direction_filter: true,
            min_radial_velocity: 1.0,
            symmetry_both_threshold: 0.7,
            body_height_multiplier: 3.3,
            assumed_height_m: 1.75,
        }
    }
}

/// Which limb dominated a swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominantSide {
    Left,
    Right,
    Both,
}

/// One detected swing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SwingEvent {
    pub frame: u64,
    pub timestamp_secs: f64,

    /// Smoothed combined wrist velocity at the peak (px/frame).
    pub velocity: f64,

    /// Rough real-world speed estimate.
    pub estimated_speed_kmh: f64,

    pub dominant_side: DominantSide,

    /// Balance of the two wrists' contributions in `[0, 1]`.
    pub symmetry: f64,

    /// How far the peak exceeds the detection threshold, capped at 1.0.
    pub confidence: f64,
}

/// Full detection result: events plus the series behind them, for charting
/// and seek-on-click UIs.
#[derive(Debug, Clone, PartialEq)]
pub struct SwingAnalysis {
    pub events: Vec<SwingEvent>,

    /// Frame indices aligned with the series below.
    pub frames: Vec<u64>,

    /// Raw combined wrist velocity per frame; `None` marks a gap.
    pub velocity: Vec<Option<f64>>,

    /// Smoothed combined velocity per frame.
    pub smoothed: Vec<Option<f64>>,

    /// Combined signed radial velocity per frame (positive = extension).
    pub radial: Vec<Option<f64>>,

    /// Peak-height threshold that was applied.
    pub threshold: f64,
}

/// Per-sample wrist kinematics, internal to the pipeline.
#[derive(Debug, Clone, Copy, Default)]
struct VelocitySample {
    combined: Option<f64>,
    radial: Option<f64>,
    left: Option<f64>,
    right: Option<f64>,
}

/// The swing detector. Pure: identical inputs yield identical output.
pub struct SwingDetector {
    config: SwingConfig,
}

impl SwingDetector {
    pub fn new(config: SwingConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SwingConfig::default())
    }

    /// Detect swings in a pose archive.
    pub fn detect_archive(&self, archive: &PoseArchive) -> StrokeLabResult<SwingAnalysis> {
        self.detect(&archive.frames, archive.topology, archive.frame_rate)
    }

    /// Detect swings in a completed pose map.
    pub fn detect(
        &self,
        map: &PoseMap,
        topology: Topology,
        frame_rate: f64,
    ) -> StrokeLabResult<SwingAnalysis> {
        if frame_rate <= 0.0 {
            return Err(StrokeLabError::analysis(format!(
                "non-positive frame rate {frame_rate}"
            )));
        }

        let frames: Vec<u64> = map.keys().copied().collect();
        let poses: Vec<Option<&PoseResult>> = map
            .values()
            .map(|people| people.get(self.config.person_index))
            .collect();

        let usable = poses.iter().filter(|p| p.is_some()).count();
        if usable < 2 {
            return Err(StrokeLabError::analysis(format!(
                "need at least 2 usable frames for swing detection, got {usable}"
            )));
        }

        let samples = self.velocity_series(topology, &poses);
        let velocity: Vec<Option<f64>> = samples.iter().map(|s| s.combined).collect();
        let radial: Vec<Option<f64>> = samples.iter().map(|s| s.radial).collect();
        let smoothed = moving_average(&velocity, self.config.smoothing_window);

        let threshold = percentile(
            smoothed.iter().filter_map(|v| *v),
            self.config.peak_percentile,
        )
        .unwrap_or(f64::MAX);

        let candidates = find_peaks(&smoothed, threshold);
        let survivors = self.filter_peaks(&candidates, &smoothed, &radial, &frames, frame_rate);

        let mut events: Vec<SwingEvent> = survivors
            .iter()
            .map(|&i| self.score_event(i, &frames, &smoothed, &samples, &poses, topology, frame_rate, threshold))
            .collect();
        events.sort_by_key(|e| e.frame);

        tracing::debug!(
            candidates = candidates.len(),
            events = events.len(),
            threshold,
            "Swing detection complete"
        );

        Ok(SwingAnalysis {
            events,
            frames,
            velocity,
            smoothed,
            radial,
            threshold,
        })
    }

    /// Combined and per-wrist body-relative velocity for every frame.
    fn velocity_series(
        &self,
        topology: Topology,
        poses: &[Option<&PoseResult>],
    ) -> Vec<VelocitySample> {
        let floor = self.config.confidence_floor;
        let (left_wrist, right_wrist) = topology.wrists();

        // Anchor-relative wrist positions per frame.
        let relative = |pose: Option<&PoseResult>| -> (Option<Point>, Option<Point>) {
            let Some(pose) = pose else {
                return (None, None);
            };
            let Some(anchor) = body_center(pose, topology, floor) else {
                return (None, None);
            };
            let rel = |joint| {
                pose.valid_point(topology, joint, floor)
                    .map(|p| p - anchor)
            };
            (rel(left_wrist), rel(right_wrist))
        };

        let rels: Vec<(Option<Point>, Option<Point>)> =
            poses.iter().map(|p| relative(*p)).collect();

        let mut samples = vec![VelocitySample::default(); poses.len()];
        for i in 1..rels.len() {
            let wrist_motion = |curr: Option<Point>, prev: Option<Point>| -> Option<(f64, f64)> {
                let (curr, prev) = (curr?, prev?);
                let displacement = curr - prev;
                let magnitude = displacement.norm();
                // Radial component along the anchor→wrist direction:
                // positive = extension, negative = retraction.
                let radial = curr
                    .normalized()
                    .map(|unit| displacement.dot(&unit))
                    .unwrap_or(0.0);
                Some((magnitude, radial))
            };

            let left = wrist_motion(rels[i].0, rels[i - 1].0);
            let right = wrist_motion(rels[i].1, rels[i - 1].1);

            samples[i] = match (left, right) {
                (Some((lm, lr)), Some((rm, rr))) => VelocitySample {
                    combined: Some(lm + rm),
                    radial: Some(lr + rr),
                    left: Some(lm),
                    right: Some(rm),
                },
                (Some((lm, lr)), None) => VelocitySample {
                    combined: Some(lm),
                    radial: Some(lr),
                    left: Some(lm),
                    right: None,
                },
                (None, Some((rm, rr))) => VelocitySample {
                    combined: Some(rm),
                    radial: Some(rr),
                    left: None,
                    right: Some(rm),
                },
                // No wrist measurable: a gap, never synthesized.
                (None, None) => VelocitySample::default(),
            };
        }
        samples
    }

    /// NMS, velocity-greedy minimum distance, ratio filter, direction filter.
    fn filter_peaks(
        &self,
        candidates: &[usize],
        smoothed: &[Option<f64>],
        radial: &[Option<f64>],
        frames: &[u64],
        frame_rate: f64,
    ) -> Vec<usize> {
        let time_of = |i: usize| frames[i] as f64 / frame_rate;
        let value_of = |i: usize| smoothed[i].unwrap_or(f64::MIN);

        // Sort candidates by descending value; ties resolve by frame order
        // so detection stays deterministic.
        let mut by_value: Vec<usize> = candidates.to_vec();
        by_value.sort_by(|&a, &b| {
            value_of(b)
                .partial_cmp(&value_of(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(frames[a].cmp(&frames[b]))
        });

        // Non-maximum suppression: keep a candidate only if no higher-valued
        // kept candidate lies within the window.
        let mut nms_kept: Vec<usize> = Vec::new();
        for &i in &by_value {
            let suppressed = nms_kept
                .iter()
                .any(|&k| (time_of(i) - time_of(k)).abs() <= self.config.nms_window_secs);
            if !suppressed {
                nms_kept.push(i);
            }
        }

        // Minimum-distance enforcement, velocity-greedy: iterating in value
        // order intentionally favors high peaks over chronologically earlier
        // neighbors.
        let mut kept: Vec<usize> = Vec::new();
        for &i in &nms_kept {
            let clear = kept
                .iter()
                .all(|&k| (time_of(i) - time_of(k)).abs() >= self.config.min_distance_secs);
            if clear {
                kept.push(i);
            }
        }

        // Ratio filter against the best survivor.
        if let Some(best) = kept
            .iter()
            .map(|&i| value_of(i))
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a: f64| a.max(v)))
            })
        {
            kept.retain(|&i| value_of(i) >= best * self.config.min_velocity_ratio);
        }

        // Direction filter: require genuine outward extension.
        if self.config.direction_filter {
            kept.retain(|&i| {
                radial[i]
                    .map(|r| r >= self.config.min_radial_velocity)
                    .unwrap_or(false)
            });
        }

        kept
    }

    #[allow(clippy::too_many_arguments)]
    fn score_event(
        &self,
        i: usize,
        frames: &[u64],
        smoothed: &[Option<f64>],
        samples: &[VelocitySample],
        poses: &[Option<&PoseResult>],
        topology: Topology,
        frame_rate: f64,
        threshold: f64,
    ) -> SwingEvent {
        let value = smoothed[i].unwrap_or(0.0);
        let frame = frames[i];

        let (symmetry, dominant_side) = match (samples[i].left, samples[i].right) {
            (Some(l), Some(r)) if l.max(r) > f64::EPSILON => {
                let symmetry = l.min(r) / l.max(r);
                let side = if symmetry > self.config.symmetry_both_threshold {
                    DominantSide::Both
                } else if l > r {
                    DominantSide::Left
                } else {
                    DominantSide::Right
                };
                (symmetry, side)
            }
            (Some(_), None) => (0.0, DominantSide::Left),
            _ => (0.0, DominantSide::Right),
        };

        let confidence = if threshold > f64::EPSILON {
            ((value - threshold) / threshold).clamp(0.0, 1.0)
        } else {
            1.0
        };

        SwingEvent {
            frame,
            timestamp_secs: frame as f64 / frame_rate,
            velocity: value,
            estimated_speed_kmh: self.estimate_speed_kmh(value, poses[i], topology, frame_rate),
            dominant_side,
            symmetry,
            confidence,
        }
    }

    /// Convert a pixel velocity to km/h using the person's estimated height
    /// as the pixel-to-meter scale. Zero when the frame has no usable torso.
    fn estimate_speed_kmh(
        &self,
        velocity_px_per_frame: f64,
        pose: Option<&PoseResult>,
        topology: Topology,
        frame_rate: f64,
    ) -> f64 {
        let Some(torso) =
            pose.and_then(|p| torso_height(p, topology, self.config.confidence_floor))
        else {
            return 0.0;
        };
        let height_px = torso * self.config.body_height_multiplier;
        if height_px < f64::EPSILON {
            return 0.0;
        }
        let meters_per_px = self.config.assumed_height_m / height_px;
        velocity_px_per_frame * frame_rate * meters_per_px * 3.6
    }
}

/// Centered moving average that preserves gaps: a `None` input stays `None`,
/// and valid samples average only the valid neighbors in their window.
fn moving_average(series: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return series.to_vec();
    }
    let half = window / 2;
    series
        .iter()
        .enumerate()
        .map(|(i, v)| {
            (*v)?;
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(series.len());
            let valid: Vec<f64> = series[start..end].iter().filter_map(|x| *x).collect();
            Some(valid.iter().sum::<f64>() / valid.len() as f64)
        })
        .collect()
}

/// Percentile over an iterator of values (nearest-rank).
fn percentile(values: impl Iterator<Item = f64>, p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, sorted.len()) - 1])
}

/// Local maxima strictly above both neighbors and the threshold.
fn find_peaks(smoothed: &[Option<f64>], threshold: f64) -> Vec<usize> {
    let mut peaks = Vec::new();
    for i in 1..smoothed.len().saturating_sub(1) {
        let (Some(prev), Some(curr), Some(next)) = (smoothed[i - 1], smoothed[i], smoothed[i + 1])
        else {
            continue;
        };
        if curr > prev && curr > next && curr > threshold {
            peaks.push(i);
        }
    }
    peaks
}
