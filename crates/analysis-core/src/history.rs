//! Joint history: relative-metric series for charting.
//!
//! Every recorded metric is scale- and translation-invariant where the
//! frame allows it: segment lengths normalize against torso height, and
//! joint kinematics are measured relative to the body-center anchor.
//! Series are ring buffers — oldest samples drop first.

use std::collections::{HashMap, VecDeque};

use strokelab_pose_model::{JointId, Point, PoseResult, Topology, ANGLES, SEGMENTS};

use crate::anchor::{body_center, torso_height};

/// Configuration for the history recorder.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Skeletal topology of incoming poses.
    pub topology: Topology,

    /// Maximum samples retained per series.
    pub max_len: usize,

    /// Keypoint confidence floor.
    pub confidence_floor: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            topology: Topology::Coco17,
            max_len: 300,
            confidence_floor: 0.3,
        }
    }
}

/// One segment-length sample.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SegmentSample {
    pub frame: u64,
    pub timestamp_secs: f64,
    /// Raw length in pixels.
    pub length: f64,
    /// Length divided by torso height, or raw length when the torso is
    /// undeterminable this frame.
    pub normalized: f64,
    /// Ratio to the previous sample's length.
    pub ratio_to_prev: Option<f64>,
    /// Whether the stability filter flagged this frame.
    pub corrupted: bool,
}

/// One joint-angle sample.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct AngleSample {
    pub frame: u64,
    pub timestamp_secs: f64,
    /// Angle at the vertex in degrees.
    pub degrees: f64,
    /// Absolute change from the previous sample.
    pub delta_from_prev: Option<f64>,
}

/// One joint-kinematics sample, all relative to the body-center anchor.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct AccelerationSample {
    pub frame: u64,
    pub timestamp_secs: f64,
    /// Position relative to the anchor.
    pub relative: Point,
    /// Frame-to-frame delta of the relative position.
    pub velocity: Option<Point>,
    /// Frame-to-frame delta of the velocity.
    pub acceleration: Option<Point>,
    pub velocity_magnitude: Option<f64>,
    pub acceleration_magnitude: Option<f64>,
}

/// The joint history recorder. Frame-sequential; driven in increasing
/// time order.
pub struct JointHistoryRecorder {
    config: HistoryConfig,
    segments: HashMap<&'static str, VecDeque<SegmentSample>>,
    angles: HashMap<&'static str, VecDeque<AngleSample>>,
    accelerations: HashMap<&'static str, VecDeque<AccelerationSample>>,
    /// Previous anchor-relative position per joint, cleared on gaps.
    prev_relative: HashMap<JointId, Point>,
    /// Previous velocity per joint, cleared on gaps.
    prev_velocity: HashMap<JointId, Point>,
}

impl JointHistoryRecorder {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            segments: HashMap::new(),
            angles: HashMap::new(),
            accelerations: HashMap::new(),
            prev_relative: HashMap::new(),
            prev_velocity: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(HistoryConfig::default())
    }

    /// Append one frame's samples to every series the frame supports.
    ///
    /// `pose` is `None` for gap frames; gaps record nothing but break the
    /// velocity/acceleration chains so no metric ever bridges a gap.
    pub fn record(
        &mut self,
        pose: Option<&PoseResult>,
        frame: u64,
        timestamp_secs: f64,
        corrupted: bool,
    ) {
        let Some(pose) = pose else {
            self.prev_relative.clear();
            self.prev_velocity.clear();
            return;
        };

        let topology = self.config.topology;
        let floor = self.config.confidence_floor;
        let torso = torso_height(pose, topology, floor);

        for seg in SEGMENTS {
            let (a, b) = seg.joints;
            let (Some(pa), Some(pb)) = (
                pose.valid_point(topology, a, floor),
                pose.valid_point(topology, b, floor),
            ) else {
                continue;
            };
            let length = pa.distance(&pb);
            let normalized = match torso {
                Some(t) if t > f64::EPSILON => length / t,
                _ => length,
            };
            let series = self.segments.entry(seg.name).or_default();
            let ratio_to_prev = series
                .back()
                .filter(|prev| prev.length > f64::EPSILON)
                .map(|prev| length / prev.length);
            push_capped(
                series,
                SegmentSample {
                    frame,
                    timestamp_secs,
                    length,
                    normalized,
                    ratio_to_prev,
                    corrupted,
                },
                self.config.max_len,
            );
        }

        for def in ANGLES {
            let (a, b, c) = def.joints;
            let (Some(pa), Some(pb), Some(pc)) = (
                pose.valid_point(topology, a, floor),
                pose.valid_point(topology, b, floor),
                pose.valid_point(topology, c, floor),
            ) else {
                continue;
            };
            let Some(degrees) = strokelab_pose_model::geometry::angle_deg(pa, pb, pc) else {
                continue;
            };
            let series = self.angles.entry(def.name).or_default();
            let delta_from_prev = series.back().map(|prev| (degrees - prev.degrees).abs());
            push_capped(
                series,
                AngleSample {
                    frame,
                    timestamp_secs,
                    degrees,
                    delta_from_prev,
                },
                self.config.max_len,
            );
        }

        let anchor = body_center(pose, topology, floor);
        match anchor {
            Some(anchor) => {
                for joint in JointId::ALL {
                    let Some(position) = pose.valid_point(topology, joint, floor) else {
                        // Lost joint: its kinematic chain restarts.
                        self.prev_relative.remove(&joint);
                        self.prev_velocity.remove(&joint);
                        continue;
                    };
                    let relative = position - anchor;
                    let velocity = self.prev_relative.get(&joint).map(|prev| relative - *prev);
                    let acceleration = match (velocity, self.prev_velocity.get(&joint)) {
                        (Some(v), Some(prev_v)) => Some(v - *prev_v),
                        _ => None,
                    };

                    push_capped(
                        self.accelerations.entry(joint.name()).or_default(),
                        AccelerationSample {
                            frame,
                            timestamp_secs,
                            relative,
                            velocity,
                            acceleration,
                            velocity_magnitude: velocity.map(|v| v.norm()),
                            acceleration_magnitude: acceleration.map(|a| a.norm()),
                        },
                        self.config.max_len,
                    );

                    self.prev_relative.insert(joint, relative);
                    if let Some(v) = velocity {
                        self.prev_velocity.insert(joint, v);
                    }
                }
            }
            None => {
                // Anchor undefined: relative metrics are meaningless this
                // frame and the kinematic chains restart.
                self.prev_relative.clear();
                self.prev_velocity.clear();
            }
        }
    }

    /// Series accessor by segment name.
    pub fn segment_series(&self, name: &str) -> Option<&VecDeque<SegmentSample>> {
        self.segments.get(name)
    }

    /// Series accessor by angle name.
    pub fn angle_series(&self, name: &str) -> Option<&VecDeque<AngleSample>> {
        self.angles.get(name)
    }

    /// Series accessor by joint name.
    pub fn acceleration_series(&self, name: &str) -> Option<&VecDeque<AccelerationSample>> {
        self.accelerations.get(name)
    }

    /// Clear all series and chains (video changed or analysis disabled).
    pub fn reset(&mut self) {
        self.segments.clear();
        self.angles.clear();
        self.accelerations.clear();
        self.prev_relative.clear();
        self.prev_velocity.clear();
    }
}

fn push_capped<T>(series: &mut VecDeque<T>, sample: T, max_len: usize) {
    while series.len() >= max_len.max(1) {
        series.pop_front();
    }
    series.push_back(sample);
}

#[cfg(test)]
mod tests {
    use super::*;
    use strokelab_pose_model::Keypoint;

    fn pose(wrist_x: f64) -> PoseResult {
        let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.0); 17];
        let set = |kps: &mut Vec<Keypoint>, joint: JointId, x: f64, y: f64| {
            kps[Topology::Coco17.joint_index(joint)] = Keypoint::new(x, y, 0.9);
        };
        set(&mut keypoints, JointId::LeftShoulder, 130.0, 50.0);
        set(&mut keypoints, JointId::RightShoulder, 70.0, 50.0);
        set(&mut keypoints, JointId::LeftHip, 120.0, 150.0);
        set(&mut keypoints, JointId::RightHip, 80.0, 150.0);
        set(&mut keypoints, JointId::LeftElbow, 140.0, 90.0);
        set(&mut keypoints, JointId::LeftWrist, wrist_x, 130.0);
        PoseResult::new(keypoints)
    }

    #[test]
    fn test_segment_sample_normalizes_by_torso() {
        let mut recorder = JointHistoryRecorder::with_defaults();
        recorder.record(Some(&pose(145.0)), 0, 0.0, false);

        let series = recorder.segment_series("left_torso_side").unwrap();
        assert_eq!(series.len(), 1);
        let sample = series[0];
        // Both torso sides are equal here, so the side length normalizes to 1.
        assert!((sample.normalized - 1.0).abs() < 1e-9);
        assert_eq!(sample.ratio_to_prev, None);
    }

    #[test]
    fn test_ratio_to_prev_tracks_growth() {
        let mut recorder = JointHistoryRecorder::with_defaults();
        recorder.record(Some(&pose(145.0)), 0, 0.0, false);
        recorder.record(Some(&pose(145.0)), 1, 1.0 / 30.0, false);

        let series = recorder.segment_series("left_forearm").unwrap();
        assert_eq!(series.len(), 2);
        assert!((series[1].ratio_to_prev.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_delta_from_prev() {
        let mut recorder = JointHistoryRecorder::with_defaults();
        recorder.record(Some(&pose(145.0)), 0, 0.0, false);
        recorder.record(Some(&pose(160.0)), 1, 1.0 / 30.0, false);

        let series = recorder.angle_series("left_elbow").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].delta_from_prev, None);
        assert!(series[1].delta_from_prev.unwrap() > 0.0);
    }

    #[test]
    fn test_acceleration_needs_three_frames() {
        let mut recorder = JointHistoryRecorder::with_defaults();
        for (i, x) in [145.0, 150.0, 160.0].iter().enumerate() {
            recorder.record(Some(&pose(*x)), i as u64, i as f64 / 30.0, false);
        }

        let series = recorder.acceleration_series("left_wrist").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].velocity, None);
        assert!(series[1].velocity.is_some());
        assert_eq!(series[1].acceleration, None);
        let accel = series[2].acceleration.unwrap();
        // Velocity went from 5 px/frame to 10 px/frame in x.
        assert!((accel.x - 5.0).abs() < 1e-9);
        assert!((series[2].acceleration_magnitude.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_breaks_kinematic_chain() {
        let mut recorder = JointHistoryRecorder::with_defaults();
        recorder.record(Some(&pose(145.0)), 0, 0.0, false);
        recorder.record(None, 1, 1.0 / 30.0, false);
        recorder.record(Some(&pose(200.0)), 2, 2.0 / 30.0, false);

        let series = recorder.acceleration_series("left_wrist").unwrap();
        // Two samples (the gap recorded nothing) and no velocity bridging it.
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].velocity, None);
    }

    #[test]
    fn test_ring_buffer_caps_length() {
        let mut recorder = JointHistoryRecorder::new(HistoryConfig {
            max_len: 4,
            ..Default::default()
        });
        for i in 0..10u64 {
            recorder.record(Some(&pose(145.0)), i, i as f64 / 30.0, false);
        }
        let series = recorder.segment_series("left_forearm").unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].frame, 6);
    }

    #[test]
    fn test_corrupted_flag_is_recorded() {
        let mut recorder = JointHistoryRecorder::with_defaults();
        recorder.record(Some(&pose(145.0)), 0, 0.0, true);
        let series = recorder.segment_series("left_forearm").unwrap();
        assert!(series[0].corrupted);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut recorder = JointHistoryRecorder::with_defaults();
        recorder.record(Some(&pose(145.0)), 0, 0.0, false);
        recorder.reset();
        assert!(recorder.segment_series("left_forearm").is_none());
    }
}
