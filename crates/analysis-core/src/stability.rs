//! Pose stability filter: banana-frame detection and recovery.
//!
//! A "banana frame" is a single frame whose estimated pose is geometrically
//! implausible relative to the immediately preceding accepted frame — a
//! segment stretched far beyond its previous length or a tracked angle
//! snapping tens of degrees. These are model glitches, not motion.
//!
//! The filter compares every tracked segment and angle against the last
//! accepted frame and repairs only the offending side, preferring a
//! mirrored estimate from the verified-stable contralateral side. A
//! `Normal`/`Recovery` state machine gates the return to trusted output;
//! the `always_mirror` toggle bypasses the state machine for callers that
//! prefer the simplified behavior.

use std::collections::HashSet;

use strokelab_pose_model::{
    JointId, Point, PoseResult, Side, Topology, ANGLES, SEGMENTS,
};

use crate::anchor::{body_center, torso_height};

/// Configuration for the stability filter.
#[derive(Debug, Clone)]
pub struct StabilityConfig {
    /// Skeletal topology of incoming poses.
    pub topology: Topology,

    /// Relative segment-length change that flags corruption (0.25 = 25%).
    pub segment_bound: f64,

    /// Absolute angle change in degrees that flags corruption.
    pub angle_bound_deg: f64,

    /// Consecutive clean frames required to leave `Recovery`.
    pub stable_frames_required: u32,

    /// Keypoint confidence floor.
    pub confidence_floor: f64,

    /// Simplified mode: always mirror a failing side, no state machine.
    pub always_mirror: bool,

    /// When the mirror side is also corrupted, briefly extrapolate the
    /// affected joints from the last stable state instead.
    pub extrapolate: bool,

    /// Maximum consecutive frames a joint may be extrapolated.
    pub extrapolate_frames: u32,

    /// Optional reference pose for the similarity score.
    pub reference_pose: Option<PoseResult>,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            topology: Topology::Coco17,
            segment_bound: 0.25,
            angle_bound_deg: 25.0,
            stable_frames_required: 5,
            confidence_floor: 0.3,
            always_mirror: false,
            extrapolate: true,
            extrapolate_frames: 3,
            reference_pose: None,
        }
    }
}

/// Filter state, exposed for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityState {
    Normal,
    Recovery,
}

/// Per-frame observability snapshot.
#[derive(Debug, Clone)]
pub struct FrameAssessment {
    pub state: StabilityState,

    /// Consecutive frames that passed the bounds check.
    pub stable_frames: u32,

    /// Whether this frame was flagged as a banana frame.
    pub corrupted: bool,

    /// Joints that failed bounds checks this frame.
    pub corrupted_joints: Vec<JointId>,

    /// How each corrupted side was repaired.
    pub recovery: Option<RecoveryKind>,

    /// Similarity against the reference pose, when configured.
    pub similarity: Option<f64>,
}

/// Recovery strategy applied to a corrupted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryKind {
    Mirrored,
    Extrapolated,
    /// Neither side was trustworthy; the frame passed through unrepaired.
    None,
}

/// The pose stability filter. Frame-sequential; one instance per tracked
/// person, driven in increasing time order.
pub struct StabilityFilter {
    config: StabilityConfig,
    state: StabilityState,
    stable_frames: u32,
    /// The previous accepted (possibly repaired) pose.
    last_accepted: Option<PoseResult>,
    /// Pose before the previous accepted one, for extrapolation velocity.
    prior_accepted: Option<PoseResult>,
    /// Last-known-good snapshot per side, refreshed when that side is clean.
    last_good_left: Option<PoseResult>,
    last_good_right: Option<PoseResult>,
    extrapolated_streak: u32,
}

impl StabilityFilter {
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            config,
            state: StabilityState::Normal,
            stable_frames: 0,
            last_accepted: None,
            prior_accepted: None,
            last_good_left: None,
            last_good_right: None,
            extrapolated_streak: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StabilityConfig::default())
    }

    /// Current state, for status indicators.
    pub fn state(&self) -> StabilityState {
        self.state
    }

    /// Consecutive-stable-frame counter, for status indicators.
    pub fn stable_frames(&self) -> u32 {
        self.stable_frames
    }

    /// Reset all history (video changed or analysis disabled).
    pub fn reset(&mut self) {
        self.state = StabilityState::Normal;
        self.stable_frames = 0;
        self.last_accepted = None;
        self.prior_accepted = None;
        self.last_good_left = None;
        self.last_good_right = None;
        self.extrapolated_streak = 0;
    }

    /// Assess one frame's pose, repairing corrupted joints where possible.
    ///
    /// Returns the (possibly repaired) pose and an observability snapshot.
    pub fn process(&mut self, pose: &PoseResult) -> (PoseResult, FrameAssessment) {
        let corrupted_joints = self.detect_corruption(pose);
        let corrupted = !corrupted_joints.is_empty();

        let mut repaired = pose.clone();
        let mut recovery = None;

        if corrupted {
            recovery = Some(self.recover(&mut repaired, &corrupted_joints));
        }

        if self.config.always_mirror {
            // Simplified mode: no state machine, no counters.
            self.state = StabilityState::Normal;
        } else if corrupted {
            if self.state == StabilityState::Normal {
                tracing::debug!(joints = corrupted_joints.len(), "Entering recovery");
            }
            self.state = StabilityState::Recovery;
            self.stable_frames = 0;
        } else {
            match self.state {
                StabilityState::Recovery => {
                    self.stable_frames += 1;
                    if self.stable_frames >= self.config.stable_frames_required {
                        tracing::debug!(
                            stable_frames = self.stable_frames,
                            "Recovered to normal"
                        );
                        self.state = StabilityState::Normal;
                    }
                }
                StabilityState::Normal => {
                    self.stable_frames = self.stable_frames.saturating_add(1);
                }
            }
        }

        // Refresh per-side snapshots from sides that were clean this frame.
        let corrupted_sides: HashSet<Side> =
            corrupted_joints.iter().map(|j| j.side()).collect();
        if !corrupted_sides.contains(&Side::Left) {
            self.last_good_left = Some(repaired.clone());
        }
        if !corrupted_sides.contains(&Side::Right) {
            self.last_good_right = Some(repaired.clone());
        }

        if !corrupted {
            self.extrapolated_streak = 0;
        }

        let similarity = self
            .config
            .reference_pose
            .as_ref()
            .and_then(|reference| self.similarity(&repaired, reference));

        let assessment = FrameAssessment {
            state: self.state,
            stable_frames: self.stable_frames,
            corrupted,
            corrupted_joints,
            recovery,
            similarity,
        };

        self.prior_accepted = self.last_accepted.take();
        self.last_accepted = Some(repaired.clone());

        (repaired, assessment)
    }

    /// Compare tracked segments and angles against the last accepted frame.
    fn detect_corruption(&self, pose: &PoseResult) -> Vec<JointId> {
        let Some(prev) = &self.last_accepted else {
            return vec![];
        };

        let topology = self.config.topology;
        let floor = self.config.confidence_floor;
        let mut corrupted: HashSet<JointId> = HashSet::new();

        for seg in SEGMENTS {
            let (a, b) = seg.joints;
            let (Some(pa), Some(pb)) = (
                pose.valid_point(topology, a, floor),
                pose.valid_point(topology, b, floor),
            ) else {
                continue;
            };
            let (Some(qa), Some(qb)) = (
                prev.valid_point(topology, a, floor),
                prev.valid_point(topology, b, floor),
            ) else {
                continue;
            };

            let len = pa.distance(&pb);
            let prev_len = qa.distance(&qb);
            if prev_len > f64::EPSILON
                && ((len - prev_len).abs() / prev_len) > self.config.segment_bound
            {
                corrupted.insert(a);
                corrupted.insert(b);
            }
        }

        for def in ANGLES {
            let (a, b, c) = def.joints;
            let current = self.angle_of(pose, a, b, c);
            let previous = self.angle_of(prev, a, b, c);
            if let (Some(current), Some(previous)) = (current, previous) {
                if (current - previous).abs() > self.config.angle_bound_deg {
                    corrupted.insert(a);
                    corrupted.insert(b);
                    corrupted.insert(c);
                }
            }
        }

        let mut out: Vec<JointId> = corrupted.into_iter().collect();
        out.sort_by_key(|j| self.config.topology.joint_index(*j));
        out
    }

    fn angle_of(
        &self,
        pose: &PoseResult,
        a: JointId,
        b: JointId,
        c: JointId,
    ) -> Option<f64> {
        let topology = self.config.topology;
        let floor = self.config.confidence_floor;
        strokelab_pose_model::geometry::angle_deg(
            pose.valid_point(topology, a, floor)?,
            pose.valid_point(topology, b, floor)?,
            pose.valid_point(topology, c, floor)?,
        )
    }

    /// Repair the affected joints only, never the whole pose.
    fn recover(&mut self, pose: &mut PoseResult, corrupted: &[JointId]) -> RecoveryKind {
        let corrupted_sides: HashSet<Side> = corrupted.iter().map(|j| j.side()).collect();
        let center = body_center(pose, self.config.topology, self.config.confidence_floor);

        if let Some(center) = center {
            let mut mirrored_any = false;
            for joint in corrupted {
                let Some(source) = self.mirror_source(pose, *joint, &corrupted_sides) else {
                    continue;
                };
                let offset = source - center;
                let reflected = Point::new(center.x - offset.x, center.y + offset.y);
                if let Some(kp) = pose.keypoint_mut(self.config.topology, *joint) {
                    kp.x = reflected.x;
                    kp.y = reflected.y;
                    mirrored_any = true;
                }
            }
            if mirrored_any {
                return RecoveryKind::Mirrored;
            }
        }

        if self.config.extrapolate && self.extrapolated_streak < self.config.extrapolate_frames {
            if self.extrapolate_joints(pose, corrupted) {
                self.extrapolated_streak += 1;
                return RecoveryKind::Extrapolated;
            }
        }

        RecoveryKind::None
    }

    /// Contralateral point to reflect across the body-center vertical axis:
    /// the live side when it passed this frame's bounds checks, otherwise
    /// the last clean snapshot of that side.
    fn mirror_source(
        &self,
        pose: &PoseResult,
        joint: JointId,
        corrupted_sides: &HashSet<Side>,
    ) -> Option<Point> {
        let mirror = joint.mirror()?;
        let topology = self.config.topology;
        let floor = self.config.confidence_floor;

        if !corrupted_sides.contains(&mirror.side()) {
            return pose.valid_point(topology, mirror, floor);
        }
        let snapshot = match mirror.side() {
            Side::Left => self.last_good_left.as_ref(),
            Side::Right => self.last_good_right.as_ref(),
            Side::Center => None,
        }?;
        snapshot.valid_point(topology, mirror, floor)
    }

    /// Replay the last stable per-joint velocity for the corrupted joints.
    fn extrapolate_joints(&self, pose: &mut PoseResult, corrupted: &[JointId]) -> bool {
        let (Some(last), Some(prior)) = (&self.last_accepted, &self.prior_accepted) else {
            return false;
        };

        let topology = self.config.topology;
        let floor = self.config.confidence_floor;
        let mut repaired_any = false;

        for joint in corrupted {
            let (Some(p1), Some(p0)) = (
                last.valid_point(topology, *joint, floor),
                prior.valid_point(topology, *joint, floor),
            ) else {
                continue;
            };
            let predicted = p1 + (p1 - p0);
            if let Some(kp) = pose.keypoint_mut(topology, *joint) {
                kp.x = predicted.x;
                kp.y = predicted.y;
                repaired_any = true;
            }
        }

        repaired_any
    }

    /// Scale-aware similarity against a reference pose in `[0, 1]`.
    fn similarity(&self, pose: &PoseResult, reference: &PoseResult) -> Option<f64> {
        let topology = self.config.topology;
        let floor = self.config.confidence_floor;

        let center = body_center(pose, topology, floor)?;
        let ref_center = body_center(reference, topology, floor)?;
        let scale = torso_height(pose, topology, floor)?;
        let ref_scale = torso_height(reference, topology, floor)?;
        if scale < f64::EPSILON || ref_scale < f64::EPSILON {
            return None;
        }

        let mut total = 0.0;
        let mut count = 0usize;
        for joint in JointId::ALL {
            let (Some(p), Some(r)) = (
                pose.valid_point(topology, joint, floor),
                reference.valid_point(topology, joint, floor),
            ) else {
                continue;
            };
            let rel_p = (p - center).scale(1.0 / scale);
            let rel_r = (r - ref_center).scale(1.0 / ref_scale);
            total += rel_p.distance(&rel_r);
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let mean_dist = total / count as f64;
        Some(1.0 / (1.0 + mean_dist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strokelab_pose_model::Keypoint;

    /// An upright figure with symmetric arms and legs.
    fn base_pose() -> PoseResult {
        let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.9); 17];
        let set = |kps: &mut Vec<Keypoint>, joint: JointId, x: f64, y: f64| {
            kps[Topology::Coco17.joint_index(joint)] = Keypoint::new(x, y, 0.9);
        };
        set(&mut keypoints, JointId::Nose, 100.0, 20.0);
        set(&mut keypoints, JointId::LeftEye, 105.0, 15.0);
        set(&mut keypoints, JointId::RightEye, 95.0, 15.0);
        set(&mut keypoints, JointId::LeftEar, 110.0, 18.0);
        set(&mut keypoints, JointId::RightEar, 90.0, 18.0);
        set(&mut keypoints, JointId::LeftShoulder, 130.0, 50.0);
        set(&mut keypoints, JointId::RightShoulder, 70.0, 50.0);
        set(&mut keypoints, JointId::LeftElbow, 140.0, 90.0);
        set(&mut keypoints, JointId::RightElbow, 60.0, 90.0);
        set(&mut keypoints, JointId::LeftWrist, 145.0, 130.0);
        set(&mut keypoints, JointId::RightWrist, 55.0, 130.0);
        set(&mut keypoints, JointId::LeftHip, 120.0, 150.0);
        set(&mut keypoints, JointId::RightHip, 80.0, 150.0);
        set(&mut keypoints, JointId::LeftKnee, 120.0, 210.0);
        set(&mut keypoints, JointId::RightKnee, 80.0, 210.0);
        set(&mut keypoints, JointId::LeftAnkle, 120.0, 270.0);
        set(&mut keypoints, JointId::RightAnkle, 80.0, 270.0);
        PoseResult::new(keypoints)
    }

    /// Stretch the left forearm 40% beyond its base length.
    fn banana_left_arm() -> PoseResult {
        let mut pose = base_pose();
        let elbow = pose
            .valid_point(Topology::Coco17, JointId::LeftElbow, 0.3)
            .unwrap();
        let wrist = pose
            .valid_point(Topology::Coco17, JointId::LeftWrist, 0.3)
            .unwrap();
        let stretched = elbow + (wrist - elbow).scale(1.4);
        let kp = pose
            .keypoint_mut(Topology::Coco17, JointId::LeftWrist)
            .unwrap();
        kp.x = stretched.x;
        kp.y = stretched.y;
        pose
    }

    #[test]
    fn test_first_frame_accepted_as_is() {
        let mut filter = StabilityFilter::with_defaults();
        let (out, assessment) = filter.process(&base_pose());
        assert!(!assessment.corrupted);
        assert_eq!(out, base_pose());
        assert_eq!(filter.state(), StabilityState::Normal);
    }

    #[test]
    fn test_banana_frame_triggers_recovery_and_mirrors_left_arm_only() {
        let mut filter = StabilityFilter::with_defaults();
        filter.process(&base_pose());

        let corrupted = banana_left_arm();
        let (out, assessment) = filter.process(&corrupted);

        assert!(assessment.corrupted);
        assert_eq!(assessment.state, StabilityState::Recovery);
        assert_eq!(assessment.recovery, Some(RecoveryKind::Mirrored));
        assert!(assessment
            .corrupted_joints
            .iter()
            .all(|j| j.side() == Side::Left));

        // The right arm is untouched.
        let right_wrist = out
            .keypoint(Topology::Coco17, JointId::RightWrist)
            .unwrap();
        assert_eq!(right_wrist.x, 55.0);
        assert_eq!(right_wrist.y, 130.0);

        // The left wrist was repaired away from the stretched detection.
        let left_wrist = out.keypoint(Topology::Coco17, JointId::LeftWrist).unwrap();
        let stretched = corrupted
            .keypoint(Topology::Coco17, JointId::LeftWrist)
            .unwrap();
        assert_ne!((left_wrist.x, left_wrist.y), (stretched.x, stretched.y));
        // Mirror of the right wrist across the body-center vertical axis.
        assert!((left_wrist.x - 145.0).abs() < 1e-9);
        assert!((left_wrist.y - 130.0).abs() < 1e-9);
    }

    /// Stretch both forearms 40% beyond their base lengths.
    fn banana_both_arms() -> PoseResult {
        let mut pose = base_pose();
        for (elbow, wrist) in [
            (JointId::LeftElbow, JointId::LeftWrist),
            (JointId::RightElbow, JointId::RightWrist),
        ] {
            let e = pose.valid_point(Topology::Coco17, elbow, 0.3).unwrap();
            let w = pose.valid_point(Topology::Coco17, wrist, 0.3).unwrap();
            let stretched = e + (w - e).scale(1.4);
            let kp = pose.keypoint_mut(Topology::Coco17, wrist).unwrap();
            kp.x = stretched.x;
            kp.y = stretched.y;
        }
        pose
    }

    #[test]
    fn test_both_sides_corrupted_mirrors_from_last_clean_snapshots() {
        let mut filter = StabilityFilter::new(StabilityConfig {
            extrapolate: false,
            ..Default::default()
        });
        filter.process(&base_pose());

        let (out, assessment) = filter.process(&banana_both_arms());
        assert!(assessment.corrupted);
        assert_eq!(assessment.recovery, Some(RecoveryKind::Mirrored));

        // Each wrist is rebuilt from the other side's last clean snapshot,
        // landing back on the base positions.
        let left = out.keypoint(Topology::Coco17, JointId::LeftWrist).unwrap();
        assert!((left.x - 145.0).abs() < 1e-9);
        assert!((left.y - 130.0).abs() < 1e-9);
        let right = out.keypoint(Topology::Coco17, JointId::RightWrist).unwrap();
        assert!((right.x - 55.0).abs() < 1e-9);
        assert!((right.y - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_returns_to_normal_after_configured_stable_frames() {
        let mut filter = StabilityFilter::new(StabilityConfig {
            stable_frames_required: 3,
            ..Default::default()
        });
        filter.process(&base_pose());
        filter.process(&banana_left_arm());
        assert_eq!(filter.state(), StabilityState::Recovery);

        for i in 1..=3u32 {
            let (_, assessment) = filter.process(&base_pose());
            if i < 3 {
                assert_eq!(assessment.state, StabilityState::Recovery);
            } else {
                assert_eq!(assessment.state, StabilityState::Normal);
            }
        }
    }

    #[test]
    fn test_always_mirror_bypasses_state_machine() {
        let mut filter = StabilityFilter::new(StabilityConfig {
            always_mirror: true,
            ..Default::default()
        });
        filter.process(&base_pose());
        let (_, assessment) = filter.process(&banana_left_arm());
        assert!(assessment.corrupted);
        assert_eq!(assessment.recovery, Some(RecoveryKind::Mirrored));
        assert_eq!(assessment.state, StabilityState::Normal);
        assert_eq!(filter.state(), StabilityState::Normal);
    }

    #[test]
    fn test_similarity_reported_against_reference() {
        let mut filter = StabilityFilter::new(StabilityConfig {
            reference_pose: Some(base_pose()),
            ..Default::default()
        });
        let (_, assessment) = filter.process(&base_pose());
        let similarity = assessment.similarity.unwrap();
        assert!((similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clean_stream_stays_normal() {
        let mut filter = StabilityFilter::with_defaults();
        for _ in 0..10 {
            let (_, assessment) = filter.process(&base_pose());
            assert!(!assessment.corrupted);
            assert_eq!(assessment.state, StabilityState::Normal);
        }
        assert!(filter.stable_frames() >= 9);
    }
}
