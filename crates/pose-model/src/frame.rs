//! Pose frames and the frame-indexed pose map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::keypoint::{JointId, Keypoint, Topology};

/// Axis-aligned bounding box in frame pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected person in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseResult {
    /// Keypoints in canonical topology order; length matches the topology.
    pub keypoints: Vec<Keypoint>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    /// Per-person track id, when the estimator tracks identities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u32>,

    /// Aggregate detection confidence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl PoseResult {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            bbox: None,
            track_id: None,
            score: None,
        }
    }

    /// Keypoint for a canonical joint, resolved through the topology.
    pub fn keypoint(&self, topology: Topology, joint: JointId) -> Option<&Keypoint> {
        self.keypoints.get(topology.joint_index(joint))
    }

    /// Mutable keypoint access for a canonical joint.
    pub fn keypoint_mut(&mut self, topology: Topology, joint: JointId) -> Option<&mut Keypoint> {
        self.keypoints.get_mut(topology.joint_index(joint))
    }

    /// Position of a joint that meets the confidence floor.
    pub fn valid_point(&self, topology: Topology, joint: JointId, floor: f64) -> Option<Point> {
        self.keypoint(topology, joint)
            .filter(|kp| kp.passes(floor))
            .map(|kp| kp.point())
    }

    /// Mean confidence over scored keypoints, `None` when none are scored.
    pub fn mean_score(&self) -> Option<f64> {
        let scored: Vec<f64> = self.keypoints.iter().filter_map(|kp| kp.score).collect();
        if scored.is_empty() {
            return None;
        }
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    }
}

/// One physical video frame with zero or more detected people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub frame_index: u64,
    pub timestamp_secs: f64,
    pub poses: Vec<PoseResult>,
}

/// Frame index → detected poses.
///
/// A `BTreeMap` so iteration is always in increasing frame order; keys are
/// contiguous from 0 except where extraction recorded a gap. Immutable once
/// published — only the extraction engine mutates it during construction.
pub type PoseMap = BTreeMap<u64, Vec<PoseResult>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_with_nose_at(x: f64, score: f64) -> PoseResult {
        let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.9); 17];
        keypoints[0] = Keypoint::new(x, 5.0, score);
        PoseResult::new(keypoints)
    }

    #[test]
    fn test_keypoint_lookup_via_topology() {
        let pose = pose_with_nose_at(3.0, 0.8);
        let nose = pose.keypoint(Topology::Coco17, JointId::Nose).unwrap();
        assert_eq!(nose.x, 3.0);
    }

    #[test]
    fn test_valid_point_respects_floor() {
        let pose = pose_with_nose_at(3.0, 0.2);
        assert!(pose
            .valid_point(Topology::Coco17, JointId::Nose, 0.3)
            .is_none());
        assert!(pose
            .valid_point(Topology::Coco17, JointId::Nose, 0.1)
            .is_some());
    }

    #[test]
    fn test_pose_map_iterates_in_frame_order() {
        let mut map = PoseMap::new();
        map.insert(5, vec![]);
        map.insert(1, vec![]);
        map.insert(3, vec![]);
        let keys: Vec<u64> = map.keys().copied().collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn test_mean_score() {
        let pose = PoseResult::new(vec![
            Keypoint::new(0.0, 0.0, 0.4),
            Keypoint::new(0.0, 0.0, 0.8),
        ]);
        assert!((pose.mean_score().unwrap() - 0.6).abs() < 1e-12);
        assert!(PoseResult::new(vec![Keypoint::unscored(0.0, 0.0)])
            .mean_score()
            .is_none());
    }
}
