//! Keypoints and canonical skeletal topologies.
//!
//! Coordinates are in frame pixel space. A keypoint whose score falls below
//! the configured confidence floor is treated as absent by all downstream
//! computation.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// A single detected keypoint in frame pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,

    /// Confidence score in `[0.0, 1.0]` when the model reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, score: f64) -> Self {
        Self {
            x,
            y,
            score: Some(score),
        }
    }

    /// Keypoint without a confidence score (always treated as present).
    pub fn unscored(x: f64, y: f64) -> Self {
        Self { x, y, score: None }
    }

    /// Whether this keypoint meets the confidence floor.
    ///
    /// Keypoints without a score pass unconditionally.
    pub fn passes(&self, floor: f64) -> bool {
        self.score.map(|s| s >= floor).unwrap_or(true)
    }

    /// Position as a geometry point.
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Canonical joint identifiers, named in COCO 17-point order.
///
/// The 33-point topology reuses these names for the joints the analysis
/// tracks; `Topology::joint_index` maps them to per-topology indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointId {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl JointId {
    /// All canonical joints in COCO order.
    pub const ALL: [JointId; 17] = [
        JointId::Nose,
        JointId::LeftEye,
        JointId::RightEye,
        JointId::LeftEar,
        JointId::RightEar,
        JointId::LeftShoulder,
        JointId::RightShoulder,
        JointId::LeftElbow,
        JointId::RightElbow,
        JointId::LeftWrist,
        JointId::RightWrist,
        JointId::LeftHip,
        JointId::RightHip,
        JointId::LeftKnee,
        JointId::RightKnee,
        JointId::LeftAnkle,
        JointId::RightAnkle,
    ];

    /// Stable name for series accessors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            JointId::Nose => "nose",
            JointId::LeftEye => "left_eye",
            JointId::RightEye => "right_eye",
            JointId::LeftEar => "left_ear",
            JointId::RightEar => "right_ear",
            JointId::LeftShoulder => "left_shoulder",
            JointId::RightShoulder => "right_shoulder",
            JointId::LeftElbow => "left_elbow",
            JointId::RightElbow => "right_elbow",
            JointId::LeftWrist => "left_wrist",
            JointId::RightWrist => "right_wrist",
            JointId::LeftHip => "left_hip",
            JointId::RightHip => "right_hip",
            JointId::LeftKnee => "left_knee",
            JointId::RightKnee => "right_knee",
            JointId::LeftAnkle => "left_ankle",
            JointId::RightAnkle => "right_ankle",
        }
    }

    /// The contralateral joint, or `None` for midline joints.
    pub fn mirror(&self) -> Option<JointId> {
        match self {
            JointId::Nose => None,
            JointId::LeftEye => Some(JointId::RightEye),
            JointId::RightEye => Some(JointId::LeftEye),
            JointId::LeftEar => Some(JointId::RightEar),
            JointId::RightEar => Some(JointId::LeftEar),
            JointId::LeftShoulder => Some(JointId::RightShoulder),
            JointId::RightShoulder => Some(JointId::LeftShoulder),
            JointId::LeftElbow => Some(JointId::RightElbow),
            JointId::RightElbow => Some(JointId::LeftElbow),
            JointId::LeftWrist => Some(JointId::RightWrist),
            JointId::RightWrist => Some(JointId::LeftWrist),
            JointId::LeftHip => Some(JointId::RightHip),
            JointId::RightHip => Some(JointId::LeftHip),
            JointId::LeftKnee => Some(JointId::RightKnee),
            JointId::RightKnee => Some(JointId::LeftKnee),
            JointId::LeftAnkle => Some(JointId::RightAnkle),
            JointId::RightAnkle => Some(JointId::LeftAnkle),
        }
    }

    /// Body side this joint belongs to.
    pub fn side(&self) -> Side {
        match self.name() {
            n if n.starts_with("left_") => Side::Left,
            n if n.starts_with("right_") => Side::Right,
            _ => Side::Center,
        }
    }
}

/// Left/right/midline classification for joints and segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
    Center,
}

/// Supported skeletal topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// 17-point COCO skeleton (MoveNet-style models).
    #[default]
    Coco17,
    /// 33-point skeleton (BlazePose-style models).
    Blaze33,
}

impl Topology {
    /// Number of keypoints a pose of this topology carries.
    pub fn joint_count(&self) -> usize {
        match self {
            Topology::Coco17 => 17,
            Topology::Blaze33 => 33,
        }
    }

    /// Index of a canonical joint within this topology's keypoint list.
    pub fn joint_index(&self, joint: JointId) -> usize {
        match self {
            Topology::Coco17 => match joint {
                JointId::Nose => 0,
                JointId::LeftEye => 1,
                JointId::RightEye => 2,
                JointId::LeftEar => 3,
                JointId::RightEar => 4,
                JointId::LeftShoulder => 5,
                JointId::RightShoulder => 6,
                JointId::LeftElbow => 7,
                JointId::RightElbow => 8,
                JointId::LeftWrist => 9,
                JointId::RightWrist => 10,
                JointId::LeftHip => 11,
                JointId::RightHip => 12,
                JointId::LeftKnee => 13,
                JointId::RightKnee => 14,
                JointId::LeftAnkle => 15,
                JointId::RightAnkle => 16,
            },
            Topology::Blaze33 => match joint {
                JointId::Nose => 0,
                JointId::LeftEye => 2,
                JointId::RightEye => 5,
                JointId::LeftEar => 7,
                JointId::RightEar => 8,
                JointId::LeftShoulder => 11,
                JointId::RightShoulder => 12,
                JointId::LeftElbow => 13,
                JointId::RightElbow => 14,
                JointId::LeftWrist => 15,
                JointId::RightWrist => 16,
                JointId::LeftHip => 23,
                JointId::RightHip => 24,
                JointId::LeftKnee => 25,
                JointId::RightKnee => 26,
                JointId::LeftAnkle => 27,
                JointId::RightAnkle => 28,
            },
        }
    }

    /// The four core torso joints used for the body-center anchor.
    pub fn core_joints(&self) -> [JointId; 4] {
        [
            JointId::LeftShoulder,
            JointId::RightShoulder,
            JointId::LeftHip,
            JointId::RightHip,
        ]
    }

    /// The two dominant limb endpoints tracked by the swing detector.
    pub fn wrists(&self) -> (JointId, JointId) {
        (JointId::LeftWrist, JointId::RightWrist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_indices_match_canonical_order() {
        for (i, joint) in JointId::ALL.iter().enumerate() {
            assert_eq!(Topology::Coco17.joint_index(*joint), i);
        }
    }

    #[test]
    fn test_blaze_maps_core_joints() {
        let t = Topology::Blaze33;
        assert_eq!(t.joint_index(JointId::LeftShoulder), 11);
        assert_eq!(t.joint_index(JointId::RightWrist), 16);
        assert_eq!(t.joint_index(JointId::RightHip), 24);
        assert!(t.joint_index(JointId::RightAnkle) < t.joint_count());
    }

    #[test]
    fn test_mirror_is_involutive() {
        for joint in JointId::ALL {
            if let Some(m) = joint.mirror() {
                assert_eq!(m.mirror(), Some(joint));
            }
        }
    }

    #[test]
    fn test_sides() {
        assert_eq!(JointId::Nose.side(), Side::Center);
        assert_eq!(JointId::LeftWrist.side(), Side::Left);
        assert_eq!(JointId::RightHip.side(), Side::Right);
    }

    #[test]
    fn test_confidence_floor() {
        let kp = Keypoint::new(1.0, 2.0, 0.4);
        assert!(kp.passes(0.3));
        assert!(!kp.passes(0.5));
        assert!(Keypoint::unscored(1.0, 2.0).passes(0.99));
    }
}
