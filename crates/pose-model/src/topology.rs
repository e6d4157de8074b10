//! Static segment and angle tables.
//!
//! These tables name the two-joint segments and three-joint angles the
//! analysis tracks. They are compile-time constants and never mutated at
//! runtime; per-topology keypoint indices are resolved through
//! `Topology::joint_index` at the point of use.

use crate::keypoint::{JointId, Side};

/// A named two-joint body segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDefinition {
    pub name: &'static str,
    pub joints: (JointId, JointId),
    pub side: Side,
}

/// A named three-joint angle; the vertex is the middle joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngleDefinition {
    pub name: &'static str,
    pub joints: (JointId, JointId, JointId),
    pub side: Side,
}

/// Tracked segments.
pub const SEGMENTS: &[SegmentDefinition] = &[
    SegmentDefinition {
        name: "left_upper_arm",
        joints: (JointId::LeftShoulder, JointId::LeftElbow),
        side: Side::Left,
    },
    SegmentDefinition {
        name: "right_upper_arm",
        joints: (JointId::RightShoulder, JointId::RightElbow),
        side: Side::Right,
    },
    SegmentDefinition {
        name: "left_forearm",
        joints: (JointId::LeftElbow, JointId::LeftWrist),
        side: Side::Left,
    },
    SegmentDefinition {
        name: "right_forearm",
        joints: (JointId::RightElbow, JointId::RightWrist),
        side: Side::Right,
    },
    SegmentDefinition {
        name: "left_torso_side",
        joints: (JointId::LeftShoulder, JointId::LeftHip),
        side: Side::Left,
    },
    SegmentDefinition {
        name: "right_torso_side",
        joints: (JointId::RightShoulder, JointId::RightHip),
        side: Side::Right,
    },
    SegmentDefinition {
        name: "left_thigh",
        joints: (JointId::LeftHip, JointId::LeftKnee),
        side: Side::Left,
    },
    SegmentDefinition {
        name: "right_thigh",
        joints: (JointId::RightHip, JointId::RightKnee),
        side: Side::Right,
    },
    SegmentDefinition {
        name: "left_shin",
        joints: (JointId::LeftKnee, JointId::LeftAnkle),
        side: Side::Left,
    },
    SegmentDefinition {
        name: "right_shin",
        joints: (JointId::RightKnee, JointId::RightAnkle),
        side: Side::Right,
    },
    SegmentDefinition {
        name: "shoulder_width",
        joints: (JointId::LeftShoulder, JointId::RightShoulder),
        side: Side::Center,
    },
    SegmentDefinition {
        name: "hip_width",
        joints: (JointId::LeftHip, JointId::RightHip),
        side: Side::Center,
    },
];

/// Tracked angles.
pub const ANGLES: &[AngleDefinition] = &[
    AngleDefinition {
        name: "left_elbow",
        joints: (JointId::LeftShoulder, JointId::LeftElbow, JointId::LeftWrist),
        side: Side::Left,
    },
    AngleDefinition {
        name: "right_elbow",
        joints: (
            JointId::RightShoulder,
            JointId::RightElbow,
            JointId::RightWrist,
        ),
        side: Side::Right,
    },
    AngleDefinition {
        name: "left_shoulder",
        joints: (JointId::LeftElbow, JointId::LeftShoulder, JointId::LeftHip),
        side: Side::Left,
    },
    AngleDefinition {
        name: "right_shoulder",
        joints: (
            JointId::RightElbow,
            JointId::RightShoulder,
            JointId::RightHip,
        ),
        side: Side::Right,
    },
    AngleDefinition {
        name: "left_knee",
        joints: (JointId::LeftHip, JointId::LeftKnee, JointId::LeftAnkle),
        side: Side::Left,
    },
    AngleDefinition {
        name: "right_knee",
        joints: (JointId::RightHip, JointId::RightKnee, JointId::RightAnkle),
        side: Side::Right,
    },
    AngleDefinition {
        name: "left_hip",
        joints: (JointId::LeftShoulder, JointId::LeftHip, JointId::LeftKnee),
        side: Side::Left,
    },
    AngleDefinition {
        name: "right_hip",
        joints: (JointId::RightShoulder, JointId::RightHip, JointId::RightKnee),
        side: Side::Right,
    },
];

impl SegmentDefinition {
    /// Look up a segment by name.
    pub fn by_name(name: &str) -> Option<&'static SegmentDefinition> {
        SEGMENTS.iter().find(|s| s.name == name)
    }

    /// The contralateral segment, or `None` for midline segments.
    pub fn mirror(&self) -> Option<&'static SegmentDefinition> {
        let (a, b) = (self.joints.0.mirror()?, self.joints.1.mirror()?);
        SEGMENTS.iter().find(|s| s.joints == (a, b))
    }
}

impl AngleDefinition {
    /// Look up an angle by name.
    pub fn by_name(name: &str) -> Option<&'static AngleDefinition> {
        ANGLES.iter().find(|a| a.name == name)
    }

    /// The contralateral angle, or `None` for midline angles.
    pub fn mirror(&self) -> Option<&'static AngleDefinition> {
        let (a, b, c) = (
            self.joints.0.mirror()?,
            self.joints.1.mirror()?,
            self.joints.2.mirror()?,
        );
        ANGLES.iter().find(|def| def.joints == (a, b, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_lookup() {
        let seg = SegmentDefinition::by_name("left_forearm").unwrap();
        assert_eq!(seg.joints, (JointId::LeftElbow, JointId::LeftWrist));
        assert!(SegmentDefinition::by_name("left_wing").is_none());
    }

    #[test]
    fn test_every_sided_segment_has_a_mirror() {
        for seg in SEGMENTS {
            match seg.side {
                Side::Center => assert!(seg.mirror().is_none() || seg.mirror() == Some(seg)),
                _ => {
                    let mirror = seg.mirror().expect(seg.name);
                    assert_ne!(mirror.name, seg.name);
                    assert_eq!(mirror.mirror().unwrap().name, seg.name);
                }
            }
        }
    }

    #[test]
    fn test_every_sided_angle_has_a_mirror() {
        for angle in ANGLES {
            if angle.side != Side::Center {
                let mirror = angle.mirror().expect(angle.name);
                assert_ne!(mirror.name, angle.name);
            }
        }
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in SEGMENTS.iter().enumerate() {
            for b in &SEGMENTS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
        for (i, a) in ANGLES.iter().enumerate() {
            for b in &ANGLES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
