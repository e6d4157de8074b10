//! Body-center anchor and torso measurements.
//!
//! The anchor cancels camera and whole-body translation before any limb
//! velocity is computed; torso height is the scale normalizer that makes
//! recorded metrics comparable across zoom levels.

use strokelab_pose_model::{JointId, Point, PoseResult, Topology};

/// Mean position of the valid core torso joints (both shoulders, both hips).
///
/// Undefined when fewer than 2 core joints meet the confidence floor.
pub fn body_center(pose: &PoseResult, topology: Topology, floor: f64) -> Option<Point> {
    let core: Vec<Point> = topology
        .core_joints()
        .iter()
        .filter_map(|joint| pose.valid_point(topology, *joint, floor))
        .collect();
    if core.len() < 2 {
        return None;
    }
    Point::mean(&core)
}

/// Torso height: average of the left and right shoulder-to-hip distances.
///
/// Degrades to a single side when the other is undeterminable, and to
/// `None` when neither side has both endpoints.
pub fn torso_height(pose: &PoseResult, topology: Topology, floor: f64) -> Option<f64> {
    let side = |shoulder: JointId, hip: JointId| -> Option<f64> {
        let s = pose.valid_point(topology, shoulder, floor)?;
        let h = pose.valid_point(topology, hip, floor)?;
        Some(s.distance(&h))
    };

    let left = side(JointId::LeftShoulder, JointId::LeftHip);
    let right = side(JointId::RightShoulder, JointId::RightHip);

    match (left, right) {
        (Some(l), Some(r)) => Some((l + r) / 2.0),
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strokelab_pose_model::Keypoint;

    fn pose(points: &[(JointId, f64, f64, f64)]) -> PoseResult {
        let mut keypoints = vec![Keypoint::new(0.0, 0.0, 0.0); 17];
        for (joint, x, y, score) in points {
            keypoints[Topology::Coco17.joint_index(*joint)] = Keypoint::new(*x, *y, *score);
        }
        PoseResult::new(keypoints)
    }

    #[test]
    fn test_anchor_is_core_mean() {
        let p = pose(&[
            (JointId::LeftShoulder, 0.0, 0.0, 0.9),
            (JointId::RightShoulder, 2.0, 0.0, 0.9),
            (JointId::LeftHip, 0.0, 4.0, 0.9),
            (JointId::RightHip, 2.0, 4.0, 0.9),
        ]);
        let anchor = body_center(&p, Topology::Coco17, 0.3).unwrap();
        assert_eq!(anchor, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_anchor_needs_two_core_joints() {
        let p = pose(&[(JointId::LeftShoulder, 0.0, 0.0, 0.9)]);
        assert!(body_center(&p, Topology::Coco17, 0.3).is_none());

        let p = pose(&[
            (JointId::LeftShoulder, 0.0, 0.0, 0.9),
            (JointId::RightHip, 4.0, 4.0, 0.9),
        ]);
        assert_eq!(
            body_center(&p, Topology::Coco17, 0.3),
            Some(Point::new(2.0, 2.0))
        );
    }

    #[test]
    fn test_torso_height_averages_sides() {
        let p = pose(&[
            (JointId::LeftShoulder, 0.0, 0.0, 0.9),
            (JointId::LeftHip, 0.0, 4.0, 0.9),
            (JointId::RightShoulder, 2.0, 0.0, 0.9),
            (JointId::RightHip, 2.0, 2.0, 0.9),
        ]);
        let torso = torso_height(&p, Topology::Coco17, 0.3).unwrap();
        assert!((torso - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_torso_height_degrades_to_one_side() {
        let p = pose(&[
            (JointId::LeftShoulder, 0.0, 0.0, 0.9),
            (JointId::LeftHip, 0.0, 4.0, 0.9),
        ]);
        assert_eq!(torso_height(&p, Topology::Coco17, 0.3), Some(4.0));
        assert_eq!(torso_height(&pose(&[]), Topology::Coco17, 0.3), None);
    }
}
