//! StrokeLab Pose Model
//!
//! Core data model for pose-stream analysis:
//! - **Keypoints** and canonical skeletal topologies (17- and 33-point)
//! - **Segments** and **angles**: static tables of named joint pairs/triples
//! - **Pose frames** and the frame-indexed `PoseMap`
//! - **Archives**: the serializable `(PoseMap, frame rate, model id)` tuple
//!
//! This crate is pure data — no I/O beyond archive save/load, no platform
//! dependencies.

pub mod archive;
pub mod frame;
pub mod geometry;
pub mod keypoint;
pub mod topology;

pub use archive::PoseArchive;
pub use frame::{BoundingBox, PoseFrame, PoseMap, PoseResult};
pub use geometry::Point;
pub use keypoint::{JointId, Keypoint, Side, Topology};
pub use topology::{AngleDefinition, SegmentDefinition, ANGLES, SEGMENTS};
