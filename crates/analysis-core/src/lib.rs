//! StrokeLab Analysis Core
//!
//! Analyzes extracted pose streams to produce editing and coaching signals:
//! - **Joint Stabilization:** per-joint velocity-based noise suppression
//! - **Pose Stability Filter:** banana-frame detection and mirror recovery
//! - **Joint History:** relative-metric series for charting
//! - **Swing Detection:** peak extraction over a body-relative velocity series
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data. Components that keep history
//! must be driven by calls in increasing time order.

pub mod anchor;
pub mod history;
pub mod stabilize;
pub mod stability;
pub mod swing;

pub use history::JointHistoryRecorder;
pub use stabilize::JointStabilizer;
pub use stability::{StabilityFilter, StabilityState};
pub use swing::{SwingAnalysis, SwingDetector, SwingEvent};
