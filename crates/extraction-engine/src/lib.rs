//! StrokeLab Extraction Engine
//!
//! Walks a media source frame by frame, runs a pose estimator on every
//! frame, and assembles the results into a frame-indexed pose archive.
//! The media source and the estimator both stay behind traits; this crate
//! owns only the orchestration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Extractor                    │
//! │  ┌────────────┐   ┌───────────────────────┐  │
//! │  │ MediaSource│──▶│ seek ▸ grab ▸ estimate │  │
//! │  └────────────┘   └───────────┬───────────┘  │
//! │  ┌────────────┐               ▼              │
//! │  │ FrameRate  │   ┌───────────────────────┐  │
//! │  │   Probe    │   │  PoseMap / PoseArchive │  │
//! │  └────────────┘   └───────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod extractor;
pub mod fps;
pub mod scripted;
pub mod source;

pub use extractor::{ExtractionConfig, ExtractionOutcome, ExtractionProgress, Extractor};
pub use fps::{FrameRate, FrameRateProbe, FrameRateSource};
pub use source::{MediaSource, PoseEstimator, PresentedFrame, VideoFrame};
