//! Replay an archive through the stability filter and dump one metric series.

use std::path::PathBuf;

use strokelab_analysis_core::history::{HistoryConfig, JointHistoryRecorder};
use strokelab_analysis_core::stability::{StabilityConfig, StabilityFilter};
use strokelab_pose_model::PoseArchive;

pub fn run(path: PathBuf, kind: String, name: String) -> anyhow::Result<()> {
    let archive = PoseArchive::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load archive: {e}"))?;

    let mut filter = StabilityFilter::new(StabilityConfig {
        topology: archive.topology,
        ..Default::default()
    });
    let mut recorder = JointHistoryRecorder::new(HistoryConfig {
        topology: archive.topology,
        // Keep the full clip; the ring cap is for live sessions.
        max_len: archive.frame_count().max(1),
        ..Default::default()
    });

    for frame in archive.pose_frames() {
        match frame.poses.first() {
            Some(pose) => {
                let (repaired, assessment) = filter.process(pose);
                recorder.record(
                    Some(&repaired),
                    frame.frame_index,
                    frame.timestamp_secs,
                    assessment.corrupted,
                );
            }
            None => recorder.record(None, frame.frame_index, frame.timestamp_secs, false),
        }
    }

    let json = match kind.as_str() {
        "segment" => {
            let series = recorder
                .segment_series(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown segment series: {name}"))?;
            serde_json::to_string_pretty(series)?
        }
        "angle" => {
            let series = recorder
                .angle_series(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown angle series: {name}"))?;
            serde_json::to_string_pretty(series)?
        }
        "acceleration" => {
            let series = recorder
                .acceleration_series(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown acceleration series: {name}"))?;
            serde_json::to_string_pretty(series)?
        }
        other => anyhow::bail!("Unknown series kind: {other} (expected segment, angle, or acceleration)"),
    };

    println!("{json}");
    Ok(())
}
