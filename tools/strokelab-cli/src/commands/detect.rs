//! Detect swings in a pose archive.

use std::path::PathBuf;

use strokelab_analysis_core::swing::{SwingConfig, SwingDetector};
use strokelab_pose_model::PoseArchive;

#[allow(clippy::too_many_arguments)]
pub fn run(
    path: PathBuf,
    json: bool,
    person: usize,
    smoothing_window: usize,
    percentile: f64,
    nms_window: f64,
    min_distance: f64,
    min_ratio: f64,
    direction_filter: bool,
) -> anyhow::Result<()> {
    let archive = PoseArchive::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load archive: {e}"))?;

    let config = SwingConfig {
        person_index: person,
        smoothing_window,
        peak_percentile: percentile,
        nms_window_secs: nms_window,
        min_distance_secs: min_distance,
        min_velocity_ratio: min_ratio,
        direction_filter,
        ..Default::default()
    };

    let analysis = SwingDetector::new(config).detect_archive(&archive)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis.events)?);
        return Ok(());
    }

    println!("Archive: {}", path.display());
    println!(
        "  {} frames @ {}fps ({:.1}s, {} gaps)",
        archive.frame_count(),
        archive.frame_rate,
        archive.duration_secs(),
        archive.gap_count()
    );
    println!();

    println!(
        "Detected {} swing(s), threshold {:.2} px/frame:",
        analysis.events.len(),
        analysis.threshold
    );
    for event in &analysis.events {
        println!(
            "  frame {:>6}  t={:>7.2}s  v={:>6.2}  ~{:>5.1} km/h  {:?} (symmetry {:.2}, confidence {:.2})",
            event.frame,
            event.timestamp_secs,
            event.velocity,
            event.estimated_speed_kmh,
            event.dominant_side,
            event.symmetry,
            event.confidence
        );
    }

    Ok(())
}
