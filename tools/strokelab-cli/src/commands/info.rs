//! Show archive information.

use std::path::PathBuf;

use strokelab_pose_model::PoseArchive;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let archive = PoseArchive::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load archive: {e}"))?;

    println!("Archive: {}", path.display());
    println!("  Version: {}", archive.version);
    println!("  Model: {}", archive.model);
    println!("  Topology: {:?}", archive.topology);
    println!("  Created: {}", archive.created_at);
    println!();

    println!("Frames:");
    println!("  Total: {}", archive.frame_count());
    println!("  Gaps: {}", archive.gap_count());
    println!(
        "  Duration: {:.1}s @ {}fps",
        archive.duration_secs(),
        archive.frame_rate
    );

    let scores: Vec<f64> = archive
        .frames
        .values()
        .filter_map(|poses| poses.first())
        .filter_map(|pose| pose.mean_score())
        .collect();
    if !scores.is_empty() {
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        println!("  Mean confidence: {mean:.3}");
    }

    Ok(())
}
