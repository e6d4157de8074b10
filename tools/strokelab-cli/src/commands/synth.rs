//! Generate a synthetic swing archive.
//!
//! Runs the real extraction loop against the scripted source/estimator
//! pair, so the whole pipeline gets exercised without a video file or an
//! inference backend.

use std::path::PathBuf;

use strokelab_extraction_engine::scripted::{ScriptedEstimator, ScriptedSource};
use strokelab_extraction_engine::{
    ExtractionConfig, ExtractionOutcome, Extractor, FrameRateProbe,
};

pub async fn run(output: PathBuf, duration: f64, fps: f64) -> anyhow::Result<()> {
    let mut source = ScriptedSource::new(duration, fps);
    let mut estimator = ScriptedEstimator::new(fps);
    let extractor = Extractor::new(ExtractionConfig {
        probe: FrameRateProbe::Nominal(fps),
        ..Default::default()
    });

    let outcome = extractor
        .extract(&mut source, &mut estimator, |p| {
            if p.frames_done % 100 == 0 {
                tracing::debug!(
                    frames_done = p.frames_done,
                    frames_total = p.frames_total,
                    "Synthesizing"
                );
            }
        })
        .await?;

    let archive = match outcome {
        ExtractionOutcome::Completed(archive) => archive,
        ExtractionOutcome::Aborted { frames_done, .. } => {
            anyhow::bail!("Synthesis aborted after {frames_done} frames")
        }
    };

    archive
        .save(&output)
        .map_err(|e| anyhow::anyhow!("Failed to save archive: {e}"))?;

    println!(
        "Wrote {} frames ({:.1}s @ {}fps) to {}",
        archive.frame_count(),
        archive.duration_secs(),
        archive.frame_rate,
        output.display()
    );
    Ok(())
}
