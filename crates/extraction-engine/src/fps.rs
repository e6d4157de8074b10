//! Frame-rate probing.
//!
//! Frame indices only map to media times through an accurate frames-per-
//! second figure. Container metadata lies often enough that the engine
//! measures the real presentation cadence when the source supports
//! per-frame signals, and otherwise falls back to a caller estimate or
//! the configured default. Probing never fails extraction: every failure
//! mode resolves to a usable rate.

use std::time::Duration;

use crate::source::MediaSource;

/// Common video frame rates the measured figure snaps to.
pub const STANDARD_RATES: [f64; 6] = [24.0, 25.0, 30.0, 50.0, 60.0, 120.0];

/// Where a resolved frame rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRateSource {
    /// Measured from presented-frame media times.
    Measured,
    /// Trusted caller estimate.
    Nominal,
    /// The configured default, used when probing was impossible.
    Fallback,
}

/// A resolved frame rate with its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    pub fps: f64,
    pub source: FrameRateSource,
}

/// Strategy for determining a source's frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRateProbe {
    /// Play briefly and measure the spacing of presented frames.
    Presentation {
        /// Presentation timestamps to collect before measuring.
        samples: usize,
        /// Wall-clock budget for the whole measurement.
        budget: Duration,
    },
    /// Trust a caller-supplied rate without measuring.
    Nominal(f64),
}

impl Default for FrameRateProbe {
    fn default() -> Self {
        Self::Presentation {
            samples: 12,
            budget: Duration::from_millis(1200),
        }
    }
}

impl FrameRateProbe {
    /// Resolve the frame rate against a live source.
    ///
    /// Never errors: a failed or unsupported measurement resolves to
    /// `default_fps` with `Fallback` provenance.
    pub async fn resolve<S>(&self, source: &mut S, default_fps: f64) -> FrameRate
    where
        S: MediaSource + ?Sized,
    {
        match *self {
            Self::Nominal(fps) if fps > 0.0 => FrameRate {
                fps,
                source: FrameRateSource::Nominal,
            },
            Self::Nominal(fps) => {
                tracing::warn!(fps, "Ignoring non-positive nominal frame rate");
                FrameRate {
                    fps: default_fps,
                    source: FrameRateSource::Fallback,
                }
            }
            Self::Presentation { samples, budget } => {
                match measure_presentation_rate(source, samples, budget).await {
                    Some(measured) => {
                        let fps = snap_to_standard(measured);
                        tracing::debug!(measured, fps, "Frame rate measured");
                        FrameRate {
                            fps,
                            source: FrameRateSource::Measured,
                        }
                    }
                    None => {
                        tracing::debug!(
                            default_fps,
                            "Frame rate probe unavailable, using default"
                        );
                        FrameRate {
                            fps: default_fps,
                            source: FrameRateSource::Fallback,
                        }
                    }
                }
            }
        }
    }
}

/// Play the source and measure fps from presented-frame media times.
///
/// `None` when the source rejects playback, does not support presentation
/// signals, or too few samples arrive within the budget.
async fn measure_presentation_rate<S>(
    source: &mut S,
    samples: usize,
    budget: Duration,
) -> Option<f64>
where
    S: MediaSource + ?Sized,
{
    if source.play().await.is_err() {
        tracing::debug!("Source rejected play during frame rate probe");
        return None;
    }

    let deadline = tokio::time::Instant::now() + budget;
    let mut times: Vec<f64> = Vec::with_capacity(samples);
    while times.len() < samples {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, source.next_presented_frame()).await {
            Ok(Some(frame)) => times.push(frame.media_time_secs),
            // Unsupported on this source.
            Ok(None) => break,
            // Budget exhausted.
            Err(_) => break,
        }
    }

    if let Err(e) = source.pause().await {
        tracing::warn!(error = %e, "Failed to pause source after frame rate probe");
    }

    if times.len() < 2 {
        return None;
    }

    let mut deltas: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    deltas.retain(|d| *d > f64::EPSILON);
    if deltas.is_empty() {
        return None;
    }
    // Median spacing is robust against the odd stuttered frame.
    deltas.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = deltas[deltas.len() / 2];
    Some(1.0 / median)
}

/// Snap a measured rate to the nearest standard video rate.
fn snap_to_standard(measured: f64) -> f64 {
    STANDARD_RATES
        .iter()
        .copied()
        .min_by(|a, b| {
            (a - measured)
                .abs()
                .partial_cmp(&(b - measured).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(measured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedSource;

    #[test]
    fn test_snap_to_standard() {
        assert_eq!(snap_to_standard(29.97), 30.0);
        assert_eq!(snap_to_standard(23.5), 24.0);
        assert_eq!(snap_to_standard(59.1), 60.0);
        assert_eq!(snap_to_standard(118.0), 120.0);
    }

    #[tokio::test]
    async fn test_nominal_probe_trusts_caller() {
        let mut source = ScriptedSource::new(10.0, 30.0);
        let rate = FrameRateProbe::Nominal(25.0).resolve(&mut source, 30.0).await;
        assert_eq!(rate.fps, 25.0);
        assert_eq!(rate.source, FrameRateSource::Nominal);
    }

    #[tokio::test]
    async fn test_non_positive_nominal_falls_back() {
        let mut source = ScriptedSource::new(10.0, 30.0);
        let rate = FrameRateProbe::Nominal(0.0).resolve(&mut source, 30.0).await;
        assert_eq!(rate.fps, 30.0);
        assert_eq!(rate.source, FrameRateSource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_presentation_probe_measures_cadence() {
        let mut source = ScriptedSource::new(10.0, 60.0);
        let rate = FrameRateProbe::default().resolve(&mut source, 30.0).await;
        assert_eq!(rate.fps, 60.0);
        assert_eq!(rate.source, FrameRateSource::Measured);
        assert!(!source.playing(), "probe must pause the source when done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_presentation_signal_falls_back() {
        let mut source = ScriptedSource::new(10.0, 60.0).without_presentation_signal();
        let rate = FrameRateProbe::default().resolve(&mut source, 30.0).await;
        assert_eq!(rate.fps, 30.0);
        assert_eq!(rate.source, FrameRateSource::Fallback);
    }
}
