//! Clock and timing utilities.
//!
//! Frame-sequential components (the stabilizer's stale-history reset,
//! extraction progress reporting) measure elapsed wall-clock time against
//! a monotonic epoch captured when the run started.

use std::time::Instant;

/// A monotonic clock anchored to a fixed epoch (the moment a run started).
#[derive(Debug, Clone)]
pub struct AnalysisClock {
    /// The instant the run started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl AnalysisClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Get milliseconds elapsed since the run started.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Get seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at run start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = AnalysisClock::start();
        // Should be very small but non-negative
        assert!(clock.elapsed_secs() < 1.0);
    }

    #[test]
    fn test_epoch_wall_is_rfc3339() {
        let clock = AnalysisClock::start();
        assert!(chrono::DateTime::parse_from_rfc3339(clock.epoch_wall()).is_ok());
    }
}
