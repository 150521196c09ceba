//! Chainage track reconstruction.
//!
//! Two pure stages over the per-frame readings, always in this order:
//! 1. median smoothing - knocks out single-frame misreads without dragging
//!    neighbours towards the outlier
//! 2. monotonicity - the camera only moves forward, so a reading that drops
//!    more than the tolerance below the running maximum is rejected
//!
//! Both stages return a new sequence with the same length and frame order.

use log::debug;

use super::reading::FrameReading;
use crate::config::OcrConfig;

/// Smallest window that smooths anything.
pub const MIN_SMOOTH_WINDOW: usize = 3;

/// A reconstructed track plus its quality.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainageTrack {
    pub readings: Vec<FrameReading>,
}

impl ChainageTrack {
    pub fn reconstruct(readings: &[FrameReading], config: &OcrConfig) -> Self {
        let smoothed = smooth_median(readings, config.smooth_window);
        let readings = if config.monotonic_check {
            enforce_monotonic(&smoothed, config.monotonic_tolerance_m)
        } else {
            smoothed
        };
        Self { readings }
    }

    pub fn total_count(&self) -> usize {
        self.readings.len()
    }

    pub fn valid_count(&self) -> usize {
        self.readings.iter().filter(|r| r.valid).count()
    }

    pub fn quality(&self) -> f64 {
        track_quality(&self.readings)
    }
}

/// Replace each valid position with the median of the valid positions in a
/// window of `window` frames centred on it. The window includes the frame's
/// own reading, so a frame without valid neighbours keeps its value. The
/// input positions are read, never the partially smoothed output.
pub fn smooth_median(readings: &[FrameReading], window: usize) -> Vec<FrameReading> {
    if window < MIN_SMOOTH_WINDOW {
        return readings.to_vec();
    }

    let positions: Vec<Option<f64>> = readings.iter().map(|r| r.usable_position()).collect();
    let half = window / 2;
    let mut changed = 0usize;

    let smoothed = readings
        .iter()
        .enumerate()
        .map(|(i, reading)| {
            if positions[i].is_none() {
                return reading.clone();
            }

            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(positions.len());
            let mut values: Vec<f64> = positions[start..end].iter().flatten().copied().collect();
            values.sort_by(|a, b| a.total_cmp(b));

            // upper median: always an observed reading
            let median = values[values.len() / 2];
            if Some(median) != reading.position_m {
                changed += 1;
            }
            FrameReading {
                position_m: Some(median),
                ..reading.clone()
            }
        })
        .collect();

    debug!("median smoothing (window {}) moved {} readings", window, changed);
    smoothed
}

/// Reject readings that fall more than `tolerance_m` below the running
/// maximum of accepted readings. Invalid readings are passed through and do
/// not move the maximum, which makes the pass idempotent.
pub fn enforce_monotonic(readings: &[FrameReading], tolerance_m: f64) -> Vec<FrameReading> {
    let mut last_valid: Option<f64> = None;

    readings
        .iter()
        .map(|reading| {
            let Some(position) = reading.usable_position() else {
                return reading.clone();
            };

            match last_valid {
                Some(last) if position < last - tolerance_m => FrameReading {
                    valid: false,
                    issue: Some(format!(
                        "non-monotonic: {:.2}m after {:.2}m",
                        position, last
                    )),
                    ..reading.clone()
                },
                Some(last) => {
                    last_valid = Some(last.max(position));
                    reading.clone()
                }
                None => {
                    last_valid = Some(position);
                    reading.clone()
                }
            }
        })
        .collect()
}

/// Share of valid readings, 0 for an empty track.
pub fn track_quality(readings: &[FrameReading]) -> f64 {
    if readings.is_empty() {
        return 0.0;
    }
    let valid = readings.iter().filter(|r| r.valid).count();
    valid as f64 / readings.len() as f64
}
