use crate::config::KeyframeConfig;
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::events::DamageEvent;
use crate::core::ocr::FrameReading;

/// Frames picked for one event, in position order.
#[derive(Debug, Clone)]
pub struct Alignment<'a> {
    pub start_m: f64,
    pub end_m: f64,
    pub frames: Vec<&'a FrameReading>,
}

/// Maps events onto the valid part of a chainage track.
pub struct EventFrameAligner<'a> {
    /// valid frames ordered by (position, frame index)
    frames: Vec<&'a FrameReading>,
    config: KeyframeConfig,
}

impl<'a> EventFrameAligner<'a> {
    /// Fails with `NoValidFrames` when nothing in the track is usable:
    /// no event could be anchored, so there is nothing to fall back to.
    pub fn new(track: &'a [FrameReading], config: &KeyframeConfig) -> PipelineResult<Self> {
        config.validate()?;
        let mut frames: Vec<&FrameReading> =
            track.iter().filter(|r| r.usable_position().is_some()).collect();
        if frames.is_empty() {
            return Err(PipelineError::NoValidFrames);
        }
        frames.sort_by(|a, b| {
            position(a)
                .total_cmp(&position(b))
                .then(a.frame_index.cmp(&b.frame_index))
        });
        Ok(Self {
            frames,
            config: config.clone(),
        })
    }

    pub fn valid_frame_count(&self) -> usize {
        self.frames.len()
    }

    /// `None` for events without a spatial anchor.
    pub fn align(&self, event: &DamageEvent) -> Option<Alignment<'a>> {
        let (start_m, end_m) = event.span_m()?;
        Some(Alignment {
            start_m,
            end_m,
            frames: self.select(start_m, end_m),
        })
    }

    /// Frames within `[start - margin, end + margin]`, or the single nearest
    /// frame to `start` when the window is empty, thinned to `per_event`.
    pub fn select(&self, start_m: f64, end_m: f64) -> Vec<&'a FrameReading> {
        let search_start = start_m - self.config.margin_m;
        let search_end = end_m + self.config.margin_m;

        let mut candidates: Vec<&'a FrameReading> = self
            .frames
            .iter()
            .copied()
            .filter(|r| {
                let p = position(r);
                search_start <= p && p <= search_end
            })
            .collect();

        if candidates.is_empty() {
            // OCR 空档：退回到最近的有效帧
            let nearest = self
                .frames
                .iter()
                .copied()
                .min_by(|a, b| {
                    (position(a) - start_m)
                        .abs()
                        .total_cmp(&(position(b) - start_m).abs())
                });
            candidates.extend(nearest);
        }

        spread_sample(candidates, self.config.per_event)
    }
}

/// Keep at most `target` items, taken at evenly spaced indices.
pub fn spread_sample<T>(items: Vec<T>, target: usize) -> Vec<T> {
    if items.len() <= target {
        return items;
    }
    let len = items.len();
    let picks: Vec<usize> = (0..target).map(|i| i * len / target).collect();
    items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| picks.contains(idx))
        .map(|(_, item)| item)
        .collect()
}

fn position(reading: &FrameReading) -> f64 {
    reading.position_m.unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(positions: &[Option<f64>]) -> Vec<FrameReading> {
        let texts: Vec<String> = positions
            .iter()
            .map(|p| p.map(|v| format!("{:.2}", v)).unwrap_or_default())
            .collect();
        FrameReading::from_texts(&texts, 3.0)
    }

    fn event(start: Option<f64>, end: Option<f64>) -> DamageEvent {
        DamageEvent {
            event_id: Some("e".into()),
            start_m: start,
            end_m: end,
            ..Default::default()
        }
    }

    fn indices(frames: &[&FrameReading]) -> Vec<u64> {
        frames.iter().map(|f| f.frame_index).collect()
    }

    #[test]
    fn test_spread_sample_indices() {
        assert_eq!(spread_sample((0..10).collect(), 3), vec![0, 3, 6]);
        assert_eq!(spread_sample((0..7).collect(), 3), vec![0, 2, 4]);
        assert_eq!(spread_sample(vec![1, 2], 3), vec![1, 2]);
    }

    #[test]
    fn test_window_with_margin() {
        let readings = track(&[Some(0.0), Some(0.5), Some(0.8), Some(1.0), Some(1.4), Some(2.0)]);
        let aligner = EventFrameAligner::new(&readings, &KeyframeConfig::default()).expect("aligner");
        // 1.0 +/- 0.3 -> [0.7, 1.3]
        let picked = aligner.align(&event(Some(1.0), None)).expect("anchored");
        assert_eq!(indices(&picked.frames), vec![2, 3]);
        assert_eq!((picked.start_m, picked.end_m), (1.0, 1.0));
    }

    #[test]
    fn test_count_capped_and_spread() {
        let readings = track(&(0..10).map(|i| Some(10.0 + i as f64 * 0.1)).collect::<Vec<_>>());
        let aligner = EventFrameAligner::new(&readings, &KeyframeConfig::default()).expect("aligner");
        let picked = aligner.select(10.0, 10.9);
        assert_eq!(indices(&picked), vec![0, 3, 6]);

        let positions: Vec<f64> = picked.iter().map(|f| f.position_m.unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_gap_falls_back_to_nearest() {
        let readings = track(&[Some(1.0), Some(2.0), None, Some(9.0)]);
        let aligner = EventFrameAligner::new(&readings, &KeyframeConfig::default()).expect("aligner");
        let picked = aligner.select(7.0, 7.5);
        assert_eq!(indices(&picked), vec![3]);
        let picked = aligner.select(4.0, 4.0);
        assert_eq!(indices(&picked), vec![1]);
    }

    #[test]
    fn test_every_anchored_event_gets_a_frame() {
        let readings = track(&[None, Some(3.3), None]);
        let aligner = EventFrameAligner::new(&readings, &KeyframeConfig::default()).expect("aligner");
        for start in [-100.0, 0.0, 3.3, 50.0, 1e6] {
            let picked = aligner.align(&event(Some(start), None)).expect("anchored");
            assert_eq!(picked.frames.len(), 1);
        }
    }

    #[test]
    fn test_unanchored_event_skipped() {
        let readings = track(&[Some(1.0)]);
        let aligner = EventFrameAligner::new(&readings, &KeyframeConfig::default()).expect("aligner");
        assert!(aligner.align(&event(None, Some(2.0))).is_none());
    }

    #[test]
    fn test_invalid_frames_ignored() {
        let mut readings = track(&[Some(1.0), Some(1.1), Some(1.2)]);
        readings[1].valid = false;
        let aligner = EventFrameAligner::new(&readings, &KeyframeConfig::default()).expect("aligner");
        assert_eq!(aligner.valid_frame_count(), 2);
        assert_eq!(indices(&aligner.select(1.0, 1.2)), vec![0, 2]);
    }

    #[test]
    fn test_no_valid_frames_is_an_error() {
        let readings = track(&[None, None]);
        let err = EventFrameAligner::new(&readings, &KeyframeConfig::default())
            .err()
            .expect("must fail");
        assert_eq!(err.error_type(), "NoValidFrames");
    }
}
