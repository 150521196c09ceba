//! NONE down-sampling, applied to one split at a time.

use rand::seq::SliceRandom;
use rand::Rng;

use super::sample::TrainingSample;

/// Down-sample NONE samples of a single split towards
/// `floor(positives * negative_ratio)`.
///
/// Returns the kept samples in their input order and the number dropped.
/// A negative ratio disables balancing, zero drops every NONE sample.
pub fn balance_split<R: Rng + ?Sized>(
    samples: Vec<TrainingSample>,
    negative_ratio: f64,
    rng: &mut R,
) -> (Vec<TrainingSample>, usize) {
    if negative_ratio < 0.0 {
        return (samples, 0);
    }

    let mut negatives: Vec<usize> = samples
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_negative())
        .map(|(i, _)| i)
        .collect();
    let positives = samples.len() - negatives.len();

    let target = if negative_ratio == 0.0 {
        0
    } else {
        if positives == 0 || negatives.is_empty() {
            return (samples, 0);
        }
        (positives as f64 * negative_ratio).floor() as usize
    };
    if target >= negatives.len() {
        return (samples, 0);
    }

    negatives.shuffle(rng);
    let mut dropped = vec![false; samples.len()];
    for &idx in &negatives[target..] {
        dropped[idx] = true;
    }
    let discarded = negatives.len() - target;

    let kept = samples
        .into_iter()
        .zip(dropped)
        .filter(|(_, drop)| !drop)
        .map(|(s, _)| s)
        .collect();
    (kept, discarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::sample::Split;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample(i: usize, label: &str) -> TrainingSample {
        TrainingSample {
            sample_id: format!("s{}", i),
            event_id: format!("e{}", i),
            video_id: String::new(),
            unit_id: "H1".into(),
            label: label.into(),
            severity: None,
            start_m: i as f64,
            end_m: i as f64,
            start_time_s: None,
            end_time_s: None,
            keyframes: vec![],
            source: "xtf_auto".into(),
            split: Split::Train,
        }
    }

    fn mixed(positives: usize, negatives: usize) -> Vec<TrainingSample> {
        let mut out: Vec<TrainingSample> = (0..negatives).map(|i| sample(i, "NONE")).collect();
        out.extend((0..positives).map(|i| sample(100 + i, "RISS")));
        out
    }

    fn count_none(samples: &[TrainingSample]) -> usize {
        samples.iter().filter(|s| s.is_negative()).count()
    }

    #[test]
    fn test_down_samples_to_target() {
        let mut rng = StdRng::seed_from_u64(42);
        let (kept, dropped) = balance_split(mixed(10, 8), 0.3, &mut rng);
        assert_eq!(count_none(&kept), 3);
        assert_eq!(dropped, 5);
        assert_eq!(kept.len(), 13);
    }

    #[test]
    fn test_keeps_input_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let (kept, _) = balance_split(mixed(4, 6), 0.5, &mut rng);
        let positions: Vec<f64> = kept.iter().map(|s| s.start_m).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_never_adds_negatives() {
        let mut rng = StdRng::seed_from_u64(0);
        let (kept, dropped) = balance_split(mixed(10, 2), 0.5, &mut rng);
        assert_eq!(count_none(&kept), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_zero_ratio_drops_all_negatives() {
        let mut rng = StdRng::seed_from_u64(0);
        let (kept, dropped) = balance_split(mixed(0, 4), 0.0, &mut rng);
        assert!(kept.is_empty());
        assert_eq!(dropped, 4);
    }

    #[test]
    fn test_negative_ratio_disables() {
        let mut rng = StdRng::seed_from_u64(0);
        let (kept, dropped) = balance_split(mixed(1, 9), -1.0, &mut rng);
        assert_eq!(kept.len(), 10);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_split_without_positives_untouched() {
        let mut rng = StdRng::seed_from_u64(0);
        let (kept, dropped) = balance_split(mixed(0, 5), 0.3, &mut rng);
        assert_eq!(kept.len(), 5);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_seeded_selection_repeats() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            balance_split(mixed(5, 9), 0.4, &mut rng)
                .0
                .into_iter()
                .map(|s| s.sample_id)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }
}
