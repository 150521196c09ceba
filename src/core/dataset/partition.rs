//! Unit-level split assignment.
//!
//! Samples are never split individually: a unit (holding) goes to exactly one
//! split and every sample of that unit follows it.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::sample::{Split, SplitCounts};
use crate::config::SplitRatios;

/// Absorbs float noise such as `100 * 0.29 = 28.999999999999996`.
const FLOOR_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct UnitAssignment {
    by_unit: BTreeMap<String, Split>,
    counts: SplitCounts,
}

impl UnitAssignment {
    /// Units that were never assigned land in test.
    pub fn split_of(&self, unit: &str) -> Split {
        self.by_unit.get(unit).copied().unwrap_or(Split::Test)
    }

    pub fn unit_counts(&self) -> SplitCounts {
        self.counts
    }

    pub fn units_in(&self, split: Split) -> impl Iterator<Item = &str> {
        self.by_unit
            .iter()
            .filter(move |(_, s)| **s == split)
            .map(|(unit, _)| unit.as_str())
    }
}

/// Number of train and val units for `n` units; test takes the rest.
pub fn split_sizes(n: usize, ratios: &SplitRatios) -> (usize, usize) {
    let floor = |ratio: f64| (n as f64 * ratio + FLOOR_EPSILON).floor() as usize;
    let mut n_train = floor(ratios.train).min(n);
    let mut n_val = floor(ratios.val);

    if n > 0 && n_train == 0 {
        n_train = 1;
    }
    if n_train + n_val > n {
        n_val = n - n_train;
    }
    (n_train, n_val)
}

/// Shuffle `units` with `rng` and cut the result into train/val/test.
/// Callers pass units in a fixed order so the result only depends on the seed.
pub fn assign_units<R: Rng + ?Sized>(
    units: &[String],
    ratios: &SplitRatios,
    rng: &mut R,
) -> UnitAssignment {
    let mut shuffled: Vec<&String> = units.iter().collect();
    shuffled.dedup();
    shuffled.shuffle(rng);

    let (n_train, n_val) = split_sizes(shuffled.len(), ratios);
    let mut assignment = UnitAssignment::default();
    for (i, unit) in shuffled.into_iter().enumerate() {
        let split = if i < n_train {
            Split::Train
        } else if i < n_train + n_val {
            Split::Val
        } else {
            Split::Test
        };
        assignment.by_unit.insert(unit.clone(), split);
        assignment.counts.add(split, 1);
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn units(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("H{:03}", i)).collect()
    }

    fn ratios(train: f64, val: f64, test: f64) -> SplitRatios {
        SplitRatios { train, val, test }
    }

    #[test]
    fn test_split_sizes() {
        assert_eq!(split_sizes(4, &ratios(0.5, 0.25, 0.25)), (2, 1));
        assert_eq!(split_sizes(10, &SplitRatios::default()), (7, 1));
        assert_eq!(split_sizes(20, &SplitRatios::default()), (14, 3));
        assert_eq!(split_sizes(0, &SplitRatios::default()), (0, 0));
        assert_eq!(split_sizes(100, &ratios(0.29, 0.29, 0.42)), (29, 29));
    }

    #[test]
    fn test_single_unit_forced_into_train() {
        assert_eq!(split_sizes(1, &ratios(0.3, 0.4, 0.3)), (1, 0));
        let mut rng = StdRng::seed_from_u64(1);
        let assignment = assign_units(&units(1), &ratios(0.3, 0.4, 0.3), &mut rng);
        assert_eq!(assignment.split_of("H000"), Split::Train);
    }

    #[test]
    fn test_val_shrinks_when_train_was_forced() {
        assert_eq!(split_sizes(2, &ratios(0.0, 1.0, 0.0)), (1, 1));
        assert_eq!(split_sizes(1, &ratios(0.0, 1.0, 0.0)), (1, 0));
    }

    #[test]
    fn test_assignment_is_exhaustive_and_disjoint() {
        let all = units(13);
        let mut rng = StdRng::seed_from_u64(42);
        let assignment = assign_units(&all, &SplitRatios::default(), &mut rng);

        let counts = assignment.unit_counts();
        assert_eq!(counts.total(), 13);
        assert_eq!(counts.train, 9);
        let mut seen: Vec<&str> = Split::ALL
            .iter()
            .flat_map(|s| assignment.units_in(*s))
            .collect();
        seen.sort();
        assert_eq!(seen, all.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_partition() {
        let all = units(30);
        let a = assign_units(&all, &SplitRatios::default(), &mut StdRng::seed_from_u64(7));
        let b = assign_units(&all, &SplitRatios::default(), &mut StdRng::seed_from_u64(7));
        for unit in &all {
            assert_eq!(a.split_of(unit), b.split_of(unit));
        }
    }
}
