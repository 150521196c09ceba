//! 训练数据集构建 - 按单元划分 train/val/test 并平衡 NONE 样本

pub mod balance;
pub mod partition;
pub mod sample;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::{DatasetConfig, SplitRatios};
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::events::{DamageEvent, EventSource, JsonlEventSource};
use crate::core::jsonl::{write_jsonl, write_pretty_json};
use crate::core::keyframes::{event_dir_name, KEYFRAME_PREFIX};

pub use balance::balance_split;
pub use partition::{assign_units, split_sizes, UnitAssignment};
pub use sample::{Split, SplitCounts, TrainingSample};

pub const METADATA_FILE: &str = "metadata.json";

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub seed: u64,
    pub ratios: SplitRatios,
    /// samples per split, after balancing
    pub splits: SplitCounts,
    pub units: SplitCounts,
    pub label_distribution: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
    pub missing_keyframes_count: usize,
    pub downsampled_none_count: usize,
    pub negative_ratio: f64,
    pub min_samples_per_class: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub output_dir: PathBuf,
    pub total_samples: usize,
    #[serde(flatten)]
    pub metadata: DatasetMetadata,
}

/// Build `train.jsonl`, `val.jsonl`, `test.jsonl` and `metadata.json` from
/// the event files in `events_dir` and the keyframe directories produced by
/// the keyframe step.
pub fn build_dataset(
    events_dir: &Path,
    keyframes_dir: &Path,
    output_dir: &Path,
    config: &DatasetConfig,
) -> PipelineResult<DatasetSummary> {
    config.validate()?;
    if !events_dir.exists() {
        return Err(PipelineError::input_missing("events directory", events_dir));
    }

    let events = JsonlEventSource::new(events_dir)
        .with_code_mapping(config.map_type_codes)
        .load()?;
    if events.is_empty() {
        return Err(PipelineError::EmptyInput(format!(
            "no events found in {}",
            events_dir.display()
        )));
    }

    let units: Vec<String> = events
        .iter()
        .map(|e| e.unit().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // 同一个 rng 先洗牌单元，再依次平衡各个 split
    let mut rng = StdRng::seed_from_u64(config.seed);
    let assignment = assign_units(&units, &config.ratios, &mut rng);
    info!(
        "🧩 {} events over {} units -> units train={} val={} test={}",
        events.len(),
        units.len(),
        assignment.unit_counts().train,
        assignment.unit_counts().val,
        assignment.unit_counts().test
    );

    let mut missing_keyframes_count = 0usize;
    let mut by_split: BTreeMap<Split, Vec<TrainingSample>> = BTreeMap::new();
    for event in &events {
        let keyframes = match find_keyframes(keyframes_dir, event)? {
            Some(paths) => paths,
            None => {
                missing_keyframes_count += 1;
                Vec::new()
            }
        };
        let split = assignment.split_of(event.unit());
        by_split
            .entry(split)
            .or_default()
            .push(TrainingSample::from_event(event, split, keyframes));
    }

    let mut downsampled_none_count = 0usize;
    let mut splits = SplitCounts::default();
    let mut label_distribution: BTreeMap<String, usize> = BTreeMap::new();
    fs::create_dir_all(output_dir)?;

    for split in Split::ALL {
        let samples = by_split.remove(&split).unwrap_or_default();
        let (kept, dropped) = balance_split(samples, config.negative_ratio, &mut rng);
        downsampled_none_count += dropped;
        splits.add(split, kept.len());
        for sample in &kept {
            *label_distribution.entry(sample.label.clone()).or_default() += 1;
        }
        write_jsonl(&output_dir.join(split.file_name()), &kept)?;
    }

    let mut warnings: Vec<String> = label_distribution
        .iter()
        .filter(|(_, count)| **count < config.min_samples_per_class)
        .map(|(label, count)| {
            format!(
                "Class '{}' has only {} samples (min: {})",
                label, count, config.min_samples_per_class
            )
        })
        .collect();
    if missing_keyframes_count > 0 {
        warnings.push(format!(
            "{} events without keyframe directory",
            missing_keyframes_count
        ));
    }
    for warning in &warnings {
        warn!("⚠️ {}", warning);
    }

    let metadata = DatasetMetadata {
        seed: config.seed,
        ratios: config.ratios,
        splits,
        units: assignment.unit_counts(),
        label_distribution,
        warnings,
        missing_keyframes_count,
        downsampled_none_count,
        negative_ratio: config.negative_ratio,
        min_samples_per_class: config.min_samples_per_class,
    };
    write_pretty_json(&output_dir.join(METADATA_FILE), &metadata)?;

    info!(
        "✅ Dataset written: train={} val={} test={} (dropped {} NONE)",
        splits.train, splits.val, splits.test, downsampled_none_count
    );
    Ok(DatasetSummary {
        output_dir: output_dir.to_path_buf(),
        total_samples: splits.total(),
        metadata,
    })
}

/// Sorted `keyframe_*` files of the event, `None` when its directory is absent.
fn find_keyframes(keyframes_dir: &Path, event: &DamageEvent) -> PipelineResult<Option<Vec<String>>> {
    let dir = keyframes_dir.join(event_dir_name(&event.resolved_id()));
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(KEYFRAME_PREFIX))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(Some(
        paths
            .into_iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect(),
    ))
}
