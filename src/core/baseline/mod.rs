//! Majority-class baseline: predicts the most frequent train label for every
//! sample. Serves as the evaluation floor for real models.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::core::dataset::Split;
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::events::normalize_label;
use crate::core::jsonl::{read_jsonl_lenient, write_pretty_json};

pub const DEFAULT_MODEL_NAME: &str = "baseline_majority";
pub const MODEL_TYPE: &str = "majority_class_baseline";

/// Only the label matters for the baseline.
#[derive(Debug, Deserialize)]
struct LabeledRow {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub support: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitMetrics {
    pub sample_count: usize,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub per_class: BTreeMap<String, ClassMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineModel {
    pub model_name: String,
    pub model_type: String,
    pub majority_label: String,
    pub label_distribution_train: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub model_name: String,
    pub majority_label: String,
    pub splits: BTreeMap<Split, SplitMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BaselineSummary {
    pub output_dir: PathBuf,
    pub model_name: String,
    pub majority_label: String,
    pub train_samples: usize,
    pub val_samples: usize,
    pub test_samples: usize,
    pub train_accuracy: f64,
    pub val_accuracy: f64,
    pub test_accuracy: f64,
}

/// Most frequent label; ties go to the lexicographically smallest.
pub fn majority_label(counts: &BTreeMap<String, usize>) -> Option<&str> {
    // BTreeMap 按键升序，严格大于才替换，平局保留较小的标签
    let mut best: Option<(&str, usize)> = None;
    for (label, &count) in counts {
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((label.as_str(), count));
        }
    }
    best.map(|(label, _)| label)
}

/// Score a constant prediction against `truth`.
pub fn evaluate(truth: &[String], predicted: &str) -> SplitMetrics {
    if truth.is_empty() {
        return SplitMetrics::default();
    }

    let total = truth.len();
    let correct = truth.iter().filter(|l| *l == predicted).count();

    let mut classes: BTreeSet<&str> = truth.iter().map(String::as_str).collect();
    classes.insert(predicted);

    let mut per_class = BTreeMap::new();
    for class in &classes {
        let support = truth.iter().filter(|l| l == class).count();
        let (tp, fp, fn_) = if *class == predicted {
            (support, total - support, 0)
        } else {
            (0, 0, support)
        };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        per_class.insert(
            class.to_string(),
            ClassMetrics {
                support,
                precision,
                recall,
                f1,
            },
        );
    }

    let macro_f1 = per_class.values().map(|m| m.f1).sum::<f64>() / per_class.len() as f64;
    SplitMetrics {
        sample_count: total,
        accuracy: ratio(correct, total),
        macro_f1,
        per_class,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn read_labels(path: &Path) -> PipelineResult<Vec<String>> {
    let rows: Vec<LabeledRow> = read_jsonl_lenient(path)?;
    Ok(rows
        .iter()
        .map(|r| normalize_label(r.label.as_deref()))
        .collect())
}

/// Train on `train.jsonl` in `dataset_dir`, evaluate all splits and write
/// `model_baseline.json`, `metrics.json` and `label_map.json` to `output_dir`.
pub fn train_baseline(
    dataset_dir: &Path,
    output_dir: &Path,
    model_name: &str,
) -> PipelineResult<BaselineSummary> {
    if !dataset_dir.exists() {
        return Err(PipelineError::input_missing("dataset directory", dataset_dir));
    }

    let mut labels: BTreeMap<Split, Vec<String>> = BTreeMap::new();
    for split in Split::ALL {
        labels.insert(split, read_labels(&dataset_dir.join(split.file_name()))?);
    }
    let train = labels.get(&Split::Train).map(Vec::as_slice).unwrap_or_default();

    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for label in train {
        *distribution.entry(label.clone()).or_default() += 1;
    }
    let majority = majority_label(&distribution)
        .ok_or_else(|| PipelineError::EmptyInput("train.jsonl is missing or empty".to_string()))?
        .to_string();
    info!(
        "🏷️ Majority label {} ({} train samples, {} classes)",
        majority,
        train.len(),
        distribution.len()
    );

    let splits: BTreeMap<Split, SplitMetrics> = labels
        .iter()
        .map(|(split, truth)| (*split, evaluate(truth, &majority)))
        .collect();

    let model = BaselineModel {
        model_name: model_name.to_string(),
        model_type: MODEL_TYPE.to_string(),
        majority_label: majority.clone(),
        label_distribution_train: distribution.clone(),
    };
    let report = MetricsReport {
        model_name: model_name.to_string(),
        majority_label: majority.clone(),
        splits,
    };
    let label_map = serde_json::json!({ "labels": distribution.keys().collect::<Vec<_>>() });

    write_pretty_json(&output_dir.join("model_baseline.json"), &model)?;
    write_pretty_json(&output_dir.join("metrics.json"), &report)?;
    write_pretty_json(&output_dir.join("label_map.json"), &label_map)?;

    let metric = |split: Split| report.splits.get(&split).cloned().unwrap_or_default();
    let (train_m, val_m, test_m) = (metric(Split::Train), metric(Split::Val), metric(Split::Test));
    info!(
        "✅ Baseline accuracy train={:.3} val={:.3} test={:.3}",
        train_m.accuracy, val_m.accuracy, test_m.accuracy
    );

    Ok(BaselineSummary {
        output_dir: output_dir.to_path_buf(),
        model_name: model_name.to_string(),
        majority_label: majority,
        train_samples: train_m.sample_count,
        val_samples: val_m.sample_count,
        test_samples: test_m.sample_count,
        train_accuracy: train_m.accuracy,
        val_accuracy: val_m.accuracy,
        test_accuracy: test_m.accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_majority_tie_breaks_alphabetically() {
        let mut counts = BTreeMap::new();
        counts.insert("RISS".to_string(), 3);
        counts.insert("BRUCH".to_string(), 3);
        counts.insert("NONE".to_string(), 1);
        assert_eq!(majority_label(&counts), Some("BRUCH"));
        assert_eq!(majority_label(&BTreeMap::new()), None);
    }

    #[test]
    fn test_evaluate_constant_prediction() {
        let m = evaluate(&labels(&["RISS", "RISS", "NONE", "BAB"]), "RISS");
        assert_eq!(m.sample_count, 4);
        assert!((m.accuracy - 0.5).abs() < 1e-12);

        let riss = &m.per_class["RISS"];
        assert_eq!(riss.support, 2);
        assert!((riss.precision - 0.5).abs() < 1e-12);
        assert!((riss.recall - 1.0).abs() < 1e-12);
        assert!((riss.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.per_class["NONE"].f1, 0.0);
        assert!((m.macro_f1 - (2.0 / 3.0) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_predicted_class_missing_from_truth() {
        let m = evaluate(&labels(&["NONE"]), "RISS");
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.per_class["RISS"].support, 0);
        assert_eq!(m.per_class.len(), 2);
    }

    #[test]
    fn test_empty_split_metrics() {
        let m = evaluate(&[], "RISS");
        assert_eq!(m, SplitMetrics::default());
    }

    #[test]
    fn test_train_baseline_writes_artifacts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let data = dir.path().join("dataset");
        fs::create_dir_all(&data).expect("mkdir");
        fs::write(
            data.join("train.jsonl"),
            "{\"label\":\"riss\"}\n{\"label\":\"RISS\"}\nnot json\n{\"label\":\"NONE\"}\n",
        )
        .expect("write");
        fs::write(data.join("val.jsonl"), "{\"label\":\"NONE\"}\n{}\n").expect("write");

        let out = dir.path().join("model");
        let summary = train_baseline(&data, &out, DEFAULT_MODEL_NAME).expect("train");
        assert_eq!(summary.majority_label, "RISS");
        assert_eq!(summary.train_samples, 3);
        assert_eq!(summary.val_samples, 2);
        assert_eq!(summary.test_samples, 0);
        assert!((summary.train_accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.val_accuracy, 0.0);

        let label_map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("label_map.json")).expect("read"))
                .expect("parse");
        assert_eq!(label_map["labels"], serde_json::json!(["NONE", "RISS"]));

        let metrics: MetricsReport =
            serde_json::from_str(&fs::read_to_string(out.join("metrics.json")).expect("read"))
                .expect("parse");
        assert!(metrics.splits[&Split::Val].per_class.contains_key("UNKNOWN"));
        assert!(out.join("model_baseline.json").exists());
    }

    #[test]
    fn test_empty_train_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = train_baseline(dir.path(), &dir.path().join("model"), "m").unwrap_err();
        assert_eq!(err.error_type(), "EmptyInput");
    }
}
