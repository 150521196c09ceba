//! 基线模型训练

use std::path::Path;

use crate::api::outcome::StepOutcome;
use crate::core::baseline::{train_baseline, BaselineSummary, DEFAULT_MODEL_NAME};

/// `model_name` 为空时使用 `baseline_majority`
pub fn run_baseline(
    dataset_dir: String,
    output_dir: String,
    model_name: Option<String>,
) -> StepOutcome<BaselineSummary> {
    let model_name = model_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
    StepOutcome::run("baseline", || {
        train_baseline(Path::new(&dataset_dir), Path::new(&output_dir), &model_name)
    })
}
