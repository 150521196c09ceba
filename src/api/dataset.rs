//! 数据集构建

use std::path::Path;

use crate::api::outcome::StepOutcome;
use crate::config::DatasetConfig;
use crate::core::dataset::{build_dataset, DatasetSummary};

pub fn run_dataset(
    events_dir: String,
    keyframes_dir: String,
    output_dir: String,
    config: DatasetConfig,
) -> StepOutcome<DatasetSummary> {
    StepOutcome::run("dataset", || {
        build_dataset(
            Path::new(&events_dir),
            Path::new(&keyframes_dir),
            Path::new(&output_dir),
            &config,
        )
    })
}
