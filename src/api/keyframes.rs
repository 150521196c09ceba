//! 关键帧生成

use std::path::Path;

use crate::api::outcome::StepOutcome;
use crate::config::KeyframeConfig;
use crate::core::keyframes::{generate_keyframes, KeyframeSummary};

pub fn run_keyframes(
    events_path: String,
    track_path: String,
    output_dir: String,
    config: KeyframeConfig,
) -> StepOutcome<KeyframeSummary> {
    StepOutcome::run("keyframes", || {
        generate_keyframes(
            Path::new(&events_path),
            Path::new(&track_path),
            Path::new(&output_dir),
            &config,
        )
    })
}
