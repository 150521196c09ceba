//! 视频抽帧

use std::path::Path;

use crate::api::outcome::StepOutcome;
use crate::config::ExtractionConfig;
use crate::core::video::{ExtractedFrames, FfmpegDecoder, VideoDecoder};

/// 用系统 ffmpeg 按固定帧率抽帧
///
/// ```ignore
/// let outcome = extract_frames("run.mp4".into(), "out/frames".into(), ExtractionConfig::default());
/// assert!(outcome.success);
/// ```
pub fn extract_frames(
    video_path: String,
    output_dir: String,
    config: ExtractionConfig,
) -> StepOutcome<ExtractedFrames> {
    extract_frames_with(&FfmpegDecoder::new(), &video_path, &output_dir, &config)
}

pub fn extract_frames_with(
    decoder: &dyn VideoDecoder,
    video_path: &str,
    output_dir: &str,
    config: &ExtractionConfig,
) -> StepOutcome<ExtractedFrames> {
    StepOutcome::run("extract_frames", || {
        decoder.extract(Path::new(video_path), Path::new(output_dir), config)
    })
}
