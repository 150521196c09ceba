//! 里程识别 - 从视频帧的叠加文字中重建里程轨迹

pub mod reading;
pub mod recognizer;
pub mod track;

use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{OcrConfig, Roi};
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::jsonl::write_jsonl;
use crate::core::video::{list_frames, Frame};

pub use reading::{parse_chainage, FrameReading, Recognition, BASE_CONFIDENCE};
pub use recognizer::{MockRecognizer, TesseractRecognizer, TextRecognizer};
pub use track::{enforce_monotonic, smooth_median, track_quality, ChainageTrack};

#[derive(Debug, Clone, Serialize)]
pub struct OcrSummary {
    pub frames_dir: PathBuf,
    pub output_path: PathBuf,
    pub total_frames: usize,
    pub valid_frames: usize,
    pub ocr_quality: f64,
    pub roi: Roi,
}

/// Recognize every frame in `frames_dir`, rebuild the chainage track and
/// write it to `output_path` as JSONL.
pub fn run_ocr_chainage(
    frames_dir: &Path,
    output_path: &Path,
    config: &OcrConfig,
    recognizer: &dyn TextRecognizer,
) -> PipelineResult<OcrSummary> {
    config.validate()?;
    recognizer.check_available()?;

    if !frames_dir.exists() {
        return Err(PipelineError::input_missing("frames directory", frames_dir));
    }
    let frame_paths = list_frames(frames_dir)?;
    if frame_paths.is_empty() {
        return Err(PipelineError::EmptyInput(format!(
            "no frames found in {}",
            frames_dir.display()
        )));
    }

    info!("🔍 OCR on {} frames from {:?}", frame_paths.len(), frames_dir);
    let raw = recognize_all(&frame_paths, config, recognizer)?;

    let track = ChainageTrack::reconstruct(&raw, config);
    write_jsonl(output_path, &track.readings)?;

    let summary = OcrSummary {
        frames_dir: frames_dir.to_path_buf(),
        output_path: output_path.to_path_buf(),
        total_frames: track.total_count(),
        valid_frames: track.valid_count(),
        ocr_quality: track.quality(),
        roi: config.roi,
    };
    info!(
        "✅ OCR done: {}/{} valid (quality {:.2})",
        summary.valid_frames, summary.total_frames, summary.ocr_quality
    );
    Ok(summary)
}

/// Per-frame recognition in parallel; output order follows `frame_paths`.
fn recognize_all(
    frame_paths: &[PathBuf],
    config: &OcrConfig,
    recognizer: &dyn TextRecognizer,
) -> PipelineResult<Vec<FrameReading>> {
    let num_threads = num_cpus::get().min(config.max_workers.max(1));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| PipelineError::Config(format!("OCR worker pool: {}", e)))?;

    let readings = pool.install(|| {
        frame_paths
            .par_iter()
            .enumerate()
            .map(|(i, path)| read_frame(i as u64, path, config, recognizer))
            .collect::<Vec<_>>()
    });

    let failed = readings.iter().filter(|r| r.issue.is_some()).count();
    if failed > 0 {
        warn!("⚠️ {} frames failed recognition", failed);
    }
    Ok(readings)
}

fn read_frame(
    frame_index: u64,
    path: &Path,
    config: &OcrConfig,
    recognizer: &dyn TextRecognizer,
) -> FrameReading {
    let recognition = match Frame::load(frame_index, config.fps, path, &config.roi) {
        Ok(frame) => match recognizer.recognize(&frame) {
            Ok(text) => Recognition::Text(text),
            Err(reason) => Recognition::Failed(reason),
        },
        Err(e) => Recognition::Failed(e.to_string()),
    };
    FrameReading::from_recognition(
        frame_index,
        path.to_string_lossy(),
        config.fps,
        recognition,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jsonl::read_jsonl;
    use image::{GrayImage, Luma};
    use std::fs;

    fn write_frames(dir: &Path, count: usize) {
        for i in 1..=count {
            let img = GrayImage::from_pixel(320, 240, Luma([120]));
            img.save(dir.join(format!("frame_{:06}.png", i))).expect("save frame");
        }
    }

    #[test]
    fn test_run_ocr_writes_track() {
        let dir = tempfile::tempdir().expect("temp dir");
        let frames = dir.path().join("frames");
        fs::create_dir_all(&frames).expect("mkdir");
        write_frames(&frames, 5);

        let recognizer = MockRecognizer::with_texts(&["1,00", "1.01", "5,20", "1.03", "1.04"]);
        let output = dir.path().join("ocr/track.jsonl");
        let summary =
            run_ocr_chainage(&frames, &output, &OcrConfig::default(), &recognizer).expect("ocr");

        assert_eq!(summary.total_frames, 5);
        assert_eq!(summary.valid_frames, 5);
        assert_eq!(summary.ocr_quality, 1.0);

        let track: Vec<FrameReading> = read_jsonl(&output).expect("read track");
        let indices: Vec<u64> = track.iter().map(|r| r.frame_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert_eq!(track[2].position_m, Some(1.03));
        assert_eq!(track[2].raw_text, "5,20");
        assert!(track[4].frame_path.ends_with("frame_000005.png"));
        assert!((track[3].time_s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_frame_failure_does_not_abort() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_frames(dir.path(), 3);
        fs::write(dir.path().join("frame_000004.jpg"), b"garbage").expect("write");

        let recognizer = MockRecognizer::with_texts(&["2.0", "2.1", "2.2", "2.3"]).failing_at(1, "timeout");
        let output = dir.path().join("track.jsonl");
        let summary =
            run_ocr_chainage(dir.path(), &output, &OcrConfig::default(), &recognizer).expect("ocr");

        assert_eq!(summary.total_frames, 4);
        assert_eq!(summary.valid_frames, 2);

        let track: Vec<FrameReading> = read_jsonl(&output).expect("read track");
        assert_eq!(track[1].issue.as_deref(), Some("timeout"));
        assert!(!track[3].valid);
        assert!(track[3].issue.is_some());
    }

    #[test]
    fn test_engine_unavailable_fails_before_reading() {
        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("track.jsonl");
        let err = run_ocr_chainage(
            &dir.path().join("missing"),
            &output,
            &OcrConfig::default(),
            &MockRecognizer::unavailable(),
        )
        .unwrap_err();
        assert_eq!(err.error_type(), "EngineUnavailable");
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_and_empty_frame_dirs() {
        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("track.jsonl");
        let recognizer = MockRecognizer::new();

        let err = run_ocr_chainage(&dir.path().join("nope"), &output, &OcrConfig::default(), &recognizer)
            .unwrap_err();
        assert_eq!(err.error_type(), "InputMissing");

        let err = run_ocr_chainage(dir.path(), &output, &OcrConfig::default(), &recognizer).unwrap_err();
        assert_eq!(err.error_type(), "EmptyInput");
        assert!(!output.exists());
    }
}
