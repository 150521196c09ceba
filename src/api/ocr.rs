//! 里程识别

use std::path::Path;

use crate::api::outcome::StepOutcome;
use crate::config::OcrConfig;
use crate::core::ocr::{run_ocr_chainage, OcrSummary, TesseractRecognizer, TextRecognizer};

/// 识别帧目录中的里程数字并写出轨迹 JSONL（使用 tesseract）
pub fn run_ocr(frames_dir: String, output_path: String, config: OcrConfig) -> StepOutcome<OcrSummary> {
    run_ocr_with(&TesseractRecognizer::new(), &frames_dir, &output_path, &config)
}

pub fn run_ocr_with(
    recognizer: &dyn TextRecognizer,
    frames_dir: &str,
    output_path: &str,
    config: &OcrConfig,
) -> StepOutcome<OcrSummary> {
    StepOutcome::run("ocr_chainage", || {
        run_ocr_chainage(Path::new(frames_dir), Path::new(output_path), config, recognizer)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ocr::MockRecognizer;

    #[test]
    fn test_unavailable_engine_fails_before_reading_frames() {
        let outcome = run_ocr_with(
            &MockRecognizer::unavailable(),
            "/definitely/not/here",
            "/tmp/unused.jsonl",
            &OcrConfig::default(),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error_type.as_deref(), Some("EngineUnavailable"));
    }

    #[test]
    fn test_empty_frames_dir() {
        let dir = tempfile::tempdir().expect("temp dir");
        let outcome = run_ocr_with(
            &MockRecognizer::new(),
            &dir.path().to_string_lossy(),
            &dir.path().join("track.jsonl").to_string_lossy(),
            &OcrConfig::default(),
        );
        assert_eq!(outcome.error_type.as_deref(), Some("EmptyInput"));
    }
}
