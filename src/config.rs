//! Pipeline configuration.
//!
//! Every section has defaults, so a config file only needs the keys it changes:
//!
//! ```json5
//! {
//!   ocr: { fps: 2.0, roi: { x: 0, y: 650, width: 240, height: 48 } },
//!   dataset: { seed: 7, negative_ratio: 0.5 },
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{PipelineError, PipelineResult};

/// Tolerance used when checking that split ratios sum to one.
pub const RATIO_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub ocr: OcrConfig,
    pub keyframes: KeyframeConfig,
    pub dataset: DatasetConfig,
}

impl PipelineConfig {
    pub fn from_json5_str(text: &str) -> PipelineResult<Self> {
        let config: Self =
            json5::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::input_missing("config file", path));
        }
        Self::from_json5_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        self.extraction.validate()?;
        self.ocr.validate()?;
        self.keyframes.validate()?;
        self.dataset.validate()
    }
}

/// Video decoding parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub fps: f64,
    /// "jpg" or "png"
    pub format: String,
    /// JPEG quality 1-100
    pub quality: u8,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fps: 3.0,
            format: "jpg".to_string(),
            quality: 85,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            return Err(PipelineError::Validation(format!(
                "extraction fps must be > 0 (got {})",
                self.fps
            )));
        }
        if self.format != "jpg" && self.format != "png" {
            return Err(PipelineError::Validation(format!(
                "unsupported frame format: {}",
                self.format
            )));
        }
        Ok(())
    }

    /// ffmpeg `-q:v` scale: 1 is best, 31 is worst.
    pub fn ffmpeg_qscale(&self) -> u32 {
        let quality = self.quality.min(100) as i64;
        (32 - quality * 31 / 100).clamp(1, 31) as u32
    }
}

/// Region of the frame holding the meter overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for Roi {
    /// 左下角，通常显示米数
    fn default() -> Self {
        Self {
            x: 10,
            y: 680,
            width: 200,
            height: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub fps: f64,
    pub roi: Roi,
    /// Median window; values below 3 disable smoothing.
    pub smooth_window: usize,
    pub monotonic_check: bool,
    /// Allowed backwards jitter in metres before a reading is rejected.
    pub monotonic_tolerance_m: f64,
    pub max_workers: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            fps: 3.0,
            roi: Roi::default(),
            smooth_window: 5,
            monotonic_check: true,
            monotonic_tolerance_m: 0.5,
            max_workers: 4,
        }
    }
}

impl OcrConfig {
    /// Raw readings only: no smoothing, no monotonicity pass.
    pub fn unfiltered() -> Self {
        Self {
            smooth_window: 0,
            monotonic_check: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.fps > 0.0 && self.fps.is_finite()) {
            return Err(PipelineError::Validation(format!(
                "ocr fps must be > 0 (got {})",
                self.fps
            )));
        }
        non_negative("monotonic_tolerance_m", self.monotonic_tolerance_m)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeConfig {
    pub per_event: usize,
    pub margin_m: f64,
    /// Map raw inspection codes (e.g. `BAB`) to training labels on load.
    pub map_type_codes: bool,
}

impl Default for KeyframeConfig {
    fn default() -> Self {
        Self {
            per_event: 3,
            margin_m: 0.3,
            map_type_codes: true,
        }
    }
}

impl KeyframeConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.per_event == 0 {
            return Err(PipelineError::Validation(
                "per_event must be at least 1".to_string(),
            ));
        }
        non_negative("margin_m", self.margin_m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.7,
            val: 0.15,
            test: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn validate(&self) -> PipelineResult<()> {
        non_negative("train ratio", self.train)?;
        non_negative("val ratio", self.val)?;
        non_negative("test ratio", self.test)?;
        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
            return Err(PipelineError::Validation(format!(
                "split ratios must sum to 1.0 (got {:.4})",
                sum
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub ratios: SplitRatios,
    /// NONE samples kept per positive sample; negative disables balancing.
    pub negative_ratio: f64,
    pub min_samples_per_class: usize,
    pub seed: u64,
    pub map_type_codes: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            negative_ratio: 0.3,
            min_samples_per_class: 10,
            seed: 42,
            map_type_codes: true,
        }
    }
}

impl DatasetConfig {
    /// Ratios, then `negative_ratio`: any finite value, negative disables balancing.
    pub fn validate(&self) -> PipelineResult<()> {
        self.ratios.validate()?;
        if !self.negative_ratio.is_finite() {
            return Err(PipelineError::Validation(format!(
                "negative_ratio must be a finite number (got {})",
                self.negative_ratio
            )));
        }
        Ok(())
    }
}

/// Rejects negatives, NaN and infinities.
fn non_negative(name: &str, value: f64) -> PipelineResult<()> {
    if !(value >= 0.0 && value.is_finite()) {
        return Err(PipelineError::Validation(format!(
            "{} must be a finite number >= 0 (got {})",
            name, value
        )));
    }
    Ok(())
}
