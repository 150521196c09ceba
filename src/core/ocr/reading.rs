use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::video::frame_time_s;

/// Confidence assigned to any reading whose text parsed as a number.
pub const BASE_CONFIDENCE: f32 = 0.8;

// 小数点可能被识别成 "." 或 ","
static CHAINAGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)[.,](\d+)").expect("chainage pattern is valid"));

/// Per-frame chainage reading, one line of the OCR track file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReading {
    pub frame_path: String,
    pub frame_index: u64,
    pub time_s: f64,
    pub raw_text: String,
    pub position_m: Option<f64>,
    pub confidence: f32,
    pub valid: bool,
    #[serde(default)]
    pub issue: Option<String>,
}

/// What the recognition engine returned for one frame.
#[derive(Debug, Clone)]
pub enum Recognition {
    Text(String),
    Failed(String),
}

impl FrameReading {
    pub fn from_recognition(
        frame_index: u64,
        frame_path: impl Into<String>,
        fps: f64,
        recognition: Recognition,
    ) -> Self {
        let time_s = frame_time_s(frame_index, fps);
        match recognition {
            Recognition::Text(text) => {
                let raw_text = text.trim().to_string();
                let position_m = parse_chainage(&raw_text);
                Self {
                    frame_path: frame_path.into(),
                    frame_index,
                    time_s,
                    raw_text,
                    position_m,
                    confidence: if position_m.is_some() { BASE_CONFIDENCE } else { 0.0 },
                    valid: position_m.is_some(),
                    issue: None,
                }
            }
            Recognition::Failed(reason) => Self {
                frame_path: frame_path.into(),
                frame_index,
                time_s,
                raw_text: String::new(),
                position_m: None,
                confidence: 0.0,
                valid: false,
                issue: Some(reason),
            },
        }
    }

    /// Build a track straight from recognized strings, frame index = position in `texts`.
    pub fn from_texts<S: AsRef<str>>(texts: &[S], fps: f64) -> Vec<Self> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                Self::from_recognition(
                    i as u64,
                    String::new(),
                    fps,
                    Recognition::Text(text.as_ref().to_string()),
                )
            })
            .collect()
    }

    /// Valid and carrying a position.
    pub fn usable_position(&self) -> Option<f64> {
        if self.valid {
            self.position_m
        } else {
            None
        }
    }
}

/// First decimal number in `text`, accepting `.` or `,` as separator.
pub fn parse_chainage(text: &str) -> Option<f64> {
    let caps = CHAINAGE_PATTERN.captures(text)?;
    format!("{}.{}", &caps[1], &caps[2]).parse::<f64>().ok()
}
