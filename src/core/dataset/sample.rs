use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::events::{normalize_label, DamageEvent, DEFAULT_SOURCE, NONE_LABEL};
use crate::core::ids::short_hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    /// `train.jsonl` etc.
    pub fn file_name(&self) -> String {
        format!("{}.jsonl", self.as_str())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-split counter, serialized as `{train, val, test}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCounts {
    pub train: usize,
    pub val: usize,
    pub test: usize,
}

impl SplitCounts {
    pub fn get(&self, split: Split) -> usize {
        match split {
            Split::Train => self.train,
            Split::Val => self.val,
            Split::Test => self.test,
        }
    }

    pub fn add(&mut self, split: Split, n: usize) {
        match split {
            Split::Train => self.train += n,
            Split::Val => self.val += n,
            Split::Test => self.test += n,
        }
    }

    pub fn total(&self) -> usize {
        self.train + self.val + self.test
    }
}

/// One row of `train.jsonl` / `val.jsonl` / `test.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub sample_id: String,
    pub event_id: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(alias = "holding_id")]
    pub unit_id: String,
    pub label: String,
    pub severity: Option<i32>,
    pub start_m: f64,
    pub end_m: f64,
    pub start_time_s: Option<f64>,
    pub end_time_s: Option<f64>,
    #[serde(default)]
    pub keyframes: Vec<String>,
    pub source: String,
    pub split: Split,
}

impl TrainingSample {
    pub fn from_event(event: &DamageEvent, split: Split, keyframes: Vec<String>) -> Self {
        let event_id = event.resolved_id();
        let unit_id = event.unit().to_string();
        let label = normalize_label(event.raw_label());
        let sample_id = short_hash(&format!("{}_{}_{}", event_id, unit_id, label));

        // 缺失里程按 start -> station -> 0 回退
        let start_m = event.start_m.or(event.station_m).unwrap_or(0.0);
        let end_m = event
            .end_m
            .or(event.start_m)
            .or(event.station_m)
            .unwrap_or(0.0);

        Self {
            sample_id,
            event_id,
            video_id: event.video_id.clone().unwrap_or_default(),
            unit_id,
            label,
            severity: event.severity,
            start_m,
            end_m,
            start_time_s: event.start_time_s,
            end_time_s: event.end_time_s,
            keyframes,
            source: event
                .source
                .clone()
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            split,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.label == NONE_LABEL
    }
}
