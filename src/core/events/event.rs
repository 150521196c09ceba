use serde::{Deserialize, Serialize};

use crate::core::ids::short_hash;

/// A damage record from the survey protocol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DamageEvent {
    #[serde(default, alias = "xtf_id")]
    pub event_id: Option<String>,
    #[serde(default, alias = "holding_id")]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub type_code: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub severity: Option<i32>,
    #[serde(default)]
    pub start_m: Option<f64>,
    #[serde(default)]
    pub end_m: Option<f64>,
    /// Single-point station, used when no start is recorded.
    #[serde(default)]
    pub station_m: Option<f64>,
    #[serde(default)]
    pub start_time_s: Option<f64>,
    #[serde(default)]
    pub end_time_s: Option<f64>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

pub const UNKNOWN_UNIT: &str = "unknown";
pub const DEFAULT_SOURCE: &str = "xtf_auto";

impl DamageEvent {
    /// Provided id if present, otherwise a hash of unit, code and span.
    pub fn resolved_id(&self) -> String {
        match self.provided_id() {
            Some(id) => id.to_string(),
            None => generated_id(&self.identity_key()),
        }
    }

    /// Pin an id on an event that has none. `origin` is where the record
    /// came from (file and record number), so identical records in one
    /// survey still get distinct ids and keyframe directories.
    pub fn assign_id_from_origin(&mut self, origin: &str) {
        if self.provided_id().is_none() {
            self.event_id = Some(generated_id(&format!("{}|{}", origin, self.identity_key())));
        }
    }

    fn provided_id(&self) -> Option<&str> {
        self.event_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    fn identity_key(&self) -> String {
        format!(
            "{}|{}|{:?}|{:?}",
            self.unit(),
            self.type_code.as_deref().unwrap_or(""),
            self.start_m,
            self.end_m
        )
    }

    pub fn unit(&self) -> &str {
        match self.unit_id.as_deref() {
            Some(unit) if !unit.trim().is_empty() => unit,
            _ => UNKNOWN_UNIT,
        }
    }

    /// Spatial anchor: start, else station. `None` means the event cannot be aligned.
    pub fn anchor_m(&self) -> Option<f64> {
        self.start_m.or(self.station_m)
    }

    /// `(start, end)` for alignment; end falls back to start.
    pub fn span_m(&self) -> Option<(f64, f64)> {
        let start = self.anchor_m()?;
        Some((start, self.end_m.unwrap_or(start)))
    }

    /// Type code first, then the explicit label.
    pub fn raw_label(&self) -> Option<&str> {
        non_blank(self.type_code.as_deref()).or_else(|| non_blank(self.label.as_deref()))
    }
}

fn generated_id(key: &str) -> String {
    format!("evt_{}", short_hash(key))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
