use log::{error, info};
use serde::Serialize;

use crate::core::error::PipelineResult;

/// 每个步骤的统一返回值
///
/// 序列化为 `{"success": true, ...report}` 或
/// `{"success": false, "error_type": "...", "error": "..."}`。
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub report: Option<T>,
}

impl<T> StepOutcome<T> {
    pub fn from_result(result: PipelineResult<T>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                error_type: None,
                error: None,
                report: Some(report),
            },
            Err(e) => Self {
                success: false,
                error_type: Some(e.error_type().to_string()),
                error: Some(e.to_string()),
                report: None,
            },
        }
    }

    /// Run one step, logging its start and how it ended.
    pub(crate) fn run(step: &str, f: impl FnOnce() -> PipelineResult<T>) -> Self {
        info!("▶️ {}: started", step);
        let outcome = Self::from_result(f());
        match (&outcome.error_type, &outcome.error) {
            (Some(kind), Some(message)) => error!("❌ {} failed [{}]: {}", step, kind, message),
            _ => info!("✅ {}: done", step),
        }
        outcome
    }

    /// The report of a successful step; `None` means callers must stop.
    pub fn into_report(self) -> Option<T> {
        if self.success {
            self.report
        } else {
            None
        }
    }
}
