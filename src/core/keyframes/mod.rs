//! 关键帧生成 - 按里程把损伤事件映射到视频帧

pub mod aligner;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::KeyframeConfig;
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::events::{normalize_label, DamageEvent, EventSource, JsonlEventSource};
use crate::core::jsonl::{read_jsonl, write_pretty_json};
use crate::core::ocr::FrameReading;

pub use aligner::{spread_sample, Alignment, EventFrameAligner};

pub const MANIFEST_FILE: &str = "keyframes_summary.json";
pub const KEYFRAME_PREFIX: &str = "keyframe_";

/// Manifest entry for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeSet {
    pub event_id: String,
    pub label: String,
    pub start_m: f64,
    pub end_m: f64,
    /// source frames that were selected, in selection order
    pub frame_indices: Vec<u64>,
    pub keyframe_count: usize,
    pub keyframe_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyframeSummary {
    pub events_processed: usize,
    pub events_skipped: usize,
    pub keyframes_generated: usize,
    pub output_dir: PathBuf,
    pub summary_path: PathBuf,
}

/// Directory name for an event's keyframes. Separators in ids are flattened.
pub fn event_dir_name(event_id: &str) -> String {
    event_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// `keyframe_<order>_<position>m.<ext>`
pub fn keyframe_file_name(order: usize, position_m: f64, source: &Path) -> String {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("{}{:02}_{:.2}m{}", KEYFRAME_PREFIX, order, position_m, ext)
}

/// Copy the selected frames into `event_dir`. Missing sources are skipped.
pub fn materialize(event_dir: &Path, frames: &[&FrameReading]) -> PipelineResult<Vec<String>> {
    fs::create_dir_all(event_dir)?;
    let mut written = Vec::with_capacity(frames.len());

    for (order, frame) in frames.iter().enumerate() {
        let src = Path::new(&frame.frame_path);
        let position = frame.position_m.unwrap_or_default();
        let dst = event_dir.join(keyframe_file_name(order, position, src));

        match fs::copy(src, &dst) {
            Ok(_) => written.push(dst.to_string_lossy().to_string()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("⚠️ frame image missing, skipped: {}", frame.frame_path);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(written)
}

/// Align every event from `events_path` to the track in `track_path` and
/// copy the chosen frames below `output_dir/<event_id>/`.
pub fn generate_keyframes(
    events_path: &Path,
    track_path: &Path,
    output_dir: &Path,
    config: &KeyframeConfig,
) -> PipelineResult<KeyframeSummary> {
    config.validate()?;
    if !events_path.exists() {
        return Err(PipelineError::input_missing("events file", events_path));
    }
    if !track_path.exists() {
        return Err(PipelineError::input_missing("OCR track file", track_path));
    }

    let events = JsonlEventSource::new(events_path)
        .with_code_mapping(config.map_type_codes)
        .load()?;
    let track: Vec<FrameReading> = read_jsonl(track_path)?;
    let aligner = EventFrameAligner::new(&track, config)?;
    info!(
        "🎯 Aligning {} events against {} valid frames",
        events.len(),
        aligner.valid_frame_count()
    );

    fs::create_dir_all(output_dir)?;
    let mut sets = Vec::with_capacity(events.len());
    let mut skipped = 0usize;

    for event in &events {
        match build_set(&aligner, event, output_dir)? {
            Some(set) => sets.push(set),
            None => {
                skipped += 1;
                debug!("event {} has no position, skipped", event.resolved_id());
            }
        }
    }

    let summary_path = output_dir.join(MANIFEST_FILE);
    write_pretty_json(&summary_path, &sets)?;

    let summary = KeyframeSummary {
        events_processed: events.len(),
        events_skipped: skipped,
        keyframes_generated: sets.iter().map(|s| s.keyframe_count).sum(),
        output_dir: output_dir.to_path_buf(),
        summary_path,
    };
    info!(
        "✅ {} keyframes for {} events ({} skipped)",
        summary.keyframes_generated, summary.events_processed, summary.events_skipped
    );
    Ok(summary)
}

fn build_set(
    aligner: &EventFrameAligner<'_>,
    event: &DamageEvent,
    output_dir: &Path,
) -> PipelineResult<Option<KeyframeSet>> {
    let Some(alignment) = aligner.align(event) else {
        return Ok(None);
    };

    let event_id = event.resolved_id();
    let event_dir = output_dir.join(event_dir_name(&event_id));
    let keyframe_paths = materialize(&event_dir, &alignment.frames)?;

    Ok(Some(KeyframeSet {
        label: normalize_label(event.raw_label()),
        start_m: alignment.start_m,
        end_m: alignment.end_m,
        frame_indices: alignment.frames.iter().map(|f| f.frame_index).collect(),
        keyframe_count: keyframe_paths.len(),
        keyframe_paths,
        event_id,
    }))
}
