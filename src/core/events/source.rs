use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::event::DamageEvent;
use super::labels::label_for_code;
use crate::core::error::{PipelineError, PipelineResult};
use crate::core::jsonl::read_jsonl;

/// Anything that yields flat damage records.
pub trait EventSource {
    fn load(&self) -> PipelineResult<Vec<DamageEvent>>;
}

/// Events from one `.jsonl` file or every `.jsonl` file in a directory
/// (read in file-name order).
pub struct JsonlEventSource {
    path: PathBuf,
    map_type_codes: bool,
}

impl JsonlEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            map_type_codes: false,
        }
    }

    /// Translate raw inspection codes into training labels while loading.
    pub fn with_code_mapping(mut self, enabled: bool) -> Self {
        self.map_type_codes = enabled;
        self
    }

    fn files(&self) -> PipelineResult<Vec<PathBuf>> {
        if !self.path.exists() {
            return Err(PipelineError::input_missing("events", &self.path));
        }
        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }
        let mut files: Vec<PathBuf> = fs::read_dir(&self.path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_jsonl_ext(p))
            .collect();
        files.sort();
        Ok(files)
    }
}

impl EventSource for JsonlEventSource {
    fn load(&self) -> PipelineResult<Vec<DamageEvent>> {
        let mut events = Vec::new();
        for file in self.files()? {
            let mut batch: Vec<DamageEvent> = read_jsonl(&file)?;
            debug!("{} events from {:?}", batch.len(), file);

            // 按文件名 + 记录序号生成 id，单文件和目录两种输入结果一致
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            for (n, event) in batch.iter_mut().enumerate() {
                event.assign_id_from_origin(&format!("{}#{}", file_name, n));
            }
            events.append(&mut batch);
        }

        if self.map_type_codes {
            for event in &mut events {
                if let Some(code) = event.type_code.as_deref() {
                    event.type_code = Some(label_for_code(code).to_string());
                }
            }
        }

        info!("📋 Loaded {} events from {:?}", events.len(), self.path);
        Ok(events)
    }
}

fn has_jsonl_ext(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jsonl"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_read_in_name_order() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("b.jsonl"), "{\"event_id\":\"b1\"}\n").expect("write");
        fs::write(
            dir.path().join("a.jsonl"),
            "{\"event_id\":\"a1\"}\n\n{\"event_id\":\"a2\"}\n",
        )
        .expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let events = JsonlEventSource::new(dir.path()).load().expect("load");
        let ids: Vec<String> = events.iter().map(|e| e.resolved_id()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn test_code_mapping() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "{\"type_code\":\"BAB\"}\n{\"type_code\":\"ZZZ\"}\n").expect("write");

        let events = JsonlEventSource::new(&path)
            .with_code_mapping(true)
            .load()
            .expect("load");
        assert_eq!(events[0].type_code.as_deref(), Some("WURZELN"));
        assert_eq!(events[1].type_code.as_deref(), Some("UNKNOWN"));

        let raw = JsonlEventSource::new(&path).load().expect("load");
        assert_eq!(raw[0].type_code.as_deref(), Some("BAB"));
        // ids come from the raw record, mapping does not change them
        assert_eq!(raw[0].resolved_id(), events[0].resolved_id());
    }

    #[test]
    fn test_identical_records_get_distinct_ids() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("events.jsonl");
        let line = "{\"holding_id\":\"H1\",\"type_code\":\"BAB\",\"start_m\":2.0}\n";
        fs::write(&path, line.repeat(2)).expect("write");

        let from_file = JsonlEventSource::new(&path).load().expect("load");
        assert_ne!(from_file[0].resolved_id(), from_file[1].resolved_id());

        let from_dir = JsonlEventSource::new(dir.path()).load().expect("load");
        assert_eq!(from_dir[0].resolved_id(), from_file[0].resolved_id());
        assert_eq!(from_dir[1].resolved_id(), from_file[1].resolved_id());
    }

    #[test]
    fn test_missing_path_and_bad_line() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = JsonlEventSource::new(dir.path().join("none.jsonl"))
            .load()
            .unwrap_err();
        assert_eq!(err.error_type(), "InputMissing");

        let path = dir.path().join("broken.jsonl");
        fs::write(&path, "{\"event_id\": \n").expect("write");
        let err = JsonlEventSource::new(&path).load().unwrap_err();
        assert_eq!(err.error_type(), "ParseFailure");
    }
}
