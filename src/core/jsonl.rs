//! Newline-delimited JSON records.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::PipelineResult;

/// Read every non-empty line of `path` as one record. A malformed line fails the whole read.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> PipelineResult<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(trimmed)?);
    }
    Ok(rows)
}

/// Lenient variant: a missing file is an empty list and unparsable lines are skipped.
pub fn read_jsonl_lenient<T: DeserializeOwned>(path: &Path) -> PipelineResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str(trimmed) {
            Ok(row) => rows.push(row),
            Err(e) => warn!("⚠️ {}:{} skipped: {}", path.display(), line_no + 1, e),
        }
    }
    Ok(rows)
}

pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> PipelineResult<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
