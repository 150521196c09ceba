//! Frame extraction through the ffmpeg/ffprobe binaries.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::core::error::{PipelineError, PipelineResult};

/// Characters of tool stderr kept in a `Decode` error.
const STDERR_LIMIT: usize = 500;

/// Result of decoding one video into still frames.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedFrames {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub frame_count: usize,
    pub fps: f64,
    pub duration_s: f64,
    pub frame_paths: Vec<PathBuf>,
}

pub trait VideoDecoder: Send + Sync {
    /// Decode `video` at `config.fps` into ordered frame images under `output_dir`.
    fn extract(
        &self,
        video: &Path,
        output_dir: &Path,
        config: &ExtractionConfig,
    ) -> PipelineResult<ExtractedFrames>;
}

pub struct FfmpegDecoder {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    pub fn with_binaries(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    fn probe_duration(&self, video: &Path) -> PipelineResult<f64> {
        let output = run(
            Command::new(&self.ffprobe_bin)
                .args(["-v", "quiet", "-print_format", "json", "-show_format"])
                .arg(video),
            "ffprobe",
        )?;
        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)?;
        Ok(probe
            .format
            .duration
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0))
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn extract(
        &self,
        video: &Path,
        output_dir: &Path,
        config: &ExtractionConfig,
    ) -> PipelineResult<ExtractedFrames> {
        if !video.exists() {
            return Err(PipelineError::input_missing("video", video));
        }
        config.validate()?;
        fs::create_dir_all(output_dir)?;

        let duration_s = self.probe_duration(video)?;
        info!("🎬 Decoding {:?} ({:.1}s) at {} fps", video, duration_s, config.fps);

        let pattern = output_dir.join(format!("frame_%06d.{}", config.format));
        run(
            Command::new(&self.ffmpeg_bin)
                .arg("-i")
                .arg(video)
                .arg("-vf")
                .arg(format!("fps={}", config.fps))
                .arg("-q:v")
                .arg(config.ffmpeg_qscale().to_string())
                .arg("-y")
                .arg(&pattern),
            "ffmpeg",
        )?;

        let frame_paths = list_frames(output_dir)?;
        info!("✅ Extracted {} frames", frame_paths.len());

        Ok(ExtractedFrames {
            video_path: video.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            frame_count: frame_paths.len(),
            fps: config.fps,
            duration_s,
            frame_paths,
        })
    }
}

fn run(cmd: &mut Command, engine: &'static str) -> PipelineResult<Output> {
    debug!("running {:?}", cmd);
    let output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::engine_unavailable(engine, e.to_string()),
        _ => PipelineError::Io(e),
    })?;
    if !output.status.success() {
        return Err(PipelineError::Decode {
            exit_code: output.status.code(),
            stderr: truncate_chars(&String::from_utf8_lossy(&output.stderr), STDERR_LIMIT),
        });
    }
    Ok(output)
}

/// At most `limit` chars; tool output is often not ASCII (e.g. "Schäden.mp4").
fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// `frame_*.jpg` / `frame_*.png` files in `dir`, ordered by file name.
pub fn list_frames(dir: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_frame_file(path))
        .collect();
    frames.sort();
    Ok(frames)
}

fn is_frame_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("frame_"))
        .unwrap_or(false);
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("png"))
        .unwrap_or(false);
    name_ok && ext_ok && path.is_file()
}
