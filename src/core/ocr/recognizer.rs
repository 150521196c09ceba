use std::collections::HashMap;
use std::io::{Cursor, ErrorKind, Write};
use std::process::{Command, Stdio};

use image::{DynamicImage, ImageOutputFormat};
use log::{debug, info};

use crate::core::error::{PipelineError, PipelineResult};
use crate::core::video::Frame;

/// Text recognition over the cropped overlay region of one frame.
pub trait TextRecognizer: Send + Sync {
    /// Fails with `EngineUnavailable` when the engine cannot run at all.
    fn check_available(&self) -> PipelineResult<()>;

    /// Best-effort text for one frame. Errors are per-frame, not fatal.
    fn recognize(&self, frame: &Frame) -> Result<String, String>;
}

/// Tesseract CLI in single-line mode, restricted to digits and separators.
pub struct TesseractRecognizer {
    binary: String,
    char_whitelist: String,
}

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self::with_binary("tesseract")
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            char_whitelist: "0123456789.,".to_string(),
        }
    }

    fn encode_png(frame: &Frame) -> Result<Vec<u8>, String> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(frame.region.clone())
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .map_err(|e| format!("encode ROI: {}", e))?;
        Ok(buffer.into_inner())
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn check_available(&self) -> PipelineResult<()> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| {
                PipelineError::engine_unavailable(
                    "tesseract",
                    format!("cannot run `{}`: {}", self.binary, e),
                )
            })?;
        if !output.status.success() {
            return Err(PipelineError::engine_unavailable(
                "tesseract",
                format!("`{} --version` exited with {:?}", self.binary, output.status.code()),
            ));
        }
        let version = String::from_utf8_lossy(&output.stdout);
        info!("🔧 OCR engine: {}", version.lines().next().unwrap_or("tesseract"));
        Ok(())
    }

    fn recognize(&self, frame: &Frame) -> Result<String, String> {
        let png = Self::encode_png(frame)?;

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "--psm", "7", "-c"])
            .arg(format!("tessedit_char_whitelist={}", self.char_whitelist))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => format!("tesseract not found: {}", e),
                _ => e.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png).map_err(|e| e.to_string())?;
        }

        let output = child.wait_with_output().map_err(|e| e.to_string())?;
        if !output.status.success() {
            return Err(format!(
                "tesseract exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("frame {} -> {:?}", frame.frame_index, text);
        Ok(text)
    }
}

/// Scripted recognizer for tests: answers by frame index.
pub struct MockRecognizer {
    available: bool,
    texts: HashMap<u64, Result<String, String>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            available: true,
            texts: HashMap::new(),
        }
    }

    /// Frame `i` reads `texts[i]`.
    pub fn with_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut mock = Self::new();
        for (i, text) in texts.iter().enumerate() {
            mock.texts.insert(i as u64, Ok(text.as_ref().to_string()));
        }
        mock
    }

    pub fn failing_at(mut self, frame_index: u64, reason: &str) -> Self {
        self.texts.insert(frame_index, Err(reason.to_string()));
        self
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            texts: HashMap::new(),
        }
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for MockRecognizer {
    fn check_available(&self) -> PipelineResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(PipelineError::engine_unavailable("mock", "disabled"))
        }
    }

    fn recognize(&self, frame: &Frame) -> Result<String, String> {
        self.texts
            .get(&frame.frame_index)
            .cloned()
            .unwrap_or_else(|| Ok(String::new()))
    }
}
