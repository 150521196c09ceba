use std::path::{Path, PathBuf};
use std::time::Duration;

use image::{DynamicImage, GenericImageView, GrayImage};

use crate::config::Roi;
use crate::core::error::PipelineResult;

/// One decoded frame, reduced to the overlay region that carries the meter reading.
#[derive(Debug, Clone)]
pub struct Frame {
    pub frame_index: u64,
    pub timestamp: Duration,
    pub path: PathBuf,
    pub region: GrayImage, // 灰度 ROI
}

impl Frame {
    pub fn new(frame_index: u64, fps: f64, path: PathBuf, region: GrayImage) -> Self {
        Self {
            frame_index,
            timestamp: Duration::from_secs_f64(frame_time_s(frame_index, fps)),
            path,
            region,
        }
    }

    /// Open `path` and crop the overlay region.
    pub fn load(frame_index: u64, fps: f64, path: &Path, roi: &Roi) -> PipelineResult<Self> {
        let img = image::open(path)?;
        let region = crop_roi(&img, roi);
        Ok(Self::new(frame_index, fps, path.to_path_buf(), region))
    }

    pub fn time_s(&self) -> f64 {
        self.timestamp.as_secs_f64()
    }
}

/// Seconds since video start for a frame sampled at `fps`.
pub fn frame_time_s(frame_index: u64, fps: f64) -> f64 {
    if fps > 0.0 {
        frame_index as f64 / fps
    } else {
        0.0
    }
}

/// Crop `roi` out of `img` as grayscale. An ROI that runs past the image
/// edge is pulled back inside so at least a 10px strip remains.
pub fn crop_roi(img: &DynamicImage, roi: &Roi) -> GrayImage {
    let (w, h) = img.dimensions();
    let (mut x0, mut y0) = (roi.x, roi.y);
    let (mut x1, mut y1) = (roi.x.saturating_add(roi.width), roi.y.saturating_add(roi.height));

    if x1 > w || y1 > h {
        x0 = x0.min(w.saturating_sub(10));
        y0 = y0.min(h.saturating_sub(10));
        x1 = x1.min(w);
        y1 = y1.min(h);
    }

    let crop_w = x1.saturating_sub(x0);
    let crop_h = y1.saturating_sub(y0);
    img.crop_imm(x0, y0, crop_w, crop_h).to_luma8()
}
