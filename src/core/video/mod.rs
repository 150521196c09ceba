pub mod decoder;
pub mod frame;

pub use decoder::{list_frames, ExtractedFrames, FfmpegDecoder, VideoDecoder};
pub use frame::{crop_roi, frame_time_s, Frame};
