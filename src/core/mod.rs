pub mod baseline;
pub mod dataset;
pub mod error;
pub mod events;
pub mod ids;
pub mod jsonl;
pub mod keyframes;
pub mod ocr;
pub mod video;

pub use error::{PipelineError, PipelineResult};
