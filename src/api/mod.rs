pub mod baseline;
pub mod dataset;
pub mod keyframes;
pub mod ocr;
pub mod outcome;
pub mod video;

pub use outcome::StepOutcome;
