pub mod event;
pub mod labels;
pub mod source;

pub use event::{DamageEvent, DEFAULT_SOURCE, UNKNOWN_UNIT};
pub use labels::{label_for_code, normalize_label, NONE_LABEL, UNKNOWN_LABEL};
pub use source::{EventSource, JsonlEventSource};
