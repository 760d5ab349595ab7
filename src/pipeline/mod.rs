//! Decode pipeline: session state machine and per-file processing.

mod processor;
mod session;

pub use processor::{OutputTarget, ProcessResult, process_file};
pub use session::{PipelineSession, PipelineState};
