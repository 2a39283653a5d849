pub mod orchestration;

pub use orchestration::{run_pipeline, PipelineArgs, PipelineReport, RunMode};
