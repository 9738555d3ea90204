//! Run planning, concurrent execution, and progress reporting.

pub mod orchestrator;
pub mod plan;
pub mod progress;
