//! JSONL event logging with graceful degradation.

pub mod events;
pub mod jsonl;
