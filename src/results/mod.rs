//! Result persistence and re-evaluation: record type, CSV codec, sinks, and the
//! evaluator.

pub mod codec;
pub mod digest;
pub mod evaluator;
pub mod record;
pub mod sink;
