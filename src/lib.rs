#![forbid(unsafe_code)]

//! pwfuzz: adversarial conformance harness for a password policy.
//!
//! Seven case generators each produce candidates that violate exactly one
//! policy dimension (or none). They run concurrently, fan in to a single
//! scoring loop, and every scored triple lands in a CSV truth file that can
//! be re-evaluated later.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use pwfuzz::prelude::*;
//!
//! let plan = RunPlan::new(TestCategory::ALL, 1_000)?.with_fail_fast(true);
//! let mut sink = CsvResultSink::create(std::path::Path::new("results.csv"))?;
//! let outcome = Orchestrator::new(plan, PolicyRule::standard())
//!     .run(&mut sink, &mut NoopObserver)?;
//! println!("{} mismatches", outcome.summary().mismatches);
//! # Ok::<(), PwfError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod generator;
pub mod harness;
pub mod logger;
pub mod policy;
pub mod results;
