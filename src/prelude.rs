//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use pwfuzz::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{PwfError, Result};

// Policy
pub use crate::policy::charset::CharacterClass;
pub use crate::policy::validator::{PasswordValidator, PolicyRule, Violation};

// Generation
pub use crate::generator::category::TestCategory;
pub use crate::generator::engine::{CaseGenerator, TestCase};
pub use crate::generator::profile::{GenerationProfile, RunLength};

// Harness
pub use crate::harness::orchestrator::{Orchestrator, RunOutcome};
pub use crate::harness::plan::RunPlan;
pub use crate::harness::progress::{NoopObserver, ProgressObserver, RunSummary};

// Results
pub use crate::results::evaluator::{EvaluationReport, Evaluator};
pub use crate::results::record::TestResult;
pub use crate::results::sink::{CsvResultSink, ResultSink};
