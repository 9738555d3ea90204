//! Adversarial case generation: categories, run-length profiles, and the
//! shared parameterized generator.

pub mod category;
pub mod engine;
pub mod profile;
