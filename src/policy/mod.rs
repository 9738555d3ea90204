//! Password policy: character classes and the conformance predicate.

pub mod charset;
pub mod validator;
