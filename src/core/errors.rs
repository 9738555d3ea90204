//! PWF-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, PwfError>;

/// Top-level error type for the conformance harness.
#[derive(Debug, Error)]
pub enum PwfError {
    #[error("[PWF-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[PWF-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[PWF-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[PWF-2001] malformed result record at line {line}: {details}")]
    MalformedRecord { line: usize, details: String },

    #[error("[PWF-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[PWF-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[PWF-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[PWF-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl PwfError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "PWF-1001",
            Self::MissingConfig { .. } => "PWF-1002",
            Self::ConfigParse { .. } => "PWF-1003",
            Self::MalformedRecord { .. } => "PWF-2001",
            Self::Serialization { .. } => "PWF-2101",
            Self::Io { .. } => "PWF-3002",
            Self::ChannelClosed { .. } => "PWF-3003",
            Self::Runtime { .. } => "PWF-3900",
        }
    }

    /// Whether the failure stems from user-supplied configuration.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::MissingConfig { .. } | Self::ConfigParse { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for PwfError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for PwfError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
