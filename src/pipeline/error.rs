//! Error taxonomy of the anchoring engine.
//!
//! Only `InvalidInput`, `Aggregate`, `Config` and `Runtime` ever reach the caller.
//! `PatternFailure` is caught per pattern by the extractor and `EnginePath` is
//! absorbed by the hybrid join unless both paths fail. Failed normalization is
//! not an error at all: the anchor is dropped and recorded in the statistics.

use thiserror::Error;

use super::types::EnginePath;

#[derive(Error, Debug)]
pub enum AnchoringError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pattern '{pattern}' failed: {reason}")]
    PatternFailure { pattern: String, reason: String },

    #[error("{path} path failed: {message}")]
    EnginePath { path: EnginePath, message: String },

    #[error("All engine paths failed (legacy: {legacy}; core: {core})")]
    Aggregate { legacy: String, core: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl AnchoringError {
    pub(crate) fn path(path: EnginePath, message: impl Into<String>) -> Self {
        Self::EnginePath {
            path,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for AnchoringError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
