//! Errors raised while turning asset files into engine data.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("line {line}: malformed face: {reason}")]
    MalformedFace { line: usize, reason: String },

    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: {kind} index {index} out of range")]
    MissingReference {
        line: usize,
        kind: &'static str,
        index: i64,
    },

    #[error("{0} has no geometry")]
    Empty(String),
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
