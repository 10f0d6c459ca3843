use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while reading and classifying VM source lines.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: invalid command `{text}`")]
    Invalid { line: usize, text: String },

    #[error("line {line}: command `{text}` has extra parts `{rest}`")]
    TrailingInput {
        line: usize,
        text: String,
        rest: String,
    },

    /// `advance` was called with nothing left to read.
    #[error("no command left after line {line}")]
    Exhausted { line: usize },

    #[error("read failed after line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// Everything that can stop a translation run. Each variant maps to exit code 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}: file doesn't exist")]
    NotFound(PathBuf),

    #[error("{0}: program receives .vm files")]
    WrongExtension(PathBuf),

    #[error("{0}: program receives a .vm file or directory")]
    InvalidPathKind(PathBuf),

    #[error("{0}: directory contains no .vm files")]
    NoSources(PathBuf),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
