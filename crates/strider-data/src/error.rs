// Errors raised while turning scene files into batches.

use std::path::PathBuf;

/// Errors from loading, windowing, collating and configuring trajectory data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The scene file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row of a scene file is malformed. `line` is 1-based.
    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Invalid dataset or loader configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Samples handed to the collator disagree on window lengths.
    #[error("cannot collate: {0}")]
    Collate(String),

    /// Index past the end of a dataset.
    #[error("index {index} out of range for dataset of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Tensor(#[from] strider_core::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
