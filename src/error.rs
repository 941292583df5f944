//! Error type shared by every fallible operation in the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or querying a resolution.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation was acting on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A matrix file exists but its contents are inconsistent.
    #[error("malformed matrix file {}: {reason}", path.display())]
    FileFormat {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// An argument is outside the range the operation accepts.
    #[error("invalid argument: {0}")]
    BadArgument(String),

    /// A projective was requested out of order.
    #[error("degree {requested} requested, but the next degree to construct is {expected}")]
    UnexpectedDegree {
        /// Degree the caller asked for.
        requested: usize,
        /// Degree that would have been accepted.
        expected: usize,
    },

    /// A degree beyond the known part of the resolution was queried.
    #[error("degree {degree} is not known yet (projectives known up to degree {known})")]
    DegreeUnknown {
        /// Degree the caller asked for.
        degree: usize,
        /// Highest projective currently known.
        known: usize,
    },

    /// A vector handed to the preimage computation is not in the image.
    #[error("vector {index} does not lie in the image of the differential")]
    NotInImage {
        /// Position of the vector in the input batch.
        index: usize,
    },

    /// A computed rank disagrees with the one predicted by rank-nullity.
    #[error("rank mismatch: expected {expected}, found {found}")]
    RankMismatch {
        /// Predicted value.
        expected: usize,
        /// Computed value.
        found: usize,
    },

    /// Division by the zero element of the field.
    #[error("division by zero")]
    DivisionByZero,

    /// The group algebra data does not describe a valid path tree.
    #[error("invalid group algebra: {0}")]
    InvalidGroup(String),

    /// An internal invariant of the algorithm was violated.
    #[error("theoretical error: {0}")]
    Theoretical(String),

    /// A JSON document could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolutionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResolutionError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ResolutionError::FileFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn theoretical(reason: impl Into<String>) -> Self {
        ResolutionError::Theoretical(reason.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = ResolutionError> = std::result::Result<T, E>;
