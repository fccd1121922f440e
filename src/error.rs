//! Error types for the composite stream.
//!
//! Three kinds are distinguishable by callers: end-of-stream (surfaced as
//! `Ok(0)` from reads, not an error), [`ChainError::Closed`] for operations
//! on a closed handle, and underlying source failures carried with the
//! original [`std::io::Error`] intact.

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Top-level error type for [`ChainReader`](crate::ChainReader) operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Read or seek on a closed handle.
    #[error("chain reader is closed")]
    Closed,

    /// Seek target outside the valid range.
    #[error("seek position ({position}) should be >= 0 and <= total size ({total_size})")]
    SeekOutOfRange {
        /// The requested absolute position.
        position: i64,
        /// Total size of the composite stream.
        total_size: u64,
    },

    /// An underlying source failed during prefetch.
    ///
    /// The failure is sticky: every read surfaces it until a seek outside
    /// the buffered window resets the prefetcher.
    #[error("source {index} failed: {error}")]
    Source {
        /// Index of the failing source in declared order.
        index: usize,
        /// The underlying error, as reported by the source.
        error: Arc<io::Error>,
    },

    /// One or more sources failed to close.
    #[error(transparent)]
    Close(#[from] CloseError),
}

/// Aggregate of per-source close failures.
///
/// Every constituent error is preserved untouched together with the index
/// of the source that produced it, so callers can inspect each failure
/// individually.
#[derive(Debug)]
pub struct CloseError {
    errors: Vec<(usize, io::Error)>,
}

impl CloseError {
    pub(crate) fn new(errors: Vec<(usize, io::Error)>) -> Self {
        Self { errors }
    }

    /// Constituent failures as `(source index, error)` pairs, in declared
    /// source order.
    pub fn errors(&self) -> &[(usize, io::Error)] {
        &self.errors
    }
}

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error when closing: ")?;
        for (i, (index, error)) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "source {index}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CloseError {}
