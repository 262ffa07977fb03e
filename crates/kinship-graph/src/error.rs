//! Graph error types

use thiserror::Error;

/// Errors that can occur during graph operations
///
/// Only infrastructure failures are errors. Duplicate requests, missing edges
/// and illegal transitions are reported as `Ok(false)` or
/// [`Outcome::Rejected`](crate::Outcome::Rejected).
#[derive(Error, Debug)]
pub enum GraphError {
    /// Storage layer error
    #[error("Store error: {0}")]
    Store(String),
}

impl GraphError {
    pub(crate) fn store<E: std::fmt::Display>(e: E) -> Self {
        GraphError::Store(e.to_string())
    }
}
