//! Rejection taxonomy for friendship operations
//!
//! None of these are faults. Each one describes a condition the caller
//! supplied, so the public API collapses them to a plain `false`. Store
//! failures are not part of this enum; they surface as real errors.

use thiserror::Error;

/// Why a friendship operation did not take effect
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The unordered pair already has an edge
    #[error("a relationship already exists between these users")]
    DuplicateRelationship,

    /// Requester and recipient are the same user
    #[error("a user cannot befriend themselves")]
    SelfRelationship,

    /// No edge exists for the pair
    #[error("no relationship exists between these users")]
    NotFound,

    /// The transition guard is not satisfied
    #[error("illegal transition: {0}")]
    IllegalTransition(&'static str),

    /// The edge changed between read and commit
    #[error("the relationship was modified concurrently")]
    Conflict,
}
