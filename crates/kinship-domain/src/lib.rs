//! Kinship Domain Layer
//!
//! This crate contains the core model for Kinship's social graph: users,
//! the single deduplicated friendship edge per user pair, and the legality
//! rules for every transition of that edge.
//!
//! ## Key Concepts
//!
//! - **User**: An opaque identity; this crate owns no user attributes
//! - **Friendship**: One edge per unordered pair, with a requester and a recipient
//! - **Status**: Pending/Approved crossed with Active/Blocked
//! - **Rejection**: Foreseeable negative outcomes, reported as plain failures
//!
//! ## Architecture
//!
//! - Minimal external dependencies (`uuid` for identifiers, `thiserror` for errors)
//! - Pure business logic only
//! - Storage lives behind the [`traits::EdgeStore`] trait

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod friendship;
pub mod identity;
pub mod traits;

// Re-exports for convenience
pub use error::Rejection;
pub use friendship::{EdgeState, EdgeUpdate, Friendship, FriendshipStatus, Role};
pub use identity::{EdgeId, UserId};
