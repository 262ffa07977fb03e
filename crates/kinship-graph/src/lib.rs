//! Kinship Graph
//!
//! The friendship state machine and the relationship graph query engine,
//! both generic over any [`EdgeStore`](kinship_domain::traits::EdgeStore).
//!
//! The engine answers membership and aggregate queries for a user by scanning
//! edges where that user is either endpoint, since each pair is stored once
//! regardless of direction. Every state transition publishes a "before" and an
//! "after" event to a [`HookRegistry`]; subscribers are advisory and can never
//! fail a transition.
//!
//! # Examples
//!
//! ```no_run
//! use kinship_domain::UserId;
//! use kinship_graph::{HookRegistry, RelationshipGraph};
//! use kinship_store::SqliteStore;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new(":memory:")?;
//! let graph = RelationshipGraph::with_hooks(store, Arc::new(HookRegistry::new()));
//!
//! let (alice, bob) = (UserId::new(), UserId::new());
//! assert!(graph.request_friendship(alice, bob, None, None)?);
//! assert!(graph.approve_friendship(bob, alice)?);
//! assert!(graph.friend_with(alice, bob)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod graph;
mod hooks;
mod lifecycle;

pub use error::GraphError;
pub use graph::RelationshipGraph;
pub use hooks::{ChannelObserver, HookEvent, HookPoint, HookRegistry, Observer, UnknownHook};
pub use lifecycle::{FriendshipLifecycle, Outcome};
