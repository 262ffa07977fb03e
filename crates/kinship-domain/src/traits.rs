//! Trait definitions for external interactions
//!
//! The edge store is the boundary between the friendship core and
//! persistence. Implementations live in other crates (`kinship-store`).

use crate::{EdgeId, EdgeState, EdgeUpdate, Friendship, UserId};

/// Result of inserting an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The edge was stored
    Inserted(EdgeId),

    /// The unordered pair already has an edge
    Duplicate,
}

/// Result of a compare-and-set edge update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was applied
    Applied,

    /// No edge with that id exists
    NotFound,

    /// The stored state no longer matches the expected state
    Conflict,
}

/// Trait for storing and retrieving friendship edges
///
/// `Self::Error` is reserved for infrastructure failure. Duplicates, missing
/// edges and stale comparands are ordinary outcomes and come back in `Ok`.
///
/// Implementations must enforce one edge per unordered pair atomically, so
/// that concurrent inserts of (a, b) and (b, a) cannot both succeed.
pub trait EdgeStore {
    /// Error type for store operations
    type Error;

    /// Insert a new edge
    fn insert_edge(&self, edge: Friendship) -> Result<InsertOutcome, Self::Error>;

    /// Get an edge by ID
    fn get_edge(&self, id: EdgeId) -> Result<Option<Friendship>, Self::Error>;

    /// Find the edge for the unordered pair {a, b}
    fn find_by_pair(&self, a: UserId, b: UserId) -> Result<Option<Friendship>, Self::Error>;

    /// Find the edge where `requester` proposed to `recipient`
    fn find_directed(
        &self,
        requester: UserId,
        recipient: UserId,
    ) -> Result<Option<Friendship>, Self::Error>;

    /// Apply `update` if the stored flags still equal `expected`
    fn update_edge(
        &self,
        id: EdgeId,
        expected: EdgeState,
        update: EdgeUpdate,
    ) -> Result<UpdateOutcome, Self::Error>;

    /// Delete an edge, returning whether a row was removed
    fn delete_edge(&self, id: EdgeId) -> Result<bool, Self::Error>;

    /// Query edges matching criteria
    fn query_edges(&self, query: &EdgeQuery) -> Result<Vec<Friendship>, Self::Error>;

    /// Count edges matching criteria without loading them
    fn count_edges(&self, query: &EdgeQuery) -> Result<usize, Self::Error>;
}

/// Which endpoint the queried user must occupy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleFilter {
    /// User is the requester
    Requester,

    /// User is the recipient
    Recipient,

    /// User is either endpoint
    #[default]
    Either,
}

/// Query criteria for retrieving edges
#[derive(Debug, Clone, Default)]
pub struct EdgeQuery {
    /// Endpoint to scan from (all edges when unset)
    pub user: Option<UserId>,

    /// Role the user must hold
    pub role: RoleFilter,

    /// Filter by pending flag
    pub pending: Option<bool>,

    /// Filter by whether a blocker is set
    pub blocked: Option<bool>,

    /// Filter by exact blocker
    pub blocker: Option<UserId>,

    /// Skip edges whose two endpoints are identical
    pub exclude_degenerate: bool,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl EdgeQuery {
    /// Edges touching `user` in the given role
    pub fn for_user(user: UserId, role: RoleFilter) -> Self {
        Self {
            user: Some(user),
            role,
            exclude_degenerate: true,
            ..Default::default()
        }
    }

    /// Restrict to pending (`true`) or approved (`false`) edges
    pub fn pending(mut self, pending: bool) -> Self {
        self.pending = Some(pending);
        self
    }

    /// Restrict to blocked (`true`) or active (`false`) edges
    pub fn blocked(mut self, blocked: bool) -> Self {
        self.blocked = Some(blocked);
        self
    }

    /// Restrict to edges blocked by `blocker`
    pub fn blocked_by(mut self, blocker: UserId) -> Self {
        self.blocker = Some(blocker);
        self
    }

    /// True if `edge` satisfies every criterion except `limit`
    ///
    /// Stores that cannot push filters down can use this directly.
    pub fn matches(&self, edge: &Friendship) -> bool {
        if let Some(user) = self.user {
            let role_ok = match self.role {
                RoleFilter::Requester => edge.requester == user,
                RoleFilter::Recipient => edge.recipient == user,
                RoleFilter::Either => edge.requester == user || edge.recipient == user,
            };
            if !role_ok {
                return false;
            }
        }
        if self.pending.is_some_and(|p| p != edge.pending) {
            return false;
        }
        if self.blocked.is_some_and(|b| b != edge.is_blocked()) {
            return false;
        }
        if self.blocker.is_some() && self.blocker != edge.blocker {
            return false;
        }
        !(self.exclude_degenerate && edge.is_degenerate())
    }
}
