//! Relationship graph query engine
//!
//! Answers questions about one user's relationships. Because each pair is
//! stored once, every query here scans edges where the user is either the
//! requester or the recipient and classifies them by role.

use crate::{FriendshipLifecycle, GraphError, HookRegistry, Outcome};
use kinship_domain::traits::{EdgeQuery, EdgeStore, RoleFilter};
use kinship_domain::{Friendship, FriendshipStatus, Rejection, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Relationship graph over an edge store
///
/// All methods take `&self`; share the graph across threads when the store is `Sync`.
///
/// # Examples
///
/// ```no_run
/// use kinship_domain::UserId;
/// use kinship_graph::RelationshipGraph;
/// use kinship_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = RelationshipGraph::new(SqliteStore::new("kinship.db")?);
/// let (carol, dave) = (UserId::new(), UserId::new());
///
/// graph.request_friendship(carol, dave, Some("book club".into()), None)?;
/// assert!(graph.friendship_requested(carol, dave)?);
/// assert!(graph.pending_with(dave, carol)?);
/// # Ok(())
/// # }
/// ```
pub struct RelationshipGraph<S> {
    store: S,
    hooks: Arc<HookRegistry>,
}

impl<S> RelationshipGraph<S>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    /// Create a graph publishing to the process-wide hook registry
    pub fn new(store: S) -> Self {
        Self::with_hooks(store, HookRegistry::global())
    }

    /// Create a graph publishing to a specific hook registry
    pub fn with_hooks(store: S, hooks: Arc<HookRegistry>) -> Self {
        Self { store, hooks }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The hook registry transitions publish to
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// State machine bound to this graph's store and hooks
    pub fn lifecycle(&self) -> FriendshipLifecycle<'_, S> {
        FriendshipLifecycle::new(&self.store, &self.hooks)
    }

    // ---------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------

    /// Propose a relationship from `user` to `other`, reporting why it failed
    pub fn request(
        &self,
        user: UserId,
        other: UserId,
        reason: Option<String>,
        greeting: Option<String>,
    ) -> Result<Outcome<Friendship>, GraphError> {
        if user == other {
            return Ok(Rejection::SelfRelationship.into());
        }
        if self.find_edge(user, other)?.is_some() {
            return Ok(Rejection::DuplicateRelationship.into());
        }
        self.lifecycle().create(user, other, reason, greeting)
    }

    /// Approve the request `other` sent to `user`, reporting why it failed
    pub fn approve(&self, user: UserId, other: UserId) -> Result<Outcome<Friendship>, GraphError> {
        match self.find_edge(user, other)? {
            Some(edge) => self.lifecycle().approve(&edge, user),
            None => Ok(Rejection::NotFound.into()),
        }
    }

    /// Block the relationship with `other` on behalf of `user`, reporting why it failed
    pub fn block(&self, user: UserId, other: UserId) -> Result<Outcome<Friendship>, GraphError> {
        match self.find_edge(user, other)? {
            Some(edge) => self.lifecycle().block(&edge, user),
            None => Ok(Rejection::NotFound.into()),
        }
    }

    /// Lift the block `user` placed on `other`, reporting why it failed
    pub fn unblock(&self, user: UserId, other: UserId) -> Result<Outcome<Friendship>, GraphError> {
        match self.find_edge(user, other)? {
            Some(edge) => self.lifecycle().unblock(&edge, user),
            None => Ok(Rejection::NotFound.into()),
        }
    }

    /// Delete the relationship between `user` and `other`, reporting why it failed
    pub fn remove(&self, user: UserId, other: UserId) -> Result<Outcome<()>, GraphError> {
        match self.find_edge(user, other)? {
            Some(edge) => self.lifecycle().remove(&edge, user),
            None => Ok(Rejection::NotFound.into()),
        }
    }

    /// Propose a relationship; `false` if `user == other` or the pair is already connected
    pub fn request_friendship(
        &self,
        user: UserId,
        other: UserId,
        reason: Option<String>,
        greeting: Option<String>,
    ) -> Result<bool, GraphError> {
        Ok(self.request(user, other, reason, greeting)?.succeeded())
    }

    /// Approve a pending request; `false` if none exists, it is already approved,
    /// or `user` is the one who sent it
    pub fn approve_friendship(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.approve(user, other)?.succeeded())
    }

    /// Delete the relationship; `false` if there is none
    pub fn remove_friendship(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.remove(user, other)?.succeeded())
    }

    /// Block the relationship; `false` if the block guard is not satisfied
    pub fn block_friend(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.block(user, other)?.succeeded())
    }

    /// Unblock the relationship; `false` unless `user` set the block
    pub fn unblock_friend(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.unblock(user, other)?.succeeded())
    }

    // ---------------------------------------------------------------------
    // Pairwise lookups
    // ---------------------------------------------------------------------

    /// Locate the single edge for {user, other}
    ///
    /// Checks `user` as requester first, then the reverse.
    pub fn find_edge(&self, user: UserId, other: UserId) -> Result<Option<Friendship>, GraphError> {
        if user == other {
            return Ok(None);
        }
        if let Some(edge) = self.store.find_directed(user, other).map_err(GraphError::store)? {
            return Ok(Some(edge));
        }
        self.store.find_directed(other, user).map_err(GraphError::store)
    }

    /// Status of the edge between `user` and `other`, if any
    pub fn status(&self, user: UserId, other: UserId) -> Result<Option<FriendshipStatus>, GraphError> {
        Ok(self.find_edge(user, other)?.map(|edge| edge.status()))
    }

    /// `other` is among `user`'s approved, unblocked friends
    pub fn friend_with(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self
            .find_edge(user, other)?
            .is_some_and(|edge| edge.is_approved() && edge.is_active()))
    }

    /// `other` is among `user`'s blocked relationships
    pub fn friend_blocked(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.find_edge(user, other)?.is_some_and(|edge| edge.is_blocked()))
    }

    /// Any edge exists between the two, in any state
    pub fn connected_with(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.find_edge(user, other)?.is_some())
    }

    /// Connected, but not as friends
    pub fn pending_with(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self
            .find_edge(user, other)?
            .is_some_and(|edge| !(edge.is_approved() && edge.is_active())))
    }

    /// `other` sent the request `user` received
    pub fn friendship_requested_by(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.find_edge(user, other)?.is_some_and(|edge| edge.requester == other))
    }

    /// `user` sent the request `other` received
    pub fn friendship_requested(&self, user: UserId, other: UserId) -> Result<bool, GraphError> {
        Ok(self.find_edge(user, other)?.is_some_and(|edge| edge.recipient == other))
    }

    // ---------------------------------------------------------------------
    // Collections and aggregates
    // ---------------------------------------------------------------------

    fn others(&self, user: UserId, query: &EdgeQuery) -> Result<BTreeSet<UserId>, GraphError> {
        let edges = self.store.query_edges(query).map_err(GraphError::store)?;
        Ok(edges
            .iter()
            .filter(|edge| !edge.is_degenerate())
            .filter_map(|edge| edge.other(user))
            .collect())
    }

    fn count(&self, query: &EdgeQuery) -> Result<usize, GraphError> {
        self.store.count_edges(query).map_err(GraphError::store)
    }

    fn friends_query(user: UserId, role: RoleFilter) -> EdgeQuery {
        EdgeQuery::for_user(user, role).pending(false).blocked(false)
    }

    fn blocked_query(user: UserId) -> EdgeQuery {
        EdgeQuery::for_user(user, RoleFilter::Either).blocked(true)
    }

    /// Users with an approved, unblocked edge to `user`, in either direction
    pub fn friends(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        let friends = self.others(user, &Self::friends_query(user, RoleFilter::Either))?;
        tracing::debug!(user = %user, count = friends.len(), "Loaded friends");
        Ok(friends)
    }

    /// `|friends(user)|`, counted in the store
    pub fn total_friends(&self, user: UserId) -> Result<usize, GraphError> {
        self.count(&Self::friends_query(user, RoleFilter::Either))
    }

    /// Friends whose request `user` sent and they approved
    pub fn accepted_requests(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        self.others(user, &Self::friends_query(user, RoleFilter::Requester))
    }

    /// Friends who sent `user` a request that `user` approved
    pub fn accepted_requests_by(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        self.others(user, &Self::friends_query(user, RoleFilter::Recipient))
    }

    /// Users `user` has asked and who have not answered yet
    pub fn pending_requests_sent(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        let query = EdgeQuery::for_user(user, RoleFilter::Requester)
            .pending(true)
            .blocked(false);
        self.others(user, &query)
    }

    /// Users waiting on `user` to answer their request
    pub fn pending_requests_received(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        let query = EdgeQuery::for_user(user, RoleFilter::Recipient)
            .pending(true)
            .blocked(false);
        self.others(user, &query)
    }

    /// Users sharing a blocked edge with `user`, whoever set the block
    pub fn blocked_friends(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        self.others(user, &Self::blocked_query(user))
    }

    /// `|blocked_friends(user)|`, counted in the store
    pub fn total_blocked_friends(&self, user: UserId) -> Result<usize, GraphError> {
        self.count(&Self::blocked_query(user))
    }

    /// Users `user` has blocked
    pub fn blockades(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        self.others(user, &Self::blocked_query(user).blocked_by(user))
    }

    /// Users who have blocked `user`
    ///
    /// The inverse of [`blockades`](Self::blockades), keyed on who set the
    /// block rather than who sent the request: an edge `user` requested and
    /// the recipient then blocked lands here, and an edge `user` blocked
    /// never does, whichever side requested it.
    pub fn blockades_by(&self, user: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        let edges = self
            .store
            .query_edges(&Self::blocked_query(user))
            .map_err(GraphError::store)?;
        Ok(edges
            .iter()
            .filter(|edge| !edge.is_degenerate() && edge.blocker != Some(user))
            .filter_map(|edge| edge.other(user))
            .collect())
    }

    /// Friends of `user` who are also friends of `other`
    pub fn common_friends_with(&self, user: UserId, other: UserId) -> Result<BTreeSet<UserId>, GraphError> {
        let mine = self.friends(user)?;
        let theirs = self.friends(other)?;
        Ok(mine.intersection(&theirs).copied().collect())
    }
}
