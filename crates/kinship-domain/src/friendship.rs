//! Friendship edge - the single stored record per unordered user pair
//!
//! An edge has two independent flags: `pending` (cleared by approval) and
//! `blocker` (set by a block, cleared by an unblock). All four combinations
//! are reachable. The guard methods here are pure; the state machine that
//! applies them against a store lives in `kinship-graph`.

use crate::{EdgeId, Rejection, UserId};

/// Directional role a user plays on an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The user who proposed the relationship
    Requester,

    /// The user who received the proposal
    Recipient,
}

/// The four reachable states of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FriendshipStatus {
    /// Awaiting approval, not blocked
    Pending,

    /// Awaiting approval, blocked by the recipient
    PendingBlocked,

    /// Approved and not blocked
    Approved,

    /// Approved, blocked by either party
    ApprovedBlocked,
}

impl FriendshipStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::PendingBlocked => "pending_blocked",
            FriendshipStatus::Approved => "approved",
            FriendshipStatus::ApprovedBlocked => "approved_blocked",
        }
    }
}

/// The mutable part of an edge, used as the comparand for compare-and-set updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeState {
    /// True until approved
    pub pending: bool,

    /// Endpoint that blocked the edge, if any
    pub blocker: Option<UserId>,
}

/// A single-edge mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeUpdate {
    /// Clear the pending flag
    Approve,

    /// Set the blocker
    Block {
        /// Endpoint invoking the block
        blocker: UserId,
    },

    /// Clear the blocker
    Unblock,
}

impl EdgeUpdate {
    /// State after applying this update to `state`
    pub fn apply(&self, state: EdgeState) -> EdgeState {
        match *self {
            EdgeUpdate::Approve => EdgeState { pending: false, ..state },
            EdgeUpdate::Block { blocker } => EdgeState { blocker: Some(blocker), ..state },
            EdgeUpdate::Unblock => EdgeState { blocker: None, ..state },
        }
    }
}

/// A relationship between two users
///
/// `requester` and `recipient` are fixed at creation. Exactly one edge exists
/// per unordered pair; the store enforces that.
#[derive(Debug, Clone, PartialEq)]
pub struct Friendship {
    /// Unique identifier
    pub id: EdgeId,

    /// User who proposed the relationship
    pub requester: UserId,

    /// User who received the proposal
    pub recipient: UserId,

    /// True until the recipient approves
    pub pending: bool,

    /// Endpoint that blocked the edge, if any
    pub blocker: Option<UserId>,

    /// Free-text reason supplied at creation
    pub reason: Option<String>,

    /// Free-text greeting supplied at creation
    pub greeting: Option<String>,

    /// When the edge was created (seconds since Unix epoch)
    pub created_at: u64,

    /// When the edge was last mutated (seconds since Unix epoch)
    pub updated_at: u64,
}

impl Friendship {
    /// Create a new pending, active edge
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::{Friendship, UserId};
    ///
    /// let alice = UserId::new();
    /// let bob = UserId::new();
    /// let edge = Friendship::new(alice, bob, None, Some("hi".to_string()), 1000);
    ///
    /// assert!(edge.is_pending());
    /// assert!(edge.is_active());
    /// assert!(edge.can_block(bob));
    /// assert!(!edge.can_block(alice));
    /// ```
    pub fn new(
        requester: UserId,
        recipient: UserId,
        reason: Option<String>,
        greeting: Option<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id: EdgeId::new(),
            requester,
            recipient,
            pending: true,
            blocker: None,
            reason,
            greeting,
            created_at,
            updated_at: created_at,
        }
    }

    /// True once the recipient has approved
    pub fn is_approved(&self) -> bool {
        !self.pending
    }

    /// True while awaiting approval
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// True if either endpoint has blocked the edge
    pub fn is_blocked(&self) -> bool {
        self.blocker.is_some()
    }

    /// True if no one has blocked the edge
    pub fn is_active(&self) -> bool {
        self.blocker.is_none()
    }

    /// Requester and recipient are the same user
    ///
    /// Cannot be created through the state machine, but readers must tolerate it.
    pub fn is_degenerate(&self) -> bool {
        self.requester == self.recipient
    }

    /// Current status
    pub fn status(&self) -> FriendshipStatus {
        match (self.pending, self.is_blocked()) {
            (true, false) => FriendshipStatus::Pending,
            (true, true) => FriendshipStatus::PendingBlocked,
            (false, false) => FriendshipStatus::Approved,
            (false, true) => FriendshipStatus::ApprovedBlocked,
        }
    }

    /// The mutable flags of this edge
    pub fn state(&self) -> EdgeState {
        EdgeState {
            pending: self.pending,
            blocker: self.blocker,
        }
    }

    /// Role `user` plays on this edge, if any
    pub fn role_of(&self, user: UserId) -> Option<Role> {
        if user == self.requester {
            Some(Role::Requester)
        } else if user == self.recipient {
            Some(Role::Recipient)
        } else {
            None
        }
    }

    /// The endpoint opposite `user`, if `user` is an endpoint
    pub fn other(&self, user: UserId) -> Option<UserId> {
        match self.role_of(user)? {
            Role::Requester => Some(self.recipient),
            Role::Recipient => Some(self.requester),
        }
    }

    /// Check that `user` may approve this edge
    ///
    /// Only the recipient approves, and only while pending.
    pub fn check_approve(&self, user: UserId) -> Result<(), Rejection> {
        match self.role_of(user) {
            None => Err(Rejection::IllegalTransition("actor is not part of this relationship")),
            Some(_) if self.is_approved() => Err(Rejection::IllegalTransition("already approved")),
            Some(Role::Requester) => Err(Rejection::IllegalTransition(
                "only the recipient may approve a request",
            )),
            Some(Role::Recipient) => Ok(()),
        }
    }

    /// Check that `user` may block this edge
    pub fn check_block(&self, user: UserId) -> Result<(), Rejection> {
        let role = self
            .role_of(user)
            .ok_or(Rejection::IllegalTransition("actor is not part of this relationship"))?;
        if self.is_blocked() {
            return Err(Rejection::IllegalTransition("already blocked"));
        }
        if self.is_pending() && role == Role::Requester {
            return Err(Rejection::IllegalTransition(
                "a requester cannot block their own pending request",
            ));
        }
        Ok(())
    }

    /// Check that `user` may unblock this edge
    pub fn check_unblock(&self, user: UserId) -> Result<(), Rejection> {
        match self.blocker {
            None => Err(Rejection::IllegalTransition("not blocked")),
            Some(blocker) if blocker != user => {
                Err(Rejection::IllegalTransition("only the blocker may unblock"))
            }
            Some(_) => Ok(()),
        }
    }

    /// True if `user` may approve this edge
    pub fn can_approve(&self, user: UserId) -> bool {
        self.check_approve(user).is_ok()
    }

    /// True if `user` may block this edge
    pub fn can_block(&self, user: UserId) -> bool {
        self.check_block(user).is_ok()
    }

    /// True if `user` may unblock this edge
    pub fn can_unblock(&self, user: UserId) -> bool {
        self.check_unblock(user).is_ok()
    }
}
