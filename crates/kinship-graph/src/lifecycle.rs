//! Friendship state machine
//!
//! Owns the lifecycle of a single edge: create, approve, block, unblock and
//! remove. Each transition checks its guard against the edge it was handed,
//! then commits through a compare-and-set on the store, so a guard that held
//! at read time but not at commit time yields [`Rejection::Conflict`] rather
//! than an illegal state.

use crate::{GraphError, HookEvent, HookPoint, HookRegistry};
use kinship_domain::traits::{EdgeStore, InsertOutcome, UpdateOutcome};
use kinship_domain::{EdgeUpdate, Friendship, Rejection, UserId};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in seconds since Unix epoch
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Result of a transition that did not hit an infrastructure failure
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The transition took effect
    Done(T),

    /// The transition was refused
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    /// True if the transition took effect
    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    /// The rejection, if any
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Done(_) => None,
            Outcome::Rejected(r) => Some(*r),
        }
    }

    /// The produced value, if any
    pub fn into_done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }
}

impl<T> From<Rejection> for Outcome<T> {
    fn from(rejection: Rejection) -> Self {
        Outcome::Rejected(rejection)
    }
}

/// Applies transitions to edges held in a store
///
/// Borrowed from a [`RelationshipGraph`](crate::RelationshipGraph) via
/// `lifecycle()`, or built directly over any store and registry.
pub struct FriendshipLifecycle<'a, S> {
    store: &'a S,
    hooks: &'a HookRegistry,
}

impl<'a, S> FriendshipLifecycle<'a, S>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    /// Create a lifecycle over the given store and hook registry
    pub fn new(store: &'a S, hooks: &'a HookRegistry) -> Self {
        Self { store, hooks }
    }

    fn publish(&self, point: HookPoint, actor: UserId, edge: &Friendship) {
        self.hooks.publish(&HookEvent {
            point,
            actor,
            edge: edge.clone(),
        });
    }

    /// Propose a relationship from `requester` to `recipient`
    ///
    /// Uniqueness is enforced by the store on insert, so two concurrent
    /// proposals for the same pair cannot both succeed.
    pub fn create(
        &self,
        requester: UserId,
        recipient: UserId,
        reason: Option<String>,
        greeting: Option<String>,
    ) -> Result<Outcome<Friendship>, GraphError> {
        if requester == recipient {
            return Ok(Rejection::SelfRelationship.into());
        }

        let edge = Friendship::new(requester, recipient, reason, greeting, current_timestamp());
        self.publish(HookPoint::BeforeCreate, requester, &edge);

        match self.store.insert_edge(edge.clone()).map_err(GraphError::store)? {
            InsertOutcome::Inserted(id) => {
                tracing::info!(edge = %id, requester = %requester, recipient = %recipient, "Friendship requested");
                self.publish(HookPoint::AfterCreate, requester, &edge);
                Ok(Outcome::Done(edge))
            }
            InsertOutcome::Duplicate => {
                tracing::debug!(requester = %requester, recipient = %recipient, "Duplicate friendship request");
                Ok(Rejection::DuplicateRelationship.into())
            }
        }
    }

    /// Approve a pending edge on behalf of its recipient
    pub fn approve(&self, edge: &Friendship, actor: UserId) -> Result<Outcome<Friendship>, GraphError> {
        if let Err(rejection) = edge.check_approve(actor) {
            return Ok(rejection.into());
        }
        self.transition(
            edge,
            actor,
            EdgeUpdate::Approve,
            (HookPoint::BeforeApprove, HookPoint::AfterApprove),
        )
    }

    /// Block an edge on behalf of `actor`
    pub fn block(&self, edge: &Friendship, actor: UserId) -> Result<Outcome<Friendship>, GraphError> {
        if let Err(rejection) = edge.check_block(actor) {
            return Ok(rejection.into());
        }
        self.transition(
            edge,
            actor,
            EdgeUpdate::Block { blocker: actor },
            (HookPoint::BeforeBlock, HookPoint::AfterBlock),
        )
    }

    /// Clear a block on behalf of the user who set it
    pub fn unblock(&self, edge: &Friendship, actor: UserId) -> Result<Outcome<Friendship>, GraphError> {
        if let Err(rejection) = edge.check_unblock(actor) {
            return Ok(rejection.into());
        }
        self.transition(
            edge,
            actor,
            EdgeUpdate::Unblock,
            (HookPoint::BeforeUnblock, HookPoint::AfterUnblock),
        )
    }

    /// Destroy an edge on behalf of either endpoint
    pub fn remove(&self, edge: &Friendship, actor: UserId) -> Result<Outcome<()>, GraphError> {
        if edge.role_of(actor).is_none() {
            return Ok(Rejection::IllegalTransition("actor is not part of this relationship").into());
        }

        self.publish(HookPoint::BeforeRemove, actor, edge);
        if !self.store.delete_edge(edge.id).map_err(GraphError::store)? {
            tracing::debug!(edge = %edge.id, "Remove found no edge");
            return Ok(Rejection::NotFound.into());
        }

        tracing::info!(edge = %edge.id, actor = %actor, "Friendship removed");
        self.publish(HookPoint::AfterRemove, actor, edge);
        Ok(Outcome::Done(()))
    }

    /// Commit `update` against the state `edge` was read in, firing hooks around it
    fn transition(
        &self,
        edge: &Friendship,
        actor: UserId,
        update: EdgeUpdate,
        (before, after): (HookPoint, HookPoint),
    ) -> Result<Outcome<Friendship>, GraphError> {
        self.publish(before, actor, edge);

        let outcome = self
            .store
            .update_edge(edge.id, edge.state(), update)
            .map_err(GraphError::store)?;

        match outcome {
            UpdateOutcome::Applied => {
                let next_state = update.apply(edge.state());
                let next = Friendship {
                    pending: next_state.pending,
                    blocker: next_state.blocker,
                    updated_at: current_timestamp(),
                    ..edge.clone()
                };
                tracing::info!(
                    edge = %edge.id,
                    actor = %actor,
                    status = next.status().as_str(),
                    "Friendship {}",
                    after.as_str().trim_start_matches("after_")
                );
                self.publish(after, actor, &next);
                Ok(Outcome::Done(next))
            }
            UpdateOutcome::NotFound => {
                tracing::debug!(edge = %edge.id, "Edge vanished before commit");
                Ok(Rejection::NotFound.into())
            }
            UpdateOutcome::Conflict => {
                tracing::debug!(edge = %edge.id, "Edge changed before commit");
                Ok(Rejection::Conflict.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_store::SqliteStore;
    use std::sync::{Arc, Mutex};

    struct Fixture {
        store: SqliteStore,
        hooks: HookRegistry,
        events: Arc<Mutex<Vec<HookPoint>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let hooks = HookRegistry::new();
            let events = Arc::new(Mutex::new(Vec::new()));
            for point in HookPoint::ALL {
                let log = Arc::clone(&events);
                hooks.subscribe(point, move |e: &HookEvent| -> anyhow::Result<()> {
                    log.lock().unwrap().push(e.point);
                    Ok(())
                });
            }
            Self {
                store: SqliteStore::in_memory().unwrap(),
                hooks,
                events,
            }
        }

        fn lifecycle(&self) -> FriendshipLifecycle<'_, SqliteStore> {
            FriendshipLifecycle::new(&self.store, &self.hooks)
        }

        fn take_events(&self) -> Vec<HookPoint> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    #[test]
    fn test_create_fires_before_and_after() {
        let fx = Fixture::new();
        let (a, b) = (UserId::new(), UserId::new());

        let outcome = fx.lifecycle().create(a, b, None, Some("hey".into())).unwrap();
        let edge = outcome.into_done().expect("created");

        assert!(edge.is_pending());
        assert_eq!(edge.greeting.as_deref(), Some("hey"));
        assert_eq!(fx.take_events(), vec![HookPoint::BeforeCreate, HookPoint::AfterCreate]);
    }

    #[test]
    fn test_create_rejects_self_without_hooks() {
        let fx = Fixture::new();
        let a = UserId::new();

        let outcome = fx.lifecycle().create(a, a, None, None).unwrap();
        assert_eq!(outcome.rejection(), Some(Rejection::SelfRelationship));
        assert!(fx.take_events().is_empty());
    }

    #[test]
    fn test_duplicate_create_fires_only_before() {
        let fx = Fixture::new();
        let (a, b) = (UserId::new(), UserId::new());

        fx.lifecycle().create(a, b, None, None).unwrap();
        fx.take_events();

        let outcome = fx.lifecycle().create(b, a, None, None).unwrap();
        assert_eq!(outcome.rejection(), Some(Rejection::DuplicateRelationship));
        assert_eq!(fx.take_events(), vec![HookPoint::BeforeCreate]);
    }

    #[test]
    fn test_approve_then_block_then_unblock() {
        let fx = Fixture::new();
        let (a, b) = (UserId::new(), UserId::new());
        let lc = fx.lifecycle();

        let edge = lc.create(a, b, None, None).unwrap().into_done().unwrap();
        let edge = lc.approve(&edge, b).unwrap().into_done().unwrap();
        assert!(edge.is_approved());

        let edge = lc.block(&edge, a).unwrap().into_done().unwrap();
        assert_eq!(edge.blocker, Some(a));

        assert_eq!(
            lc.unblock(&edge, b).unwrap().rejection(),
            Some(Rejection::IllegalTransition("only the blocker may unblock"))
        );

        let edge = lc.unblock(&edge, a).unwrap().into_done().unwrap();
        assert!(edge.is_active());

        let stored = fx.store.get_edge(edge.id).unwrap().unwrap();
        assert_eq!(stored.state(), edge.state());
    }

    #[test]
    fn test_requester_cannot_approve() {
        let fx = Fixture::new();
        let (a, b) = (UserId::new(), UserId::new());
        let lc = fx.lifecycle();

        let edge = lc.create(a, b, None, None).unwrap().into_done().unwrap();
        fx.take_events();

        assert!(!lc.approve(&edge, a).unwrap().succeeded());
        assert!(fx.take_events().is_empty(), "guard failures fire no hooks");
    }

    #[test]
    fn test_stale_edge_yields_conflict() {
        let fx = Fixture::new();
        let (a, b) = (UserId::new(), UserId::new());
        let lc = fx.lifecycle();

        let edge = lc.create(a, b, None, None).unwrap().into_done().unwrap();
        let stale = edge.clone();
        lc.approve(&edge, b).unwrap();

        // Second approval from a stale snapshot passes the in-memory guard but not the commit
        let outcome = lc.approve(&stale, b).unwrap();
        assert_eq!(outcome.rejection(), Some(Rejection::Conflict));
    }

    #[test]
    fn test_block_after_concurrent_remove() {
        let fx = Fixture::new();
        let (a, b) = (UserId::new(), UserId::new());
        let lc = fx.lifecycle();

        let edge = lc.create(a, b, None, None).unwrap().into_done().unwrap();
        assert!(lc.remove(&edge, a).unwrap().succeeded());
        fx.take_events();

        let outcome = lc.block(&edge, b).unwrap();
        assert_eq!(outcome.rejection(), Some(Rejection::NotFound));
        assert_eq!(fx.take_events(), vec![HookPoint::BeforeBlock]);
    }

    #[test]
    fn test_remove_twice() {
        let fx = Fixture::new();
        let (a, b) = (UserId::new(), UserId::new());
        let lc = fx.lifecycle();

        let edge = lc.create(a, b, None, None).unwrap().into_done().unwrap();
        assert!(lc.remove(&edge, b).unwrap().succeeded());
        assert_eq!(lc.remove(&edge, b).unwrap().rejection(), Some(Rejection::NotFound));
        assert_eq!(
            lc.remove(&edge, UserId::new()).unwrap().rejection(),
            Some(Rejection::IllegalTransition("actor is not part of this relationship"))
        );
    }
}
