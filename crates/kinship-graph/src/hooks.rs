//! Observer hooks for friendship transitions
//!
//! A registry of named hook points. The state machine publishes to the
//! registry at two points per transition; subscribers react (deliver a
//! notification, update a feed) but never influence the transition itself.

use kinship_domain::{Friendship, UserId};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;

/// Named points at which the state machine publishes events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// About to insert a new edge
    BeforeCreate,
    /// A new edge was inserted
    AfterCreate,
    /// About to approve an edge
    BeforeApprove,
    /// An edge was approved
    AfterApprove,
    /// About to block an edge
    BeforeBlock,
    /// An edge was blocked
    AfterBlock,
    /// About to unblock an edge
    BeforeUnblock,
    /// An edge was unblocked
    AfterUnblock,
    /// About to remove an edge
    BeforeRemove,
    /// An edge was removed
    AfterRemove,
}

impl HookPoint {
    /// Every hook point, in transition order
    pub const ALL: [HookPoint; 10] = [
        HookPoint::BeforeCreate,
        HookPoint::AfterCreate,
        HookPoint::BeforeApprove,
        HookPoint::AfterApprove,
        HookPoint::BeforeBlock,
        HookPoint::AfterBlock,
        HookPoint::BeforeUnblock,
        HookPoint::AfterUnblock,
        HookPoint::BeforeRemove,
        HookPoint::AfterRemove,
    ];

    /// Get the hook name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::BeforeCreate => "before_create",
            HookPoint::AfterCreate => "after_create",
            HookPoint::BeforeApprove => "before_approve",
            HookPoint::AfterApprove => "after_approve",
            HookPoint::BeforeBlock => "before_block",
            HookPoint::AfterBlock => "after_block",
            HookPoint::BeforeUnblock => "before_unblock",
            HookPoint::AfterUnblock => "after_unblock",
            HookPoint::BeforeRemove => "before_remove",
            HookPoint::AfterRemove => "after_remove",
        }
    }

    /// Parse a hook name, accepting `before_block` as well as `beforeBlock`
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|point| point.as_str().replace('_', "") == normalized)
    }

    /// True for the "before" half of a transition
    pub fn is_before(&self) -> bool {
        self.as_str().starts_with("before")
    }
}

impl std::str::FromStr for HookPoint {
    type Err = UnknownHook;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownHook(s.to_string()))
    }
}

/// A hook name that matches no [`HookPoint`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown hook: {0}")]
pub struct UnknownHook(pub String);

/// Event delivered to observers
#[derive(Debug, Clone, PartialEq)]
pub struct HookEvent {
    /// Where in the transition this fired
    pub point: HookPoint,

    /// User who invoked the transition
    pub actor: UserId,

    /// Edge snapshot: the prior state for "before", the resulting state for "after"
    pub edge: Friendship,
}

/// Subscriber to hook events
///
/// Returned errors are logged and otherwise ignored.
pub trait Observer: Send + Sync {
    /// React to an event
    fn notify(&self, event: &HookEvent) -> anyhow::Result<()>;
}

impl<F> Observer for F
where
    F: Fn(&HookEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn notify(&self, event: &HookEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Registry of observers keyed by hook point
#[derive(Default)]
pub struct HookRegistry {
    subscribers: RwLock<HashMap<HookPoint, Vec<Arc<dyn Observer>>>>,
}

static GLOBAL: OnceLock<Arc<HookRegistry>> = OnceLock::new();

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> Arc<HookRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(HookRegistry::new())))
    }

    /// Subscribe an observer to a hook point
    pub fn subscribe<O>(&self, point: HookPoint, observer: O)
    where
        O: Observer + 'static,
    {
        self.subscribe_shared(point, Arc::new(observer));
    }

    /// Subscribe an already shared observer, e.g. one listening on several points
    pub fn subscribe_shared(&self, point: HookPoint, observer: Arc<dyn Observer>) {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.entry(point).or_default().push(observer);
    }

    /// Subscribe by hook name
    pub fn subscribe_named<O>(&self, name: &str, observer: O) -> Result<(), UnknownHook>
    where
        O: Observer + 'static,
    {
        let point: HookPoint = name.parse()?;
        self.subscribe(point, observer);
        Ok(())
    }

    /// Number of observers on a hook point
    pub fn subscriber_count(&self, point: HookPoint) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&point)
            .map_or(0, Vec::len)
    }

    /// Deliver an event to every observer of its hook point, in subscription order
    ///
    /// Observer errors and panics are logged and swallowed.
    pub fn publish(&self, event: &HookEvent) {
        // Snapshot so observers run without the lock held and may subscribe
        let observers: Vec<Arc<dyn Observer>> = self
            .subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&event.point)
            .cloned()
            .unwrap_or_default();

        for observer in observers {
            match panic::catch_unwind(AssertUnwindSafe(|| observer.notify(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(hook = event.point.as_str(), edge = %event.edge.id, "Observer failed: {:#}", e);
                }
                Err(_) => {
                    tracing::warn!(hook = event.point.as_str(), edge = %event.edge.id, "Observer panicked");
                }
            }
        }
    }
}

/// Observer that forwards events to an async channel
///
/// Lets consumers handle events on a tokio task instead of inside the
/// transition. Sending never blocks.
///
/// # Examples
///
/// ```
/// use kinship_graph::{ChannelObserver, HookPoint, HookRegistry};
///
/// let registry = HookRegistry::new();
/// let (observer, mut rx) = ChannelObserver::new();
/// registry.subscribe(HookPoint::AfterApprove, observer);
/// # drop(rx.try_recv());
/// ```
#[derive(Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<HookEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiver that drains it
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HookEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Subscribe a clone of this observer to every hook point
    pub fn subscribe_all(&self, registry: &HookRegistry) {
        let shared: Arc<dyn Observer> = Arc::new(self.clone());
        for point in HookPoint::ALL {
            registry.subscribe_shared(point, Arc::clone(&shared));
        }
    }
}

impl Observer for ChannelObserver {
    fn notify(&self, event: &HookEvent) -> anyhow::Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| anyhow::anyhow!("hook channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn noop(_: &HookEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn event(point: HookPoint) -> HookEvent {
        let a = UserId::from_value(1);
        let b = UserId::from_value(2);
        HookEvent {
            point,
            actor: a,
            edge: Friendship::new(a, b, None, None, 0),
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(HookPoint::parse("before_approve"), Some(HookPoint::BeforeApprove));
        assert_eq!(HookPoint::parse("afterUnblock"), Some(HookPoint::AfterUnblock));
        assert_eq!(HookPoint::parse("beforeBlock"), Some(HookPoint::BeforeBlock));
        assert_eq!(HookPoint::parse("after-remove"), Some(HookPoint::AfterRemove));
        assert_eq!(HookPoint::parse("during_block"), None);
        assert!("nope".parse::<HookPoint>().is_err());
    }

    #[test]
    fn test_before_after_classification() {
        assert!(HookPoint::BeforeCreate.is_before());
        assert!(!HookPoint::AfterCreate.is_before());
    }

    #[test]
    fn test_publish_reaches_only_matching_point() {
        let registry = HookRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        registry.subscribe(HookPoint::AfterBlock, move |_: &HookEvent| -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        registry.publish(&event(HookPoint::AfterBlock));
        registry.publish(&event(HookPoint::BeforeBlock));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.subscriber_count(HookPoint::AfterBlock), 1);
        assert_eq!(registry.subscriber_count(HookPoint::BeforeBlock), 0);
    }

    #[test]
    fn test_failing_and_panicking_observers_are_contained() {
        let registry = HookRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        registry.subscribe(HookPoint::AfterApprove, |_: &HookEvent| -> anyhow::Result<()> {
            Err(anyhow::anyhow!("mail server down"))
        });
        registry.subscribe(HookPoint::AfterApprove, |_: &HookEvent| -> anyhow::Result<()> {
            panic!("observer bug")
        });
        let log = Arc::clone(&seen);
        registry.subscribe(HookPoint::AfterApprove, move |e: &HookEvent| -> anyhow::Result<()> {
            log.lock().unwrap().push(e.point);
            Ok(())
        });

        registry.publish(&event(HookPoint::AfterApprove));

        assert_eq!(*seen.lock().unwrap(), vec![HookPoint::AfterApprove]);
    }

    #[test]
    fn test_subscribe_named() {
        let registry = HookRegistry::new();
        assert!(registry.subscribe_named("beforeUnblock", noop).is_ok());
        assert_eq!(registry.subscriber_count(HookPoint::BeforeUnblock), 1);

        let err = registry
            .subscribe_named("before_lunch", noop)
            .unwrap_err();
        assert_eq!(err, UnknownHook("before_lunch".to_string()));
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = HookRegistry::global();
        let b = HookRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_channel_observer_forwards_in_order() {
        let registry = HookRegistry::new();
        let (observer, mut rx) = ChannelObserver::new();
        observer.subscribe_all(&registry);

        registry.publish(&event(HookPoint::BeforeRemove));
        registry.publish(&event(HookPoint::AfterRemove));

        assert_eq!(rx.recv().await.map(|e| e.point), Some(HookPoint::BeforeRemove));
        assert_eq!(rx.recv().await.map(|e| e.point), Some(HookPoint::AfterRemove));
    }

    #[test]
    fn test_channel_observer_closed_receiver_is_not_fatal() {
        let registry = HookRegistry::new();
        let (observer, rx) = ChannelObserver::new();
        registry.subscribe(HookPoint::AfterBlock, observer);
        drop(rx);

        // Logged, not propagated
        registry.publish(&event(HookPoint::AfterBlock));
    }
}
