//! Scoped, cancellable resource watches.
//!
//! A [`ScopedWatchFactory`] turns a namespace scope and an optional label
//! selector into a live change-notification stream over one resource kind,
//! delivering events to a caller-supplied handler on a spawned task. The
//! returned [`WatchHandle`] is the subscription's lifecycle: it is `Active`
//! until cancelled by the caller or terminated by the transport, and
//! cancellation is idempotent.
//!
//! Scope resolution (which collection view to query) and selector application
//! (which predicate the endpoint applies) are combined once, in
//! [`WatchQuery`], so every resource kind shares the same tested branch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use kube::core::Selector;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connector::WatchConnector;
use crate::error::SubscriptionTerminated;

/// Namespace scope of a watch. Exactly one applies per subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    /// Observe the resource collection across every namespace
    AllNamespaces,
    /// Observe only the named namespace
    Namespaced(String),
}

impl WatchScope {
    /// Returns the namespace filter this scope translates to.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            WatchScope::AllNamespaces => None,
            WatchScope::Namespaced(namespace) => Some(namespace),
        }
    }
}

/// A `(scope, selector)` pair translated into a collection query.
///
/// The underlying collection endpoint performs the filtering; this type only
/// carries the constraints. When both are present they apply jointly.
#[derive(Debug, Clone)]
pub struct WatchQuery {
    /// Namespace filter, `None` for all namespaces
    pub namespace: Option<String>,
    /// Optional label selector, applied by the endpoint at subscription time
    pub selector: Option<Selector>,
}

impl WatchQuery {
    /// Builds the query for a scope and an optional selector.
    pub fn new(scope: WatchScope, selector: Option<Selector>) -> Self {
        let namespace = match scope {
            WatchScope::AllNamespaces => None,
            WatchScope::Namespaced(namespace) => Some(namespace),
        };
        Self {
            namespace,
            selector,
        }
    }
}

/// A discrete change observed by a watch.
///
/// The transport folds added and modified notifications into [`Applied`](Self::Applied);
/// terminal errors are reported through [`WatchEventHandler::on_terminated`]
/// rather than as an event variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent<K> {
    /// The resource was added or modified
    Applied(K),
    /// The resource was deleted
    Deleted(K),
}

/// Capability object invoked once per observed event.
///
/// Callbacks run on the delivery task owned by the subscription, in the order
/// the collection endpoint observed the changes. Ordering across two
/// independent handles is not coordinated.
pub trait WatchEventHandler<K>: Send + Sync {
    /// Called for every change the subscription observes.
    fn on_event(&self, event: ResourceEvent<K>);

    /// Called at most once, when the change stream cannot continue.
    ///
    /// The handle transitions to `Cancelled` immediately after this returns.
    fn on_terminated(&self, error: SubscriptionTerminated);
}

/// One active subscription.
///
/// Two states: `Active` (delivering events) and `Cancelled` (terminal). The
/// handle reaches `Cancelled` either through [`cancel`](Self::cancel) or
/// autonomously when the transport reports a terminal error. It is not
/// reusable afterwards; callers re-subscribe through the factory.
#[derive(Debug)]
pub struct WatchHandle {
    cancelled: Arc<AtomicBool>,
    cancel: Arc<Notify>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stops further event delivery and releases the delivery task.
    ///
    /// Safe to call from any thread, concurrently with in-flight delivery;
    /// at most one already-in-flight handler invocation may still complete
    /// after this returns. Calling it again is a no-op.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.cancel.notify_one();
        }
    }

    /// Returns true once the handle left the `Active` state, whether through
    /// [`cancel`](Self::cancel) or a transport-initiated termination.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns true while the delivery task is still running.
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Creates and tears down watch subscriptions for one resource kind.
///
/// The factory holds the transport ([`WatchConnector`]) and the kind name
/// used for logging; each [`watch`](Self::watch) call owns its own handle,
/// so one factory serves many concurrent subscriptions.
pub struct ScopedWatchFactory<K> {
    connector: Arc<dyn WatchConnector<K>>,
    kind: String,
}

impl<K> std::fmt::Debug for ScopedWatchFactory<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedWatchFactory")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<K: Send + 'static> ScopedWatchFactory<K> {
    /// Creates a factory over the given transport.
    ///
    /// `kind` names the watched resource kind in log messages.
    pub fn new(connector: Arc<dyn WatchConnector<K>>, kind: impl Into<String>) -> Self {
        Self {
            connector,
            kind: kind.into(),
        }
    }

    /// Subscribes to changes within `scope`, without a label selector.
    pub fn watch(&self, scope: WatchScope, handler: Arc<dyn WatchEventHandler<K>>) -> WatchHandle {
        self.watch_selected(scope, None, handler)
    }

    /// Subscribes to changes within `scope`, observing only resources that
    /// match `selector` when one is given.
    ///
    /// Returns immediately; the initial connection handshake and all event
    /// delivery happen on a spawned task owned by the returned handle.
    pub fn watch_selected(
        &self,
        scope: WatchScope,
        selector: Option<Selector>,
        handler: Arc<dyn WatchEventHandler<K>>,
    ) -> WatchHandle {
        let query = WatchQuery::new(scope, selector);
        debug!(
            "Starting {} watch (namespace: {})",
            self.kind,
            query.namespace.as_deref().unwrap_or("all namespaces")
        );

        let mut stream = self.connector.connect(query);
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(Notify::new());
        let kind = self.kind.clone();

        let task = {
            let cancelled = Arc::clone(&cancelled);
            let cancel = Arc::clone(&cancel);
            tokio::spawn(async move {
                loop {
                    if cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    tokio::select! {
                        () = cancel.notified() => {
                            debug!("{} watch cancelled", kind);
                            break;
                        }
                        item = stream.next() => match item {
                            Some(Ok(event)) => handler.on_event(event),
                            Some(Err(error)) => {
                                warn!("{} watch terminated: {}", kind, error);
                                cancelled.store(true, Ordering::SeqCst);
                                handler.on_terminated(error);
                                break;
                            }
                            None => {
                                warn!("{} watch stream closed", kind);
                                cancelled.store(true, Ordering::SeqCst);
                                handler.on_terminated(SubscriptionTerminated::new(
                                    "change stream closed by transport",
                                ));
                                break;
                            }
                        }
                    }
                }
            })
        };

        WatchHandle {
            cancelled,
            cancel,
            task,
        }
    }
}
