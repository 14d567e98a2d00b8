//! Mock watch transport for unit testing.
//!
//! [`MockWatchConnector`] stands in for the cluster's collection endpoint:
//! it records every query it is asked to open, applies the query's namespace
//! and selector constraints the way the real endpoint would, and lets tests
//! inject events and terminal errors without a running cluster.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use futures::channel::mpsc;
use futures::stream::BoxStream;
use futures::StreamExt;
use kube::core::SelectorExt;
use kube::Resource;

use crate::connector::WatchConnector;
use crate::error::SubscriptionTerminated;
use crate::watch::{ResourceEvent, WatchQuery};

type EventSender<K> = mpsc::UnboundedSender<Result<ResourceEvent<K>, SubscriptionTerminated>>;

/// In-memory fake of the collection endpoint.
///
/// Clones share one subscriber table, so a test can hold the connector while
/// the factory holds another handle to it.
#[derive(Debug)]
pub struct MockWatchConnector<K> {
    subscribers: Arc<Mutex<Vec<(WatchQuery, EventSender<K>)>>>,
    queries: Arc<Mutex<Vec<WatchQuery>>>,
}

impl<K> Clone for MockWatchConnector<K> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
            queries: Arc::clone(&self.queries),
        }
    }
}

impl<K> Default for MockWatchConnector<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> MockWatchConnector<K> {
    /// Creates an empty mock endpoint.
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every query opened against this endpoint, in order.
    pub fn queries(&self) -> Vec<WatchQuery> {
        self.queries.lock().unwrap().clone()
    }

    /// Delivers a terminal error to every open subscription.
    pub fn terminate_all(&self, cause: &str) {
        let mut subscribers = self.subscribers.lock().unwrap();
        for (_, sender) in subscribers.drain(..) {
            let _ = sender.unbounded_send(Err(SubscriptionTerminated::new(cause)));
        }
    }
}

impl<K> MockWatchConnector<K>
where
    K: Resource + Clone,
{
    /// Injects an added/modified notification for `resource`.
    ///
    /// Routed only to subscriptions whose query matches the resource's
    /// namespace and labels - the endpoint-side filtering the real
    /// collection performs.
    pub fn push_applied(&self, resource: &K) {
        self.push(resource, ResourceEvent::Applied(resource.clone()));
    }

    /// Injects a deleted notification for `resource`.
    pub fn push_deleted(&self, resource: &K) {
        self.push(resource, ResourceEvent::Deleted(resource.clone()));
    }

    fn push(&self, resource: &K, event: ResourceEvent<K>) {
        let meta = resource.meta();
        let namespace = meta.namespace.as_deref();
        let empty = BTreeMap::new();
        let labels = meta.labels.as_ref().unwrap_or(&empty);

        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|(query, sender)| {
            if !matches(query, namespace, labels) {
                return true;
            }
            // Drop subscribers whose receiving side is gone
            sender.unbounded_send(Ok(event.clone())).is_ok()
        });
    }
}

fn matches(query: &WatchQuery, namespace: Option<&str>, labels: &BTreeMap<String, String>) -> bool {
    if let Some(wanted) = query.namespace.as_deref() {
        if namespace != Some(wanted) {
            return false;
        }
    }
    match &query.selector {
        Some(selector) => selector.matches(labels),
        None => true,
    }
}

impl<K> WatchConnector<K> for MockWatchConnector<K>
where
    K: Clone + Send + Sync + 'static,
{
    fn connect(
        &self,
        query: WatchQuery,
    ) -> BoxStream<'static, Result<ResourceEvent<K>, SubscriptionTerminated>> {
        let (sender, receiver) = mpsc::unbounded();
        self.queries.lock().unwrap().push(query.clone());
        self.subscribers.lock().unwrap().push((query, sender));
        receiver.boxed()
    }
}
