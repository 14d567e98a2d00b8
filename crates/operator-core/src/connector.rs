//! Watch transport.
//!
//! [`WatchConnector`] abstracts the change-stream endpoint so the factory can
//! be exercised against an in-memory transport in unit tests, the same way
//! the NetBox client is mocked elsewhere in this workspace. The production
//! implementation is [`KubeWatchConnector`], backed by `kube_runtime`'s
//! watcher, which owns reconnection and backoff; this crate only surfaces the
//! terminal outcome.

use std::fmt::Debug;

use futures::stream::BoxStream;
use futures::{StreamExt, future};
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use kube_runtime::watcher;
use serde::de::DeserializeOwned;

use crate::error::SubscriptionTerminated;
use crate::watch::{ResourceEvent, WatchQuery};

/// Opens a filtered, namespace-scoped change stream over a resource collection.
///
/// The endpoint behind the connector is responsible for applying the query's
/// namespace and selector constraints; items are yielded in the order the
/// endpoint observed them. An `Err` item is terminal: no further events follow.
pub trait WatchConnector<K>: Send + Sync {
    /// Establishes the subscription described by `query`.
    fn connect(
        &self,
        query: WatchQuery,
    ) -> BoxStream<'static, Result<ResourceEvent<K>, SubscriptionTerminated>>;
}

/// Production transport over the Kubernetes API.
#[derive(Clone)]
pub struct KubeWatchConnector {
    client: Client,
}

impl Debug for KubeWatchConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeWatchConnector").finish_non_exhaustive()
    }
}

impl KubeWatchConnector {
    /// Creates a connector over the given cluster client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
        }
    }
}

impl<K> WatchConnector<K> for KubeWatchConnector
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static,
    K::DynamicType: Default,
{
    fn connect(
        &self,
        query: WatchQuery,
    ) -> BoxStream<'static, Result<ResourceEvent<K>, SubscriptionTerminated>> {
        let api: Api<K> = match query.namespace.as_deref() {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };
        let mut config = watcher::Config::default();
        if let Some(selector) = &query.selector {
            config = config.labels_from(selector);
        }

        // The watcher folds added/modified into Apply and replays the
        // initial list as InitApply; list markers carry no resource and
        // are dropped. Watcher errors are terminal from this crate's
        // point of view - retry policy lives in the transport, not here.
        watcher(api, config)
            .filter_map(|step| {
                future::ready(match step {
                    Ok(watcher::Event::Apply(resource) | watcher::Event::InitApply(resource)) => {
                        Some(Ok(ResourceEvent::Applied(resource)))
                    }
                    Ok(watcher::Event::Delete(resource)) => {
                        Some(Ok(ResourceEvent::Deleted(resource)))
                    }
                    Ok(watcher::Event::Init | watcher::Event::InitDone) => None,
                    Err(error) => Some(Err(SubscriptionTerminated::new(error.to_string()))),
                })
            })
            .boxed()
    }
}
