//! Operator Core
//!
//! Shared runtime services for Microscaler controllers:
//!
//! - **Annotation resolution**: typed configuration values read off a
//!   resource's annotation map, with deprecated-key fallback and defaults
//! - **Scoped watches**: cancellable change-notification streams over a
//!   resource collection, filtered by namespace and optional label selector
//!
//! The reconciliation engine that consumes resolved values and watch events
//! lives in the controller binaries; this crate is the library boundary
//! between them and the cluster API.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kube::Resource;
//! use operator_core::{
//!     bool_annotation, is_reconciliation_paused, KubeWatchConnector, ResourceEvent,
//!     ScopedWatchFactory, SubscriptionTerminated, WatchEventHandler, WatchScope,
//! };
//! use k8s_openapi::api::core::v1::ConfigMap;
//!
//! struct LogHandler;
//!
//! impl WatchEventHandler<ConfigMap> for LogHandler {
//!     fn on_event(&self, event: ResourceEvent<ConfigMap>) {
//!         if let ResourceEvent::Applied(map) = event {
//!             // Skip paused resources, honor a per-resource tunable
//!             if is_reconciliation_paused(map.meta()) {
//!                 return;
//!             }
//!             let _verbose = bool_annotation(map.meta(), "dcops.microscaler.io/verbose", false, &[]);
//!         }
//!     }
//!
//!     fn on_terminated(&self, error: SubscriptionTerminated) {
//!         eprintln!("watch ended: {error}");
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = kube::Client::try_default().await?;
//! let factory: ScopedWatchFactory<ConfigMap> =
//!     ScopedWatchFactory::new(Arc::new(KubeWatchConnector::new(client)), "ConfigMap");
//!
//! let handle = factory.watch(WatchScope::Namespaced("dcops".to_string()), Arc::new(LogHandler));
//! // ... later
//! handle.cancel();
//! # Ok(())
//! # }
//! ```

pub mod annotations;
mod annotations_test;
pub mod connector;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod watch;

pub use annotations::{
    Annotated, ANNO_DCOPS_CONFIG_HASH, ANNO_DCOPS_FORCE_RESYNC, ANNO_DCOPS_PAUSE_RECONCILIATION,
    DCOPS_DOMAIN, bool_annotation, has_annotation, int_annotation, is_reconciliation_paused,
    string_annotation,
};
pub use connector::{KubeWatchConnector, WatchConnector};
pub use error::{AnnotationError, SubscriptionTerminated};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockWatchConnector;
pub use watch::{
    ResourceEvent, ScopedWatchFactory, WatchEventHandler, WatchHandle, WatchQuery, WatchScope,
};
