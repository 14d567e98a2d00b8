//! Operator core errors.
//!
//! Only two error kinds originate in this crate: a synchronous annotation
//! coercion failure and the asynchronous terminal event of a watch.
//! Transport-level faults are carried inside [`SubscriptionTerminated`] as an
//! opaque cause and are not decomposed further here.

use thiserror::Error;

/// Errors raised while resolving typed annotation values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    /// The selected annotation value could not be coerced to the requested type
    #[error("invalid value '{value}' for annotation '{key}': expected a base-10 integer")]
    MalformedValue {
        /// Annotation key whose value was selected (primary or deprecated)
        key: String,
        /// Raw string value that failed to parse
        value: String,
    },
}

/// Terminal event of a watch subscription.
///
/// Delivered to the watch handler when the underlying change stream cannot
/// continue; the owning [`WatchHandle`](crate::watch::WatchHandle) transitions
/// to `Cancelled`. The caller decides whether to re-subscribe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("watch subscription terminated: {cause}")]
pub struct SubscriptionTerminated {
    /// Opaque description of why the stream ended
    pub cause: String,
}

impl SubscriptionTerminated {
    /// Creates a terminal event with the given cause.
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }
}
