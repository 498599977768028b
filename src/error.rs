//! Error types used by the status bridge and its sources.
//!
//! This module defines two error types:
//!
//! - [`BridgeError`] - programmer/configuration errors raised synchronously by
//!   the registry and the bridge (wrong key, wrong payload type, use after shutdown).
//! - [`SourceError`] - an error produced by a push-based source. It is never
//!   raised out of the bridge; it travels through snapshots and observations.
//!
//! [`BridgeError`] provides helper methods (`as_label`, `as_message`) for logging/metrics.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// # Errors raised synchronously by the registry and the bridge.
///
/// These represent misuse by the caller, not failures of a source.
/// Source failures are delivered through [`StatusSnapshot::error`](crate::StatusSnapshot).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Cache keys must be non-empty.
    #[error("cache key must not be empty")]
    EmptyKey,

    /// A key was requested with a payload type different from the one it was created with.
    #[error("key {key:?} holds {existing}, requested as {requested}")]
    TypeMismatch {
        /// The offending cache key.
        key: String,
        /// Payload type of the existing entry.
        existing: &'static str,
        /// Payload type the caller asked for.
        requested: &'static str,
    },

    /// The bridge was shut down; no new entries are created.
    #[error("bridge is shut down")]
    ShutDown,
}

impl BridgeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statusvisor::BridgeError;
    ///
    /// assert_eq!(BridgeError::EmptyKey.as_label(), "bridge_empty_key");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::EmptyKey => "bridge_empty_key",
            BridgeError::TypeMismatch { .. } => "bridge_type_mismatch",
            BridgeError::ShutDown => "bridge_shut_down",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BridgeError::EmptyKey => "empty cache key".to_string(),
            BridgeError::TypeMismatch {
                key,
                existing,
                requested,
            } => format!("type mismatch: key={key} existing={existing} requested={requested}"),
            BridgeError::ShutDown => "bridge shut down".to_string(),
        }
    }
}

/// # Error emitted by a push-based source.
///
/// Wraps the original error object in an `Arc` so that every observer and
/// every snapshot sees the very same value. Use [`SourceError::downcast_ref`]
/// to get the concrete error back.
#[derive(Clone)]
pub struct SourceError {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl SourceError {
    /// Wraps an arbitrary error.
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(err),
        }
    }

    /// Creates an error from a plain message.
    ///
    /// # Example
    /// ```
    /// use statusvisor::SourceError;
    ///
    /// let err = SourceError::msg("permission denied");
    /// assert_eq!(err.to_string(), "permission denied");
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Returns the wrapped error.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    /// Attempts to downcast the wrapped error to a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// Returns true if both handles point at the same original error.
    pub fn ptr_eq(&self, other: &SourceError) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceError").field(&self.inner).finish()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for SourceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// Plain-message error used by [`SourceError::msg`].
#[derive(Error, Debug)]
#[error("{0}")]
struct Message(String);
