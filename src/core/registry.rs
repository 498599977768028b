//! # Preload registry - keyed, at-most-one-subscription subject cache.
//!
//! The registry maps caller-derived string keys to [`StatusSubject`]s. It is the
//! only mutable shared state of the bridge and the mechanism that prevents
//! duplicate subscriptions when many consumers ask for the same resource.
//!
//! ## Architecture
//! ```text
//! get_or_create(key, factory, window)
//!     ├─► lock map
//!     │     ├─ key present  ─► downcast (TypeMismatch on wrong T) ─► return existing
//!     │     └─ key missing  ─► insert idle subject (child token)
//!     ├─► unlock map
//!     └─► factory() ─► subject.start(source)        (creator only, outside the lock)
//!             └─ Err ─► subject records an immediate error
//! ```
//!
//! ## Rules
//! - First writer wins: `factory` and `window` are ignored for existing keys.
//! - The factory runs outside the map lock, so sources may read the registry.
//! - Entries are never dropped because consumers detach; only [`Registry::evict`]
//!   (or [`Registry::clear`]) removes them and cancels the warm-up subscription.
//! - Keys are used verbatim (no normalization).
//! - Once the runtime token is cancelled no new entries are created.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{BridgeError, SourceError};
use crate::events::{Bus, Event, EventKind};
use crate::sources::Source;
use crate::subject::{FirstEmission, StatusSubject};

/// Type-erased view of a subject held by the registry.
trait ErasedSubject: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn close(&self);
    fn payload_type(&self) -> &'static str;
}

impl<T: Clone + Send + Sync + 'static> ErasedSubject for StatusSubject<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn close(&self) {
        StatusSubject::close(self);
    }

    fn payload_type(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Keyed cache of status subjects.
pub struct Registry {
    entries: Mutex<HashMap<String, Box<dyn ErasedSubject>>>,
    bus: Bus,
    runtime_token: CancellationToken,
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// `runtime_token` is the parent of every warm-up token; cancelling it
    /// tears down all subscriptions at once.
    pub fn new(bus: Bus, runtime_token: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            bus,
            runtime_token,
        })
    }

    /// Returns the subject for `key`, creating it (and subscribing to the
    /// source from `factory`) if absent.
    ///
    /// # Errors
    /// - [`BridgeError::EmptyKey`] for an empty key.
    /// - [`BridgeError::TypeMismatch`] if `key` holds a subject of another payload type.
    /// - [`BridgeError::ShutDown`] for a new key once the runtime token is cancelled.
    ///
    /// A failing `factory` is not an error here: the subject records it as an
    /// immediate error state.
    pub fn get_or_create<T, S, F>(
        &self,
        key: &str,
        factory: F,
        window: Duration,
    ) -> Result<StatusSubject<T>, BridgeError>
    where
        T: Clone + Send + Sync + 'static,
        S: Source<T>,
        F: FnOnce() -> Result<S, SourceError>,
    {
        if key.is_empty() {
            return Err(BridgeError::EmptyKey);
        }

        let created = {
            let mut entries = self.entries.lock();
            if let Some(existing) = entries.get(key) {
                return downcast(key, existing.as_ref());
            }
            if self.runtime_token.is_cancelled() {
                return Err(BridgeError::ShutDown);
            }
            let subject = StatusSubject::<T>::idle(
                Arc::from(key),
                window,
                self.bus.clone(),
                self.runtime_token.child_token(),
            );
            entries.insert(key.to_string(), Box::new(subject.clone()));
            subject
        };

        tracing::debug!(key, ?window, "registry entry created");
        self.bus.publish(
            Event::new(EventKind::EntryCreated)
                .with_key(key)
                .with_window(window),
        );

        match factory() {
            Ok(source) => created.start(&source),
            Err(err) => created.fail_construction(err),
        }
        Ok(created)
    }

    /// Returns the existing subject for `key` without creating one.
    pub fn get<T>(&self, key: &str) -> Result<Option<StatusSubject<T>>, BridgeError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.lock();
        entries
            .get(key)
            .map(|existing| downcast(key, existing.as_ref()))
            .transpose()
    }

    /// Creates (or reuses) the entry for `key` and returns its first-emission signal.
    ///
    /// Intended to warm a cache entry before the consuming UI mounts.
    pub fn preload<T, S, F>(
        &self,
        key: &str,
        factory: F,
        window: Duration,
    ) -> Result<FirstEmission, BridgeError>
    where
        T: Clone + Send + Sync + 'static,
        S: Source<T>,
        F: FnOnce() -> Result<S, SourceError>,
    {
        self.get_or_create::<T, S, F>(key, factory, window)
            .map(|subject| subject.first_emission())
    }

    /// Returns true if `key` has an entry.
    pub fn has(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Removes `key`, cancelling its warm-up subscription and ending its observers.
    ///
    /// Returns false if there was no such entry.
    pub fn evict(&self, key: &str) -> bool {
        let removed = self.entries.lock().remove(key);
        match removed {
            Some(subject) => {
                subject.close();
                tracing::debug!(key, "registry entry evicted");
                self.bus
                    .publish(Event::new(EventKind::EntryEvicted).with_key(key));
                true
            }
            None => false,
        }
    }

    /// Evicts every entry. Test/debug reset hook.
    pub fn clear(&self) {
        let drained: Vec<(String, Box<dyn ErasedSubject>)> = {
            let mut entries = self.entries.lock();
            entries.drain().collect()
        };
        for (key, subject) in drained {
            subject.close();
            self.bus
                .publish(Event::new(EventKind::EntryEvicted).with_key(key));
        }
    }

    /// Returns sorted list of keys.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Diagnostic bus shared with every subject.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}

fn downcast<T>(key: &str, existing: &dyn ErasedSubject) -> Result<StatusSubject<T>, BridgeError>
where
    T: Clone + Send + Sync + 'static,
{
    existing
        .as_any()
        .downcast_ref::<StatusSubject<T>>()
        .cloned()
        .ok_or_else(|| BridgeError::TypeMismatch {
            key: key.to_string(),
            existing: existing.payload_type(),
            requested: type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Sink, SourceFn, SourceRef};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WINDOW: Duration = Duration::from_secs(30);

    fn registry() -> Arc<Registry> {
        Registry::new(Bus::new(64), CancellationToken::new())
    }

    fn counting_source(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> Result<SourceRef<u32>, SourceError> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let src: SourceRef<u32> =
                SourceFn::arc(move |sink: Sink<u32>, _ctx: CancellationToken| {
                    sink.next(value);
                    Ok::<_, SourceError>(())
                });
            Ok(src)
        }
    }

    fn create(reg: &Registry, key: &str, calls: &Arc<AtomicUsize>, value: u32) -> StatusSubject<u32> {
        reg.get_or_create::<u32, _, _>(key, counting_source(calls, value), WINDOW)
            .unwrap()
    }

    #[test]
    fn same_key_subscribes_once() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = create(&reg, "doc/1", &calls, 1);
        let b = create(&reg, "doc/1", &calls, 2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.value(), Some(1));
        assert_eq!(b.value(), Some(1));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn concurrent_lookups_create_one_subscription() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let reg = Arc::clone(&reg);
                let calls = Arc::clone(&calls);
                scope.spawn(move || {
                    create(&reg, "doc/shared", &calls, 9);
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wrong_payload_type_is_rejected() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        create(&reg, "doc/1", &calls, 1);

        let err = reg.get::<String>("doc/1").unwrap_err();
        assert_eq!(err.as_label(), "bridge_type_mismatch");
    }

    #[test]
    fn empty_key_is_rejected() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let err = reg
            .get_or_create::<u32, _, _>("", counting_source(&calls, 1), WINDOW)
            .unwrap_err();
        assert_eq!(err, BridgeError::EmptyKey);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn factory_failure_is_captured_as_error_state() {
        let reg = registry();
        let subject = reg
            .get_or_create::<u32, SourceRef<u32>, _>(
                "doc/broken",
                || Err(SourceError::msg("bad reference")),
                WINDOW,
            )
            .unwrap();

        assert!(subject.first_emission().is_settled());
        assert_eq!(subject.error().unwrap().to_string(), "bad reference");
        assert!(reg.has("doc/broken"));
    }

    #[test]
    fn evict_cancels_and_allows_recreation() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let first = create(&reg, "doc/1", &calls, 1);
        let mut rx = reg.bus().subscribe();

        assert!(reg.evict("doc/1"));
        assert!(!reg.evict("doc/1"));
        assert!(first.is_closed());
        assert!(!reg.has("doc/1"));
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::EntryEvicted);

        let second = create(&reg, "doc/1", &calls, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.value(), Some(2));
    }

    #[test]
    fn preload_returns_first_emission() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        let first = reg
            .preload::<u32, _, _>("doc/1", counting_source(&calls, 1), WINDOW)
            .unwrap();
        assert!(first.is_settled());
        assert_eq!(reg.keys(), vec!["doc/1".to_string()]);
    }

    #[test]
    fn cancelled_runtime_rejects_new_keys() {
        let token = CancellationToken::new();
        let reg = Registry::new(Bus::new(64), token.clone());
        let calls = Arc::new(AtomicUsize::new(0));

        token.cancel();
        let err = reg
            .get_or_create::<u32, _, _>("doc/1", counting_source(&calls, 1), WINDOW)
            .unwrap_err();
        assert_eq!(err, BridgeError::ShutDown);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!reg.has("doc/1"));
    }

    #[test]
    fn clear_empties_the_registry() {
        let reg = registry();
        let calls = Arc::new(AtomicUsize::new(0));
        create(&reg, "a", &calls, 1);
        create(&reg, "b", &calls, 2);

        reg.clear();
        assert!(reg.is_empty());
    }
}
