//! # StatusBridge: per-read adapter from subjects to snapshots.
//!
//! The [`StatusBridge`] owns a [`Registry`], the bridge [`Config`] and the
//! optional diagnostic fan-out. Every read goes through the same path:
//!
//! ```text
//! read(key, factory, options)
//!   └─► Registry::get_or_create(key, factory, window)       (one subscription per key)
//!         └─► read_subject(subject, options)
//!               ├─ suspense = options.suspense ?? cfg.suspense
//!               ├─ view = subject.inspect()
//!               └─ Escalation::decide(view, subject window, suspense)
//!                    ├─ Settle              ─► Ready(StatusSnapshot::derive(..))
//!                    └─ Suspend { stalled } ─► ReadSuspended (once)
//!                                              SuspenseStalled + warn (once, StallPolicy::Log)
//!                                              Pending(first emission, stall watch)
//!
//! Pending::wait ── first emission ──────────────────► return
//!               └─ created + window elapses first ──► SuspenseStalled + warn (once), keep waiting
//! ```
//!
//! The bridge never blocks a thread. A pending read hands back an awaitable;
//! the caller decides how to pause and reads again once it settles. After a
//! key has emitted once, reads of it never suspend again.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::{window_or_none, Config};
use crate::core::snapshot::StallHook;
use crate::core::{BridgeBuilder, Pending, ReadOptions, ReadOutcome, Registry, StatusSnapshot};
use crate::error::{BridgeError, SourceError};
use crate::events::{Event, EventKind};
use crate::policies::{Escalation, SubjectView};
use crate::sources::Source;
use crate::subject::{FirstEmission, StatusSubject};
use crate::subscribers::SubscriberSet;

/// Subscriber fan-out wiring owned by the bridge.
pub(crate) struct Fanout {
    pub(crate) subs: Arc<SubscriberSet>,
    pub(crate) listener: JoinHandle<()>,
}

/// Turns push-based sources into synchronous status snapshots.
pub struct StatusBridge {
    cfg: Config,
    registry: Arc<Registry>,
    runtime_token: CancellationToken,
    fanout: Mutex<Option<Fanout>>,
}

impl StatusBridge {
    /// Creates a bridge without subscribers. Does not need a tokio runtime.
    pub fn new(cfg: Config) -> Self {
        BridgeBuilder::new(cfg).build()
    }

    /// Returns a builder for a bridge with subscribers.
    pub fn builder(cfg: Config) -> BridgeBuilder {
        BridgeBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        registry: Arc<Registry>,
        runtime_token: CancellationToken,
        fanout: Option<Fanout>,
    ) -> Self {
        Self {
            cfg,
            registry,
            runtime_token,
            fanout: Mutex::new(fanout),
        }
    }

    /// Bridge configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The registry backing this bridge.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Resolves the suspense mode for a read.
    pub fn suspense_enabled(&self, from_read: Option<bool>) -> bool {
        self.cfg.suspense_enabled(from_read)
    }

    /// Reads the status of `key`, creating its subject from `factory` if needed.
    ///
    /// Returns [`ReadOutcome::Pending`] only in suspense mode, when the subject
    /// has neither value nor error and the read supplied no initial data.
    ///
    /// # Errors
    /// [`BridgeError`] for programmer errors (empty key, payload type mismatch)
    /// and for new keys after [`shutdown`](Self::shutdown).
    /// Source failures are reported inside the snapshot instead.
    pub fn read<T, S, F>(
        &self,
        key: &str,
        factory: F,
        options: ReadOptions<T>,
    ) -> Result<ReadOutcome<T>, BridgeError>
    where
        T: Clone + Send + Sync + 'static,
        S: Source<T>,
        F: FnOnce() -> Result<S, SourceError>,
    {
        let window = options.timeout_window.unwrap_or(self.cfg.timeout_window);
        let subject = self.registry.get_or_create(key, factory, window)?;
        Ok(self.read_subject(&subject, options))
    }

    /// Reads the status of a subject the caller already holds.
    pub fn read_subject<T>(&self, subject: &StatusSubject<T>, options: ReadOptions<T>) -> ReadOutcome<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let suspense = self.cfg.suspense_enabled(options.suspense);
        let initial = options.into_initial();
        let inspection = subject.inspect();

        let view = SubjectView {
            has_value: inspection.value.is_some(),
            has_error: inspection.error.is_some(),
            is_complete: inspection.complete,
            is_closed: inspection.closed,
            has_initial: initial.is_some(),
            elapsed: inspection.elapsed,
        };
        let window = window_or_none(subject.timeout_window());

        match Escalation::decide(&view, window, suspense) {
            Escalation::Settle => ReadOutcome::Ready(StatusSnapshot::derive(
                inspection,
                initial,
                subject.first_emission(),
            )),
            Escalation::Suspend { stalled } => {
                self.on_suspend(subject, stalled);
                let mut pending = Pending::new(subject.key(), subject.first_emission(), stalled);
                if let (Some(window), true) = (window, self.cfg.stall.reports()) {
                    let watched = subject.clone();
                    let hook: StallHook = Arc::new(move || report_stall(&watched));
                    pending = pending.watch_stall(subject.created_at() + window, hook);
                }
                ReadOutcome::Pending(pending)
            }
        }
    }

    /// Reads `key` and, while suspended, waits and reads again.
    ///
    /// This is the retry loop a rendering framework runs around a suspended
    /// read. Always resolves to a snapshot once the subject emits, errors,
    /// completes or is evicted. While waiting past the subject's timeout
    /// window the stall is reported per [`StallPolicy`](crate::StallPolicy).
    pub async fn read_settled<T, S, F>(
        &self,
        key: &str,
        factory: F,
        options: ReadOptions<T>,
    ) -> Result<StatusSnapshot<T>, BridgeError>
    where
        T: Clone + Send + Sync + 'static,
        S: Source<T>,
        F: FnOnce() -> Result<S, SourceError>,
    {
        let window = options.timeout_window.unwrap_or(self.cfg.timeout_window);
        let subject = self.registry.get_or_create(key, factory, window)?;
        loop {
            match self.read_subject(&subject, options.clone()) {
                ReadOutcome::Ready(snapshot) => return Ok(snapshot),
                ReadOutcome::Pending(pending) => pending.wait().await,
            }
        }
    }

    /// Starts the subject for `key` ahead of any read and returns its first-emission signal.
    pub fn preload<T, S, F>(
        &self,
        key: &str,
        factory: F,
        window: std::time::Duration,
    ) -> Result<FirstEmission, BridgeError>
    where
        T: Clone + Send + Sync + 'static,
        S: Source<T>,
        F: FnOnce() -> Result<S, SourceError>,
    {
        self.registry.preload::<T, S, F>(key, factory, window)
    }

    /// Evicts every entry, stops the fan-out listener and drains subscriber workers.
    ///
    /// Reads of keys that do not exist yet fail with [`BridgeError::ShutDown`] afterwards.
    pub async fn shutdown(&self) {
        self.runtime_token.cancel();
        self.registry.clear();

        let fanout = self.fanout.lock().take();
        if let Some(Fanout { subs, listener }) = fanout {
            let _ = listener.await;
            match Arc::try_unwrap(subs) {
                Ok(set) => set.shutdown().await,
                Err(_) => tracing::warn!("subscriber set still shared at shutdown"),
            }
        }
    }

    fn on_suspend<T>(&self, subject: &StatusSubject<T>, stalled: bool) {
        if subject.mark_suspended() {
            tracing::debug!(key = subject.key(), "read suspended");
            subject
                .bus()
                .publish(Event::new(EventKind::ReadSuspended).with_key(subject.key()));
        }
        if stalled && self.cfg.stall.reports() {
            report_stall(subject);
        }
    }
}

/// Warns and publishes `SuspenseStalled`, once per subject.
fn report_stall<T>(subject: &StatusSubject<T>) {
    if !subject.mark_stalled() {
        return;
    }
    let elapsed = subject.elapsed();
    let window = subject.timeout_window();
    tracing::warn!(
        key = subject.key(),
        ?elapsed,
        ?window,
        "suspense read still pending past its timeout window"
    );
    subject.bus().publish(
        Event::new(EventKind::SuspenseStalled)
            .with_key(subject.key())
            .with_elapsed(elapsed)
            .with_window(window),
    );
}

impl Default for StatusBridge {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for StatusBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusBridge")
            .field("cfg", &self.cfg)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Status;
    use crate::policies::StallPolicy;
    use crate::sources::{Sink, SourceFn, SourceRef};
    use std::time::Duration;

    type Slot = Arc<Mutex<Option<Sink<u32>>>>;

    fn manual() -> (Slot, impl FnOnce() -> Result<SourceRef<u32>, SourceError>) {
        let slot: Slot = Arc::new(Mutex::new(None));
        let inner = Arc::clone(&slot);
        let factory = move || {
            let src: SourceRef<u32> = SourceFn::arc(move |sink: Sink<u32>, _ctx: CancellationToken| {
                *inner.lock() = Some(sink);
                Ok::<_, SourceError>(())
            });
            Ok(src)
        };
        (slot, factory)
    }

    fn opts() -> ReadOptions<u32> {
        ReadOptions::new()
    }

    fn push(slot: &Slot, v: u32) {
        slot.lock().as_ref().unwrap().next(v);
    }

    fn never() -> impl FnOnce() -> Result<SourceRef<u32>, SourceError> {
        || panic!("factory must not run for an existing key")
    }

    #[test]
    fn non_suspense_read_returns_loading() {
        let bridge = StatusBridge::default();
        let (_slot, factory) = manual();
        let snap = bridge
            .read("doc", factory, opts())
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(snap.status, Status::Loading);
    }

    #[test]
    fn suspense_read_suspends_then_settles() {
        let bridge = StatusBridge::default();
        let (slot, factory) = manual();

        let first = bridge
            .read("doc", factory, opts().suspense(true))
            .unwrap();
        let pending = first.pending().unwrap().clone();
        assert_eq!(pending.key(), "doc");
        assert!(!pending.is_stalled());

        push(&slot, 4);
        assert!(pending.first_emission().is_settled());

        let snap = bridge
            .read("doc", never(), opts().suspense(true))
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(snap.status, Status::Success);
        assert_eq!(snap.data, Some(4));
    }

    #[test]
    fn bridge_default_suspense_applies() {
        let bridge = StatusBridge::new(Config {
            suspense: true,
            ..Config::default()
        });
        let (_slot, factory) = manual();
        let outcome = bridge.read("doc", factory, opts()).unwrap();
        assert!(outcome.is_pending());

        let outcome = bridge
            .read("doc", never(), opts().suspense(false))
            .unwrap();
        assert!(!outcome.is_pending());
    }

    #[test]
    fn initial_data_skips_suspension() {
        let bridge = StatusBridge::default();
        let (_slot, factory) = manual();
        let snap = bridge
            .read("doc", factory, opts().suspense(true).initial_data(1))
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(snap.status, Status::Success);
        assert_eq!(snap.data, Some(1));
        assert!(!snap.has_emitted);
    }

    #[test]
    fn evicted_subject_never_suspends() {
        let bridge = StatusBridge::default();
        let (_slot, factory) = manual();
        let subject = bridge
            .registry()
            .get_or_create::<u32, _, _>("doc", factory, Duration::from_secs(30))
            .unwrap();
        bridge.registry().evict("doc");

        let outcome = bridge.read_subject(&subject, opts().suspense(true));
        assert_eq!(outcome.ready().unwrap().status, Status::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn stall_is_reported_once_and_never_rejects() {
        let bridge = StatusBridge::new(Config {
            timeout_window: Duration::from_secs(5),
            ..Config::default()
        });
        let mut rx = bridge.registry().bus().subscribe();
        let (slot, factory) = manual();

        assert!(bridge
            .read("doc", factory, opts().suspense(true))
            .unwrap()
            .is_pending());

        tokio::time::advance(Duration::from_secs(6)).await;
        for _ in 0..3 {
            let outcome = bridge
                .read("doc", never(), opts().suspense(true))
                .unwrap();
            assert!(outcome.pending().unwrap().is_stalled());
        }

        let mut stalls = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::SuspenseStalled {
                stalls += 1;
                assert_eq!(ev.window_ms, Some(5_000));
            }
        }
        assert_eq!(stalls, 1);

        push(&slot, 8);
        let snap = bridge
            .read("doc", never(), opts().suspense(true))
            .unwrap()
            .ready()
            .unwrap();
        assert_eq!(snap.data, Some(8));
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn read_settled_waits_for_first_value() {
        let bridge = Arc::new(StatusBridge::default());
        let (slot, factory) = manual();

        let reader = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .read_settled("doc", factory, opts().suspense(true))
                    .await
            })
        };

        while slot.lock().is_none() {
            tokio::task::yield_now().await;
        }
        push(&slot, 11);

        let snap = reader.await.unwrap().unwrap();
        assert_eq!(snap.data, Some(11));
    }

    fn count(rx: &mut tokio::sync::broadcast::Receiver<Event>, kind: EventKind) -> usize {
        let mut n = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == kind {
                n += 1;
            }
        }
        n
    }

    fn windowed(stall: StallPolicy) -> Arc<StatusBridge> {
        Arc::new(StatusBridge::new(Config {
            timeout_window: Duration::from_secs(5),
            stall,
            ..Config::default()
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn stall_is_reported_while_waiting_in_read_settled() {
        let bridge = windowed(StallPolicy::Log);
        let mut rx = bridge.registry().bus().subscribe();
        let (slot, factory) = manual();

        let reader = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move {
                bridge
                    .read_settled("doc", factory, opts().suspense(true))
                    .await
            })
        };
        while slot.lock().is_none() {
            tokio::task::yield_now().await;
        }

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!reader.is_finished());
        assert_eq!(count(&mut rx, EventKind::SuspenseStalled), 1);

        push(&slot, 3);
        let snap = reader.await.unwrap().unwrap();
        assert_eq!(snap.data, Some(3));
        assert!(snap.error.is_none());
        assert_eq!(count(&mut rx, EventKind::SuspenseStalled), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ignore_policy_reports_nothing() {
        let bridge = windowed(StallPolicy::Ignore);
        let mut rx = bridge.registry().bus().subscribe();
        let (slot, factory) = manual();

        let pending = bridge
            .read("doc", factory, opts().suspense(true))
            .unwrap()
            .pending()
            .unwrap()
            .clone();
        let waiter = tokio::spawn(async move { pending.wait().await });

        tokio::time::sleep(Duration::from_secs(60)).await;
        let late = bridge
            .read("doc", never(), opts().suspense(true))
            .unwrap();
        assert!(late.pending().unwrap().is_stalled());
        assert!(!waiter.is_finished());

        push(&slot, 1);
        waiter.await.unwrap();
        assert_eq!(count(&mut rx, EventKind::SuspenseStalled), 0);
    }

    #[tokio::test]
    async fn reads_after_shutdown_fail_fast() {
        let bridge = StatusBridge::default();
        let (_slot, factory) = manual();
        bridge.shutdown().await;

        let err = bridge
            .read_settled("doc", factory, opts().suspense(true))
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::ShutDown);
        assert!(!bridge.registry().has("doc"));
    }
}
