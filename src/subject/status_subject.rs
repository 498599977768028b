//! # StatusSubject: hot, replay-latest multicast over one push-based source.
//!
//! A [`StatusSubject`] owns a single upstream subscription (the *warm-up*
//! subscription) and any number of downstream [`Observation`]s.
//!
//! ## Architecture
//! ```text
//! Source ── subscribe(Sink, ctx) ──► Sink ──push──► Shared<T>
//!                                                     │  state: value / error / complete
//!                                                     │  first: watch<Phase>
//!                                                     ├──► observer 1 (unbounded FIFO)
//!                                                     ├──► observer 2
//!                                                     └──► observer N
//! ```
//!
//! ## Rules
//! - `has_value` goes false → true at most once and never reverts.
//! - `complete` is terminal: later pushes are ignored.
//! - An error does not clear the cached value, and a later value makes the
//!   error stale (it is still reported, but no longer drives `status`).
//! - The first value **or** first error settles [`FirstEmission`]. Completing
//!   or closing before either releases its waiters without settling it.
//! - Every observer sees items in push order; attaching replays exactly one
//!   most-recent item (plus `Complete` if already completed).
//! - The timeout window is advisory metadata; the subject never fabricates
//!   an error when it elapses.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SourceError;
use crate::events::{Bus, Event, EventKind};
use crate::sources::{Sink, Source};
use crate::subject::first_emission::{FirstEmission, Phase};
use crate::subject::{Notification, Observation};

/// Mutable state guarded by the subject's lock.
struct State<T> {
    value: Option<T>,
    error: Option<SourceError>,
    /// False once a newer value superseded `error`.
    error_current: bool,
    complete: bool,
    /// Evicted: warm-up cancelled, observers released.
    closed: bool,
    settled: bool,
    observers: Vec<mpsc::UnboundedSender<Notification<T>>>,
    /// Instant of the first suspended read, if any.
    suspended_at: Option<Instant>,
    stall_reported: bool,
}

/// Shared core of a subject; sinks hold it weakly.
pub(crate) struct Shared<T> {
    key: Arc<str>,
    window: Duration,
    created: Instant,
    bus: Bus,
    cancel: CancellationToken,
    first_tx: watch::Sender<Phase>,
    first: FirstEmission,
    state: Mutex<State<T>>,
}

/// Point-in-time copy of a subject's state, taken under one lock.
pub(crate) struct Inspection<T> {
    pub value: Option<T>,
    pub error: Option<SourceError>,
    pub error_current: bool,
    pub complete: bool,
    pub closed: bool,
    pub elapsed: Duration,
}

impl<T> Shared<T> {
    pub(crate) fn accepts(&self) -> bool {
        let st = self.state.lock();
        !st.complete && !st.closed
    }
}

impl<T: Clone + Send + 'static> Shared<T> {
    /// Applies one notification and fans it out. Returns false if it was ignored.
    pub(crate) fn push(&self, n: Notification<T>) -> bool {
        let mut st = self.state.lock();
        if st.complete || st.closed {
            return false;
        }

        match &n {
            Notification::Next(v) => {
                st.value = Some(v.clone());
                st.error_current = false;
            }
            Notification::Error(e) => {
                st.error = Some(e.clone());
                st.error_current = true;
            }
            Notification::Complete => {
                st.complete = true;
            }
        }

        let settles = !st.settled && !n.is_complete();
        let released = !st.settled && n.is_complete();
        let suspended_at = if settles {
            st.settled = true;
            st.suspended_at
        } else {
            None
        };

        st.observers.retain(|tx| tx.send(n.clone()).is_ok());
        if st.complete {
            st.observers.clear();
        }
        drop(st);

        if settles {
            self.first_tx.send_replace(Phase::Settled);
            let elapsed = self.created.elapsed();
            tracing::debug!(key = %self.key, ?elapsed, "first emission");
            self.bus.publish(
                Event::new(EventKind::FirstEmission)
                    .with_key(Arc::clone(&self.key))
                    .with_elapsed(elapsed),
            );
            if let Some(at) = suspended_at {
                self.bus.publish(
                    Event::new(EventKind::SuspenseResolved)
                        .with_key(Arc::clone(&self.key))
                        .with_elapsed(at.elapsed()),
                );
            }
        }

        if released {
            self.first_tx.send_if_modified(release_pending);
        }

        match &n {
            Notification::Error(e) => {
                tracing::debug!(key = %self.key, error = %e, "source error");
                self.bus.publish(
                    Event::new(EventKind::SourceErrored)
                        .with_key(Arc::clone(&self.key))
                        .with_reason(e.to_string()),
                );
            }
            Notification::Complete => {
                tracing::debug!(key = %self.key, "source completed");
                self.bus
                    .publish(Event::new(EventKind::SourceCompleted).with_key(Arc::clone(&self.key)));
            }
            Notification::Next(_) => {}
        }
        true
    }
}

/// # Replay-latest multicast subject tracking one source's lifecycle.
///
/// Cheap to clone; clones share the same state and warm-up subscription.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use statusvisor::{Notification, Sink, SourceError, SourceFn, StatusSubject};
///
/// let subject = StatusSubject::new(
///     "greeting",
///     SourceFn::new(|sink: Sink<&'static str>, _ctx: CancellationToken| {
///         sink.next("hello");
///         Ok::<_, SourceError>(())
///     }),
///     Duration::from_secs(30),
/// );
///
/// assert!(subject.has_value());
/// let mut obs = subject.observe();
/// assert!(matches!(obs.try_recv(), Some(Notification::Next("hello"))));
/// ```
pub struct StatusSubject<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for StatusSubject<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for StatusSubject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.state.lock();
        f.debug_struct("StatusSubject")
            .field("key", &self.shared.key)
            .field("has_value", &st.value.is_some())
            .field("has_error", &st.error.is_some())
            .field("complete", &st.complete)
            .field("closed", &st.closed)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> StatusSubject<T> {
    /// Creates a standalone subject and starts its warm-up subscription immediately.
    ///
    /// The subject owns its own cancellation token; call [`close`](Self::close)
    /// to tear the subscription down. Subjects created through a
    /// [`Registry`](crate::Registry) are torn down by eviction instead.
    pub fn new<S>(key: impl Into<Arc<str>>, source: S, window: Duration) -> Self
    where
        S: Source<T>,
    {
        let subject = Self::idle(key.into(), window, Bus::default(), CancellationToken::new());
        subject.start(&source);
        subject
    }

    /// Creates a subject whose warm-up subscription has not started yet.
    pub(crate) fn idle(key: Arc<str>, window: Duration, bus: Bus, cancel: CancellationToken) -> Self {
        let (first_tx, first) = FirstEmission::channel();
        Self {
            shared: Arc::new(Shared {
                key,
                window,
                created: Instant::now(),
                bus,
                cancel,
                first_tx,
                first,
                state: Mutex::new(State {
                    value: None,
                    error: None,
                    error_current: false,
                    complete: false,
                    closed: false,
                    settled: false,
                    observers: Vec::new(),
                    suspended_at: None,
                    stall_reported: false,
                }),
            }),
        }
    }

    /// Starts the warm-up subscription. A synchronous failure becomes an error emission.
    pub(crate) fn start<S>(&self, source: &S)
    where
        S: Source<T> + ?Sized,
    {
        let sink = Sink::new(Arc::downgrade(&self.shared));
        if let Err(err) = source.subscribe(sink, self.shared.cancel.clone()) {
            self.fail_construction(err);
        }
    }

    /// Records a construction failure (factory or subscribe) as an immediate error state.
    pub(crate) fn fail_construction(&self, err: SourceError) {
        tracing::warn!(key = %self.shared.key, error = %err, "source construction failed");
        self.shared.bus.publish(
            Event::new(EventKind::SourceFailed)
                .with_key(Arc::clone(&self.shared.key))
                .with_reason(err.to_string()),
        );
        self.shared.push(Notification::Error(err));
    }

    /// Attaches an observer.
    ///
    /// The observer first receives the latest cached item (the current error if
    /// it is newer than the last value, otherwise the last value), then `Complete`
    /// if the subject already completed, then every later emission in order.
    pub fn observe(&self) -> Observation<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut st = self.shared.state.lock();

        let replay = match (&st.error, &st.value) {
            (Some(e), _) if st.error_current => Some(Notification::Error(e.clone())),
            (_, Some(v)) => Some(Notification::Next(v.clone())),
            _ => None,
        };
        if let Some(n) = replay {
            let _ = tx.send(n);
        }

        if st.complete {
            let _ = tx.send(Notification::Complete);
        } else if !st.closed {
            st.observers.push(tx);
        }
        Observation::new(rx)
    }
}

impl<T> StatusSubject<T> {
    /// Cache key this subject was created for.
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// True once any value has been received. Never reverts.
    pub fn has_value(&self) -> bool {
        self.shared.state.lock().value.is_some()
    }

    /// True if an error has been received (current or stale).
    pub fn has_error(&self) -> bool {
        self.shared.state.lock().error.is_some()
    }

    /// True once the source signalled completion.
    pub fn is_complete(&self) -> bool {
        self.shared.state.lock().complete
    }

    /// True once the subject was closed (evicted).
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Most recent error, if any.
    pub fn error(&self) -> Option<SourceError> {
        self.shared.state.lock().error.clone()
    }

    /// Signal that settles on the first value or first error.
    pub fn first_emission(&self) -> FirstEmission {
        self.shared.first.clone()
    }

    /// Advisory timeout window.
    pub fn timeout_window(&self) -> Duration {
        self.shared.window
    }

    /// Time since the subject was created.
    pub fn elapsed(&self) -> Duration {
        self.shared.created.elapsed()
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        let mut st = self.shared.state.lock();
        st.observers.retain(|tx| !tx.is_closed());
        st.observers.len()
    }

    /// Closes the subject: cancels the warm-up subscription and releases observers.
    ///
    /// The cached value and error stay readable. Idempotent.
    pub fn close(&self) {
        {
            let mut st = self.shared.state.lock();
            if st.closed {
                return;
            }
            st.closed = true;
            st.observers.clear();
        }
        self.shared.cancel.cancel();
        self.shared.first_tx.send_if_modified(release_pending);
    }

    /// Instant the subject was created; the timeout window counts from here.
    pub(crate) fn created_at(&self) -> Instant {
        self.shared.created
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.shared.bus
    }

    /// Records the first suspended read. Returns true only the first time.
    pub(crate) fn mark_suspended(&self) -> bool {
        let mut st = self.shared.state.lock();
        if st.suspended_at.is_some() {
            return false;
        }
        st.suspended_at = Some(Instant::now());
        true
    }

    /// Records a stall report. Returns true only the first time.
    pub(crate) fn mark_stalled(&self) -> bool {
        let mut st = self.shared.state.lock();
        !std::mem::replace(&mut st.stall_reported, true)
    }
}

impl<T: Clone> StatusSubject<T> {
    /// Latest cached value, if any.
    pub fn value(&self) -> Option<T> {
        self.shared.state.lock().value.clone()
    }

    pub(crate) fn inspect(&self) -> Inspection<T> {
        let st = self.shared.state.lock();
        Inspection {
            value: st.value.clone(),
            error: st.error.clone(),
            error_current: st.error_current,
            complete: st.complete,
            closed: st.closed,
            elapsed: self.shared.created.elapsed(),
        }
    }
}

/// Moves a still-pending signal to `Closed` so waiters return without settling.
fn release_pending(phase: &mut Phase) -> bool {
    if *phase == Phase::Pending {
        *phase = Phase::Closed;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceFn;
    use parking_lot::Mutex as PlMutex;

    type Slot<T> = Arc<PlMutex<Option<Sink<T>>>>;

    /// Source that parks its sink so the test can push by hand.
    fn manual<T: Send + 'static>() -> (Slot<T>, impl Source<T>) {
        let slot: Slot<T> = Arc::new(PlMutex::new(None));
        let inner = Arc::clone(&slot);
        let src = SourceFn::new(move |sink: Sink<T>, _ctx: CancellationToken| {
            *inner.lock() = Some(sink);
            Ok::<_, SourceError>(())
        });
        (slot, src)
    }

    fn sink<T>(slot: &Slot<T>) -> Sink<T> {
        slot.lock().clone().unwrap()
    }

    #[test]
    fn has_value_sticks_through_errors() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        assert!(!subject.has_value());

        sink(&slot).next(1);
        sink(&slot).error(SourceError::msg("boom"));
        assert!(subject.has_value());
        assert_eq!(subject.value(), Some(1));
        assert!(subject.has_error());
    }

    #[test]
    fn late_observer_gets_latest_value() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        sink(&slot).next(1);
        sink(&slot).next(2);

        let mut obs = subject.observe();
        assert_eq!(obs.try_recv().and_then(|n| n.value().copied()), Some(2));
        assert!(obs.try_recv().is_none());

        sink(&slot).next(3);
        assert_eq!(obs.try_recv().and_then(|n| n.value().copied()), Some(3));
    }

    #[test]
    fn replays_newer_error_over_older_value() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        sink(&slot).next(1);
        sink(&slot).error(SourceError::msg("boom"));

        let mut obs = subject.observe();
        assert!(obs.try_recv().unwrap().is_error());
    }

    #[test]
    fn detaching_one_observer_keeps_others() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        let a = subject.observe();
        let mut b = subject.observe();
        assert_eq!(subject.observer_count(), 2);

        a.detach();
        sink(&slot).next(7);
        assert_eq!(b.try_recv().and_then(|n| n.value().copied()), Some(7));
        assert_eq!(subject.observer_count(), 1);
    }

    #[test]
    fn completion_is_terminal() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        let mut live = subject.observe();

        assert!(sink(&slot).next(1));
        assert!(sink(&slot).complete());
        assert!(!sink(&slot).next(2));
        assert!(sink(&slot).is_closed());
        assert_eq!(subject.value(), Some(1));

        assert_eq!(live.try_recv().and_then(|n| n.value().copied()), Some(1));
        assert!(live.try_recv().unwrap().is_complete());

        let mut late = subject.observe();
        assert_eq!(late.try_recv().and_then(|n| n.value().copied()), Some(1));
        assert!(late.try_recv().unwrap().is_complete());
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn error_settles_first_emission() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        let first = subject.first_emission();
        assert!(!first.is_settled());

        sink(&slot).error(SourceError::msg("denied"));
        assert!(first.is_settled());

        // Values after an error are still accepted.
        assert!(sink(&slot).next(5));
        assert_eq!(subject.value(), Some(5));
    }

    #[test]
    fn subscribe_failure_becomes_error_state() {
        let src = SourceFn::new(|_sink: Sink<u32>, _ctx: CancellationToken| {
            Err::<(), _>(SourceError::msg("no such collection"))
        });
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        assert!(subject.first_emission().is_settled());
        assert_eq!(subject.error().unwrap().to_string(), "no such collection");
        assert!(!subject.has_value());
    }

    #[test]
    fn close_cancels_warmup_and_ends_observers() {
        let token: Arc<PlMutex<Option<CancellationToken>>> = Arc::new(PlMutex::new(None));
        let seen = Arc::clone(&token);
        let src = SourceFn::new(move |_sink: Sink<u32>, ctx: CancellationToken| {
            *seen.lock() = Some(ctx);
            Ok::<_, SourceError>(())
        });
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        let mut obs = subject.observe();

        subject.close();
        assert!(token.lock().as_ref().unwrap().is_cancelled());
        assert!(obs.try_recv().is_none());
        assert!(subject.is_closed());
        assert!(!subject.first_emission().is_settled());
    }

    #[tokio::test]
    async fn completion_without_value_releases_waiters() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        let first = subject.first_emission();

        sink(&slot).complete();
        tokio::time::timeout(Duration::from_secs(1), first.wait())
            .await
            .unwrap();
        assert!(!first.is_settled());
    }

    #[test]
    fn dropped_subject_makes_sink_inert() {
        let (slot, src) = manual::<u32>();
        let subject = StatusSubject::new("k", src, Duration::from_secs(30));
        drop(subject);
        assert!(!sink(&slot).next(1));
        assert!(sink(&slot).is_closed());
    }
}
