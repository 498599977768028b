//! # First-emission signal.
//!
//! [`FirstEmission`] is the awaitable a suspended read hands back to its
//! caller. It settles exactly once, on the subject's first value or first
//! error, and never un-settles.
//!
//! Backed by a [`tokio::sync::watch`] channel so any number of clones can
//! wait on it and late clones see the settled state immediately.

use tokio::sync::watch;

/// Internal phase of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    /// No value and no error yet.
    Pending,
    /// First value or first error arrived.
    Settled,
    /// Subject completed or was evicted before settling; waiters are released but the signal is not settled.
    Closed,
}

/// Cloneable awaitable that resolves on a subject's first emission.
///
/// # Example
/// ```rust
/// # async fn demo(first: statusvisor::FirstEmission) {
/// if !first.is_settled() {
///     first.wait().await;
/// }
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FirstEmission {
    rx: watch::Receiver<Phase>,
}

impl FirstEmission {
    pub(crate) fn channel() -> (watch::Sender<Phase>, Self) {
        let (tx, rx) = watch::channel(Phase::Pending);
        (tx, Self { rx })
    }

    /// Returns true once the first value or first error has arrived.
    pub fn is_settled(&self) -> bool {
        *self.rx.borrow() == Phase::Settled
    }

    /// Waits for the first emission.
    ///
    /// Also returns if the subject completes, is evicted or is dropped before emitting;
    /// check [`is_settled`](Self::is_settled) to tell the cases apart.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|phase| *phase != Phase::Pending).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn settles_once_for_all_clones() {
        let (tx, first) = FirstEmission::channel();
        let late = first.clone();
        assert!(!first.is_settled());

        let waiter = tokio::spawn({
            let first = first.clone();
            async move { first.wait().await }
        });
        tx.send_replace(Phase::Settled);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(late.is_settled());
        late.wait().await;
    }

    #[tokio::test]
    async fn dropped_sender_releases_waiters() {
        let (tx, first) = FirstEmission::channel();
        drop(tx);
        first.wait().await;
        assert!(!first.is_settled());
    }
}
