use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::{
    core::Config,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};
use super::{
    bridge::{Fanout, StatusBridge},
    registry::Registry,
};

/// Builder for constructing a StatusBridge with optional subscribers.
pub struct BridgeBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl BridgeBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for diagnostics.
    ///
    /// Subscribers receive bridge events (entry lifecycle, emissions,
    /// suspensions, stalls) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the bridge.
    ///
    /// Subscriber workers need a tokio runtime. Without one the subscribers
    /// are dropped with a warning; the bridge itself works either way.
    pub fn build(self) -> StatusBridge {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        let registry = Registry::new(bus.clone(), runtime_token.clone());

        let fanout = match (self.subscribers.is_empty(), Handle::try_current()) {
            (true, _) => None,
            (false, Ok(handle)) => Some(spawn_fanout(&handle, self.subscribers, &bus, &runtime_token)),
            (false, Err(_)) => {
                tracing::warn!(
                    subscribers = self.subscribers.len(),
                    "no tokio runtime; subscribers disabled"
                );
                None
            }
        };

        StatusBridge::new_internal(self.cfg, registry, runtime_token, fanout)
    }
}

/// Forwards bus events to the subscriber set until the runtime token is cancelled.
fn spawn_fanout(
    handle: &Handle,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus: &Bus,
    token: &CancellationToken,
) -> Fanout {
    let _guard = handle.enter();
    let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
    let mut rx = bus.subscribe();
    let set = Arc::clone(&subs);
    let token = token.clone();

    let listener = handle.spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    });

    Fanout { subs, listener }
}
