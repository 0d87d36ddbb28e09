use std::sync::Arc;
use std::time::Duration;

use ambit_common::{BuiltinRequestContextValue, ContextConfig, WaitUntil};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::error::ContextError;
use crate::storage;

/// Host-side `waitUntil`: runs deferred work on a tokio runtime and lets the
/// host wait for it before shutting down.
#[derive(Debug, Clone)]
pub struct DeferredWork {
    handle: Handle,
    in_flight: Arc<watch::Sender<usize>>,
}

struct InFlightGuard(Arc<watch::Sender<usize>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl DeferredWork {
    pub fn new() -> Result<Self, ContextError> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|_| ContextError::NoRuntime)
    }

    pub fn with_handle(handle: Handle) -> Self {
        let (tx, _rx) = watch::channel(0usize);
        Self {
            handle,
            in_flight: Arc::new(tx),
        }
    }

    /// Each registered operation is spawned with the registering task's
    /// request context and counted until it finishes or panics.
    pub fn wait_until(&self) -> WaitUntil {
        let handle = self.handle.clone();
        let in_flight = Arc::clone(&self.in_flight);
        WaitUntil::new(move |work| {
            in_flight.send_modify(|n| *n += 1);
            let guard = InFlightGuard(Arc::clone(&in_flight));
            handle.spawn(storage::propagate(async move {
                let _guard = guard;
                work.await;
            }));
        })
    }

    pub fn context_value(&self) -> BuiltinRequestContextValue {
        BuiltinRequestContextValue::with_wait_until(self.wait_until())
    }

    pub fn pending(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// [`drain`](Self::drain) with the configured drain timeout.
    pub async fn drain_with(&self, config: &ContextConfig) -> Result<(), ContextError> {
        self.drain(config.drain_timeout()).await
    }

    /// Wait for every registered operation to finish.
    pub async fn drain(&self, timeout: Duration) -> Result<(), ContextError> {
        let mut rx = self.in_flight.subscribe();
        let drained = tokio::time::timeout(timeout, async {
            let _ = rx.wait_for(|n| *n == 0).await;
        })
        .await
        .is_ok();

        if drained {
            tracing::debug!("deferred work drained");
            return Ok(());
        }

        let pending = self.pending();
        let timeout_ms = duration_ms(timeout);
        tracing::warn!(pending, timeout_ms, "deferred work did not finish before drain timeout");
        Err(ContextError::DrainTimeout {
            pending,
            timeout_ms,
        })
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
