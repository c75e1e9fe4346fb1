use crate::{CallbackError, Device};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use prometheus::IntCounter;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned when registering a device update callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type Callback = Arc<dyn Fn(&Device) -> BoxFuture<'static, Result<(), CallbackError>> + Send + Sync>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Update callbacks of one device, run concurrently on every change.
#[derive(Default)]
pub struct UpdateCallbacks {
    entries: Vec<(CallbackId, Callback)>,
    failures: Option<IntCounter>,
}

impl UpdateCallbacks {
    pub fn register<F, Fut>(&mut self, callback: F) -> CallbackId
    where
        F: Fn(&Device) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        let id = CallbackId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        let callback: Callback = Arc::new(move |device: &Device| callback(device).boxed());
        self.entries.push((id, callback));
        id
    }

    /// Remove a callback; unknown ids are ignored.
    pub fn unregister(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn set_failure_counter(&mut self, counter: IntCounter) {
        self.failures = Some(counter);
    }

    /// Run every callback for `device` and wait for all of them.
    ///
    /// A callback that errors or panics is logged; the others still complete.
    pub async fn notify(&self, device: &Device) {
        if self.entries.is_empty() {
            return;
        }
        let runs = self.entries.iter().map(|(id, callback)| {
            // a callback may panic before handing back its future
            let started = std::panic::catch_unwind(AssertUnwindSafe(|| callback(device)));
            async move {
                let outcome = match started {
                    Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                    Err(panic) => Err(panic),
                };
                (*id, outcome)
            }
        });
        for (id, outcome) in join_all(runs).await {
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            tracing::error!(
                device = device.name(),
                callback = id.0,
                "device update callback failed: {failure}"
            );
            if let Some(counter) = &self.failures {
                counter.inc();
            }
        }
    }
}

impl std::fmt::Debug for UpdateCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCallbacks")
            .field("len", &self.entries.len())
            .finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
