use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::debug;

struct PendingReply {
    generation: u64,
    handle: AbortHandle,
}

/// At most one pending auto-reply per ticket. Scheduling again replaces the
/// pending one; a task that already started is never aborted.
#[derive(Default)]
pub struct AutoReplyScheduler {
    pending: Mutex<HashMap<i32, PendingReply>>,
    generation: AtomicU64,
}

impl AutoReplyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F, Fut>(self: &Arc<Self>, ticket_id: i32, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Held across the spawn so the task cannot finish before it is recorded.
        let mut pending = self.lock();
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if scheduler.finish(ticket_id, generation) {
                task().await;
            }
        });

        if let Some(previous) = pending.insert(
            ticket_id,
            PendingReply {
                generation,
                handle: handle.abort_handle(),
            },
        ) {
            previous.handle.abort();
        }
        debug!(ticket_id, delay_secs = delay.as_secs(), "auto_reply: scheduled");
    }

    /// Drops the pending auto-reply of a ticket. Returns whether one was pending.
    pub fn cancel(&self, ticket_id: i32) -> bool {
        match self.lock().remove(&ticket_id) {
            Some(previous) => {
                previous.handle.abort();
                debug!(ticket_id, "auto_reply: canceled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, ticket_id: i32) -> bool {
        self.lock().contains_key(&ticket_id)
    }

    fn finish(&self, ticket_id: i32, generation: u64) -> bool {
        let mut pending = self.lock();
        match pending.get(&ticket_id) {
            Some(entry) if entry.generation == generation => {
                pending.remove(&ticket_id);
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i32, PendingReply>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
