//! Concurrency limit and cancellation for engine streams.
//!
//! Every cache miss holds a [`StreamSlot`] for as long as its response stream
//! exists. When the client disconnects, axum drops the stream, which drops the
//! slot, which cancels its token and frees the permit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Tracks running engine streams and bounds how many may run at once.
pub struct StreamSlots {
    /// Active streams keyed by stream ID.
    active: Mutex<HashMap<Uuid, SlotEntry>>,
    limit: Arc<Semaphore>,
    max_concurrent: usize,
}

struct SlotEntry {
    session_id: String,
    cancel: CancellationToken,
}

/// Guard for one running engine stream; releases its slot on drop.
pub struct StreamSlot {
    stream_id: Uuid,
    cancel: CancellationToken,
    slots: Arc<StreamSlots>,
    _permit: OwnedSemaphorePermit,
}

impl StreamSlot {
    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    /// Token fired when the slot is released or the server shuts down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for StreamSlot {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.slots.release(self.stream_id);
    }
}

impl StreamSlots {
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            active: Mutex::new(HashMap::new()),
            limit: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        })
    }

    /// Claim a slot without waiting. Returns `None` at capacity.
    pub fn try_acquire(self: &Arc<Self>, session_id: &str) -> Option<StreamSlot> {
        let permit = self.limit.clone().try_acquire_owned().ok()?;
        let stream_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        self.lock_active().insert(
            stream_id,
            SlotEntry {
                session_id: session_id.to_string(),
                cancel: cancel.clone(),
            },
        );
        tracing::debug!(%stream_id, session_id, "stream slot acquired");

        Some(StreamSlot {
            stream_id,
            cancel,
            slots: Arc::clone(self),
            _permit: permit,
        })
    }

    /// Signal every running stream to stop (server shutdown).
    pub fn cancel_all(&self) {
        let active = self.lock_active();
        for (stream_id, entry) in active.iter() {
            tracing::debug!(%stream_id, session_id = %entry.session_id, "cancelling stream");
            entry.cancel.cancel();
        }
    }

    /// Number of streams currently holding a slot.
    pub fn active_count(&self) -> usize {
        self.lock_active().len()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.limit.available_permits()
    }

    fn release(&self, stream_id: Uuid) {
        self.lock_active().remove(&stream_id);
        tracing::debug!(%stream_id, "stream slot released");
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SlotEntry>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
