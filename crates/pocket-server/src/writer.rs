//! Background persistence queue.
//!
//! The inference path never waits on storage. Saves are pushed onto an
//! unbounded channel drained by a single task, which keeps per-process write
//! order (a request's prompt is always written before its answer) and absorbs
//! every store failure, including panics, at the task boundary.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use pocket_store::{MessageStore, Role};
use tokio::sync::{mpsc, oneshot};

enum WriteCommand {
    Save {
        session_id: String,
        role: Role,
        content: String,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Cheap to clone.
#[derive(Clone)]
pub struct PersistenceWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl PersistenceWriter {
    /// Start the writer task on the current tokio runtime.
    pub fn spawn(store: Arc<dyn MessageStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriteCommand::Save {
                        session_id,
                        role,
                        content,
                    } => {
                        let save = store.save_message(&session_id, role, &content);
                        match AssertUnwindSafe(save).catch_unwind().await {
                            Ok(Ok(message)) => {
                                tracing::debug!(%session_id, %role, id = message.id, "message saved");
                            }
                            Ok(Err(err)) => {
                                tracing::warn!(%session_id, %role, error = %err, "failed to save message");
                            }
                            Err(_) => {
                                tracing::error!(%session_id, %role, "message store panicked while saving");
                            }
                        }
                    }
                    WriteCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("persistence writer stopped");
        });

        Self { tx }
    }

    /// Queue a message for saving and return immediately.
    pub fn save(&self, session_id: impl Into<String>, role: Role, content: impl Into<String>) {
        let command = WriteCommand::Save {
            session_id: session_id.into(),
            role,
            content: content.into(),
        };
        if self.tx.send(command).is_err() {
            tracing::warn!(%role, "persistence writer stopped; message dropped");
        }
    }

    /// Wait until every save queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
