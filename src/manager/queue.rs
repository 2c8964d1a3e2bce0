//! Handle for feeding command lines to the dispatcher.

use tokio::sync::mpsc;

use crate::error::ControlError;

/// Cloneable handle over the bounded command queue.
///
/// External producers (the stdin reader, tests) push raw command lines; the
/// dispatcher consumes them one at a time.
#[derive(Clone)]
pub struct CommandQueue {
    tx: mpsc::Sender<String>,
}

impl CommandQueue {
    pub(crate) fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Pushes a command line, waiting if the queue is full.
    pub async fn push(&self, line: impl Into<String>) -> Result<(), ControlError> {
        self.tx
            .send(line.into())
            .await
            .map_err(|_| ControlError::QueueClosed)
    }

    /// Pushes a command line without blocking.
    pub fn try_push(&self, line: impl Into<String>) -> Result<(), ControlError> {
        self.tx.try_send(line.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ControlError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => ControlError::QueueClosed,
        })
    }
}
