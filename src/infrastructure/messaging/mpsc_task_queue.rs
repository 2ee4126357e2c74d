use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::application::ports::{JobMessage, QueueError, QueueHandle, TaskQueue};

/// Serialized message as it travels through the channel.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub handle: QueueHandle,
    pub body: String,
}

impl Envelope {
    pub fn decode(&self) -> Result<JobMessage, QueueError> {
        serde_json::from_str(&self.body).map_err(|e| QueueError::Serialization(e.to_string()))
    }
}

/// In-process bounded queue. Messages are JSON-encoded on the way in, the same
/// shape an external broker would carry.
pub struct MpscTaskQueue {
    sender: mpsc::Sender<Envelope>,
}

/// Consumer half shared by every worker; each `recv` takes one message.
#[derive(Clone)]
pub struct MpscTaskQueueReceiver {
    receiver: Arc<Mutex<mpsc::Receiver<Envelope>>>,
}

impl MpscTaskQueue {
    pub fn create_pair(capacity: usize) -> (Self, MpscTaskQueueReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self { sender },
            MpscTaskQueueReceiver {
                receiver: Arc::new(Mutex::new(receiver)),
            },
        )
    }
}

impl MpscTaskQueueReceiver {
    /// `None` once every sender is gone and the buffer is drained.
    pub async fn recv(&self) -> Option<Envelope> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }
}

#[async_trait]
impl TaskQueue for MpscTaskQueue {
    async fn enqueue(&self, message: JobMessage) -> Result<QueueHandle, QueueError> {
        let body =
            serde_json::to_string(&message).map_err(|e| QueueError::Serialization(e.to_string()))?;
        let handle = QueueHandle(format!("job-{}", Uuid::new_v4()));

        self.sender
            .try_send(Envelope {
                handle: handle.clone(),
                body,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            })?;

        Ok(handle)
    }
}
