use crossbeam::queue::ArrayQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::message::Message;

/// Fixed-capacity FIFO. `offer` is non-blocking; `poll` blocks up to a
/// timeout for an element. Safe for multiple producers and consumers;
/// FIFO ordering is only guaranteed within a single producer's own pushes.
pub struct BoundedQueue {
    buf: ArrayQueue<Message>,
    notify: Notify,
}

impl BoundedQueue {
    pub fn new(capacity: usize) -> Self {
        Self { buf: ArrayQueue::new(capacity.max(1)), notify: Notify::new() }
    }

    /// Non-blocking. Returns the message back on `Err` if the queue was full.
    pub fn offer(&self, msg: Message) -> Result<(), Message> {
        match self.buf.push(msg) {
            Ok(()) => {
                self.notify.notify_one();
                Ok(())
            }
            Err(msg) => Err(msg),
        }
    }

    /// Blocks up to `timeout_ms` for an element. Returns `None` on timeout.
    pub async fn poll(&self, timeout_ms: u64) -> Option<Message> {
        if let Some(msg) = self.buf.pop() {
            return Some(msg);
        }
        let wait = self.notify.notified();
        tokio::pin!(wait);
        let _ = timeout(Duration::from_millis(timeout_ms), &mut wait).await;
        self.buf.pop()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

pub type SharedQueue = Arc<BoundedQueue>;
