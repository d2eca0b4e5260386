//! Channels between the session and its background tasks.
//!
//! [`Queue`] carries change signals into the history debounce worker;
//! [`BroadcastQueue`] fans notifications out to every surface listening.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use crate::{EditorError, Result};

/// Bounded MPMC queue. Backed by flume.
#[derive(Clone)]
pub struct Queue<T> {
    receiver: Arc<flume::Receiver<T>>,
    sender: Arc<flume::Sender<T>>,
}

impl<T> Queue<T> {
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, rx) = flume::bounded(cap);

        Arc::new(Self {
            receiver: Arc::new(rx),
            sender: Arc::new(tx),
        })
    }

    /// Enqueues without waiting. A full queue drops `msg`: pending signals
    /// already cover it.
    pub fn signal(
        &self,
        msg: T,
    ) -> Result<()> {
        match self.sender.try_send(msg) {
            Ok(()) | Err(flume::TrySendError::Full(_)) => Ok(()),
            Err(flume::TrySendError::Disconnected(_)) => Err(EditorError::Session("queue disconnected".to_string())),
        }
    }

    /// receive a message from the queue asynchronously
    pub async fn next_async(&self) -> Option<T> {
        self.receiver.recv_async().await.ok()
    }

    /// Discards everything pending and returns how many messages were dropped.
    pub fn drain(&self) -> usize {
        self.receiver.drain().count()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// One-to-many queue: every subscriber receives every message. Backed by
/// tokio's broadcast channel.
#[derive(Clone)]
pub struct BroadcastQueue<T> {
    sender: Arc<broadcast::Sender<T>>,
}

impl<T: Clone> BroadcastQueue<T> {
    pub fn new(cap: usize) -> Arc<Self> {
        let (tx, _) = broadcast::channel(cap);

        Arc::new(Self {
            sender: Arc::new(tx),
        })
    }

    /// Publishes `msg` and returns how many subscribers got it. Publishing
    /// with nobody subscribed is not an error.
    pub fn send(
        &self,
        msg: T,
    ) -> usize {
        match self.sender.send(msg) {
            Ok(n) => n,
            Err(_) => {
                trace!("BroadcastQueue::send: no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn full_queue_coalesces_signals() {
        let queue = Queue::new(1);
        queue.signal(1).unwrap();
        queue.signal(2).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_async().await, Some(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_empties_the_queue() {
        let queue = Queue::new(4);
        queue.signal(()).unwrap();
        queue.signal(()).unwrap();
        assert_eq!(queue.drain(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let queue = BroadcastQueue::new(8);
        assert_eq!(queue.send("lost"), 0);

        let mut a = queue.subscribe();
        let mut b = queue.subscribe();
        assert_eq!(queue.send("hello"), 2);
        assert_eq!(a.try_recv().unwrap(), "hello");
        assert_eq!(b.try_recv().unwrap(), "hello");
    }
}
