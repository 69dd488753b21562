// ============================================================================
// In-Process Broker
// ============================================================================
//
// One unbounded channel per queue, created on first use. Frames travel as
// encoded bytes so the consumer decodes exactly what a remote broker would
// hand it. Receivers are shared behind an async mutex: one receive at a
// time per queue, FIFO.
//
// `shut_down` simulates the broker going away: pending and future
// operations fail with a transport error.
//
// ============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::{Connection, ConnectionFactory, Queue};
use crate::error::{RelayError, RelayResult};
use crate::message::WireMessage;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>;

struct QueueChannel {
    sender: mpsc::UnboundedSender<Vec<u8>>,
    receiver: SharedReceiver,
}

impl QueueChannel {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
        }
    }
}

struct BrokerInner {
    queues: Mutex<HashMap<String, QueueChannel>>,
    online: AtomicBool,
    open_connections: AtomicUsize,
}

/// In-process broker; clones share the same queues
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<BrokerInner>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                queues: Mutex::new(HashMap::new()),
                online: AtomicBool::new(true),
                open_connections: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of connections opened and not yet released
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections.load(Ordering::SeqCst)
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Take the broker offline and drop every queue
    pub fn shut_down(&self) {
        self.inner.online.store(false, Ordering::SeqCst);
        match self.inner.queues.lock() {
            Ok(mut queues) => queues.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
        tracing::info!("In-memory broker shut down");
    }

    /// Enqueue raw bytes, bypassing frame encoding
    pub fn publish_raw(&self, queue: &Queue, bytes: Vec<u8>) -> RelayResult<()> {
        self.ensure_online()?;
        let sender = self.with_channel(queue, |channel| channel.sender.clone())?;
        sender
            .send(bytes)
            .map_err(|_| RelayError::transport(format!("{} is closed", queue)))
    }

    fn ensure_online(&self) -> RelayResult<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(RelayError::transport("in-memory broker is unavailable"))
        }
    }

    fn with_channel<T>(&self, queue: &Queue, f: impl FnOnce(&QueueChannel) -> T) -> RelayResult<T> {
        let mut queues = self
            .inner
            .queues
            .lock()
            .map_err(|_| RelayError::internal("in-memory broker state poisoned"))?;
        let channel = queues
            .entry(queue.name().to_string())
            .or_insert_with(QueueChannel::new);
        Ok(f(channel))
    }
}

#[async_trait]
impl ConnectionFactory for InMemoryBroker {
    async fn create_connection(&self) -> RelayResult<Box<dyn Connection>> {
        self.ensure_online()?;
        self.inner.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryConnection {
            broker: self.clone(),
        }))
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

/// Connection to an [`InMemoryBroker`]
pub struct InMemoryConnection {
    broker: InMemoryBroker,
}

impl Drop for InMemoryConnection {
    fn drop(&mut self) {
        self.broker
            .inner
            .open_connections
            .fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for InMemoryConnection {
    async fn publish(&mut self, queue: &Queue, frame: WireMessage) -> RelayResult<()> {
        let bytes = frame.encode()?;
        self.broker.publish_raw(queue, bytes)
    }

    async fn receive(&mut self, queue: &Queue) -> RelayResult<WireMessage> {
        self.broker.ensure_online()?;
        let receiver = self
            .broker
            .with_channel(queue, |channel| channel.receiver.clone())?;

        let mut receiver = receiver.lock().await;
        match receiver.recv().await {
            Some(bytes) => WireMessage::decode(&bytes),
            None => Err(RelayError::transport(format!(
                "{} closed by broker",
                queue
            ))),
        }
    }

    async fn ping(&mut self) -> RelayResult<()> {
        self.broker.ensure_online()
    }

    async fn close(self: Box<Self>) -> RelayResult<()> {
        Ok(())
    }
}
