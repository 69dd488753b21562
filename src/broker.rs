// ============================================================================
// Broker Abstraction
// ============================================================================
//
// Connection level (wire view): a ConnectionFactory opens Connections that
// publish and receive raw WireMessage frames on named queues.
//
// Session level (typed view): a Session owns one Connection and hands out
// producers and consumers that speak TextMessage / Message. Sessions are
// non-transactional and acknowledge on receipt.
//
// Implementations:
// - redis_list.rs - Redis lists (LPUSH / BRPOP), durable across restarts
// - memory.rs     - in-process channels, used by tests and `memory://`
//
// ============================================================================

pub mod memory;
pub mod redis_list;

use async_trait::async_trait;
use std::fmt;

use crate::error::RelayResult;
use crate::message::{Message, TextMessage, WireMessage};

pub use self::memory::InMemoryBroker;
pub use self::redis_list::RedisConnectionFactory;

/// Concrete queue handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Queue {
    name: String,
}

impl Queue {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue://{}", self.name)
    }
}

/// Opens broker connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create_connection(&self) -> RelayResult<Box<dyn Connection>>;

    /// Human-readable target for logs (credentials masked)
    fn describe(&self) -> String;
}

/// A live broker connection, owned by whoever opened it
///
/// Dropping a connection releases it; `close` does the same explicitly.
#[async_trait]
pub trait Connection: Send {
    async fn publish(&mut self, queue: &Queue, frame: WireMessage) -> RelayResult<()>;

    /// Block until a frame is available on `queue`
    ///
    /// Frames that cannot be decoded fail with `MalformedMessage`; the
    /// connection stays usable afterwards.
    async fn receive(&mut self, queue: &Queue) -> RelayResult<WireMessage>;

    async fn ping(&mut self) -> RelayResult<()>;

    async fn close(self: Box<Self>) -> RelayResult<()>;
}

/// Non-transactional, auto-acknowledge session over one connection
pub struct Session {
    connection: Box<dyn Connection>,
}

impl Session {
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Self { connection }
    }

    /// Open a connection from `factory` and start a session on it
    pub async fn open(factory: &dyn ConnectionFactory) -> RelayResult<Self> {
        let connection = factory.create_connection().await?;
        Ok(Self::new(connection))
    }

    pub fn create_producer(&mut self, queue: &Queue) -> QueueProducer<'_> {
        QueueProducer {
            session: self,
            queue: queue.clone(),
        }
    }

    pub fn create_consumer(&mut self, queue: &Queue) -> QueueConsumer<'_> {
        QueueConsumer {
            session: self,
            queue: queue.clone(),
        }
    }

    /// Close the session and its connection
    pub async fn close(self) -> RelayResult<()> {
        self.connection.close().await
    }
}

/// Sends text messages to one queue
pub struct QueueProducer<'s> {
    session: &'s mut Session,
    queue: Queue,
}

impl QueueProducer<'_> {
    pub async fn send(&mut self, message: TextMessage) -> RelayResult<()> {
        self.session
            .connection
            .publish(&self.queue, WireMessage::from(message))
            .await
    }
}

/// Receives typed messages from one queue
pub struct QueueConsumer<'s> {
    session: &'s mut Session,
    queue: Queue,
}

impl QueueConsumer<'_> {
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Block until the next message arrives
    pub async fn receive(&mut self) -> RelayResult<Message> {
        let frame = self.session.connection.receive(&self.queue).await?;
        Ok(Message::from(frame))
    }
}
