// Transport contract for the publish/subscribe feed
use crate::application::errors::TransportError;
use async_trait::async_trait;

/// Something the connection reports without being asked.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Raw text body of a message delivered on the subscribed topic.
    Message(String),
    /// The peer closed the connection.
    Closed(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection and complete the protocol handshake.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>, TransportError>;
}

#[async_trait]
pub trait Connection: Send {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Wait for the next inbound event. After `Closed` the connection is dead.
    async fn next_event(&mut self) -> ConnectionEvent;

    /// Stop producing events and release the connection.
    async fn close(&mut self);
}
