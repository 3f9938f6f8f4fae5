// Error types shared by the application services
use thiserror::Error;

/// No drawable surface for the chart. Not retried by the adapter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderInitError {
    #[error("no drawable chart surface")]
    NoSurface,
    #[error("chart surface too small: {width}x{height}")]
    TooSmall { width: u16, height: u16 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderUpdateError {
    #[error("chart is not initialized")]
    NotReady,
    #[error("drawing context lost")]
    ContextLost,
    #[error("draw failed: {0}")]
    Draw(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },
    #[error("handshake rejected: {0}")]
    Rejected(String),
    #[error("handshake timed out")]
    Timeout,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("connection closed: {0}")]
    Closed(String),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
