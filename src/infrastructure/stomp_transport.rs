// STOMP over websocket (optionally SockJS-framed) implementation of the feed transport
use crate::application::errors::TransportError;
use crate::application::transport::{Connection, ConnectionEvent, Transport};
use crate::infrastructure::config::FeedSettings;
use crate::infrastructure::sockjs::{self, SockJsFrame};
use crate::infrastructure::stomp::{decode_frames, is_heartbeat, Command, Frame};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    SockJs,
    Raw,
}

impl Framing {
    fn wrap(self, text: String) -> String {
        match self {
            Framing::SockJs => sockjs::encode_messages(&[text]),
            Framing::Raw => text,
        }
    }
}

/// Decoded inbound STOMP frames waiting to be consumed.
#[derive(Debug)]
struct FrameBuffer {
    framing: Framing,
    opened: bool,
    frames: VecDeque<Frame>,
}

impl FrameBuffer {
    fn new(framing: Framing) -> Self {
        Self {
            framing,
            opened: framing == Framing::Raw,
            frames: VecDeque::new(),
        }
    }

    /// Feed one websocket text message. Malformed content is logged and
    /// skipped; only a transport-level close is an error.
    fn ingest(&mut self, text: &str) -> Result<(), TransportError> {
        match self.framing {
            Framing::Raw => self.ingest_stomp(text),
            Framing::SockJs => match sockjs::parse_frame(text) {
                Ok(SockJsFrame::Open) => self.opened = true,
                Ok(SockJsFrame::Heartbeat) => {}
                Ok(SockJsFrame::Messages(messages)) => {
                    for message in &messages {
                        self.ingest_stomp(message);
                    }
                }
                Ok(SockJsFrame::Close { code, reason }) => {
                    return Err(TransportError::Closed(format!("{} {}", code, reason)));
                }
                Err(e) => tracing::warn!("Skipping SockJS frame: {}", e),
            },
        }
        Ok(())
    }

    fn ingest_stomp(&mut self, text: &str) {
        if is_heartbeat(text) {
            tracing::trace!("Broker heart-beat");
            return;
        }
        match decode_frames(text) {
            Ok(frames) => self.frames.extend(frames),
            Err(e) => tracing::warn!("Skipping STOMP frame: {}", e),
        }
    }

    fn pop(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }
}

#[derive(Debug, Clone)]
pub struct StompTransport {
    client: reqwest::Client,
    framing: Framing,
    heartbeat: Option<Duration>,
    handshake_timeout: Duration,
}

impl StompTransport {
    pub fn new(settings: &FeedSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            framing: if settings.sockjs {
                Framing::SockJs
            } else {
                Framing::Raw
            },
            heartbeat: settings.heartbeat(),
            handshake_timeout: settings.handshake_timeout(),
        }
    }

    async fn websocket_url(&self, endpoint: &str) -> Result<String, TransportError> {
        if self.framing == Framing::Raw {
            return Ok(endpoint.to_string());
        }

        let info = sockjs::fetch_info(&self.client, endpoint).await?;
        if !info.websocket {
            return Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                reason: "server does not offer the websocket transport".to_string(),
            });
        }
        let (server_id, session_id) = sockjs::new_session_path();
        sockjs::session_url(endpoint, server_id, &session_id)
    }

    async fn handshake(&self, endpoint: &str) -> Result<StompConnection, TransportError> {
        let url = self.websocket_url(endpoint).await?;
        tracing::debug!("Opening websocket {}", url);

        let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let mut connection = StompConnection {
            ws,
            framing: self.framing,
            buffer: FrameBuffer::new(self.framing),
            heartbeat: self.heartbeat.map(|period| {
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval
            }),
            subscriptions: 0,
        };

        while !connection.buffer.opened {
            connection.read_more().await?;
        }

        let heartbeat_ms = self.heartbeat.map(|d| d.as_millis() as u64).unwrap_or(0);
        connection.send_frame(&Frame::connect(heartbeat_ms)).await?;

        let reply = connection.read_frame().await?;
        match reply.command {
            Command::Connected => {
                tracing::info!(
                    "STOMP session established (version {})",
                    reply.get("version").unwrap_or("1.0")
                );
                Ok(connection)
            }
            Command::Error => Err(TransportError::Rejected(error_detail(&reply))),
            other => Err(TransportError::Protocol(format!(
                "expected CONNECTED, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl Transport for StompTransport {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>, TransportError> {
        let connection = tokio::time::timeout(self.handshake_timeout, self.handshake(endpoint))
            .await
            .map_err(|_| TransportError::Timeout)??;
        Ok(Box::new(connection))
    }
}

enum Wake {
    Heartbeat,
    Inbound(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
}

pub struct StompConnection {
    ws: WsStream,
    framing: Framing,
    buffer: FrameBuffer,
    heartbeat: Option<Interval>,
    subscriptions: u32,
}

impl StompConnection {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let payload = self.framing.wrap(text);
        self.ws.send(Message::text(payload)).await?;
        Ok(())
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.send_text(frame.to_text()).await
    }

    async fn read_frame(&mut self) -> Result<Frame, TransportError> {
        loop {
            if let Some(frame) = self.buffer.pop() {
                return Ok(frame);
            }
            self.read_more().await?;
        }
    }

    async fn read_more(&mut self) -> Result<(), TransportError> {
        let message = self.ws.next().await;
        self.handle_inbound(message)
    }

    fn handle_inbound(
        &mut self,
        message: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
    ) -> Result<(), TransportError> {
        match message {
            None => Err(TransportError::Closed("websocket stream ended".to_string())),
            Some(Err(e)) => Err(e.into()),
            Some(Ok(Message::Text(text))) => self.buffer.ingest(text.as_str()),
            Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                Ok(text) => self.buffer.ingest(text),
                Err(_) => {
                    tracing::warn!("Skipping non-UTF-8 binary message ({} bytes)", data.len());
                    Ok(())
                }
            },
            Some(Ok(Message::Close(frame))) => Err(TransportError::Closed(
                frame
                    .map(|f| format!("{} {}", u16::from(f.code), f.reason.as_str()))
                    .unwrap_or_else(|| "closed by server".to_string()),
            )),
            Some(Ok(_)) => Ok(()),
        }
    }
}

async fn next_tick(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn error_detail(frame: &Frame) -> String {
    frame
        .get("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.trim().to_string())
}

#[async_trait]
impl Connection for StompConnection {
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let id = format!("sub-{}", self.subscriptions);
        self.subscriptions += 1;
        self.send_frame(&Frame::subscribe(&id, topic)).await
    }

    async fn next_event(&mut self) -> ConnectionEvent {
        loop {
            if let Some(frame) = self.buffer.pop() {
                match frame.command {
                    Command::Message => return ConnectionEvent::Message(frame.body),
                    Command::Error => {
                        return ConnectionEvent::Closed(format!(
                            "broker error: {}",
                            error_detail(&frame)
                        ));
                    }
                    other => {
                        tracing::debug!("Ignoring {} frame", other);
                        continue;
                    }
                }
            }

            let wake = {
                let Self { ws, heartbeat, .. } = &mut *self;
                tokio::select! {
                    _ = next_tick(heartbeat) => Wake::Heartbeat,
                    message = ws.next() => Wake::Inbound(message),
                }
            };

            let result = match wake {
                Wake::Heartbeat => self.send_text("\n".to_string()).await,
                Wake::Inbound(message) => self.handle_inbound(message),
            };
            if let Err(e) = result {
                return ConnectionEvent::Closed(e.to_string());
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.send_frame(&Frame::disconnect()).await {
            tracing::debug!("DISCONNECT not sent: {}", e);
        }
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!("Websocket close failed: {}", e);
        }
    }
}
