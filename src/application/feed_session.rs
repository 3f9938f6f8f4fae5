// Feed session - Connection lifecycle, reconnection and message dispatch
use crate::application::errors::TransportError;
use crate::application::transport::{ConnectionEvent, Transport};
use crate::domain::sample::{decode_payload, ReceivedSample, Sample};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub const DEFAULT_TOPIC: &str = "/topic/wind_updates";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connected,
    Disconnected { detail: String },
    Sample(ReceivedSample),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub endpoint: String,
    pub topic: String,
    pub reconnect_delay: Duration,
}

enum Outcome {
    Shutdown,
    Lost(TransportError),
}

/// Single producer of feed events. Reconnects after every failure, forever,
/// until the shutdown signal fires or the event receiver goes away.
pub struct FeedSession {
    transport: Arc<dyn Transport>,
    settings: SessionSettings,
    state: SessionState,
}

impl FeedSession {
    pub fn new(transport: Arc<dyn Transport>, settings: SessionSettings) -> Self {
        Self {
            transport,
            settings,
            state: SessionState::Disconnected,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn run(&mut self, events: mpsc::Sender<FeedEvent>, mut shutdown: watch::Receiver<bool>) {
        loop {
            match self.connect_and_stream(&events, &mut shutdown).await {
                Outcome::Shutdown => break,
                Outcome::Lost(err) => {
                    self.transition(SessionState::Disconnected);
                    tracing::warn!(
                        "Feed connection lost: {}; reconnecting in {:?}",
                        err,
                        self.settings.reconnect_delay
                    );

                    let event = FeedEvent::Disconnected {
                        detail: err.to_string(),
                    };
                    if events.send(event).await.is_err() {
                        break;
                    }

                    tokio::select! {
                        _ = wait_for_shutdown(&mut shutdown) => break,
                        _ = tokio::time::sleep(self.settings.reconnect_delay) => {}
                    }
                }
            }
        }

        self.transition(SessionState::Disconnected);
        tracing::info!("Feed session stopped");
    }

    async fn connect_and_stream(
        &mut self,
        events: &mpsc::Sender<FeedEvent>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Outcome {
        self.transition(SessionState::Connecting);
        tracing::info!("Connecting to {}", self.settings.endpoint);

        let connected = tokio::select! {
            _ = wait_for_shutdown(shutdown) => None,
            result = self.transport.connect(&self.settings.endpoint) => Some(result),
        };
        let mut connection = match connected {
            None => return Outcome::Shutdown,
            Some(Ok(connection)) => connection,
            Some(Err(e)) => return Outcome::Lost(e),
        };

        if let Err(e) = connection.subscribe(&self.settings.topic).await {
            connection.close().await;
            return Outcome::Lost(e);
        }

        self.transition(SessionState::Connected);
        tracing::info!("Subscribed to {}", self.settings.topic);
        if events.send(FeedEvent::Connected).await.is_err() {
            connection.close().await;
            return Outcome::Shutdown;
        }

        loop {
            let event = tokio::select! {
                _ = wait_for_shutdown(shutdown) => None,
                event = connection.next_event() => Some(event),
            };

            let Some(event) = event else {
                connection.close().await;
                return Outcome::Shutdown;
            };

            match event {
                ConnectionEvent::Message(body) => {
                    let Some(sample) = accept_message(&body) else {
                        continue;
                    };
                    if events.send(FeedEvent::Sample(sample)).await.is_err() {
                        connection.close().await;
                        return Outcome::Shutdown;
                    }
                }
                ConnectionEvent::Closed(reason) => {
                    return Outcome::Lost(TransportError::Closed(reason));
                }
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!("Feed session {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

/// Decode and validate one message body. Failures are logged and dropped.
fn accept_message(body: &str) -> Option<ReceivedSample> {
    let payload = match decode_payload(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Dropping message: {}", e);
            return None;
        }
    };

    match Sample::from_payload(&payload) {
        Ok(sample) => Some(ReceivedSample::new(sample, Local::now())),
        Err(e) => {
            tracing::warn!("Rejected sample ({}): {}", e, body);
            None
        }
    }
}

/// Resolves once shutdown is requested or the signal sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
