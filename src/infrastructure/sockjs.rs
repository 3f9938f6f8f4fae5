// SockJS websocket transport framing and info probe
use crate::application::errors::TransportError;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SockJsError {
    #[error("unknown SockJS frame `{0}`")]
    UnknownFrame(String),
    #[error("malformed SockJS payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Response of `GET {endpoint}/info`.
#[derive(Debug, Clone, Deserialize)]
pub struct SockJsInfo {
    pub websocket: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SockJsFrame {
    Open,
    Heartbeat,
    Messages(Vec<String>),
    Close { code: u16, reason: String },
}

pub fn parse_frame(text: &str) -> Result<SockJsFrame, SockJsError> {
    let mut chars = text.chars();
    let kind = chars.next();
    let payload = chars.as_str();
    match kind {
        Some('o') => Ok(SockJsFrame::Open),
        Some('h') => Ok(SockJsFrame::Heartbeat),
        Some('a') => Ok(SockJsFrame::Messages(serde_json::from_str(payload)?)),
        Some('m') => Ok(SockJsFrame::Messages(vec![serde_json::from_str(payload)?])),
        Some('c') => {
            let (code, reason): (u16, String) = serde_json::from_str(payload)?;
            Ok(SockJsFrame::Close { code, reason })
        }
        _ => Err(SockJsError::UnknownFrame(text.chars().take(32).collect())),
    }
}

/// Outbound SockJS frames are JSON arrays of strings.
pub fn encode_messages(messages: &[String]) -> String {
    serde_json::json!(messages).to_string()
}

pub async fn fetch_info(client: &reqwest::Client, endpoint: &str) -> Result<SockJsInfo, TransportError> {
    let url = format!("{}/info", endpoint.trim_end_matches('/'));
    tracing::debug!("Probing SockJS info at {}", url);

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(TransportError::Connect {
            endpoint: endpoint.to_string(),
            reason: format!("SockJS info returned {}", response.status()),
        });
    }

    Ok(response.json::<SockJsInfo>().await?)
}

/// Random `server_id/session_id` path segment pair for a new session.
pub fn new_session_path() -> (u16, String) {
    let id = uuid::Uuid::new_v4();
    let server_id = (id.as_u128() % 1000) as u16;
    let session_id = id.simple().to_string()[..8].to_string();
    (server_id, session_id)
}

/// `http(s)://host/prefix` becomes `ws(s)://host/prefix/{server}/{session}/websocket`.
pub fn session_url(endpoint: &str, server_id: u16, session_id: &str) -> Result<String, TransportError> {
    let base = endpoint.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(TransportError::Connect {
            endpoint: endpoint.to_string(),
            reason: "endpoint must be an http(s) or ws(s) URL".to_string(),
        });
    };
    Ok(format!("{}/{:03}/{}/websocket", ws_base, server_id, session_id))
}
