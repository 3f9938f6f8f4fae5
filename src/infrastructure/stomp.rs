// STOMP 1.1 frame codec
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StompError {
    #[error("frame is missing its NUL terminator")]
    Incomplete,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("malformed header line `{0}`")]
    MalformedHeader(String),
    #[error("invalid escape sequence in `{0}`")]
    InvalidEscape(String),
    #[error("content-length does not match the body")]
    BadContentLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Send => "SEND",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    fn parse(line: &str) -> Result<Self, StompError> {
        Ok(match line {
            "CONNECT" | "STOMP" => Command::Connect,
            "CONNECTED" => Command::Connected,
            "SUBSCRIBE" => Command::Subscribe,
            "UNSUBSCRIBE" => Command::Unsubscribe,
            "SEND" => Command::Send,
            "MESSAGE" => Command::Message,
            "RECEIPT" => Command::Receipt,
            "ERROR" => Command::Error,
            "DISCONNECT" => Command::Disconnect,
            other => return Err(StompError::UnknownCommand(other.to_string())),
        })
    }

    /// CONNECT and CONNECTED headers are never escaped.
    fn escapes_headers(self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[cfg(test)]
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// First value wins when a header repeats.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// We promise heart-beats every `heartbeat_ms` and ask for none back.
    pub fn connect(heartbeat_ms: u64) -> Self {
        Frame::new(Command::Connect)
            .header("accept-version", "1.1,1.0")
            .header("heart-beat", &format!("{},0", heartbeat_ms))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        Frame::new(Command::Disconnect)
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64 + self.body.len());
        buf.put_slice(self.command.as_str().as_bytes());
        buf.put_u8(b'\n');
        for (name, value) in &self.headers {
            if self.command.escapes_headers() {
                buf.put_slice(escape(name).as_bytes());
                buf.put_u8(b':');
                buf.put_slice(escape(value).as_bytes());
            } else {
                buf.put_slice(name.as_bytes());
                buf.put_u8(b':');
                buf.put_slice(value.as_bytes());
            }
            buf.put_u8(b'\n');
        }
        buf.put_u8(b'\n');
        buf.put_slice(self.body.as_bytes());
        buf.put_u8(0);
        buf.freeze()
    }

    /// Encoded frame as text, for transports that carry text messages.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.encode()).into_owned()
    }
}

/// A bare EOL between frames is a heart-beat.
pub fn is_heartbeat(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c == '\n' || c == '\r')
}

/// Decode every frame in `text`, skipping heart-beat EOLs between them.
pub fn decode_frames(text: &str) -> Result<Vec<Frame>, StompError> {
    let mut frames = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.trim_start_matches(['\r', '\n']);
        if rest.is_empty() {
            return Ok(frames);
        }
        let (frame, consumed) = decode_one(rest)?;
        frames.push(frame);
        rest = &rest[consumed..];
    }
}

fn decode_one(text: &str) -> Result<(Frame, usize), StompError> {
    let mut pos = 0;
    let command = Command::parse(next_line(text, &mut pos)?)?;
    let mut headers = Vec::new();
    loop {
        let line = next_line(text, &mut pos)?;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
        if command.escapes_headers() {
            headers.push((unescape(name)?, unescape(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(name, _)| name == "content-length")
        .map(|(_, value)| value.trim().parse::<usize>())
        .transpose()
        .map_err(|_| StompError::BadContentLength)?;

    let body_end = match content_length {
        Some(len) => {
            let end = pos.checked_add(len).ok_or(StompError::BadContentLength)?;
            if text.as_bytes().get(end) != Some(&0) {
                return Err(if end >= text.len() {
                    StompError::Incomplete
                } else {
                    StompError::BadContentLength
                });
            }
            end
        }
        None => text[pos..].find('\0').ok_or(StompError::Incomplete)? + pos,
    };
    let body = text
        .get(pos..body_end)
        .ok_or(StompError::BadContentLength)?
        .to_string();

    Ok((
        Frame {
            command,
            headers,
            body,
        },
        body_end + 1,
    ))
}

fn next_line<'a>(text: &'a str, pos: &mut usize) -> Result<&'a str, StompError> {
    let end = text[*pos..].find('\n').ok_or(StompError::Incomplete)? + *pos;
    let line = text[*pos..end].trim_end_matches('\r');
    *pos = end + 1;
    Ok(line)
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(StompError::InvalidEscape(value.to_string())),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_connect() {
        let text = Frame::connect(10_000).to_text();
        assert_eq!(text, "CONNECT\naccept-version:1.1,1.0\nheart-beat:10000,0\n\n\0");
    }

    #[test]
    fn test_encode_escapes_subscribe_headers() {
        let text = Frame::new(Command::Subscribe)
            .header("destination", "/topic/a:b")
            .to_text();
        assert_eq!(text, "SUBSCRIBE\ndestination:/topic/a\\cb\n\n\0");
    }

    #[test]
    fn test_decode_message() {
        let text = "MESSAGE\ndestination:/topic/wind_updates\ncontent-type:application/json\nsubscription:sub-0\nmessage-id:7\n\n{\"speed\":12.3,\"direction\":47}\0";
        let frames = decode_frames(text).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::Message);
        assert_eq!(frames[0].get("destination"), Some("/topic/wind_updates"));
        assert_eq!(frames[0].body, "{\"speed\":12.3,\"direction\":47}");
    }

    #[test]
    fn test_decode_honours_content_length() {
        let text = "MESSAGE\ncontent-length:5\n\na\0b c\0\n";
        let frames = decode_frames(text).unwrap();
        assert_eq!(frames[0].body, "a\0b c");
    }

    #[test]
    fn test_decode_several_frames_and_heartbeats() {
        let text = "\nCONNECTED\nversion:1.1\nheart-beat:0,0\n\n\0\n\nMESSAGE\nfoo:a\\cb\n\nx\0";
        let frames = decode_frames(text).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].command, Command::Connected);
        assert_eq!(frames[0].get("version"), Some("1.1"));
        assert_eq!(frames[1].get("foo"), Some("a:b"));
        assert!(decode_frames("\n").unwrap().is_empty());
        assert!(is_heartbeat("\r\n"));
        assert!(!is_heartbeat(""));
    }

    #[test]
    fn test_decode_crlf_lines() {
        let frames = decode_frames("ERROR\r\nmessage:bad login\r\n\r\ndenied\0").unwrap();
        assert_eq!(frames[0].command, Command::Error);
        assert_eq!(frames[0].get("message"), Some("bad login"));
        assert_eq!(frames[0].body, "denied");
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            decode_frames("MESSAGE\n\nno terminator"),
            Err(StompError::Incomplete)
        );
        assert_eq!(
            decode_frames("HELLO\n\n\0"),
            Err(StompError::UnknownCommand("HELLO".to_string()))
        );
        assert_eq!(
            decode_frames("MESSAGE\nnocolon\n\n\0"),
            Err(StompError::MalformedHeader("nocolon".to_string()))
        );
        assert_eq!(
            decode_frames("MESSAGE\nk:bad\\x\n\n\0"),
            Err(StompError::InvalidEscape("bad\\x".to_string()))
        );
        assert_eq!(
            decode_frames("MESSAGE\ncontent-length:1\n\nabc\0"),
            Err(StompError::BadContentLength)
        );
        assert_eq!(
            decode_frames("MESSAGE\ncontent-length:18446744073709551615\n\nabc\0"),
            Err(StompError::BadContentLength)
        );
    }
}
