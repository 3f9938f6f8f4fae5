// Connection status presentation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionState {
    pub connected: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    Connected,
    Disconnected,
}

impl StatusStyle {
    pub fn class(self) -> &'static str {
        match self {
            StatusStyle::Connected => "connected",
            StatusStyle::Disconnected => "disconnected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    pub label: String,
    pub style: StatusStyle,
}

/// Holds the single current connection state. Every transport event
/// overwrites it; there is no queue of past states.
#[derive(Debug, Clone)]
pub struct StatusPresenter {
    server: String,
    state: Option<ConnectionState>,
}

impl StatusPresenter {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            state: None,
        }
    }

    pub fn set_status(&mut self, connected: bool, detail: Option<&str>) -> StatusView {
        self.state = Some(ConnectionState {
            connected,
            detail: detail.unwrap_or_default().to_string(),
        });
        self.view()
    }

    #[cfg(test)]
    pub fn state(&self) -> Option<&ConnectionState> {
        self.state.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.connected)
    }

    pub fn view(&self) -> StatusView {
        match &self.state {
            None => StatusView {
                label: "Connecting".to_string(),
                style: StatusStyle::Disconnected,
            },
            Some(state) if state.connected => StatusView {
                label: "Connected".to_string(),
                style: StatusStyle::Connected,
            },
            Some(state) if state.detail.is_empty() => StatusView {
                label: "Disconnected".to_string(),
                style: StatusStyle::Disconnected,
            },
            Some(state) => StatusView {
                label: format!("Disconnected ({})", state.detail),
                style: StatusStyle::Disconnected,
            },
        }
    }

    pub fn server_line(&self) -> String {
        match &self.state {
            None => format!("Connecting to server: {}", self.server),
            Some(state) if state.connected => format!("Connected to server: {}", self.server),
            Some(_) => format!("Trying to connect to server: {}", self.server),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_view() {
        let presenter = StatusPresenter::new("10.0.0.5");
        assert_eq!(presenter.view().label, "Connecting");
        assert_eq!(presenter.view().style.class(), "disconnected");
        assert_eq!(presenter.server_line(), "Connecting to server: 10.0.0.5");
    }

    #[test]
    fn test_connected() {
        let mut presenter = StatusPresenter::new("10.0.0.5");
        let view = presenter.set_status(true, None);
        assert_eq!(view.label, "Connected");
        assert_eq!(view.style.class(), "connected");
        assert!(presenter.is_connected());
        assert_eq!(presenter.server_line(), "Connected to server: 10.0.0.5");
    }

    #[test]
    fn test_disconnected_with_and_without_detail() {
        let mut presenter = StatusPresenter::new("host");
        assert_eq!(presenter.set_status(false, None).label, "Disconnected");

        let view = presenter.set_status(false, Some("connection refused"));
        assert_eq!(view.label, "Disconnected (connection refused)");
        assert_eq!(view.style, StatusStyle::Disconnected);
        assert_eq!(presenter.server_line(), "Trying to connect to server: host");
    }

    #[test]
    fn test_last_write_wins() {
        let mut presenter = StatusPresenter::new("host");
        presenter.set_status(false, Some("closed"));
        presenter.set_status(true, None);
        assert_eq!(
            presenter.state(),
            Some(&ConnectionState {
                connected: true,
                detail: String::new()
            })
        );
    }
}
