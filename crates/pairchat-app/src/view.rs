//! Presentation view model.
//!
//! [`View`] folds the session's notifications into what a screen shows.
//! It owns no session logic: every field is derived from notifications, so
//! any frontend (or a test driver) can render from it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use pairchat_core::{
    ConnectionStatus, EndpointAddress, ErrorKind, Notification, Origin, RoomCode, Screen,
};

/// How long a raised error stays visible.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(3);

/// A message as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMessage {
    /// Who produced it.
    pub origin: Origin,
    /// Message text.
    pub text: String,
    /// `HH:MM` label.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ShownError {
    kind: ErrorKind,
    message: String,
    raised_at: DateTime<Utc>,
}

/// View model folded from notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    screen: Screen,
    status: ConnectionStatus,
    room_code: Option<RoomCode>,
    endpoint: Option<EndpointAddress>,
    messages: Vec<ViewMessage>,
    error: Option<ShownError>,
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

impl View {
    /// Welcome screen, disconnected, nothing shown.
    pub fn new() -> Self {
        Self {
            screen: Screen::Welcome,
            status: ConnectionStatus::Disconnected,
            room_code: None,
            endpoint: None,
            messages: Vec::new(),
            error: None,
        }
    }

    /// Fold one notification. `now` stamps raised errors.
    pub fn apply(&mut self, notification: &Notification, now: DateTime<Utc>) {
        match notification {
            Notification::ScreenChanged(screen) => {
                self.screen = *screen;
                if *screen == Screen::Welcome {
                    // Back to the start: the session and its log are gone.
                    self.room_code = None;
                    self.endpoint = None;
                    self.messages.clear();
                }
            },
            Notification::MessageAppended(message) => self.messages.push(ViewMessage {
                origin: message.origin,
                text: message.text.clone(),
                time: message.time_label(),
            }),
            Notification::ConnectionStatusChanged(status) => self.status = *status,
            Notification::ErrorRaised(err) => {
                self.error = Some(ShownError {
                    kind: err.kind(),
                    message: err.to_string(),
                    raised_at: now,
                });
            },
            Notification::RoomCodeReady(code) => self.room_code = Some(code.clone()),
            Notification::LocalEndpointReady(endpoint) => self.endpoint = Some(endpoint.clone()),
        }
    }

    /// Expire the error line once it has been shown for [`ERROR_DISPLAY`].
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let expired = self.error.as_ref().is_some_and(|shown| {
            (now - shown.raised_at).to_std().is_ok_and(|elapsed| elapsed >= ERROR_DISPLAY)
        });
        if expired {
            self.error = None;
        }
    }

    /// Current screen.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Connection indicator.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Room code to display to the host.
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.room_code.as_ref()
    }

    /// Local endpoint, once acquired.
    pub fn endpoint(&self) -> Option<&EndpointAddress> {
        self.endpoint.as_ref()
    }

    /// Rendered messages in log order.
    pub fn messages(&self) -> &[ViewMessage] {
        &self.messages
    }

    /// Visible error line.
    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|shown| shown.message.as_str())
    }

    /// Kind of the visible error.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|shown| shown.kind)
    }
}
