//! Session state machine.
//!
//! The [`SessionController`] owns the session's role, room code, link and
//! chat log, and keeps them consistent with the link lifecycle. It is a pure
//! state machine: it consumes [`SessionEvent`]s and produces
//! [`SessionAction`]s for the runtime to execute.
//!
//! # Transitions
//!
//! | From | Event | To |
//! |---|---|---|
//! | Idle | `CreateRoom` | Hosting (endpoint pending) |
//! | Idle | `JoinRoom` (valid, registered code) | Joining (endpoint pending) |
//! | Hosting | `IncomingLink` | Hosting (link connecting) |
//! | Hosting / Joining | link `Open` | Connected |
//! | Connected | link `Data` | Connected, peer message appended |
//! | Hosting / Joining | `EndpointFailed` | Idle, room released |
//! | Connected | `EndpointFailed` | unchanged, disconnected |
//! | any non-Idle | link `Close` / `Error` | unchanged, link cleared |
//! | any non-Idle | `LeaveRoom` | Idle |
//!
//! Events that arrive for a link that is not the live one, or completions
//! that arrive after the session was left, never change state.

use chrono::{DateTime, SubsecRound, Utc};
use pairchat_proto::{DataFrame, RoomCode};

use crate::{
    ChatLog, ChatMessage, ConnectionStatus, EndpointAddress, Environment, LinkEvent, LinkId,
    LinkOptions, LinkSnapshot, LinkState, Notification, Origin, Phase, Role, RoomDirectory,
    RoomRecord, Screen, SessionAction, SessionError, SessionEvent, SessionState,
};

/// Texts of the messages the session appends on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMessages {
    /// Appended when the link opens.
    pub peer_connected: String,
    /// Appended when the link closes.
    pub peer_disconnected: String,
}

impl Default for SystemMessages {
    fn default() -> Self {
        Self {
            peer_connected: "peer connected".to_string(),
            peer_disconnected: "peer disconnected".to_string(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Options for the guest's outbound link.
    pub link_options: LinkOptions,
    /// System message texts.
    pub system_messages: SystemMessages,
}

/// Which side of the room, with the guest's target.
#[derive(Debug, Clone)]
enum Side {
    Host,
    Guest { remote: EndpointAddress },
}

/// Everything that exists only while a room is active.
#[derive(Debug, Clone)]
struct ActiveSession {
    side: Side,
    code: RoomCode,
    /// `None` while acquisition is in flight.
    endpoint: Option<EndpointAddress>,
    /// Live link. Cleared on close and error.
    link: Option<LinkSnapshot>,
    /// The link has opened at least once.
    connected: bool,
}

impl ActiveSession {
    fn new(side: Side, code: RoomCode) -> Self {
        Self { side, code, endpoint: None, link: None, connected: false }
    }

    fn role(&self) -> Role {
        match self.side {
            Side::Host => Role::Host,
            Side::Guest { .. } => Role::Guest,
        }
    }

    fn phase(&self) -> Phase {
        match (&self.side, self.connected) {
            (_, true) => Phase::Connected,
            (Side::Host, false) => Phase::Hosting,
            (Side::Guest { .. }, false) => Phase::Joining,
        }
    }
}

/// Session state machine.
///
/// One controller drives one session at a time and assumes single-flight
/// use: a `CreateRoom` or `JoinRoom` while a room is active is ignored, and
/// the presentation layer is expected not to offer it.
///
/// Generic over the [`Environment`] (time, randomness) and the
/// [`RoomDirectory`] so both can be replaced in simulation.
#[derive(Debug)]
pub struct SessionController<E: Environment, D: RoomDirectory> {
    env: E,
    directory: D,
    config: SessionConfig,
    /// `None` when idle.
    session: Option<ActiveSession>,
    log: ChatLog,
    status: ConnectionStatus,
    screen: Screen,
}

impl<E: Environment, D: RoomDirectory> SessionController<E, D> {
    /// Create an idle controller with default configuration.
    pub fn new(env: E, directory: D) -> Self {
        Self::with_config(env, directory, SessionConfig::default())
    }

    /// Create an idle controller.
    pub fn with_config(env: E, directory: D, config: SessionConfig) -> Self {
        Self {
            env,
            directory,
            config,
            session: None,
            log: ChatLog::new(),
            status: ConnectionStatus::Disconnected,
            screen: Screen::Welcome,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::CreateRoom => self.create_room(),
            SessionEvent::JoinRoom { code } => self.join_room(&code),
            SessionEvent::SendMessage { text } => self.send_message(&text),
            SessionEvent::LeaveRoom => self.leave_room(),
            SessionEvent::EndpointAcquired { endpoint } => self.handle_endpoint_acquired(endpoint),
            SessionEvent::EndpointFailed { reason } => self.handle_endpoint_failed(reason),
            SessionEvent::LinkStarted { link } => self.handle_link_started(link),
            SessionEvent::LinkFailed { reason } => self.handle_link_failed(reason),
            SessionEvent::IncomingLink { link } => self.handle_incoming_link(link),
            SessionEvent::Link { link, event } => self.handle_link_event(link, event),
        }
    }

    /// Host a new room.
    ///
    /// Draws a room code (first draw is used, no collision check) and asks
    /// for an endpoint. The room is registered once the endpoint arrives.
    pub fn create_room(&mut self) -> Vec<SessionAction> {
        if let Some(session) = &self.session {
            tracing::warn!(code = %session.code, "create_room ignored: room already active");
            return vec![];
        }

        let code = RoomCode::generate(|| self.env.random_u8());
        tracing::debug!(%code, "creating room");

        self.session = Some(ActiveSession::new(Side::Host, code));
        vec![SessionAction::AcquireEndpoint]
    }

    /// Join the room registered under `code`.
    ///
    /// `code` must already be normalized; it is matched case-sensitively.
    /// Raises `InvalidCode` or `RoomNotFound` without touching state.
    pub fn join_room(&mut self, code: &str) -> Vec<SessionAction> {
        if let Some(session) = &self.session {
            tracing::warn!(code = %session.code, "join_room ignored: room already active");
            return vec![];
        }

        let code = match RoomCode::parse(code) {
            Ok(code) => code,
            Err(e) => return vec![raise(e.into())],
        };

        let Some(record) = self.directory.lookup(&code) else {
            return vec![raise(SessionError::RoomNotFound { code })];
        };

        tracing::debug!(%code, remote = %record.endpoint, "joining room");

        self.session = Some(ActiveSession::new(Side::Guest { remote: record.endpoint }, code));
        vec![SessionAction::AcquireEndpoint]
    }

    /// Send a chat message to the peer.
    ///
    /// Whitespace-only text is ignored. Without an open link, raises
    /// `NotConnected` and neither sends nor queues.
    pub fn send_message(&mut self, text: &str) -> Vec<SessionAction> {
        let text = text.trim();
        if text.is_empty() {
            return vec![];
        }

        let open_link = self
            .session
            .as_ref()
            .and_then(|s| s.link)
            .filter(|l| l.state == LinkState::Open)
            .map(|l| l.id);

        let Some(link) = open_link else {
            return vec![raise(SessionError::NotConnected)];
        };

        // The wire carries milliseconds; keep the local copy identical.
        let sent_at = self.env.now().trunc_subsecs(3);
        let payload = match DataFrame::message(text, sent_at).encode() {
            Ok(payload) => payload,
            Err(e) => return vec![raise(e.into())],
        };

        vec![SessionAction::Send { link, payload }, self.append(Origin::Own, text, sent_at)]
    }

    /// Leave the room and return to idle.
    ///
    /// Closes the link, releases the endpoint, unregisters the room if we
    /// host it, and clears the chat log. No-op when already idle.
    pub fn leave_room(&mut self) -> Vec<SessionAction> {
        let Some(session) = self.session.take() else {
            return vec![];
        };

        // Acquisition may still be in flight; releasing without an endpoint is a no-op.
        let mut actions = Vec::new();
        self.tear_down(&session, true, &mut actions);

        tracing::info!(code = %session.code, role = ?session.role(), "left room");
        actions
    }

    /// Observable snapshot of the session.
    pub fn state(&self) -> SessionState {
        match &self.session {
            None => SessionState { connection_status: self.status, ..SessionState::idle() },
            Some(session) => SessionState {
                role: session.role(),
                phase: session.phase(),
                room_code: Some(session.code.clone()),
                endpoint: session.endpoint.clone(),
                link: session.link,
                connection_status: self.status,
            },
        }
    }

    /// Chat log of the active session. Empty when idle.
    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    /// Connection indicator.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.status
    }

    /// Screen the presentation should show.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Active room code. `None` when idle.
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.session.as_ref().map(|s| &s.code)
    }

    /// The injected room directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    fn handle_endpoint_acquired(&mut self, endpoint: EndpointAddress) -> Vec<SessionAction> {
        let Some(session) = self.session.as_mut() else {
            tracing::warn!(%endpoint, "releasing endpoint acquired after leaving");
            return vec![SessionAction::ReleaseEndpoint];
        };

        if session.endpoint.is_some() {
            tracing::warn!(%endpoint, "ignoring duplicate endpoint");
            return vec![];
        }

        session.endpoint = Some(endpoint.clone());
        let side = session.side.clone();
        let code = session.code.clone();

        let mut actions =
            vec![SessionAction::Notify(Notification::LocalEndpointReady(endpoint.clone()))];

        match side {
            Side::Host => {
                let record = RoomRecord { code: code.clone(), endpoint, created_at: self.env.now() };
                self.directory.register(record);
                tracing::info!(%code, "room created");

                actions.push(SessionAction::Notify(Notification::RoomCodeReady(code)));
                actions.push(SessionAction::Listen);
                self.set_screen(Screen::RoomCreated, &mut actions);
            },
            Side::Guest { remote } => {
                actions.push(SessionAction::Notify(Notification::RoomCodeReady(code)));
                self.set_status(ConnectionStatus::Connecting, &mut actions);
                actions.push(SessionAction::OpenLink {
                    remote,
                    options: self.config.link_options,
                });
                self.set_screen(Screen::Chat, &mut actions);
            },
        }

        actions
    }

    fn handle_endpoint_failed(&mut self, reason: String) -> Vec<SessionAction> {
        let Some(session) = &self.session else {
            tracing::debug!(%reason, "ignoring endpoint failure while idle");
            return vec![];
        };

        let mut actions = Vec::new();
        if session.connected {
            // Established links survive losing the rendezvous.
            tracing::warn!(code = %session.code, %reason, "rendezvous lost");
            self.set_status(ConnectionStatus::Disconnected, &mut actions);
        } else if let Some(session) = self.session.take() {
            // Room setup never completed: the create or join is aborted.
            tracing::debug!(code = %session.code, %reason, "aborting room setup");
            let acquired = session.endpoint.is_some();
            self.tear_down(&session, acquired, &mut actions);
        }

        actions.push(raise(SessionError::RendezvousUnavailable { reason }));
        actions
    }

    fn handle_link_started(&mut self, link: LinkId) -> Vec<SessionAction> {
        match self.session.as_mut() {
            Some(session)
                if matches!(session.side, Side::Guest { .. })
                    && session.endpoint.is_some()
                    && session.link.is_none() =>
            {
                session.link = Some(LinkSnapshot { id: link, state: LinkState::Connecting });
                tracing::debug!(%link, "outbound link connecting");
                vec![]
            },
            _ => {
                tracing::warn!(%link, "closing unexpected outbound link");
                vec![SessionAction::CloseLink { link }]
            },
        }
    }

    fn handle_link_failed(&mut self, reason: String) -> Vec<SessionAction> {
        let awaiting_link = self.session.as_ref().is_some_and(|s| s.link.is_none());
        if !awaiting_link {
            tracing::debug!(%reason, "ignoring stale link failure");
            return vec![];
        }

        let mut actions = Vec::new();
        self.set_status(ConnectionStatus::Disconnected, &mut actions);
        actions.push(raise(SessionError::ConnectionError { reason }));
        actions
    }

    fn handle_incoming_link(&mut self, link: LinkId) -> Vec<SessionAction> {
        let session = match self.session.as_mut() {
            Some(session)
                if matches!(session.side, Side::Host)
                    && session.endpoint.is_some()
                    && session.link.is_none() =>
            {
                session
            },
            _ => {
                // One live link per session; guests never accept.
                tracing::warn!(%link, "refusing incoming link");
                return vec![SessionAction::CloseLink { link }];
            },
        };

        session.link = Some(LinkSnapshot { id: link, state: LinkState::Connecting });
        tracing::info!(%link, code = %session.code, "guest connecting");

        let mut actions = Vec::new();
        self.set_status(ConnectionStatus::Connecting, &mut actions);
        actions
    }

    fn handle_link_event(&mut self, link: LinkId, event: LinkEvent) -> Vec<SessionAction> {
        let live = self.session.as_ref().and_then(|s| s.link).filter(|l| l.id == link);
        let Some(current) = live else {
            tracing::debug!(%link, state = ?event.resulting_state(), "ignoring event for stale link");
            return vec![];
        };

        match event {
            LinkEvent::Open => self.handle_link_open(current),
            LinkEvent::Data(bytes) => self.handle_link_data(current, &bytes),
            LinkEvent::Close => self.handle_link_close(link),
            LinkEvent::Error { reason } => self.handle_link_error(link, reason),
        }
    }

    fn handle_link_open(&mut self, current: LinkSnapshot) -> Vec<SessionAction> {
        if current.state == LinkState::Open {
            tracing::debug!(link = %current.id, "ignoring duplicate open");
            return vec![];
        }

        if let Some(session) = self.session.as_mut() {
            session.link = Some(LinkSnapshot { id: current.id, state: LinkState::Open });
            session.connected = true;
        }

        let mut actions = Vec::new();
        self.set_status(ConnectionStatus::Connected, &mut actions);

        let now = self.env.now();
        let text = self.config.system_messages.peer_connected.clone();
        actions.push(self.append(Origin::System, text, now));

        self.set_screen(Screen::Chat, &mut actions);

        tracing::info!(link = %current.id, "peer connected");
        actions
    }

    fn handle_link_data(&mut self, current: LinkSnapshot, bytes: &[u8]) -> Vec<SessionAction> {
        if current.state != LinkState::Open {
            tracing::warn!(link = %current.id, "dropping frame received before open");
            return vec![];
        }

        match DataFrame::decode(bytes) {
            Ok(Some(DataFrame::Message(message))) => {
                vec![self.append(Origin::Peer, message.text, message.timestamp)]
            },
            Ok(None) => {
                tracing::debug!(link = %current.id, "ignoring frame of unknown kind");
                vec![]
            },
            Err(e) => {
                tracing::warn!(link = %current.id, error = %e, "dropping malformed frame");
                vec![]
            },
        }
    }

    fn handle_link_close(&mut self, link: LinkId) -> Vec<SessionAction> {
        if let Some(session) = self.session.as_mut() {
            session.link = None;
        }

        let mut actions = Vec::new();
        self.set_status(ConnectionStatus::Disconnected, &mut actions);

        let now = self.env.now();
        let text = self.config.system_messages.peer_disconnected.clone();
        actions.push(self.append(Origin::System, text, now));

        tracing::info!(%link, "peer disconnected");
        actions
    }

    fn handle_link_error(&mut self, link: LinkId, reason: String) -> Vec<SessionAction> {
        if let Some(session) = self.session.as_mut() {
            session.link = None;
        }

        let mut actions = vec![SessionAction::CloseLink { link }];
        self.set_status(ConnectionStatus::Disconnected, &mut actions);
        actions.push(raise(SessionError::ConnectionError { reason }));

        tracing::warn!(%link, "link failed");
        actions
    }

    /// Release what `session` holds and return to the welcome screen.
    fn tear_down(
        &mut self,
        session: &ActiveSession,
        release: bool,
        actions: &mut Vec<SessionAction>,
    ) {
        if let Some(link) = session.link {
            actions.push(SessionAction::CloseLink { link: link.id });
        }
        if release {
            actions.push(SessionAction::ReleaseEndpoint);
        }

        if matches!(session.side, Side::Host) && session.endpoint.is_some() {
            self.directory.unregister(&session.code);
        }

        self.log.clear();
        self.set_status(ConnectionStatus::Disconnected, actions);
        self.set_screen(Screen::Welcome, actions);
    }

    fn append(
        &mut self,
        origin: Origin,
        text: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> SessionAction {
        let message = ChatMessage { origin, text: text.into(), sent_at };
        self.log.append(message.clone());
        SessionAction::Notify(Notification::MessageAppended(message))
    }

    fn set_status(&mut self, status: ConnectionStatus, actions: &mut Vec<SessionAction>) {
        if self.status != status {
            self.status = status;
            actions.push(SessionAction::Notify(Notification::ConnectionStatusChanged(status)));
        }
    }

    fn set_screen(&mut self, screen: Screen, actions: &mut Vec<SessionAction>) {
        if self.screen != screen {
            self.screen = screen;
            actions.push(SessionAction::Notify(Notification::ScreenChanged(screen)));
        }
    }
}

fn raise(err: SessionError) -> SessionAction {
    tracing::debug!(kind = ?err.kind(), error = %err, "raising session error");
    SessionAction::Notify(Notification::ErrorRaised(err))
}
