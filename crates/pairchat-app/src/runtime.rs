//! Generic runtime for session orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`SessionController`]: session state machine
//! - [`Rendezvous`]: endpoints and links
//! - [`Driver`]: presentation I/O
//!
//! Every event is handled to completion before the next one is taken: the
//! actions it produces are executed in order, and any completion they yield
//! (an acquired endpoint, a started link) is fed back in the same cycle.

use std::collections::VecDeque;

use pairchat_core::{
    Environment, LinkEvent, RoomDirectory, SessionAction, SessionConfig, SessionController,
    SessionEvent,
};
use pairchat_proto::normalize_code;

use crate::{Driver, Rendezvous, RendezvousError, RuntimeError, UserIntent};

/// Runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Passed to the session controller.
    pub session: SessionConfig,
}

/// Generic runtime that orchestrates a session, a rendezvous and a driver.
///
/// # Type Parameters
///
/// - `P`: Presentation driver
/// - `R`: Rendezvous client
/// - `E`: Environment for time and randomness
/// - `D`: Room directory
pub struct Runtime<P, R, E, D>
where
    P: Driver,
    R: Rendezvous,
    E: Environment,
    D: RoomDirectory,
{
    driver: P,
    rendezvous: R,
    session: SessionController<E, D>,
}

impl<P, R, E, D> Runtime<P, R, E, D>
where
    P: Driver,
    R: Rendezvous,
    E: Environment,
    D: RoomDirectory,
{
    /// Create a runtime with default configuration.
    pub fn new(driver: P, rendezvous: R, env: E, directory: D) -> Self {
        Self::with_config(driver, rendezvous, env, directory, RuntimeConfig::default())
    }

    /// Create a runtime.
    pub fn with_config(
        driver: P,
        rendezvous: R,
        env: E,
        directory: D,
        config: RuntimeConfig,
    ) -> Self {
        let session = SessionController::with_config(env, directory, config.session);
        Self { driver, rendezvous, session }
    }

    /// The session being driven.
    pub fn session(&self) -> &SessionController<E, D> {
        &self.session
    }

    /// Run until the user quits.
    ///
    /// Leaves the active room, if any, before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails or the rendezvous shuts down.
    pub async fn run(mut self) -> Result<(), RuntimeError<P::Error>> {
        tracing::info!("runtime started");

        let result = loop {
            match self.step().await {
                Ok(true) => {},
                Ok(false) => break self.dispatch(SessionEvent::LeaveRoom).await,
                Err(e) => break Err(e),
            }
        };

        self.driver.stop();
        tracing::info!("runtime stopped");
        result
    }

    /// Wait for one intent or rendezvous event and handle it.
    ///
    /// Returns `false` when the user quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails or the rendezvous shuts down.
    pub async fn step(&mut self) -> Result<bool, RuntimeError<P::Error>> {
        tokio::select! {
            intent = self.driver.poll_intent() => {
                let Some(intent) = intent.map_err(RuntimeError::Driver)? else {
                    return Ok(false);
                };
                let Some(event) = intent_to_event(intent) else {
                    return Ok(false);
                };
                self.dispatch(event).await?;
            },
            event = self.rendezvous.next_event() => {
                let Some(event) = event else {
                    return Err(RendezvousError::Unavailable {
                        reason: "rendezvous shut down".to_string(),
                    }
                    .into());
                };
                self.dispatch(event.into()).await?;
            },
        }

        Ok(true)
    }

    /// Feed one event to the session and execute everything it leads to.
    async fn dispatch(&mut self, event: SessionEvent) -> Result<(), RuntimeError<P::Error>> {
        let mut pending: VecDeque<SessionAction> = self.session.handle(event).into();

        while let Some(action) = pending.pop_front() {
            if let Some(follow_up) = self.execute(action).await? {
                pending.extend(self.session.handle(follow_up));
            }
        }

        Ok(())
    }

    /// Execute one action. Returns the completion to feed back, if any.
    async fn execute(
        &mut self,
        action: SessionAction,
    ) -> Result<Option<SessionEvent>, RuntimeError<P::Error>> {
        let follow_up = match action {
            SessionAction::AcquireEndpoint => Some(match self.rendezvous.acquire_endpoint().await {
                Ok(endpoint) => SessionEvent::EndpointAcquired { endpoint },
                Err(e) => SessionEvent::EndpointFailed { reason: e.to_string() },
            }),
            SessionAction::Listen => self
                .rendezvous
                .listen()
                .await
                .err()
                .map(|e| SessionEvent::EndpointFailed { reason: e.to_string() }),
            SessionAction::OpenLink { remote, options } => {
                Some(match self.rendezvous.open_link(&remote, options).await {
                    Ok(link) => SessionEvent::LinkStarted { link },
                    Err(e) => SessionEvent::LinkFailed { reason: e.to_string() },
                })
            },
            SessionAction::Send { link, payload } => {
                match self.rendezvous.send(link, payload).await {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::warn!(%link, error = %e, "send failed");
                        Some(SessionEvent::Link {
                            link,
                            event: LinkEvent::Error { reason: e.to_string() },
                        })
                    },
                }
            },
            SessionAction::CloseLink { link } => {
                if let Err(e) = self.rendezvous.close_link(link).await {
                    tracing::debug!(%link, error = %e, "close on released link");
                }
                None
            },
            SessionAction::ReleaseEndpoint => {
                if let Err(e) = self.rendezvous.release().await {
                    tracing::warn!(error = %e, "endpoint release failed");
                }
                None
            },
            SessionAction::Notify(notification) => {
                self.driver.notify(&notification).map_err(RuntimeError::Driver)?;
                None
            },
        };

        Ok(follow_up)
    }
}

/// Session event for a user intent. `None` for `Quit`.
fn intent_to_event(intent: UserIntent) -> Option<SessionEvent> {
    tracing::debug!(?intent, "user intent");
    match intent {
        UserIntent::CreateRoom => Some(SessionEvent::CreateRoom),
        UserIntent::JoinRoom(input) => Some(SessionEvent::JoinRoom { code: normalize_code(&input) }),
        UserIntent::SendMessage(text) => Some(SessionEvent::SendMessage { text }),
        UserIntent::LeaveRoom => Some(SessionEvent::LeaveRoom),
        UserIntent::Quit => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_input_is_normalized() {
        let event = intent_to_event(UserIntent::JoinRoom("  k7q2zp ".into()));
        assert_eq!(event, Some(SessionEvent::JoinRoom { code: "K7Q2ZP".into() }));
    }

    #[test]
    fn quit_has_no_session_event() {
        assert_eq!(intent_to_event(UserIntent::Quit), None);
    }
}
