//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` stands in for a real frontend so the same
//! [`pairchat_app::Runtime`] orchestration code runs in tests. Intents are
//! injected through a [`SimHandle`]; notifications are recorded and folded
//! into a [`View`] the handle can wait on.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use pairchat_app::{Driver, UserIntent, View};
use pairchat_core::{Environment, Notification};
use tokio::sync::{mpsc, watch};

use crate::SimEnv;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// State shared between the driver and its handle.
#[derive(Debug, Default)]
struct SharedState {
    notifications: Vec<Notification>,
    stopped: bool,
    /// Fail the next `notify` with this message.
    fail_next_notify: Option<String>,
}

/// Simulation driver for deterministic testing.
pub struct SimDriver {
    env: SimEnv,
    intents: mpsc::UnboundedReceiver<UserIntent>,
    view: Arc<watch::Sender<View>>,
    state: Arc<Mutex<SharedState>>,
}

/// Test-side handle to a [`SimDriver`].
///
/// Dropping every handle ends the intent stream, which stops the runtime.
#[derive(Clone)]
pub struct SimHandle {
    env: SimEnv,
    intents: mpsc::UnboundedSender<UserIntent>,
    view_tx: Arc<watch::Sender<View>>,
    view: watch::Receiver<View>,
    state: Arc<Mutex<SharedState>>,
}

impl SimDriver {
    /// Create a driver and its handle. `env` stamps raised errors.
    pub fn new(env: SimEnv) -> (Self, SimHandle) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(View::new());
        let view_tx = Arc::new(view_tx);
        let state = Arc::new(Mutex::new(SharedState::default()));

        let driver = Self {
            env: env.clone(),
            intents: intent_rx,
            view: view_tx.clone(),
            state: state.clone(),
        };
        let handle = SimHandle { env, intents: intent_tx, view_tx, view: view_rx, state };
        (driver, handle)
    }
}

impl SimHandle {
    /// Inject a user intent.
    pub fn intent(&self, intent: UserIntent) {
        // Runtime gone: nothing left to drive.
        let _ = self.intents.send(intent);
    }

    /// Current view.
    pub fn view(&self) -> View {
        self.view.borrow().clone()
    }

    /// Wait until the view satisfies `predicate`, for at most `timeout`.
    ///
    /// Returns the matching view, or `None` on timeout.
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        predicate: impl FnMut(&View) -> bool,
    ) -> Option<View> {
        match tokio::time::timeout(timeout, self.view.wait_for(predicate)).await {
            Ok(Ok(view)) => Some(view.clone()),
            Ok(Err(_)) | Err(_) => None,
        }
    }

    /// Advance the shared clock and expire the view's error line.
    pub fn advance(&self, duration: Duration) {
        self.env.advance(duration);
        let now = self.env.now();
        self.view_tx.send_modify(|view| view.tick(now));
    }

    /// Every notification presented so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }

    /// Whether the runtime called `stop`.
    pub fn stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Make the next `notify` fail.
    pub fn fail_next_notify(&self, message: impl Into<String>) {
        self.lock().fail_next_notify = Some(message.into());
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_intent(&mut self) -> Result<Option<UserIntent>, Self::Error> {
        Ok(self.intents.recv().await)
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), Self::Error> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(message) = state.fail_next_notify.take() {
                return Err(SimDriverError(message));
            }
            state.notifications.push(notification.clone());
        }

        let now = self.env.now();
        self.view.send_modify(|view| {
            view.tick(now);
            view.apply(notification, now);
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).stopped = true;
    }
}
