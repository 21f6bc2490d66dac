//! Simulated driver and session wrapper.
//!
//! [`SimDriver`] implements [`Driver`] over an in-memory event queue wired to
//! a [`SimServer`]. Frames the runtime sends are decoded and answered by the
//! server; answers are queued as received frames. Nothing happens in the
//! background: time moves and events are delivered only when the test says
//! so.
//!
//! Fault injection:
//! - [`SimDriver::drop_connection`]: unclean loss of the channel
//! - [`SimDriver::set_offline`]: every connect attempt fails
//! - [`SimDriver::hold_replies`]: server answers stay in flight until released
//! - [`SimDriver::server_close`]: the server closes the channel cleanly

use std::{collections::VecDeque, time::Duration};

use lexo_app::{Driver, DriverEvent, Runtime, View};
use lexo_client::{
    ClientConfig, ClientError, ClientEvent, ClientIdentity, Notification, SessionStatus,
};
use lexo_core::{ConnectionConfig, Environment};
use lexo_proto::{ClientMessage, ProtocolError, ServerMessage, decode, encode};
use thiserror::Error;
use tracing::debug;

use crate::{SimEnv, SimServer};

/// URL the simulated runtime connects to.
pub const SIM_URL: &str = "ws://sim.invalid/ws";

/// Simulated driver failures.
#[derive(Debug, Error)]
pub enum SimError {
    /// Send on a channel that is not open.
    #[error("channel is not open")]
    NotConnected,

    /// Connect while a channel exists.
    #[error("channel already open")]
    AlreadyConnected,

    /// A frame failed to encode or decode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Last rendered frame, reduced to what tests assert on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedView {
    /// Session status.
    pub status: SessionStatus,
    /// Seconds left.
    pub remaining: Option<u32>,
    /// Words awaiting a verdict.
    pub pending: Vec<String>,
}

/// In-memory driver backed by a [`SimServer`].
#[derive(Debug)]
pub struct SimDriver {
    env: SimEnv,
    server: SimServer,
    events: VecDeque<DriverEvent>,
    held: Vec<ServerMessage>,
    connected: bool,
    offline: bool,
    holding: bool,
    connects: usize,
    sent: Vec<ClientMessage>,
    notifications: Vec<Notification>,
    rendered: Option<RenderedView>,
    stopped: bool,
}

impl SimDriver {
    /// Driver wired to `server`, sharing `env`'s clock.
    pub fn new(env: SimEnv, server: SimServer) -> Self {
        Self {
            env,
            server,
            events: VecDeque::new(),
            held: Vec::new(),
            connected: false,
            offline: false,
            holding: false,
            connects: 0,
            sent: Vec::new(),
            notifications: Vec::new(),
            rendered: None,
            stopped: false,
        }
    }

    /// The server.
    pub fn server(&self) -> &SimServer {
        &self.server
    }

    /// The server, mutably.
    pub fn server_mut(&mut self) -> &mut SimServer {
        &mut self.server
    }

    /// Queue a user command.
    pub fn input(&mut self, event: ClientEvent) {
        self.events.push_back(DriverEvent::Input(event));
    }

    /// Queue a server push. Dropped if no channel is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the message fails to encode.
    pub fn push(&mut self, message: &ServerMessage) -> Result<(), SimError> {
        if !self.connected {
            debug!(kind = message.kind(), "push without open channel dropped");
            return Ok(());
        }
        self.events.push_back(DriverEvent::Received(encode(message)?));
        Ok(())
    }

    /// Queue a raw text frame.
    pub fn push_raw(&mut self, text: impl Into<String>) {
        self.events.push_back(DriverEvent::Received(text.into()));
    }

    /// Lose the channel without a close handshake.
    pub fn drop_connection(&mut self) {
        if self.connected {
            self.connected = false;
            self.held.clear();
            self.events.push_back(DriverEvent::Closed { clean: false });
        }
    }

    /// The server closes the channel with a close handshake.
    pub fn server_close(&mut self) {
        if self.connected {
            self.connected = false;
            self.events.push_back(DriverEvent::Closed { clean: true });
        }
    }

    /// While offline, every connect attempt fails.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Keep server answers in flight until [`release`](Self::release).
    pub fn hold_replies(&mut self, holding: bool) {
        self.holding = holding;
    }

    /// Deliver held server answers, even onto a newer channel.
    ///
    /// # Errors
    ///
    /// Returns an error if a message fails to encode.
    pub fn release(&mut self) -> Result<(), SimError> {
        for message in std::mem::take(&mut self.held) {
            self.events.push_back(DriverEvent::Received(encode(&message)?));
        }
        Ok(())
    }

    /// Whether events are waiting to be delivered.
    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }

    /// Whether a channel is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of connect attempts so far.
    pub fn connects(&self) -> usize {
        self.connects
    }

    /// Every message sent to the server.
    pub fn sent(&self) -> &[ClientMessage] {
        &self.sent
    }

    /// Texts of every word submitted to the server.
    pub fn submitted(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                ClientMessage::SubmitWord { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every notification surfaced so far.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Errors surfaced so far.
    pub fn errors(&self) -> Vec<&ClientError> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Error(error) => Some(error),
                _ => None,
            })
            .collect()
    }

    /// Last rendered view.
    pub fn rendered(&self) -> Option<&RenderedView> {
        self.rendered.as_ref()
    }

    /// Whether the runtime stopped the driver.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Driver for SimDriver {
    type Error = SimError;

    async fn next_event(
        &mut self,
        _timeout: Option<Duration>,
    ) -> Result<Option<DriverEvent>, SimError> {
        // Virtual time never moves on its own; an empty queue is an idle timeout.
        Ok(self.events.pop_front())
    }

    async fn connect(&mut self, url: &str) -> Result<(), SimError> {
        if self.connected {
            return Err(SimError::AlreadyConnected);
        }
        self.connects += 1;
        debug!(%url, attempt = self.connects, offline = self.offline, "sim connect");
        if self.offline {
            self.events.push_front(DriverEvent::Closed { clean: false });
        } else {
            self.connected = true;
            self.events.push_front(DriverEvent::Opened);
        }
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), SimError> {
        if !self.connected {
            return Err(SimError::NotConnected);
        }
        let message: ClientMessage = decode(&text)?;
        let replies = self.server.handle(&message, self.env.wall_clock_ms());
        self.sent.push(message);
        if self.holding {
            self.held.extend(replies);
        } else {
            for reply in replies {
                self.events.push_back(DriverEvent::Received(encode(&reply)?));
            }
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.connected {
            self.connected = false;
            self.events.push_front(DriverEvent::Closed { clean: true });
        }
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), SimError> {
        self.notifications.push(notification.clone());
        Ok(())
    }

    fn render(&mut self, view: &View<'_>) -> Result<(), SimError> {
        self.rendered = Some(RenderedView {
            status: view.state.status,
            remaining: view.remaining,
            pending: view.pending.iter().map(ToString::to_string).collect(),
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Runtime over the simulated driver.
pub type SimRuntime = Runtime<SimDriver, SimEnv>;

/// A complete simulated session: runtime, driver, server and clock.
///
/// Every method delivers all resulting events before returning, so tests
/// observe settled state.
pub struct SimSession {
    env: SimEnv,
    runtime: SimRuntime,
}

impl SimSession {
    /// Classic session with a default server.
    pub fn new(seed: u64) -> Self {
        Self::with_server(seed, SimServer::new(seed))
    }

    /// Session against a custom server.
    pub fn with_server(seed: u64, server: SimServer) -> Self {
        let env = SimEnv::with_seed(seed);
        let driver = SimDriver::new(env.clone(), server);
        let runtime = Runtime::new(
            driver,
            env.clone(),
            ClientIdentity::guest("Ada"),
            SIM_URL,
            ClientConfig::default(),
            ConnectionConfig::default(),
        );
        Self { env, runtime }
    }

    /// The clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// The runtime.
    pub fn runtime(&self) -> &SimRuntime {
        &self.runtime
    }

    /// The runtime, mutably.
    pub fn runtime_mut(&mut self) -> &mut SimRuntime {
        &mut self.runtime
    }

    /// The driver.
    pub fn driver(&self) -> &SimDriver {
        self.runtime.driver()
    }

    /// The driver, mutably. Queue events here, then [`settle`](Self::settle).
    pub fn driver_mut(&mut self) -> &mut SimDriver {
        self.runtime.driver_mut()
    }

    /// The server.
    pub fn server(&self) -> &SimServer {
        self.driver().server()
    }

    /// Current session status.
    pub fn status(&self) -> SessionStatus {
        self.runtime.client().status()
    }

    /// Deliver queued events until none remain.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn settle(&mut self) -> Result<(), SimError> {
        while self.driver().has_pending() {
            self.runtime.step().await?;
        }
        Ok(())
    }

    /// Apply a user command and settle.
    ///
    /// # Errors
    ///
    /// The outer error is a driver failure; the inner one is the client
    /// refusing the command.
    pub async fn command(
        &mut self,
        event: ClientEvent,
    ) -> Result<Result<(), ClientError>, SimError> {
        let outcome = self.runtime.command(event).await?;
        self.settle().await?;
        Ok(outcome)
    }

    /// Deliver a server push and settle.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn deliver(&mut self, message: &ServerMessage) -> Result<(), SimError> {
        self.driver_mut().push(message)?;
        self.settle().await
    }

    /// Advance virtual time, fire due timers, and settle.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn advance(&mut self, duration: Duration) -> Result<(), SimError> {
        self.env.advance(duration);
        self.runtime.step().await?;
        self.settle().await
    }

    /// Join, get matched, and start the round.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn start_round(&mut self) -> Result<(), SimError> {
        if let Err(error) = self.command(ClientEvent::Join { resume: false }).await? {
            debug!(%error, "join refused");
            return Ok(());
        }
        let matched = self.driver_mut().server_mut().match_found();
        self.deliver(&matched).await?;
        let now = self.env.wall_clock_ms();
        let start = self.driver_mut().server_mut().start_game(now);
        self.deliver(&start).await
    }
}
