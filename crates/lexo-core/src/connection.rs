//! Connection lifecycle state machine.
//!
//! Owns the bookkeeping for the single persistent channel between the client
//! and the game server: opening it, sending the handshake first, periodic
//! heartbeats, and bounded reconnection after unclean drops.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods accept time as a parameter (no stored Environment)
//! - Methods return `Vec<ConnectionAction>` (or a `Result` of one)
//! - The driver owns the physical transport and executes the actions
//!
//! The driver reports transport outcomes back through
//! [`ConnectionManager::handle_opened`] and [`ConnectionManager::handle_closed`].
//!
//! # State Machine
//!
//! ```text
//!                 open()              transport ready
//! ┌──────────────┐─────────>┌────────────┐─────────>┌──────┐
//! │ Disconnected │          │ Connecting │          │ Open │
//! └──────────────┘<─────────└────────────┘          └──────┘
//!        ↑   ↑     failed        ↑                      │ close()
//!        │   │                   │ reconnect timer      ↓
//!        │   └───────────────────┘ (unclean only)  ┌─────────┐
//!        └─────────────────────────────────────────│ Closing │
//!                       transport closed           └─────────┘
//! ```
//!
//! # Reconnect policy
//!
//! Only unclean closes schedule a retry. Retries use a fixed delay and are
//! bounded by [`ConnectionConfig::max_reconnect_attempts`]; once exhausted the
//! manager emits [`ConnectionEvent::ReconnectFailed`] and stays disconnected.
//! A reconnect re-sends the handshake with its resume flag set so the server
//! answers with a full snapshot.
//!
//! # Sends
//!
//! Nothing is buffered. [`ConnectionManager::send`] fails with
//! [`ConnectionError::NotConnected`] unless the channel is open.

use std::time::{Duration, Instant};

use lexo_proto::ClientMessage;
use tracing::{debug, error, info, warn};

use crate::error::ConnectionError;

/// Actions returned by the connection state machine.
///
/// The driver executes these in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a transport to `url`. The driver reports the result through
    /// `handle_opened` or `handle_closed`.
    Connect {
        /// Server endpoint.
        url: String,
    },
    /// Send this message on the open transport.
    Send(ClientMessage),
    /// Close the transport gracefully.
    Disconnect,
    /// Lifecycle notification for the session layer.
    Notify(ConnectionEvent),
}

/// Lifecycle notifications observed by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Channel ready and handshake sent.
    Opened {
        /// True when this channel replaces one that dropped.
        reconnect: bool,
    },
    /// Channel closed cleanly. No retry will follow.
    Closed {
        /// True when the close was requested through `close()`.
        explicit: bool,
    },
    /// Channel dropped uncleanly; a retry is scheduled.
    Dropped {
        /// Retry number about to be attempted, starting at 1.
        attempt: u32,
        /// Retry budget.
        max_attempts: u32,
        /// Delay before the retry.
        retry_in: Duration,
    },
    /// Retry budget exhausted. Manual action is needed.
    ReconnectFailed {
        /// Retries that were made.
        attempts: u32,
    },
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel. A reconnect may be scheduled.
    Disconnected,
    /// Transport requested, not ready yet.
    Connecting,
    /// Channel ready; handshake sent.
    Open,
    /// Graceful close requested, waiting for the transport to confirm.
    Closing,
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Interval between client heartbeats while open.
    pub heartbeat_interval: Duration,
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,
    /// Reconnect attempts allowed after an unclean drop.
    pub max_reconnect_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(25),
            reconnect_delay: Duration::from_secs(3),
            max_reconnect_attempts: 5,
        }
    }
}

/// Connection state machine for one logical session.
///
/// Holds no transport. The driver that executes [`ConnectionAction`]s is the
/// only owner of the physical channel.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: ConnectionState,
    /// Endpoint of the current or last channel.
    url: Option<String>,
    /// First message sent on every new channel.
    handshake: Option<ClientMessage>,
    /// Retries made since the last successful open.
    attempts: u32,
    /// Set while re-establishing after an unclean drop.
    reconnecting: bool,
    reconnect_at: Option<Instant>,
    last_heartbeat: Option<Instant>,
    /// Open requested while the previous channel was still closing.
    reopen: Option<(String, ClientMessage)>,
}

impl ConnectionManager {
    /// Create a disconnected manager.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Disconnected,
            url: None,
            handshake: None,
            attempts: 0,
            reconnecting: false,
            reconnect_at: None,
            last_heartbeat: None,
            reopen: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether messages can be sent.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Retries made since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether a reconnect is scheduled.
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    /// Configuration in use.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open a channel to `url`. `handshake` is sent first once it is ready.
    ///
    /// No-op while a channel exists or is being established, so at most one
    /// channel is ever live. While a graceful close is in flight the open is
    /// deferred until the transport confirms the close. A fresh open cancels
    /// any scheduled reconnect.
    pub fn open(
        &mut self,
        url: impl Into<String>,
        handshake: ClientMessage,
        now: Instant,
    ) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Disconnected => {},
            ConnectionState::Closing => {
                debug!("open deferred until close completes");
                self.reopen = Some((url.into(), handshake));
                return vec![];
            },
            ConnectionState::Connecting | ConnectionState::Open => {
                debug!(state = ?self.state, "open ignored, channel already exists");
                return vec![];
            },
        }

        let url = url.into();
        info!(%url, "opening connection");
        self.state = ConnectionState::Connecting;
        self.url = Some(url.clone());
        self.handshake = Some(handshake);
        self.attempts = 0;
        self.reconnecting = false;
        self.reconnect_at = None;
        self.last_heartbeat = Some(now);

        vec![ConnectionAction::Connect { url }]
    }

    /// The transport reports the channel is ready.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a connect is in progress.
    pub fn handle_opened(
        &mut self,
        now: Instant,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "handle_opened",
            });
        }

        let reconnect = self.reconnecting;
        info!(reconnect, "connection open");
        self.state = ConnectionState::Open;
        self.attempts = 0;
        self.reconnecting = false;
        self.last_heartbeat = Some(now);

        let mut actions = Vec::with_capacity(2);
        if let Some(handshake) = self.handshake.clone() {
            let handshake = if reconnect { handshake.into_resume() } else { handshake };
            actions.push(ConnectionAction::Send(handshake));
        }
        actions.push(ConnectionAction::Notify(ConnectionEvent::Opened { reconnect }));
        Ok(actions)
    }

    /// Send a message on the open channel.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` unless the channel is open. The message is
    /// dropped, not queued.
    pub fn send(&self, message: ClientMessage) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Open {
            debug!(kind = message.kind(), state = ?self.state, "send without open channel");
            return Err(ConnectionError::NotConnected);
        }
        Ok(vec![ConnectionAction::Send(message)])
    }

    /// Close the channel gracefully. Suppresses reconnection for this close.
    pub fn close(&mut self) -> Vec<ConnectionAction> {
        self.reopen = None;
        self.reconnect_at = None;
        self.reconnecting = false;
        self.attempts = 0;
        self.last_heartbeat = None;

        match self.state {
            ConnectionState::Open | ConnectionState::Connecting => {
                info!("closing connection");
                self.state = ConnectionState::Closing;
                vec![ConnectionAction::Disconnect]
            },
            ConnectionState::Closing | ConnectionState::Disconnected => vec![],
        }
    }

    /// The transport reports the channel is gone.
    ///
    /// `clean` is true for a normal close handshake from either side. A failed
    /// connect attempt is reported as unclean.
    pub fn handle_closed(&mut self, clean: bool, now: Instant) -> Vec<ConnectionAction> {
        let previous = self.state;
        if previous == ConnectionState::Disconnected {
            debug!("close reported while already disconnected");
            return vec![];
        }

        self.state = ConnectionState::Disconnected;
        self.last_heartbeat = None;

        if previous == ConnectionState::Closing {
            info!("connection closed");
            let mut actions =
                vec![ConnectionAction::Notify(ConnectionEvent::Closed { explicit: true })];
            if let Some((url, handshake)) = self.reopen.take() {
                actions.extend(self.open(url, handshake, now));
            }
            return actions;
        }
        if clean {
            info!("connection closed by server");
            self.reconnecting = false;
            return vec![ConnectionAction::Notify(ConnectionEvent::Closed { explicit: false })];
        }

        if self.attempts < self.config.max_reconnect_attempts {
            self.attempts += 1;
            self.reconnecting = true;
            self.reconnect_at = Some(now + self.config.reconnect_delay);
            warn!(
                attempt = self.attempts,
                max = self.config.max_reconnect_attempts,
                "connection dropped, reconnect scheduled"
            );
            return vec![ConnectionAction::Notify(ConnectionEvent::Dropped {
                attempt: self.attempts,
                max_attempts: self.config.max_reconnect_attempts,
                retry_in: self.config.reconnect_delay,
            })];
        }

        let attempts = self.attempts;
        error!(attempts, "reconnect attempts exhausted");
        self.attempts = 0;
        self.reconnecting = false;
        vec![ConnectionAction::Notify(ConnectionEvent::ReconnectFailed { attempts })]
    }

    /// Drive timers: fire a due reconnect, send a due heartbeat.
    ///
    /// `wall_clock_ms` is stamped into the heartbeat for clock alignment.
    pub fn tick(&mut self, now: Instant, wall_clock_ms: u64) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Disconnected => {
                let due = self.reconnect_at.is_some_and(|at| now >= at);
                match (due, self.url.clone()) {
                    (true, Some(url)) => {
                        info!(attempt = self.attempts, %url, "reconnecting");
                        self.reconnect_at = None;
                        self.state = ConnectionState::Connecting;
                        vec![ConnectionAction::Connect { url }]
                    },
                    _ => vec![],
                }
            },
            ConnectionState::Open => {
                let due = self
                    .last_heartbeat
                    .is_none_or(|last| now.duration_since(last) >= self.config.heartbeat_interval);
                if due {
                    self.last_heartbeat = Some(now);
                    vec![ConnectionAction::Send(ClientMessage::Ping { client_time: wall_clock_ms })]
                } else {
                    vec![]
                }
            },
            ConnectionState::Connecting | ConnectionState::Closing => vec![],
        }
    }

    /// Next instant at which [`tick`](Self::tick) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            ConnectionState::Disconnected => self.reconnect_at,
            ConnectionState::Open => {
                self.last_heartbeat.map(|last| last + self.config.heartbeat_interval)
            },
            ConnectionState::Connecting | ConnectionState::Closing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join() -> ClientMessage {
        ClientMessage::Join {
            identity: "u-1".into(),
            display_name: "Ada".into(),
            resume: false,
            auth_token: Some("token".into()),
        }
    }

    fn open(now: Instant) -> ConnectionManager {
        let mut conn = ConnectionManager::new(ConnectionConfig::default());
        conn.open("ws://server", join(), now);
        conn.handle_opened(now).unwrap();
        conn
    }

    #[test]
    fn handshake_is_first_send() {
        let t0 = Instant::now();
        let mut conn = ConnectionManager::new(ConnectionConfig::default());

        let actions = conn.open("ws://server", join(), t0);
        assert_eq!(actions, vec![ConnectionAction::Connect { url: "ws://server".into() }]);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        let actions = conn.handle_opened(t0).unwrap();
        assert_eq!(actions[0], ConnectionAction::Send(join()));
        assert_eq!(
            actions[1],
            ConnectionAction::Notify(ConnectionEvent::Opened { reconnect: false })
        );
        assert!(conn.is_open());
    }

    #[test]
    fn second_open_is_noop() {
        let t0 = Instant::now();
        let mut conn = open(t0);
        assert!(conn.open("ws://other", join(), t0).is_empty());
        assert!(conn.is_open());
    }

    #[test]
    fn send_requires_open_channel() {
        let conn = ConnectionManager::new(ConnectionConfig::default());
        let result = conn.send(ClientMessage::SubmitWord { text: "kalem".into() });
        assert_eq!(result, Err(ConnectionError::NotConnected));
    }

    #[test]
    fn opened_without_connect_is_invalid() {
        let mut conn = ConnectionManager::new(ConnectionConfig::default());
        let result = conn.handle_opened(Instant::now());
        assert!(matches!(result, Err(ConnectionError::InvalidState { .. })));
    }

    #[test]
    fn heartbeat_timing() {
        let t0 = Instant::now();
        let mut conn = open(t0);

        assert!(conn.tick(t0 + Duration::from_secs(1), 1_000).is_empty());

        let actions = conn.tick(t0 + Duration::from_secs(25), 25_000);
        assert_eq!(actions, vec![ConnectionAction::Send(ClientMessage::Ping {
            client_time: 25_000
        })]);

        assert!(conn.tick(t0 + Duration::from_secs(30), 30_000).is_empty());
        assert_eq!(conn.next_deadline(), Some(t0 + Duration::from_secs(50)));
    }

    #[test]
    fn explicit_close_never_retries() {
        let t0 = Instant::now();
        let mut conn = open(t0);

        assert_eq!(conn.close(), vec![ConnectionAction::Disconnect]);
        assert_eq!(conn.state(), ConnectionState::Closing);

        // even an unclean report after close() is treated as the explicit close
        let actions = conn.handle_closed(false, t0);
        assert_eq!(
            actions,
            vec![ConnectionAction::Notify(ConnectionEvent::Closed { explicit: true })]
        );
        assert!(!conn.reconnect_pending());
        assert!(conn.tick(t0 + Duration::from_secs(60), 0).is_empty());
    }

    #[test]
    fn clean_server_close_never_retries() {
        let t0 = Instant::now();
        let mut conn = open(t0);

        let actions = conn.handle_closed(true, t0);
        assert_eq!(
            actions,
            vec![ConnectionAction::Notify(ConnectionEvent::Closed { explicit: false })]
        );
        assert!(!conn.reconnect_pending());
    }

    #[test]
    fn unclean_drop_reconnects_with_resume() {
        let t0 = Instant::now();
        let mut conn = open(t0);

        let actions = conn.handle_closed(false, t0);
        assert!(matches!(
            actions[0],
            ConnectionAction::Notify(ConnectionEvent::Dropped { attempt: 1, max_attempts: 5, .. })
        ));

        // not yet due
        assert!(conn.tick(t0 + Duration::from_secs(1), 0).is_empty());

        let t1 = t0 + Duration::from_secs(3);
        let actions = conn.tick(t1, 0);
        assert_eq!(actions, vec![ConnectionAction::Connect { url: "ws://server".into() }]);

        let actions = conn.handle_opened(t1).unwrap();
        assert_eq!(actions[0], ConnectionAction::Send(join().into_resume()));
        assert_eq!(
            actions[1],
            ConnectionAction::Notify(ConnectionEvent::Opened { reconnect: true })
        );
        assert_eq!(conn.attempts(), 0);
    }

    #[test]
    fn retry_budget_is_bounded() {
        let config = ConnectionConfig { max_reconnect_attempts: 2, ..Default::default() };
        let mut now = Instant::now();
        let mut conn = ConnectionManager::new(config);
        conn.open("ws://server", join(), now);
        conn.handle_opened(now).unwrap();

        // drop, then two failed connects
        for attempt in 1..=2 {
            let actions = conn.handle_closed(false, now);
            assert!(matches!(
                actions[0],
                ConnectionAction::Notify(ConnectionEvent::Dropped { attempt: a, .. }) if a == attempt
            ));
            now += Duration::from_secs(3);
            assert_eq!(conn.tick(now, 0).len(), 1);
            assert_eq!(conn.state(), ConnectionState::Connecting);
        }

        let actions = conn.handle_closed(false, now);
        assert_eq!(
            actions,
            vec![ConnectionAction::Notify(ConnectionEvent::ReconnectFailed { attempts: 2 })]
        );
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(conn.tick(now + Duration::from_secs(60), 0).is_empty());
    }

    #[test]
    fn open_while_closing_waits_for_the_close() {
        let t0 = Instant::now();
        let mut conn = open(t0);
        conn.close();

        assert!(conn.open("ws://server", join(), t0).is_empty());
        assert_eq!(conn.state(), ConnectionState::Closing);

        let actions = conn.handle_closed(true, t0);
        assert_eq!(actions, vec![
            ConnectionAction::Notify(ConnectionEvent::Closed { explicit: true }),
            ConnectionAction::Connect { url: "ws://server".into() },
        ]);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        let actions = conn.handle_opened(t0).unwrap();
        assert_eq!(actions[0], ConnectionAction::Send(join()));
    }

    #[test]
    fn close_drops_a_deferred_open() {
        let t0 = Instant::now();
        let mut conn = open(t0);
        conn.close();
        conn.open("ws://server", join(), t0);
        conn.close();

        let actions = conn.handle_closed(true, t0);
        assert_eq!(
            actions,
            vec![ConnectionAction::Notify(ConnectionEvent::Closed { explicit: true })]
        );
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn close_cancels_scheduled_reconnect() {
        let t0 = Instant::now();
        let mut conn = open(t0);
        conn.handle_closed(false, t0);
        assert!(conn.reconnect_pending());

        assert!(conn.close().is_empty());
        assert!(!conn.reconnect_pending());
        assert!(conn.tick(t0 + Duration::from_secs(10), 0).is_empty());
    }
}
