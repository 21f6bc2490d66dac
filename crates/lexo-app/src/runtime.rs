//! Generic runtime for the Lexo client.
//!
//! The [`Runtime`] owns the session state machine, the connection manager and
//! a [`Driver`], and shuttles actions between them. It contains no I/O of its
//! own, so the same loop runs against a real socket and in simulation.
//!
//! # Action routing
//!
//! Client actions and connection actions share one work queue and are
//! executed in the order they were produced:
//!
//! - `Connect`/`Send`/`Disconnect` from the client go through the connection
//!   manager, which enforces the single-channel and heartbeat rules
//! - Connection actions reach the driver; connection notifications are fed
//!   back into the client
//! - Notifications reach the driver
//!
//! Errors from user commands and from sending are surfaced as notifications.
//! Only driver failures end the loop.

use std::collections::VecDeque;

use lexo_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, ClientIdentity, Notification,
};
use lexo_core::{
    ConnectionAction, ConnectionConfig, ConnectionEvent, ConnectionManager, Environment,
};
use lexo_proto::{ServerMessage, decode, encode};
use tracing::{debug, trace, warn};

use crate::{Driver, DriverEvent, View};

/// One unit of pending work.
#[derive(Debug)]
enum Work {
    Client(ClientAction),
    Connection(ConnectionAction),
}

/// Generic runtime that orchestrates a [`Client`] using a [`Driver`].
pub struct Runtime<D: Driver, E: Environment> {
    driver: D,
    env: E,
    client: Client<E>,
    connection: ConnectionManager,
    url: String,
    running: bool,
}

impl<D: Driver, E: Environment> Runtime<D, E> {
    /// Create a runtime for an idle client that will connect to `url`.
    pub fn new(
        driver: D,
        env: E,
        identity: ClientIdentity,
        url: impl Into<String>,
        client_config: ClientConfig,
        connection_config: ConnectionConfig,
    ) -> Self {
        Self {
            client: Client::new(env.clone(), identity, client_config),
            connection: ConnectionManager::new(connection_config),
            driver,
            env,
            url: url.into(),
            running: true,
        }
    }

    /// Run until the driver reports a shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.render()?;
        while self.running {
            self.step().await?;
        }
        self.driver.stop();
        Ok(())
    }

    /// Wait for one driver event, process it, fire due timers, and render.
    ///
    /// Returns whether the runtime is still running.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        let timeout = self
            .connection
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(self.env.now()));

        match self.driver.next_event(timeout).await? {
            Some(event) => self.handle_driver_event(event).await?,
            None => trace!("idle timeout"),
        }

        let actions = self.connection.tick(self.env.now(), self.env.wall_clock_ms());
        self.drain(actions.into_iter().map(Work::Connection).collect()).await?;

        self.render()?;
        Ok(self.running)
    }

    /// Feed one event straight into the runtime, bypassing the driver's
    /// event source.
    ///
    /// # Errors
    ///
    /// Returns the first driver error.
    pub async fn handle_driver_event(&mut self, event: DriverEvent) -> Result<(), D::Error> {
        match event {
            DriverEvent::Input(event) => self.dispatch(event).await,
            DriverEvent::Opened => match self.connection.handle_opened(self.env.now()) {
                Ok(actions) => self.drain(actions.into_iter().map(Work::Connection).collect()).await,
                Err(error) => {
                    warn!(%error, "unexpected open");
                    Ok(())
                },
            },
            DriverEvent::Received(text) => match decode::<ServerMessage>(&text) {
                Ok(message) => {
                    trace!(kind = message.kind(), "received");
                    self.dispatch(ClientEvent::Message(message)).await
                },
                Err(error) => {
                    warn!(%error, "dropping malformed message");
                    Ok(())
                },
            },
            DriverEvent::Closed { clean } => {
                let actions = self.connection.handle_closed(clean, self.env.now());
                self.drain(actions.into_iter().map(Work::Connection).collect()).await
            },
            DriverEvent::Shutdown => {
                debug!("shutdown requested");
                self.running = false;
                self.dispatch(ClientEvent::Leave).await
            },
        }
    }

    /// Apply a user command, returning a refusal to the caller instead of
    /// notifying the driver.
    ///
    /// # Errors
    ///
    /// The outer error is a driver failure. The inner error is the client
    /// refusing the command, in which case nothing was executed.
    pub async fn command(
        &mut self,
        event: ClientEvent,
    ) -> Result<Result<(), ClientError>, D::Error> {
        match self.client.handle(event) {
            Ok(actions) => {
                self.drain(actions.into_iter().map(Work::Client).collect()).await?;
                Ok(Ok(()))
            },
            Err(error) => Ok(Err(error)),
        }
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The session state machine.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// The connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current view of the session.
    pub fn view(&self) -> View<'_> {
        view_of(&self.client, &self.connection)
    }

    async fn dispatch(&mut self, event: ClientEvent) -> Result<(), D::Error> {
        match self.client.handle(event) {
            Ok(actions) => self.drain(actions.into_iter().map(Work::Client).collect()).await,
            Err(error) => {
                debug!(%error, "command refused");
                self.driver.notify(&Notification::Error(error))
            },
        }
    }

    async fn drain(&mut self, mut queue: VecDeque<Work>) -> Result<(), D::Error> {
        while let Some(work) = queue.pop_front() {
            match work {
                Work::Client(action) => self.execute_client(action, &mut queue)?,
                Work::Connection(action) => self.execute_connection(action, &mut queue).await?,
            }
        }
        Ok(())
    }

    fn execute_client(
        &mut self,
        action: ClientAction,
        queue: &mut VecDeque<Work>,
    ) -> Result<(), D::Error> {
        let actions = match action {
            ClientAction::Connect { join } => {
                self.connection.open(self.url.clone(), join, self.env.now())
            },
            ClientAction::Send(message) => match self.connection.send(message) {
                Ok(actions) => actions,
                Err(error) => {
                    return self.driver.notify(&Notification::Error(ClientError::from(error)));
                },
            },
            ClientAction::Disconnect => self.connection.close(),
            ClientAction::Notify(notification) => return self.driver.notify(&notification),
        };
        queue.extend(actions.into_iter().map(Work::Connection));
        Ok(())
    }

    async fn execute_connection(
        &mut self,
        action: ConnectionAction,
        queue: &mut VecDeque<Work>,
    ) -> Result<(), D::Error> {
        match action {
            ConnectionAction::Connect { url } => {
                if let Err(error) = self.driver.connect(&url).await {
                    warn!(%error, %url, "connect failed");
                    let actions = self.connection.handle_closed(false, self.env.now());
                    queue.extend(actions.into_iter().map(Work::Connection));
                }
            },
            ConnectionAction::Send(message) => match encode(&message) {
                Ok(text) => {
                    trace!(kind = message.kind(), "sending");
                    // A broken channel surfaces as a close event from the driver.
                    if let Err(error) = self.driver.send_text(text).await {
                        warn!(%error, kind = message.kind(), "send failed");
                    }
                },
                Err(error) => warn!(%error, kind = message.kind(), "dropping unencodable message"),
            },
            ConnectionAction::Disconnect => self.driver.disconnect().await,
            ConnectionAction::Notify(event) => self.connection_event(event, queue)?,
        }
        Ok(())
    }

    fn connection_event(
        &mut self,
        event: ConnectionEvent,
        queue: &mut VecDeque<Work>,
    ) -> Result<(), D::Error> {
        match self.client.handle(ClientEvent::Connection(event)) {
            Ok(actions) => {
                queue.extend(actions.into_iter().map(Work::Client));
                Ok(())
            },
            Err(error) => self.driver.notify(&Notification::Error(error)),
        }
    }

    fn render(&mut self) -> Result<(), D::Error> {
        let view = view_of(&self.client, &self.connection);
        self.driver.render(&view)
    }
}

fn view_of<'a, E: Environment>(client: &'a Client<E>, connection: &ConnectionManager) -> View<'a> {
    View {
        state: client.state(),
        connection: connection.state(),
        remaining: client.remaining(),
        next_elimination_in: client.next_elimination_in(),
        standings: client.standings(),
        pending: client.pending().map(|attempt| attempt.text.as_str()).collect(),
    }
}
