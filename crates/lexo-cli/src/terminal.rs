//! Line-mode terminal driver over a WebSocket.
//!
//! Input and the socket each run on their own task and feed channels that
//! [`TerminalDriver::next_event`] selects over. Every socket is tagged with a
//! generation number; events from a socket that has since been replaced or
//! closed are dropped, so a late frame can never reach a newer session.

use std::{
    collections::VecDeque,
    io::{self, Stdout, Write},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use lexo_app::{Driver, DriverEvent, View};
use lexo_client::{Notification, SessionStatus};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{
    commands::{self, Command, HELP},
    render,
};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Writing to the terminal failed.
    #[error("terminal i/o: {0}")]
    Io(#[from] io::Error),

    /// A send was attempted with no socket.
    #[error("no open socket")]
    NotConnected,
}

/// Lifecycle of one socket as seen by its task.
#[derive(Debug)]
enum SocketEvent {
    Opened,
    Frame(String),
    Closed { clean: bool },
}

/// Why `next_event` woke up.
enum Wake {
    Timeout,
    Line(Option<String>),
    Socket(u64, SocketEvent),
    Interrupt,
}

/// [`Driver`] reading commands from stdin and talking to the server over a
/// WebSocket.
pub struct TerminalDriver {
    out: Stdout,
    lines: mpsc::UnboundedReceiver<String>,
    input_task: JoinHandle<()>,
    socket_tx: mpsc::UnboundedSender<(u64, SocketEvent)>,
    socket_rx: mpsc::UnboundedReceiver<(u64, SocketEvent)>,
    socket_task: Option<JoinHandle<()>>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    generation: u64,
    local: VecDeque<DriverEvent>,
    last_line: Option<String>,
    last_status: SessionStatus,
}

impl TerminalDriver {
    /// Start reading stdin. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        let (lines_tx, lines) = mpsc::unbounded_channel();
        let input_task = tokio::spawn(async move {
            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = stdin.next_line().await {
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
        });
        let (socket_tx, socket_rx) = mpsc::unbounded_channel();

        Self {
            out: io::stdout(),
            lines,
            input_task,
            socket_tx,
            socket_rx,
            socket_task: None,
            outbound: None,
            generation: 0,
            local: VecDeque::new(),
            last_line: None,
            last_status: SessionStatus::Idle,
        }
    }

    /// Print one line to stdout.
    pub fn say(&mut self, line: &str) -> Result<(), TerminalError> {
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Turn a typed line into an event, answering local commands directly.
    fn interpret(&mut self, line: &str) -> Result<Option<DriverEvent>, TerminalError> {
        match commands::parse(line) {
            Command::Quit => Ok(Some(DriverEvent::Shutdown)),
            Command::Help => {
                self.say(HELP)?;
                Ok(None)
            },
            Command::Unknown { input } => {
                self.say(&format!("unknown command {input}; {HELP}"))?;
                Ok(None)
            },
            Command::InvalidArgs { command, error } => {
                self.say(&format!("/{command}: {error}"))?;
                Ok(None)
            },
            command => Ok(command.into_event().map(DriverEvent::Input)),
        }
    }

    fn retire_socket(&mut self) {
        self.generation += 1;
        self.outbound = None;
        if let Some(task) = self.socket_task.take() {
            task.abort();
        }
    }
}

impl Default for TerminalDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn next_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<DriverEvent>, TerminalError> {
        if let Some(event) = self.local.pop_front() {
            return Ok(Some(event));
        }

        let sleep = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(sleep);

        loop {
            let wake = tokio::select! {
                () = &mut sleep => Wake::Timeout,
                line = self.lines.recv() => Wake::Line(line),
                Some((generation, event)) = self.socket_rx.recv() => Wake::Socket(generation, event),
                _ = tokio::signal::ctrl_c() => Wake::Interrupt,
            };

            match wake {
                Wake::Timeout => return Ok(None),
                Wake::Line(None) | Wake::Interrupt => return Ok(Some(DriverEvent::Shutdown)),
                Wake::Line(Some(line)) => {
                    if let Some(event) = self.interpret(&line)? {
                        return Ok(Some(event));
                    }
                },
                Wake::Socket(generation, event) if generation == self.generation => {
                    return Ok(Some(match event {
                        SocketEvent::Opened => DriverEvent::Opened,
                        SocketEvent::Frame(text) => DriverEvent::Received(text),
                        SocketEvent::Closed { clean } => {
                            self.outbound = None;
                            self.socket_task = None;
                            DriverEvent::Closed { clean }
                        },
                    }));
                },
                Wake::Socket(generation, event) => {
                    debug!(generation, ?event, "dropping event from retired socket");
                },
            }
        }
    }

    async fn connect(&mut self, url: &str) -> Result<(), TerminalError> {
        self.retire_socket();
        let generation = self.generation;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let events = self.socket_tx.clone();
        let url = url.to_string();

        info!(%url, generation, "connecting");
        self.outbound = Some(outbound_tx);
        self.socket_task = Some(tokio::spawn(pump(url, generation, outbound_rx, events)));
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), TerminalError> {
        let outbound = self.outbound.as_ref().ok_or(TerminalError::NotConnected)?;
        outbound.send(text).map_err(|_| TerminalError::NotConnected)
    }

    async fn disconnect(&mut self) {
        // Dropping the sender lets the pump send a close frame and exit; its
        // own close report is stale by then, so report the close here.
        self.generation += 1;
        self.outbound = None;
        self.socket_task = None;
        self.local.push_back(DriverEvent::Closed { clean: true });
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), TerminalError> {
        if matches!(notification, Notification::StatusChanged { .. }) {
            return Ok(());
        }
        self.say(&render::notification(notification))
    }

    fn render(&mut self, view: &View<'_>) -> Result<(), TerminalError> {
        if view.state.status == SessionStatus::Ended && self.last_status != SessionStatus::Ended {
            self.say(&render::standings(&view.standings))?;
        }
        self.last_status = view.state.status;

        let line = render::status_line(view);
        if self.last_line.as_deref() != Some(line.as_str()) {
            self.say(&line)?;
            self.last_line = Some(line);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.retire_socket();
        self.input_task.abort();
        let _ = self.out.flush();
    }
}

/// Own one socket: connect, then shuttle frames until either side closes.
async fn pump(
    url: String,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<(u64, SocketEvent)>,
) {
    let report = |event| {
        let _ = events.send((generation, event));
    };

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(error) => {
            warn!(%url, %error, "connect failed");
            report(SocketEvent::Closed { clean: false });
            return;
        },
    };
    report(SocketEvent::Opened);

    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            text = outbound.recv() => match text {
                Some(text) => {
                    if let Err(error) = sink.send(Message::Text(text)).await {
                        warn!(%error, "send failed");
                        report(SocketEvent::Closed { clean: false });
                        return;
                    }
                },
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                },
            },
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => report(SocketEvent::Frame(text)),
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "server closed the socket");
                    report(SocketEvent::Closed { clean: true });
                    return;
                },
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    warn!(%error, "socket error");
                    report(SocketEvent::Closed { clean: false });
                    return;
                },
                None => {
                    report(SocketEvent::Closed { clean: false });
                    return;
                },
            },
        }
    }
}
