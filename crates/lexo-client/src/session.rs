//! Session orchestrator.
//!
//! [`Client`] consumes [`ClientEvent`]s one at a time and returns the
//! [`ClientAction`]s the runtime must execute. It never touches the channel
//! itself: opening, sending and closing are requested through actions and
//! carried out by whoever owns the connection manager.
//!
//! # Message dispatch
//!
//! Every server discriminant has its own handler. Handlers read the current
//! [`SessionState`] snapshot, build the next one, and hand it to a single
//! commit point that enforces the lifecycle edges. A handler that does not
//! apply in the current status discards the message and leaves the state
//! untouched.
//!
//! # Reconnects
//!
//! Pending submissions are dropped when the channel drops. After a reconnect
//! nothing is replayed; the server's snapshot re-baselines the session.

use lexo_core::{ClockSync, ConnectionError, ConnectionEvent, Environment};
use lexo_proto::{
    ClientMessage, EliminationInfo, GameMode, GameResult, Letter, ParticipantId, ParticipantInfo,
    RoomSnapshot, ScoreEntry, ServerMessage,
};
use tracing::{debug, info, warn};

use crate::{
    action::{ClientAction, Notification},
    config::{ClientConfig, ClientIdentity},
    error::{ClientError, ValidationError},
    event::ClientEvent,
    leaderboard::{self, Standing},
    state::{SessionState, SessionStatus},
    submission::{SubmissionPipeline, WordAttempt},
};

/// Client session state machine.
#[derive(Debug)]
pub struct Client<E: Environment> {
    env: E,
    identity: ClientIdentity,
    state: SessionState,
    clock: ClockSync,
    pipeline: SubmissionPipeline,
    connected: bool,
}

impl<E: Environment> Client<E> {
    /// Create an idle client.
    pub fn new(env: E, identity: ClientIdentity, config: ClientConfig) -> Self {
        Self {
            env,
            identity,
            state: SessionState::default(),
            clock: ClockSync::new(config.clock),
            pipeline: SubmissionPipeline::new(config.rules),
            connected: false,
        }
    }

    /// Current session snapshot.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current lifecycle position.
    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    /// Who the client plays as.
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Clock offset estimator.
    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    /// Whether the channel is open as far as the client knows.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Submissions awaiting a verdict.
    pub fn pending(&self) -> impl Iterator<Item = &WordAttempt> {
        self.pipeline.pending()
    }

    /// Submissions that received a verdict this session.
    pub fn resolved(&self) -> &[WordAttempt] {
        self.pipeline.resolved()
    }

    /// Whole seconds left in the round, recomputed from the server anchor.
    ///
    /// `None` outside a round. Zero once the round has ended.
    pub fn remaining(&self) -> Option<u32> {
        match self.state.status {
            SessionStatus::Playing => {
                let duration = self.state.duration_seconds?;
                let start = self.state.server_start_time?;
                Some(self.clock.remaining(duration, start, self.env.wall_clock_ms()))
            },
            SessionStatus::Ended => Some(0),
            SessionStatus::Idle | SessionStatus::Queued | SessionStatus::Matched => None,
        }
    }

    /// Whole seconds until the next elimination tick, multi-party only.
    pub fn next_elimination_in(&self) -> Option<u32> {
        if self.state.status != SessionStatus::Playing {
            return None;
        }
        let info = self.state.elimination.as_ref()?;
        Some(self.clock.until(info.next_elimination_at, self.env.wall_clock_ms()))
    }

    /// Ranked standings for the current scoreboard.
    pub fn standings(&self) -> Vec<Standing> {
        leaderboard::project(&self.state)
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Only user commands fail, and only before anything is sent: a
    /// rejected submission, a command that does not apply in the current
    /// status, or no open channel. Server messages and connection events
    /// never fail; their problems are reported through notifications.
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Join { resume } => self.join(resume),
            ClientEvent::Submit { text } => self.submit(&text),
            ClientEvent::SendEmote { symbol } => self.send_emote(symbol),
            ClientEvent::Leave => Ok(self.leave()),
            ClientEvent::Reset => self.reset(),
            ClientEvent::Message(message) => Ok(self.handle_message(message)),
            ClientEvent::Connection(event) => Ok(self.handle_connection(event)),
        }
    }

    fn join(&mut self, resume: bool) -> Result<Vec<ClientAction>, ClientError> {
        if self.state.status != SessionStatus::Idle {
            return Err(ClientError::InvalidCommand { status: self.state.status, command: "join" });
        }

        self.pipeline.reset();
        let mut actions = self.commit(SessionState::queued());
        let join = ClientMessage::Join {
            identity: self.identity.identity.clone(),
            display_name: self.identity.display_name.clone(),
            resume,
            auth_token: self.identity.auth_token.clone(),
        };
        info!(resume, identity = %self.identity.identity, "joining");
        actions.insert(0, ClientAction::Connect { join });
        Ok(actions)
    }

    fn submit(&mut self, candidate: &str) -> Result<Vec<ClientAction>, ClientError> {
        if self.state.status != SessionStatus::Playing {
            return Err(ValidationError::NotPlaying.into());
        }
        if self.state.is_viewer {
            return Err(ValidationError::Viewer.into());
        }
        if self.state.self_eliminated() {
            return Err(ValidationError::Eliminated.into());
        }
        if !self.connected {
            return Err(ConnectionError::NotConnected.into());
        }

        let text = self.pipeline.validate(candidate, &self.state)?;
        self.pipeline.begin(text.clone(), self.env.now());
        Ok(vec![ClientAction::Send(ClientMessage::SubmitWord { text })])
    }

    fn send_emote(&mut self, symbol: String) -> Result<Vec<ClientAction>, ClientError> {
        if self.state.status != SessionStatus::Playing {
            return Err(ValidationError::NotPlaying.into());
        }
        if !self.connected {
            return Err(ConnectionError::NotConnected.into());
        }
        Ok(vec![ClientAction::Send(ClientMessage::SendEmote { symbol })])
    }

    fn leave(&mut self) -> Vec<ClientAction> {
        if self.state.status == SessionStatus::Idle {
            return vec![];
        }
        info!(status = ?self.state.status, "leaving session");
        self.pipeline.discard_pending();
        let mut actions = vec![ClientAction::Disconnect];
        actions.extend(self.commit(SessionState::default()));
        actions
    }

    fn reset(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        match self.state.status {
            SessionStatus::Idle => Ok(vec![]),
            SessionStatus::Ended => Ok(self.leave()),
            status => Err(ClientError::InvalidCommand { status, command: "reset" }),
        }
    }

    /// Dispatch a server message to its handler.
    fn handle_message(&mut self, message: ServerMessage) -> Vec<ClientAction> {
        if self.state.status == SessionStatus::Idle {
            debug!(kind = message.kind(), "discarding message outside a session");
            return vec![];
        }

        match message {
            ServerMessage::QueueJoined { participant_id } => self.on_queue_joined(participant_id),
            ServerMessage::MatchFound { opponents } => self.on_match_found(opponents),
            ServerMessage::GameStart {
                pool,
                duration_seconds,
                server_start_time,
                mode,
                scoreboard,
                elimination,
            } => self.on_game_start(
                pool,
                duration_seconds,
                server_start_time,
                mode,
                scoreboard,
                elimination,
            ),
            ServerMessage::WordAccepted { text, score, updated_pool, scoreboard } => {
                self.on_word_accepted(text, score, updated_pool, scoreboard)
            },
            ServerMessage::WordRejected { text, reason } => self.on_word_rejected(text, reason),
            ServerMessage::OpponentWord { participant_id, text, score, updated_pool, scoreboard } => {
                self.on_opponent_word(participant_id, text, score, updated_pool, scoreboard)
            },
            ServerMessage::RoomState { snapshot } => self.on_room_state(snapshot),
            ServerMessage::Countdown { seconds_remaining } => self.on_countdown(seconds_remaining),
            ServerMessage::CountdownStopped { reason } => self.on_countdown_stopped(reason),
            ServerMessage::GameOver { scoreboard, result, reason } => {
                self.on_game_over(scoreboard, result, reason)
            },
            ServerMessage::ParticipantJoined { roster }
            | ServerMessage::ParticipantLeft { roster } => self.on_roster(roster),
            ServerMessage::Emote { symbol, from_participant_id } => {
                self.on_emote(symbol, from_participant_id)
            },
            ServerMessage::Ping { server_time } => self.on_ping(server_time),
            ServerMessage::Pong { server_time, echoed_client_time } => {
                self.on_pong(server_time, echoed_client_time)
            },
            ServerMessage::Eliminated { participant_ids, count, scoreboard } => {
                self.on_eliminated(participant_ids, count, scoreboard)
            },
            ServerMessage::LeaderboardUpdate { scoreboard, elimination } => {
                self.on_leaderboard_update(scoreboard, elimination)
            },
            ServerMessage::Expired => self.on_expired(),
            ServerMessage::Error { message } => self.on_error(message),
            ServerMessage::Unknown => {
                debug!("ignoring unknown message type");
                vec![]
            },
        }
    }

    fn on_queue_joined(&mut self, participant_id: ParticipantId) -> Vec<ClientAction> {
        info!(%participant_id, "queue joined");
        let next = self.state.with_participant_id(participant_id.clone());
        let mut actions = self.commit(next);
        actions.push(ClientAction::Notify(Notification::QueueJoined { participant_id }));
        actions
    }

    fn on_match_found(&mut self, opponents: Vec<ParticipantInfo>) -> Vec<ClientAction> {
        if self.state.status != SessionStatus::Queued {
            return self.discard("match_found");
        }
        let mut actions = self.commit(self.state.matched(opponents.clone()));
        actions.push(ClientAction::Notify(Notification::MatchFound { opponents }));
        actions
    }

    fn on_game_start(
        &mut self,
        pool: Vec<Letter>,
        duration_seconds: u32,
        server_start_time: u64,
        mode: GameMode,
        scoreboard: Vec<ScoreEntry>,
        elimination: Option<EliminationInfo>,
    ) -> Vec<ClientAction> {
        let mut actions = Vec::new();
        match self.state.status {
            SessionStatus::Matched | SessionStatus::Playing => {},
            SessionStatus::Queued => {
                // Start without a preceding match notice: pass through Matched.
                let matched = SessionState { status: SessionStatus::Matched, ..self.state.clone() };
                actions.extend(self.commit(matched));
            },
            SessionStatus::Idle | SessionStatus::Ended => return self.discard("game_start"),
        }

        if pool.len() != mode.pool_size() {
            warn!(len = pool.len(), expected = mode.pool_size(), "unexpected pool size");
        }
        info!(duration_seconds, server_start_time, ?mode, "round started");
        self.pipeline.discard_pending();
        let next = self.state.started(
            pool,
            duration_seconds,
            server_start_time,
            mode,
            scoreboard,
            elimination,
        );
        actions.extend(self.commit(next));
        actions
    }

    fn on_word_accepted(
        &mut self,
        text: String,
        score: u32,
        updated_pool: Vec<Letter>,
        scoreboard: Vec<ScoreEntry>,
    ) -> Vec<ClientAction> {
        if self.state.status != SessionStatus::Playing {
            return self.discard("word_accepted");
        }
        if self.pipeline.accept(&text, score).is_none() {
            debug!(%text, "accepted word had no pending attempt");
        }

        let next = self.state.with_own_word(text.clone(), updated_pool, scoreboard);
        let mut actions = self.commit(next);
        actions.push(ClientAction::Notify(Notification::WordAccepted { text, score }));
        actions
    }

    fn on_word_rejected(&mut self, text: Option<String>, reason: String) -> Vec<ClientAction> {
        if self.state.status != SessionStatus::Playing {
            return self.discard("word_rejected");
        }
        let attempt = self.pipeline.reject(text.as_deref(), &reason);
        let text = text.or_else(|| attempt.map(|a| a.text));
        debug!(?text, %reason, "word rejected");
        vec![ClientAction::Notify(Notification::Error(ClientError::ServerRejection {
            text,
            reason,
        }))]
    }

    fn on_opponent_word(
        &mut self,
        participant_id: ParticipantId,
        text: String,
        score: u32,
        updated_pool: Vec<Letter>,
        scoreboard: Vec<ScoreEntry>,
    ) -> Vec<ClientAction> {
        if self.state.status != SessionStatus::Playing {
            return self.discard("opponent_word");
        }

        let next = if self.state.is_self(&participant_id) {
            // Own words are recorded from the outcome message only.
            debug!(%text, "own word echoed as broadcast");
            self.state.with_board(updated_pool, scoreboard)
        } else {
            let id = participant_id.clone();
            self.state.with_opponent_word(id, text.clone(), updated_pool, scoreboard)
        };
        let mut actions = self.commit(next);
        actions.push(ClientAction::Notify(Notification::OpponentWord {
            participant_id,
            text,
            score,
        }));
        actions
    }

    fn on_room_state(&mut self, snapshot: RoomSnapshot) -> Vec<ClientAction> {
        if self.state.status == SessionStatus::Ended {
            return self.discard("room_state");
        }

        let next = self.state.from_snapshot(snapshot);
        if !self.state.status.can_transition_to(next.status) {
            warn!(from = ?self.state.status, to = ?next.status, "snapshot does not fit session");
            return vec![];
        }
        info!(status = ?next.status, "re-baselining from snapshot");
        self.pipeline.discard_pending();
        let mut actions = self.commit(next);
        actions.push(ClientAction::Notify(Notification::Resynced));
        actions
    }

    fn on_countdown(&mut self, seconds_remaining: u32) -> Vec<ClientAction> {
        if !matches!(self.state.status, SessionStatus::Queued | SessionStatus::Matched) {
            return self.discard("countdown");
        }
        let mut actions = self.commit(self.state.with_countdown(Some(seconds_remaining)));
        actions.push(ClientAction::Notify(Notification::Countdown {
            seconds_remaining: Some(seconds_remaining),
        }));
        actions
    }

    fn on_countdown_stopped(&mut self, reason: Option<String>) -> Vec<ClientAction> {
        if !matches!(self.state.status, SessionStatus::Queued | SessionStatus::Matched) {
            return self.discard("countdown_stopped");
        }
        let mut actions = self.commit(self.state.with_countdown(None));
        actions.push(ClientAction::Notify(Notification::Countdown { seconds_remaining: None }));
        if let Some(reason) = reason {
            actions.push(ClientAction::Notify(Notification::Notice(reason)));
        }
        actions
    }

    fn on_game_over(
        &mut self,
        scoreboard: Vec<ScoreEntry>,
        result: GameResult,
        reason: Option<String>,
    ) -> Vec<ClientAction> {
        match self.state.status {
            SessionStatus::Playing => {
                info!(?result, "round over");
                self.pipeline.discard_pending();
                let mut actions =
                    self.commit(self.state.ended(scoreboard, result.clone(), reason.clone()));
                actions.push(ClientAction::Notify(Notification::GameOver { result, reason }));
                actions
            },
            SessionStatus::Queued | SessionStatus::Matched => {
                // Room closed before the round began.
                info!("session closed before the round started");
                let mut actions = vec![ClientAction::Disconnect];
                actions.extend(self.commit(SessionState::default()));
                let notice = reason.unwrap_or_else(|| "session closed before start".to_string());
                actions.push(ClientAction::Notify(Notification::Notice(notice)));
                actions
            },
            SessionStatus::Idle | SessionStatus::Ended => self.discard("game_over"),
        }
    }

    fn on_roster(&mut self, roster: Vec<ParticipantInfo>) -> Vec<ClientAction> {
        let mut actions = self.commit(self.state.with_roster(roster.clone()));
        actions.push(ClientAction::Notify(Notification::RosterChanged { roster }));
        actions
    }

    fn on_emote(&mut self, symbol: String, from: ParticipantId) -> Vec<ClientAction> {
        if self.state.status != SessionStatus::Playing {
            return self.discard("emote");
        }
        vec![ClientAction::Notify(Notification::Emote { symbol, from })]
    }

    fn on_ping(&mut self, server_time: u64) -> Vec<ClientAction> {
        if !self.connected {
            return vec![];
        }
        debug!(server_time, "answering server ping");
        vec![ClientAction::Send(ClientMessage::Pong { client_time: self.env.wall_clock_ms() })]
    }

    fn on_pong(&mut self, server_time: u64, echoed_client_time: u64) -> Vec<ClientAction> {
        self.clock.record_pong(echoed_client_time, server_time, self.env.wall_clock_ms());
        vec![]
    }

    fn on_eliminated(
        &mut self,
        participant_ids: Vec<ParticipantId>,
        count: Option<u32>,
        scoreboard: Vec<ScoreEntry>,
    ) -> Vec<ClientAction> {
        if self.state.status != SessionStatus::Playing {
            return self.discard("eliminated");
        }

        let base = if scoreboard.is_empty() {
            self.state.clone()
        } else {
            self.state.with_scoreboard(scoreboard, None)
        };
        let removed = match (participant_ids.is_empty(), count) {
            (true, Some(count)) => leaderboard::lowest_ranked(&base, count as usize),
            _ => participant_ids,
        };

        let next = base.with_eliminated(removed.iter().cloned(), Vec::new());
        let including_self = next.self_eliminated() && !self.state.self_eliminated();
        if including_self {
            info!("eliminated");
            self.pipeline.discard_pending();
        }
        let mut actions = self.commit(next);
        actions.push(ClientAction::Notify(Notification::Eliminated {
            participant_ids: removed,
            including_self,
        }));
        actions
    }

    fn on_leaderboard_update(
        &mut self,
        scoreboard: Vec<ScoreEntry>,
        elimination: Option<EliminationInfo>,
    ) -> Vec<ClientAction> {
        if self.state.status != SessionStatus::Playing {
            return self.discard("leaderboard_update");
        }
        self.commit(self.state.with_scoreboard(scoreboard, elimination))
    }

    fn on_expired(&mut self) -> Vec<ClientAction> {
        info!("session expired");
        let mut actions = vec![ClientAction::Disconnect];
        actions.extend(self.commit(SessionState::default()));
        actions.push(ClientAction::Notify(Notification::Error(ClientError::SessionExpired)));
        actions
    }

    fn on_error(&mut self, message: String) -> Vec<ClientAction> {
        warn!(%message, "server reported an error");
        vec![ClientAction::Notify(Notification::Error(ClientError::Server { message }))]
    }

    fn handle_connection(&mut self, event: ConnectionEvent) -> Vec<ClientAction> {
        match event {
            ConnectionEvent::Opened { reconnect } => {
                self.connected = true;
                vec![ClientAction::Notify(Notification::Connected { reconnect })]
            },
            ConnectionEvent::Closed { explicit } => {
                self.connected = false;
                self.pipeline.discard_pending();
                if explicit {
                    return vec![];
                }
                match self.state.status {
                    SessionStatus::Playing => {
                        let mut actions = self.commit(self.state.disconnected());
                        actions.push(ClientAction::Notify(Notification::Notice(
                            "server closed the connection".to_string(),
                        )));
                        actions
                    },
                    SessionStatus::Queued | SessionStatus::Matched => {
                        let mut actions = self.commit(SessionState::default());
                        actions.push(ClientAction::Notify(Notification::Notice(
                            "server closed the connection".to_string(),
                        )));
                        actions
                    },
                    SessionStatus::Idle | SessionStatus::Ended => vec![],
                }
            },
            ConnectionEvent::Dropped { attempt, max_attempts, retry_in } => {
                self.connected = false;
                self.pipeline.discard_pending();
                vec![
                    ClientAction::Notify(Notification::Error(ClientError::Connection(
                        ConnectionError::Dropped { attempt, max_attempts },
                    ))),
                    ClientAction::Notify(Notification::Reconnecting {
                        attempt,
                        max_attempts,
                        retry_in,
                    }),
                ]
            },
            ConnectionEvent::ReconnectFailed { attempts } => {
                self.connected = false;
                let mut actions = self.commit(SessionState::default());
                actions.push(ClientAction::Notify(Notification::Error(
                    ClientError::FatalReconnectFailure { attempts },
                )));
                actions
            },
        }
    }

    /// Swap in `next` if the lifecycle allows it.
    fn commit(&mut self, next: SessionState) -> Vec<ClientAction> {
        let (from, to) = (self.state.status, next.status);
        if !from.can_transition_to(to) {
            warn!(?from, ?to, "refusing illegal session transition");
            return vec![];
        }

        self.state = next;
        if from == to {
            return vec![];
        }
        info!(?from, ?to, "session status changed");
        if to == SessionStatus::Idle {
            self.pipeline.reset();
        }
        vec![ClientAction::Notify(Notification::StatusChanged { from, to })]
    }

    fn discard(&self, kind: &'static str) -> Vec<ClientAction> {
        debug!(kind, status = ?self.state.status, "discarding message");
        vec![]
    }
}
