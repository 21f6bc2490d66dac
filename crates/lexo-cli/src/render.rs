//! Plain-text formatting of notifications and session views.
//!
//! Everything here is a pure function of its input so the output can be
//! snapshot-tested without a terminal.

use std::fmt::Write;

use lexo_app::View;
use lexo_client::{ClientError, Notification, SessionStatus, Standing};
use lexo_core::ConnectionState;
use lexo_proto::{GameResult, Letter, ParticipantId, ParticipantInfo};

/// Lowercase label for a status.
pub fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "idle",
        SessionStatus::Queued => "queued",
        SessionStatus::Matched => "matched",
        SessionStatus::Playing => "playing",
        SessionStatus::Ended => "ended",
    }
}

/// One line describing a notification.
pub fn notification(notification: &Notification) -> String {
    match notification {
        Notification::StatusChanged { from, to } => {
            format!("status: {} -> {}", status_label(*from), status_label(*to))
        },
        Notification::Connected { reconnect: false } => "connected".to_string(),
        Notification::Connected { reconnect: true } => "reconnected".to_string(),
        Notification::QueueJoined { participant_id } => {
            format!("waiting for opponents as {participant_id}")
        },
        Notification::MatchFound { opponents } => format!("match found: {}", names(opponents)),
        Notification::Resynced => "session restored".to_string(),
        Notification::Countdown { seconds_remaining: Some(seconds) } => {
            format!("starting in {seconds}s")
        },
        Notification::Countdown { seconds_remaining: None } => "countdown stopped".to_string(),
        Notification::RosterChanged { roster } => format!("players: {}", names(roster)),
        Notification::WordAccepted { text, score } => format!("+{score} {text}"),
        Notification::OpponentWord { participant_id, text, score } => {
            format!("{participant_id} played {text} (+{score})")
        },
        Notification::Emote { symbol, from } => format!("{from}: {symbol}"),
        Notification::Eliminated { including_self: true, .. } => {
            "you were eliminated".to_string()
        },
        Notification::Eliminated { participant_ids, including_self: false } => {
            format!("eliminated: {}", ids(participant_ids))
        },
        Notification::GameOver { result, reason } => match reason {
            Some(reason) => format!("game over: {} ({reason})", verdict(result)),
            None => format!("game over: {}", verdict(result)),
        },
        Notification::Reconnecting { attempt, max_attempts, retry_in } => format!(
            "connection lost, retry {attempt}/{max_attempts} in {}s",
            retry_in.as_secs()
        ),
        Notification::Error(error) => error_line(error),
        Notification::Notice(text) => text.clone(),
    }
}

/// Error line. Blocking errors are marked so they stand out.
pub fn error_line(error: &ClientError) -> String {
    if error.is_blocking() { format!("!! {error}") } else { format!("error: {error}") }
}

/// Human-readable verdict.
pub fn verdict(result: &GameResult) -> String {
    match result {
        GameResult::Winner { participant_id, score } => {
            format!("{participant_id} wins with {score}")
        },
        GameResult::Tie { participant_ids, score } => {
            format!("tie between {} at {score}", ids(participant_ids))
        },
        GameResult::NoContest => "no contest".to_string(),
    }
}

/// Single status line for the current frame.
pub fn status_line(view: &View<'_>) -> String {
    let state = view.state;
    let mut line = format!("[{}", status_label(state.status));
    if let Some(remaining) = view.remaining.filter(|_| state.status == SessionStatus::Playing) {
        let _ = write!(line, " {remaining}s");
    }
    line.push(']');

    if state.status.is_active() && view.connection != ConnectionState::Open {
        line.push_str(" (offline)");
    }

    match state.status {
        SessionStatus::Idle => line.push_str(" /join to play"),
        SessionStatus::Queued => {},
        SessionStatus::Matched => {
            if let Some(countdown) = state.countdown {
                let _ = write!(line, " starting in {countdown}s");
            }
        },
        SessionStatus::Playing => {
            let _ = write!(line, " {}", pool(&state.pool));
            let _ = write!(line, " | score {}", state.own_score().unwrap_or(0));
            if let Some(seconds) = view.next_elimination_in {
                let _ = write!(line, " | next cut {seconds}s");
            }
            if !view.pending.is_empty() {
                let _ = write!(line, " | pending {}", view.pending.join(", "));
            }
        },
        SessionStatus::Ended => line.push_str(" /reset or /leave"),
    }
    line
}

/// Ranked table, one participant per line.
pub fn standings(standings: &[Standing]) -> String {
    standings
        .iter()
        .map(|s| {
            let rank = s.rank.map_or_else(|| "-".to_string(), |r| r.to_string());
            let name = s.display_name.as_deref().unwrap_or(s.participant_id.as_str());
            let mut row = format!("{rank}. {name} {}", s.score);
            if s.is_viewer {
                row.push_str(" (watching)");
            }
            if s.is_eliminated {
                row.push_str(" (out)");
            }
            row
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pool letters separated by spaces.
pub fn pool(letters: &[Letter]) -> String {
    letters.iter().map(char::to_string).collect::<Vec<_>>().join(" ")
}

fn names(participants: &[ParticipantInfo]) -> String {
    participants.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn ids(ids: &[ParticipantId]) -> String {
    ids.iter().map(ParticipantId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use insta::assert_snapshot;
    use lexo_client::{SessionState, ValidationError};
    use lexo_core::ConnectionError;

    use super::*;

    fn view(state: &SessionState) -> View<'_> {
        View {
            state,
            connection: ConnectionState::Open,
            remaining: Some(42),
            next_elimination_in: None,
            standings: Vec::new(),
            pending: Vec::new(),
        }
    }

    #[test]
    fn idle_line() {
        let state = SessionState::default();
        assert_snapshot!(status_line(&view(&state)), @"[idle] /join to play");
    }

    #[test]
    fn playing_line() {
        let state = SessionState {
            status: SessionStatus::Playing,
            pool: "testab".chars().collect(),
            ..SessionState::default()
        };
        let mut frame = view(&state);
        frame.pending = vec!["bat"];
        frame.next_elimination_in = Some(12);
        assert_snapshot!(
            status_line(&frame),
            @"[playing 42s] t e s t a b | score 0 | next cut 12s | pending bat"
        );
    }

    #[test]
    fn offline_while_active() {
        let state = SessionState { status: SessionStatus::Queued, ..SessionState::default() };
        let mut frame = view(&state);
        frame.connection = ConnectionState::Disconnected;
        assert_snapshot!(status_line(&frame), @"[queued] (offline)");
    }

    #[test]
    fn notification_lines() {
        let lines = [
            Notification::StatusChanged { from: SessionStatus::Matched, to: SessionStatus::Playing },
            Notification::WordAccepted { text: "test".into(), score: 7 },
            Notification::OpponentWord { participant_id: "p1".into(), text: "bat".into(), score: 5 },
            Notification::Reconnecting {
                attempt: 2,
                max_attempts: 5,
                retry_in: Duration::from_secs(3),
            },
            Notification::GameOver {
                result: GameResult::Winner { participant_id: "p0".into(), score: 31 },
                reason: None,
            },
            Notification::Error(ClientError::Validation(ValidationError::TooShort { min: 2 })),
            Notification::Error(ClientError::Connection(ConnectionError::NotConnected)),
        ]
        .iter()
        .map(notification)
        .collect::<Vec<_>>()
        .join("\n");

        assert_snapshot!(lines, @r"
        status: matched -> playing
        +7 test
        p1 played bat (+5)
        connection lost, retry 2/5 in 3s
        game over: p0 wins with 31
        error: word must be at least 2 letters
        !! not connected
        ");
    }

    #[test]
    fn standings_table() {
        let rows = [
            Standing {
                participant_id: "p1".into(),
                display_name: Some("Rival".into()),
                score: 12,
                rank: Some(1),
                is_eliminated: false,
                is_viewer: false,
            },
            Standing {
                participant_id: "p0".into(),
                display_name: None,
                score: 4,
                rank: Some(2),
                is_eliminated: true,
                is_viewer: false,
            },
            Standing {
                participant_id: "p2".into(),
                display_name: Some("Late".into()),
                score: 0,
                rank: None,
                is_eliminated: false,
                is_viewer: true,
            },
        ];
        assert_snapshot!(standings(&rows), @r"
        1. Rival 12
        2. p0 4 (out)
        -. Late 0 (watching)
        ");
    }
}
