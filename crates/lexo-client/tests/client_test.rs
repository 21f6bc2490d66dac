//! Client state machine driven directly, without a runtime.
//!
//! Each test feeds events into [`Client`] and asserts on the returned actions
//! and the resulting snapshot.

use lexo_client::{
    Client, ClientAction, ClientConfig, ClientError, ClientEvent, ClientIdentity, Notification,
    Outcome, SessionStatus, ValidationError,
};
use lexo_core::{ConnectionEvent, Environment};
use lexo_harness::SimEnv;
use lexo_proto::{
    ClientMessage, GameMode, GameResult, ParticipantId, ParticipantInfo, RoomSnapshot, RoomStatus,
    ScoreEntry, ServerMessage,
};
use proptest::prelude::*;

fn client() -> Client<SimEnv> {
    Client::new(SimEnv::with_seed(1), ClientIdentity::guest("Ada"), ClientConfig::default())
}

fn message(client: &mut Client<SimEnv>, message: ServerMessage) -> Vec<ClientAction> {
    client.handle(ClientEvent::Message(message)).unwrap()
}

fn player(id: &str) -> ParticipantInfo {
    ParticipantInfo { id: id.into(), name: id.to_uppercase(), is_viewer: false }
}

fn entry(id: &str, score: u32) -> ScoreEntry {
    ScoreEntry { participant_id: id.into(), score, is_eliminated: false }
}

fn start(pool: &str, env: &SimEnv) -> ServerMessage {
    ServerMessage::GameStart {
        pool: pool.chars().collect(),
        duration_seconds: 60,
        server_start_time: env.wall_clock_ms(),
        mode: GameMode::Classic,
        scoreboard: vec![],
        elimination: None,
    }
}

fn queued() -> Client<SimEnv> {
    let mut client = client();
    client.handle(ClientEvent::Join { resume: false }).unwrap();
    client.handle(ClientEvent::Connection(ConnectionEvent::Opened { reconnect: false })).unwrap();
    message(&mut client, ServerMessage::QueueJoined { participant_id: "p0".into() });
    client
}

fn playing(pool: &str) -> Client<SimEnv> {
    let env = SimEnv::with_seed(1);
    let mut client = queued();
    message(&mut client, ServerMessage::MatchFound { opponents: vec![player("p1")] });
    message(&mut client, start(pool, &env));
    client
}

fn status_edges(actions: &[ClientAction]) -> Vec<(SessionStatus, SessionStatus)> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Notify(Notification::StatusChanged { from, to }) => Some((*from, *to)),
            _ => None,
        })
        .collect()
}

#[test]
fn join_requests_connect_with_handshake() {
    let mut client = client();
    let actions = client.handle(ClientEvent::Join { resume: true }).unwrap();

    assert!(matches!(
        actions.first(),
        Some(ClientAction::Connect { join: ClientMessage::Join { resume: true, identity, .. } })
            if identity == "Ada"
    ));
    assert_eq!(status_edges(&actions), vec![(SessionStatus::Idle, SessionStatus::Queued)]);
}

#[test]
fn game_start_while_queued_passes_through_matched() {
    let env = SimEnv::with_seed(1);
    let mut client = queued();

    let actions = message(&mut client, start("testabcdefghijkl", &env));

    assert_eq!(status_edges(&actions), vec![
        (SessionStatus::Queued, SessionStatus::Matched),
        (SessionStatus::Matched, SessionStatus::Playing),
    ]);
    assert_eq!(client.remaining(), Some(60));
}

#[test]
fn countdown_is_display_only() {
    let mut client = queued();
    message(&mut client, ServerMessage::MatchFound { opponents: vec![player("p1")] });

    message(&mut client, ServerMessage::Countdown { seconds_remaining: 3 });
    assert_eq!(client.state().countdown, Some(3));
    assert_eq!(client.status(), SessionStatus::Matched);

    let actions = message(&mut client, ServerMessage::CountdownStopped {
        reason: Some("p1 left".into()),
    });
    assert_eq!(client.state().countdown, None);
    assert_eq!(client.status(), SessionStatus::Matched);
    assert!(actions.contains(&ClientAction::Notify(Notification::Notice("p1 left".into()))));
}

#[test]
fn snapshot_resumes_straight_into_round() {
    let mut client = queued();
    let snapshot = RoomSnapshot {
        status: RoomStatus::InProgress,
        participant_id: Some("p0".into()),
        roster: vec![player("p0"), player("p1")],
        pool: "testab".chars().collect(),
        scoreboard: vec![entry("p0", 7), entry("p1", 3)],
        words: [
            (ParticipantId::from("p0"), vec!["test".to_string()]),
            (ParticipantId::from("p1"), vec!["ab".to_string()]),
        ]
            .into_iter()
            .collect(),
        server_start_time: Some(SimEnv::with_seed(1).wall_clock_ms()),
        duration_seconds: Some(60),
        ..RoomSnapshot::default()
    };

    let actions = message(&mut client, ServerMessage::RoomState { snapshot });

    assert_eq!(status_edges(&actions), vec![(SessionStatus::Queued, SessionStatus::Playing)]);
    assert!(actions.contains(&ClientAction::Notify(Notification::Resynced)));
    let state = client.state();
    assert_eq!(state.own_words, vec!["test".to_string()]);
    assert_eq!(state.opponent_words.get(&ParticipantId::from("p1")).map(Vec::len), Some(1));
    assert!(state.used_words.contains("ab"));
    assert_eq!(state.own_score(), Some(7));
}

#[test]
fn ended_session_ignores_late_start_and_snapshot() {
    let env = SimEnv::with_seed(1);
    let mut client = playing("testabcdefghijkl");
    message(&mut client, ServerMessage::GameOver {
        scoreboard: vec![entry("p0", 0)],
        result: GameResult::NoContest,
        reason: None,
    });
    assert_eq!(client.status(), SessionStatus::Ended);

    assert!(message(&mut client, start("abcdefghijklmnop", &env)).is_empty());
    let snapshot = RoomSnapshot { status: RoomStatus::InProgress, ..RoomSnapshot::default() };
    assert!(message(&mut client, ServerMessage::RoomState { snapshot }).is_empty());
    assert_eq!(client.status(), SessionStatus::Ended);
}

#[test]
fn ill_fitting_snapshot_keeps_pending_attempts() {
    let mut client = playing("testabcdefghijkl");
    client.handle(ClientEvent::Submit { text: "test".into() }).unwrap();

    let snapshot = RoomSnapshot { status: RoomStatus::Countdown, ..RoomSnapshot::default() };
    assert!(message(&mut client, ServerMessage::RoomState { snapshot }).is_empty());

    assert_eq!(client.status(), SessionStatus::Playing);
    assert_eq!(client.pending().map(|a| a.text.as_str()).collect::<Vec<_>>(), vec!["test"]);
}

#[test]
fn viewer_cannot_submit() {
    let mut client = queued();
    let snapshot = RoomSnapshot {
        status: RoomStatus::InProgress,
        pool: "testab".chars().collect(),
        is_viewer: true,
        ..RoomSnapshot::default()
    };
    message(&mut client, ServerMessage::RoomState { snapshot });

    let refused = client.handle(ClientEvent::Submit { text: "test".into() });
    assert_eq!(refused, Err(ClientError::Validation(ValidationError::Viewer)));
}

#[test]
fn emote_needs_a_live_round() {
    let mut client = queued();
    let refused = client.handle(ClientEvent::SendEmote { symbol: "gg".into() });
    assert_eq!(refused, Err(ClientError::Validation(ValidationError::NotPlaying)));

    let mut client = playing("testabcdefghijkl");
    let actions = client.handle(ClientEvent::SendEmote { symbol: "gg".into() }).unwrap();
    assert_eq!(actions, vec![ClientAction::Send(ClientMessage::SendEmote { symbol: "gg".into() })]);

    let inbound = message(&mut client, ServerMessage::Emote {
        symbol: "gg".into(),
        from_participant_id: "p1".into(),
    });
    assert_eq!(inbound, vec![ClientAction::Notify(Notification::Emote {
        symbol: "gg".into(),
        from: "p1".into(),
    })]);
}

#[test]
fn own_broadcast_is_not_double_counted() {
    let mut client = playing("testabcdefghijkl");
    client.handle(ClientEvent::Submit { text: "test".into() }).unwrap();
    message(&mut client, ServerMessage::WordAccepted {
        text: "test".into(),
        score: 7,
        updated_pool: "qwerabcdefghijkl".chars().collect(),
        scoreboard: vec![entry("p0", 7)],
    });
    message(&mut client, ServerMessage::OpponentWord {
        participant_id: "p0".into(),
        text: "test".into(),
        score: 7,
        updated_pool: "qwerabcdefghijkl".chars().collect(),
        scoreboard: vec![entry("p0", 7)],
    });

    let state = client.state();
    assert_eq!(state.own_words, vec!["test".to_string()]);
    assert!(state.opponent_words.is_empty());
    assert!(matches!(
        client.resolved(),
        [attempt] if attempt.outcome == Outcome::Accepted { score: 7 }
    ));
}

#[test]
fn rejection_without_text_resolves_oldest_pending() {
    let mut client = playing("testabcdefghijkl");
    client.handle(ClientEvent::Submit { text: "test".into() }).unwrap();
    client.handle(ClientEvent::Submit { text: "bat".into() }).unwrap();

    let actions = message(&mut client, ServerMessage::WordRejected {
        text: None,
        reason: "not a word".into(),
    });

    assert_eq!(actions, vec![ClientAction::Notify(Notification::Error(
        ClientError::ServerRejection { text: Some("test".into()), reason: "not a word".into() }
    ))]);
    assert_eq!(client.pending().map(|a| a.text.as_str()).collect::<Vec<_>>(), vec!["bat"]);
}

#[test]
fn duplicate_pending_word_is_refused_locally() {
    let mut client = playing("testtestabcdefgh");
    client.handle(ClientEvent::Submit { text: "test".into() }).unwrap();

    let refused = client.handle(ClientEvent::Submit { text: "TEST".into() });
    assert!(matches!(
        refused,
        Err(ClientError::Validation(ValidationError::AlreadyPending { .. }))
    ));
}

#[test]
fn elimination_by_count_removes_lowest_ranked() {
    let env = SimEnv::with_seed(1);
    let mut client = queued();
    message(&mut client, ServerMessage::MatchFound { opponents: vec![player("p1"), player("p2")] });
    message(&mut client, ServerMessage::GameStart {
        pool: "abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwx".chars().collect(),
        duration_seconds: 240,
        server_start_time: env.wall_clock_ms(),
        mode: GameMode::BattleRoyale,
        scoreboard: vec![entry("p0", 0), entry("p1", 0), entry("p2", 0)],
        elimination: None,
    });

    let actions = message(&mut client, ServerMessage::Eliminated {
        participant_ids: vec![],
        count: Some(1),
        scoreboard: vec![entry("p0", 9), entry("p1", 2), entry("p2", 5)],
    });

    assert!(actions.contains(&ClientAction::Notify(Notification::Eliminated {
        participant_ids: vec!["p1".into()],
        including_self: false,
    })));
    assert!(!client.state().self_eliminated());
    let out: Vec<_> = client.standings().into_iter().filter(|s| s.is_eliminated).collect();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].participant_id, ParticipantId::from("p1"));
}

#[test]
fn server_error_is_reported_not_fatal() {
    let mut client = playing("testabcdefghijkl");
    let actions = message(&mut client, ServerMessage::Error { message: "slow down".into() });

    assert_eq!(actions, vec![ClientAction::Notify(Notification::Error(ClientError::Server {
        message: "slow down".into(),
    }))]);
    assert_eq!(client.status(), SessionStatus::Playing);
}

#[test]
fn fatal_reconnect_failure_returns_to_idle() {
    let mut client = playing("testabcdefghijkl");
    client.handle(ClientEvent::Connection(ConnectionEvent::ReconnectFailed { attempts: 5 })).unwrap();

    assert_eq!(client.status(), SessionStatus::Idle);
    assert!(!client.is_connected());
    // A fresh session can start right away.
    assert!(client.handle(ClientEvent::Join { resume: false }).is_ok());
}

/// Inputs for the lifecycle property.
fn event_strategy() -> impl Strategy<Value = ClientEvent> {
    let env = SimEnv::with_seed(1);
    let start_at = env.wall_clock_ms();
    prop_oneof![
        2 => any::<bool>().prop_map(|resume| ClientEvent::Join { resume }),
        1 => Just(ClientEvent::Leave),
        1 => Just(ClientEvent::Reset),
        2 => "[a-z]{1,5}".prop_map(|text| ClientEvent::Submit { text }),
        1 => Just(ClientEvent::Connection(ConnectionEvent::Opened { reconnect: false })),
        1 => any::<bool>().prop_map(|explicit| ClientEvent::Connection(ConnectionEvent::Closed { explicit })),
        1 => Just(ClientEvent::Message(ServerMessage::MatchFound { opponents: vec![player("p1")] })),
        2 => Just(ClientEvent::Message(start("testabcdefghijkl", &env))),
        1 => Just(ClientEvent::Message(ServerMessage::GameOver {
            scoreboard: vec![],
            result: GameResult::NoContest,
            reason: None,
        })),
        1 => prop_oneof![
            Just(RoomStatus::Waiting),
            Just(RoomStatus::Countdown),
            Just(RoomStatus::InProgress),
            Just(RoomStatus::Finished),
        ]
        .prop_map(move |status| ClientEvent::Message(ServerMessage::RoomState {
            snapshot: RoomSnapshot {
                status,
                pool: "testabcdefghijkl".chars().collect(),
                server_start_time: Some(start_at),
                duration_seconds: Some(60),
                ..RoomSnapshot::default()
            },
        })),
        1 => Just(ClientEvent::Message(ServerMessage::Expired)),
    ]
}

proptest! {
    /// Whatever arrives, every reported status change is a lifecycle edge and
    /// a finished round never restarts without a fresh join.
    #[test]
    fn prop_status_changes_follow_lifecycle(
        events in prop::collection::vec(event_strategy(), 0..80)
    ) {
        let mut client = client();
        for event in events {
            let before = client.status();
            let actions = client.handle(event).unwrap_or_default();
            for (from, to) in status_edges(&actions) {
                prop_assert!(from.can_transition_to(to), "illegal edge {:?} -> {:?}", from, to);
                prop_assert!(!(from == SessionStatus::Ended && to == SessionStatus::Playing));
            }
            prop_assert!(
                !(before == SessionStatus::Ended && client.status() == SessionStatus::Playing)
            );
            if client.status() == SessionStatus::Idle {
                prop_assert_eq!(client.pending().count(), 0);
            }
        }
    }
}
