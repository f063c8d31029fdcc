//! Integration tests for the match lobby and full games played through
//! match actors.

use gorillas_match::{
    GameInfo, MatchConfig, MatchError, MatchManager, MatchPhase, PlayerSender,
};
use gorillas_protocol::{ClientEvent, MatchId, PlayerIndex, ServerEvent};
use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Helpers
// =========================================================================

fn manager() -> MatchManager {
    MatchManager::new(MatchConfig {
        seed: Some(2024),
        ..MatchConfig::default()
    })
}

/// A sender whose receiver is dropped immediately.
fn dummy_sender() -> PlayerSender {
    mpsc::unbounded_channel().0
}

fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn starting_player(events: &[ServerEvent]) -> PlayerIndex {
    events
        .iter()
        .find_map(|event| match event {
            ServerEvent::RoundStarted(round) => Some(round.starting_player),
            _ => None,
        })
        .expect("a roundStarted event")
}

fn throw() -> ClientEvent {
    ClientEvent::ThrowBanana(json!({ "angle": 60, "velocity": 42 }))
}

// =========================================================================
// MatchManager
// =========================================================================

#[tokio::test]
async fn test_create_match_returns_unique_ids() {
    let mut mgr = manager();
    let m1 = mgr.create_match();
    let m2 = mgr.create_match();
    assert_ne!(m1, m2);
    assert_eq!(mgr.match_count(), 2);

    let ids = mgr.match_ids();
    assert!(ids.contains(&m1) && ids.contains(&m2));
}

#[tokio::test]
async fn test_join_match_assigns_seats() {
    let mut mgr = manager();
    let id = mgr.create_match();

    let alice = mgr.join_match("alice", id, dummy_sender()).await.unwrap();
    let bob = mgr.join_match("bob", id, dummy_sender()).await.unwrap();

    assert_eq!(alice, PlayerIndex::FIRST);
    assert_eq!(bob, PlayerIndex::SECOND);
    assert_eq!(mgr.player_match("alice"), Some(id));

    let info = mgr.match_info(id).await.unwrap();
    assert_eq!(info.player_count, 2);
    assert_eq!(info.max_players, GameInfo::GORILLAS.max_players);
    assert_eq!(info.phase, MatchPhase::AwaitingReady);
}

#[tokio::test]
async fn test_join_match_not_found() {
    let mut mgr = manager();
    let result = mgr
        .join_match("alice", MatchId(u64::MAX), dummy_sender())
        .await;
    assert_eq!(result, Err(MatchError::NotFound(MatchId(u64::MAX))));
}

#[tokio::test]
async fn test_join_match_one_match_at_a_time() {
    let mut mgr = manager();
    let m1 = mgr.create_match();
    let m2 = mgr.create_match();

    mgr.join_match("alice", m1, dummy_sender()).await.unwrap();
    let result = mgr.join_match("alice", m2, dummy_sender()).await;

    assert_eq!(result, Err(MatchError::AlreadyInMatch("alice".into(), m1)));
}

#[tokio::test]
async fn test_join_match_twice_keeps_seat() {
    let mut mgr = manager();
    let id = mgr.create_match();
    mgr.join_match("alice", id, dummy_sender()).await.unwrap();

    let again = mgr.join_match("alice", id, dummy_sender()).await;

    assert_eq!(again, Ok(PlayerIndex::FIRST));
    assert_eq!(mgr.match_info(id).await.unwrap().player_count, 1);
}

#[tokio::test]
async fn test_join_match_third_player_rejected() {
    let mut mgr = manager();
    let id = mgr.create_match();
    mgr.join_match("alice", id, dummy_sender()).await.unwrap();
    mgr.join_match("bob", id, dummy_sender()).await.unwrap();

    let result = mgr.join_match("carol", id, dummy_sender()).await;

    assert_eq!(result, Err(MatchError::RosterFull));
    assert_eq!(mgr.player_match("carol"), None);
}

#[tokio::test]
async fn test_join_or_create_pairs_players_then_opens_new_match() {
    let mut mgr = manager();

    let (m1, seat1) = mgr.join_or_create("alice", dummy_sender()).await.unwrap();
    let (m2, seat2) = mgr.join_or_create("bob", dummy_sender()).await.unwrap();
    let (m3, seat3) = mgr.join_or_create("carol", dummy_sender()).await.unwrap();

    assert_eq!(m1, m2);
    assert_eq!((seat1, seat2), (PlayerIndex::FIRST, PlayerIndex::SECOND));
    assert_ne!(m3, m1);
    assert_eq!(seat3, PlayerIndex::FIRST);
    assert_eq!(mgr.match_count(), 2);
}

#[tokio::test]
async fn test_join_or_create_refuses_a_seated_player() {
    let mut mgr = manager();
    let (id, _) = mgr.join_or_create("alice", dummy_sender()).await.unwrap();

    let again = mgr.join_or_create("alice", dummy_sender()).await;

    assert_eq!(again, Err(MatchError::AlreadyInMatch("alice".into(), id)));
    assert_eq!(mgr.match_count(), 1);
    assert_eq!(mgr.match_info(id).await.unwrap().player_count, 1);
}

#[tokio::test]
async fn test_leave_match_alone_frees_the_lobby() {
    let mut mgr = manager();
    let (id, _) = mgr.join_or_create("alice", dummy_sender()).await.unwrap();

    mgr.leave_match("alice", id).await.unwrap();

    assert_eq!(mgr.match_count(), 0);
    assert_eq!(mgr.player_match("alice"), None);

    let (next, seat) = mgr.join_or_create("bob", dummy_sender()).await.unwrap();
    assert_ne!(next, id);
    assert_eq!(seat, PlayerIndex::FIRST);
}

#[tokio::test]
async fn test_leave_match_mid_game_frees_the_opponent() {
    let mut mgr = manager();
    let (id, _) = mgr.join_or_create("alice", dummy_sender()).await.unwrap();
    mgr.join_or_create("bob", dummy_sender()).await.unwrap();
    mgr.route_event("alice", ClientEvent::Ready).await.unwrap();
    mgr.route_event("bob", ClientEvent::Ready).await.unwrap();

    mgr.leave_match("alice", id).await.unwrap();

    assert_eq!(mgr.match_count(), 0);
    assert_eq!(mgr.player_match("bob"), None);
    let (_, seat) = mgr.join_or_create("bob", dummy_sender()).await.unwrap();
    assert_eq!(seat, PlayerIndex::FIRST);
}

#[tokio::test]
async fn test_leave_match_ignores_a_stale_match_id() {
    let mut mgr = manager();
    let (id, _) = mgr.join_or_create("alice", dummy_sender()).await.unwrap();

    let result = mgr.leave_match("alice", MatchId(u64::MAX)).await;

    assert_eq!(result, Err(MatchError::NotInMatch("alice".into())));
    assert_eq!(mgr.player_match("alice"), Some(id));
    assert_eq!(mgr.match_count(), 1);
}

#[tokio::test]
async fn test_list_matches_returns_open_seats_only() {
    let mut mgr = manager();
    let open = mgr.create_match();
    let full = mgr.create_match();
    mgr.join_match("alice", full, dummy_sender()).await.unwrap();
    mgr.join_match("bob", full, dummy_sender()).await.unwrap();

    let matches = mgr.list_matches().await;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].match_id, open);
}

#[tokio::test]
async fn test_route_event_not_in_match() {
    let mgr = manager();
    let result = mgr.route_event("nobody", ClientEvent::Ready).await;
    assert_eq!(result, Err(MatchError::NotInMatch("nobody".into())));
}

#[tokio::test]
async fn test_destroy_match_forgets_players() {
    let mut mgr = manager();
    let id = mgr.create_match();
    mgr.join_match("alice", id, dummy_sender()).await.unwrap();

    mgr.destroy_match(id).await.unwrap();

    assert_eq!(mgr.match_count(), 0);
    assert_eq!(mgr.player_match("alice"), None);
    assert_eq!(mgr.destroy_match(id).await, Err(MatchError::NotFound(id)));
}

// =========================================================================
// Full games through the lobby
// =========================================================================

#[tokio::test]
async fn test_out_of_turn_throw_reaches_only_the_offender() {
    let mut mgr = manager();
    let (tx0, mut rx0) = mpsc::unbounded_channel();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    mgr.join_or_create("alice", tx0).await.unwrap();
    mgr.join_or_create("bob", tx1).await.unwrap();
    mgr.route_event("alice", ClientEvent::Ready).await.unwrap();
    mgr.route_event("bob", ClientEvent::Ready).await.unwrap();

    let start = starting_player(&drain(&mut rx0));
    drain(&mut rx1);
    let (waiting, waiting_rx, other_rx) = if start == PlayerIndex::FIRST {
        ("bob", &mut rx1, &mut rx0)
    } else {
        ("alice", &mut rx0, &mut rx1)
    };

    let result = mgr.route_event(waiting, throw()).await;

    assert_eq!(result, Err(MatchError::TurnViolation));
    assert_eq!(
        drain(waiting_rx),
        vec![ServerEvent::Error { msg: "It is not your turn.".into() }]
    );
    assert!(drain(other_rx).is_empty());
}

#[tokio::test]
async fn test_full_match_to_a_winner() {
    let mut mgr = manager();
    let (tx0, mut rx0) = mpsc::unbounded_channel();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let names = ["alice", "bob"];
    let (id, _) = mgr.join_or_create("alice", tx0).await.unwrap();
    mgr.join_or_create("bob", tx1).await.unwrap();

    mgr.route_event("alice", ClientEvent::Ready).await.unwrap();
    mgr.route_event("bob", ClientEvent::Ready).await.unwrap();

    let events = drain(&mut rx0);
    assert!(matches!(events[0], ServerEvent::MatchStarted(_)));
    drain(&mut rx1);
    let winner = starting_player(&events);
    let mut current = winner;

    // The same player takes two rounds; if the opponent opens a round
    // they throw once and miss.
    for round in 1..=2 {
        if current != winner {
            mgr.route_event(names[current.as_usize()], throw())
                .await
                .unwrap();
        }
        let thrower = names[winner.as_usize()];
        mgr.route_event(thrower, throw()).await.unwrap();
        mgr.route_event(thrower, ClientEvent::EndRound).await.unwrap();

        let events = drain(&mut rx0);
        drain(&mut rx1);
        if round == 1 {
            current = starting_player(&events);
        } else {
            assert_eq!(events.last(), Some(&ServerEvent::MatchEnded { winner }));
        }
    }

    let info = mgr.match_info(id).await.unwrap();
    assert_eq!(info.phase, MatchPhase::MatchEnded);
    assert_eq!(info.wins[winner.as_usize()], 2);
    assert_eq!(info.wins.iter().sum::<u32>(), 2);
    assert_eq!(
        mgr.route_event("alice", ClientEvent::Ready).await,
        Err(MatchError::MatchEnded)
    );
}

/// Seats alice and bob in a fresh match and plays it out: whoever throws
/// first ends each round. Returns the match ID.
async fn play_out_match(mgr: &mut MatchManager) -> MatchId {
    let names = ["alice", "bob"];
    let (tx0, mut rx0) = mpsc::unbounded_channel();
    let (id, _) = mgr.join_or_create("alice", tx0).await.unwrap();
    mgr.join_or_create("bob", dummy_sender()).await.unwrap();
    mgr.route_event("alice", ClientEvent::Ready).await.unwrap();
    mgr.route_event("bob", ClientEvent::Ready).await.unwrap();

    while mgr.match_info(id).await.unwrap().phase != MatchPhase::MatchEnded {
        let start = starting_player(&drain(&mut rx0));
        let thrower = names[start.as_usize()];
        mgr.route_event(thrower, throw()).await.unwrap();
        mgr.route_event(thrower, ClientEvent::EndRound).await.unwrap();
    }
    id
}

#[tokio::test]
async fn test_join_or_create_after_match_ended_starts_fresh() {
    let mut mgr = manager();
    let first = play_out_match(&mut mgr).await;

    let (next, seat) = mgr.join_or_create("alice", dummy_sender()).await.unwrap();

    assert_ne!(next, first);
    assert_eq!(seat, PlayerIndex::FIRST);
    assert_eq!(mgr.player_match("alice"), Some(next));
    assert_eq!(mgr.player_match("bob"), None);
    assert_eq!(mgr.match_ids(), vec![next]);
}

#[tokio::test]
async fn test_finished_matches_are_reclaimed() {
    let mut mgr = manager();

    for _ in 0..5 {
        play_out_match(&mut mgr).await;
        assert_eq!(mgr.match_count(), 1);
    }

    assert_eq!(mgr.reap_finished().await, 1);
    assert_eq!(mgr.match_count(), 0);
    assert_eq!(mgr.player_match("alice"), None);
}
