//! Actor, hub, and registry behaviour through the public async surface:
//! command serialisation, event fan-out order, presence, and terminal
//! room cleanup.

use std::sync::Arc;

use letter_rally_server::config::Config;
use letter_rally_server::error::ErrorKind;
use letter_rally_server::protocol::types::{GameConfigInput, GameStatus, MarkSet};
use letter_rally_server::server::registry::{RoomCreated, RoomRegistry};
use letter_rally_server::server::Subscription;

fn registry() -> Arc<RoomRegistry> {
    Arc::new(RoomRegistry::new(Arc::new(Config::default())))
}

async fn next_event(subscription: &mut Subscription) -> serde_json::Value {
    let frame = subscription.receiver.recv().await.expect("stream closed");
    serde_json::from_str(frame.as_str()).expect("invalid frame")
}

async fn drain_greeting(subscription: &mut Subscription) {
    // connected, snapshot, presence
    for _ in 0..3 {
        next_event(subscription).await;
    }
}

#[tokio::test]
async fn test_full_game_over_the_actor_surface() {
    let registry = registry();
    let RoomCreated {
        room_code,
        host_token,
        ..
    } = registry.create_room("Qudus", 4).unwrap();
    let room = registry.lookup(&room_code).unwrap();

    let mut watcher = room.subscribe().await.unwrap();
    drain_greeting(&mut watcher).await;

    // Join + admit.
    let accepted = room.submit_join("Ada".to_string()).await.unwrap();
    assert_eq!(next_event(&mut watcher).await["type"], "join_request");
    room.review_join(host_token.clone(), accepted.request_id.clone(), true)
        .await
        .unwrap();
    let event = next_event(&mut watcher).await;
    assert_eq!(event["type"], "admission_update");
    assert_eq!(event["participant"]["status"], "ADMITTED");

    // Start.
    let snapshot = room.start_game(host_token.clone(), None).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::InProgress);
    assert_eq!(next_event(&mut watcher).await["type"], "game_started");

    // Call, then end the round manually before the countdown even passes.
    let snapshot = room.call_number("host".to_string(), 3).await.unwrap();
    let round = snapshot.game.active_round.unwrap();
    assert_eq!(round.active_letter, 'C');
    assert_eq!(next_event(&mut watcher).await["type"], "turn_called");

    let snapshot = room.end_round_early("host".to_string()).await.unwrap();
    assert_eq!(snapshot.game.completed_rounds.len(), 1);
    assert_eq!(snapshot.game.current_turn_index, 1);
    let event = next_event(&mut watcher).await;
    assert_eq!(event["type"], "round_ended");
    assert_eq!(event["reason"], "MANUAL_END");
    assert_eq!(event["completedRound"]["submissions"].as_array().unwrap().len(), 2);

    // Review both forced submissions and publish.
    for participant in ["host", accepted.request_id.as_str()] {
        room.score_submission(
            host_token.clone(),
            1,
            participant.to_string(),
            MarkSet::default(),
        )
        .await
        .unwrap();
        assert_eq!(next_event(&mut watcher).await["type"], "submission_scored");
    }
    let snapshot = room.publish_round(host_token.clone(), 1).await.unwrap();
    assert_eq!(snapshot.game.scoring.published_rounds, 1);
    let event = next_event(&mut watcher).await;
    assert_eq!(event["type"], "round_scores_published");
    assert_eq!(event["roundNumber"], 1);

    // Finish.
    let snapshot = room.end_game(host_token).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Finished);
    assert_eq!(next_event(&mut watcher).await["type"], "game_ended");

    // Joins are now permanently refused.
    let err = room.submit_join("Late".to_string()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);
}

#[tokio::test]
async fn test_events_carry_matching_snapshots() {
    let registry = registry();
    let created = registry.create_room("Qudus", 4).unwrap();
    let room = registry.lookup(&created.room_code).unwrap();

    let mut watcher = room.subscribe().await.unwrap();
    drain_greeting(&mut watcher).await;

    room.submit_join("Ada".to_string()).await.unwrap();
    let event = next_event(&mut watcher).await;
    assert_eq!(event["snapshot"]["counts"]["pending"], 1);
    assert_eq!(event["snapshot"]["meta"]["roomCode"], created.room_code);
    // The host token never appears in any event payload.
    assert!(!event.to_string().contains(&created.host_token));
}

#[tokio::test]
async fn test_concurrent_joins_are_serialised() {
    let registry = registry();
    let created = registry.create_room("Qudus", 10).unwrap();
    let room = registry.lookup(&created.room_code).unwrap();

    let mut joins = tokio::task::JoinSet::new();
    for i in 0..8 {
        let room = room.clone();
        joins.spawn(async move { room.submit_join(format!("Player{i}")).await });
    }
    let mut accepted = 0;
    while let Some(result) = joins.join_next().await {
        if result.unwrap().is_ok() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 8);

    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.counts.pending, 8);
    // Unique ids for every request.
    let mut ids: Vec<_> = snapshot.participants.iter().map(|p| p.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 9);
}

#[tokio::test]
async fn test_duplicate_name_race_admits_exactly_one() {
    let registry = registry();
    let created = registry.create_room("Qudus", 4).unwrap();
    let room = registry.lookup(&created.room_code).unwrap();

    let mut joins = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let room = room.clone();
        joins.spawn(async move { room.submit_join("Ada".to_string()).await });
    }
    let mut outcomes = Vec::new();
    while let Some(result) = joins.join_next().await {
        outcomes.push(result.unwrap());
    }
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind == ErrorKind::Conflict));
}

#[tokio::test]
async fn test_registry_sweep_lifecycle() {
    let registry = registry();
    let created = registry.create_room("Qudus", 4).unwrap();
    let room = registry.lookup(&created.room_code).unwrap();
    assert_eq!(registry.room_count(), 1);

    // Active room with a subscriber: never swept.
    let sub = room.subscribe().await.unwrap();
    assert_eq!(registry.sweep_terminal_rooms().await, 0);

    room.cancel_game(created.host_token.clone()).await.unwrap();
    assert_eq!(registry.sweep_terminal_rooms().await, 0);

    room.unsubscribe(sub.id).await;
    assert_eq!(registry.sweep_terminal_rooms().await, 1);
    assert_eq!(registry.room_count(), 0);

    // Commands against the destroyed room fail cleanly.
    let err = room.snapshot().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_room_log_records_creates() {
    let path = std::env::temp_dir().join(format!(
        "letter-rally-test-log-{}.jsonl",
        uuid::Uuid::new_v4()
    ));
    let mut config = Config::default();
    config.server.room_log_path = Some(path.clone());
    let registry = RoomRegistry::new(Arc::new(config));

    let a = registry.create_room("Qudus", 4).unwrap();
    let b = registry.create_room("Ada", 6).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["code"], a.room_code);
    assert_eq!(lines[1]["code"], b.room_code);
    assert_eq!(lines[0]["status"], "LOBBY");
    assert_eq!(lines[1]["maxParticipants"], 6);
    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn test_invalid_start_configs_are_refused_over_the_surface() {
    let registry = registry();
    let created = registry.create_room("Qudus", 4).unwrap();
    let room = registry.lookup(&created.room_code).unwrap();
    let accepted = room.submit_join("Ada".to_string()).await.unwrap();
    room.review_join(created.host_token.clone(), accepted.request_id, true)
        .await
        .unwrap();

    let config = GameConfigInput {
        round_seconds: Some(121),
        ..Default::default()
    };
    let err = room
        .start_game(created.host_token.clone(), Some(config))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadRequest);

    // State untouched: a valid start still succeeds.
    let snapshot = room.start_game(created.host_token, None).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::InProgress);
}
