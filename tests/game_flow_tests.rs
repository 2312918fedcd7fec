//! End-to-end game flows driven through the pure state machine with a
//! synthetic clock, so every assertion about timing is exact.

use chrono::{DateTime, Duration, TimeZone, Utc};
use letter_rally_server::config::GameLimitsConfig;
use letter_rally_server::error::ErrorKind;
use letter_rally_server::game::state::RoomState;
use letter_rally_server::game::transitions::{
    call_number, cancel_game, create_room, end_game, end_round_early, publish_round, review_join,
    score_submission, start_game, submit_answers, submit_join, timer_expired, update_draft,
    EventKind,
};
use letter_rally_server::game::{project, COUNTDOWN_SECONDS};
use letter_rally_server::protocol::types::{
    AnswerPatch, EndReason, EndRule, GameConfigInput, GameStatus, ManualEndPolicy, MarkSet,
    ScoringMode,
};

fn limits() -> GameLimitsConfig {
    GameLimitsConfig::default()
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap()
}

fn all_true() -> MarkSet {
    MarkSet {
        name: true,
        animal: true,
        place: true,
        thing: true,
        food: true,
    }
}

/// Room with host Qudus (max 4), Ada admitted, game started.
fn two_player_game(config: GameConfigInput) -> RoomState {
    let state = create_room(
        "GAME22".to_string(),
        "Qudus",
        4,
        "host-token".to_string(),
        t0(),
        &limits(),
    )
    .unwrap();
    let state = submit_join(&state, "Ada", "p-ada".to_string(), t0(), &limits())
        .unwrap()
        .state;
    let state = review_join(&state, "host-token", "p-ada", true, t0())
        .unwrap()
        .state;
    start_game(&state, "host-token", Some(config), t0(), &limits())
        .unwrap()
        .state
}

#[test]
fn test_happy_path_two_players_whichever_first() {
    let config = GameConfigInput {
        round_seconds: Some(15),
        end_rule: Some(EndRule::WhicheverFirst),
        scoring_mode: Some(ScoringMode::Fixed10),
        ..Default::default()
    };
    let state = two_player_game(config);
    assert_eq!(state.game.turn_order, vec!["host", "p-ada"]);

    // Host calls n=3 at t1.
    let t1 = t0() + Duration::seconds(10);
    let state = call_number(&state, "host", 3, t1).unwrap().state;
    let round = state.game.active_round.as_ref().unwrap();
    assert_eq!(round.active_letter, 'C');
    assert_eq!(round.countdown_ends_at, t1 + Duration::seconds(3));
    assert_eq!(round.ends_at, Some(t1 + Duration::seconds(18)));

    // Ada submits once the countdown has passed.
    let t2 = t1 + Duration::seconds(COUNTDOWN_SECONDS + 2);
    let answers = AnswerPatch {
        name: Some("Cora".to_string()),
        animal: Some("Cat".to_string()),
        place: Some("Cairo".to_string()),
        thing: Some("Cup".to_string()),
        food: Some("Cake".to_string()),
    };
    let outcome = submit_answers(&state, "p-ada", &answers, t2, &limits()).unwrap();
    let EventKind::RoundEnded {
        reason,
        completed_round,
    } = outcome.event.unwrap()
    else {
        panic!("expected the first submission to end the round");
    };

    assert_eq!(reason, EndReason::FirstSubmission);
    assert_eq!(completed_round.submissions.len(), 2);
    let ada = completed_round.submission("p-ada").unwrap();
    assert_eq!(ada.answers.name, "Cora");
    assert_eq!(ada.answers.food, "Cake");
    let host = completed_round.submission("host").unwrap();
    assert_eq!(host.answers.name, "");
    assert_eq!(outcome.state.game.current_turn_index, 1);
    assert!(outcome.state.game.active_round.is_none());
}

#[test]
fn test_manual_end_under_host_or_caller() {
    let config = GameConfigInput {
        round_seconds: Some(12),
        end_rule: Some(EndRule::Timer),
        manual_end_policy: Some(ManualEndPolicy::HostOrCaller),
        ..Default::default()
    };
    let state = two_player_game(config);

    let t1 = t0() + Duration::seconds(5);
    let state = call_number(&state, "host", 7, t1).unwrap().state;
    let open = t1 + Duration::seconds(COUNTDOWN_SECONDS);

    // Ada saves a partial draft, never submits.
    let draft = AnswerPatch {
        name: Some("Grace".to_string()),
        place: Some("Ghana".to_string()),
        ..Default::default()
    };
    let state = update_draft(&state, "p-ada", &draft, open, &limits())
        .unwrap()
        .state;

    // Host ends early; HOST_OR_CALLER allows it even as non-caller later.
    let outcome = end_round_early(&state, "host", open + Duration::seconds(4)).unwrap();
    let EventKind::RoundEnded {
        reason,
        completed_round,
    } = outcome.event.unwrap()
    else {
        panic!("expected RoundEnded");
    };
    assert_eq!(reason, EndReason::ManualEnd);
    let ada = completed_round.submission("p-ada").unwrap();
    assert_eq!(ada.answers.name, "Grace");
    assert_eq!(ada.answers.place, "Ghana");
    assert_eq!(ada.answers.animal, "");
}

#[test]
fn test_shared_ten_split_across_matching_answers() {
    let config = GameConfigInput {
        end_rule: Some(EndRule::Timer),
        scoring_mode: Some(ScoringMode::Shared10),
        ..Default::default()
    };
    let state = two_player_game(config);

    let t1 = t0() + Duration::seconds(1);
    let state = call_number(&state, "host", 1, t1).unwrap().state;
    let open = t1 + Duration::seconds(COUNTDOWN_SECONDS);

    // Both answer name=Ada, animal=Ant; the other fields differ.
    let host_answers = AnswerPatch {
        name: Some("Ada".to_string()),
        animal: Some("Ant".to_string()),
        place: Some("Accra".to_string()),
        thing: Some("Anvil".to_string()),
        food: Some("Apple".to_string()),
    };
    let ada_answers = AnswerPatch {
        name: Some("ada".to_string()),
        animal: Some("ANT".to_string()),
        place: Some("Athens".to_string()),
        thing: Some("Axe".to_string()),
        food: Some("Agbalumo".to_string()),
    };
    let state = submit_answers(&state, "host", &host_answers, open, &limits())
        .unwrap()
        .state;
    let state = submit_answers(&state, "p-ada", &ada_answers, open, &limits())
        .unwrap()
        .state;

    let ends_at = state.game.active_round.as_ref().unwrap().ends_at.unwrap();
    let state = timer_expired(&state, ends_at).unwrap().state;

    let state = score_submission(&state, "host-token", 1, "host", all_true(), t0(), &limits())
        .unwrap()
        .state;
    let state = score_submission(
        &state,
        "host-token",
        1,
        "p-ada",
        all_true(),
        t0(),
        &limits(),
    )
    .unwrap()
    .state;

    let round = &state.game.completed_rounds[0];
    for id in ["host", "p-ada"] {
        let scores = round.submission(id).unwrap().review.as_ref().unwrap().scores;
        assert_eq!(scores.name, 5.0);
        assert_eq!(scores.animal, 5.0);
        assert_eq!(scores.place, 10.0);
        assert_eq!(scores.thing, 10.0);
        assert_eq!(scores.food, 10.0);
        assert_eq!(scores.total, 40.0);
    }
}

#[test]
fn test_publication_gate() {
    let state = two_player_game(GameConfigInput::default());
    let t1 = t0() + Duration::seconds(1);
    let state = call_number(&state, "host", 5, t1).unwrap().state;
    let state = end_round_early(&state, "host", t1 + Duration::seconds(COUNTDOWN_SECONDS))
        .unwrap()
        .state;
    assert_eq!(state.game.completed_rounds[0].submissions.len(), 2);

    // Only one of two submissions reviewed: publishing is refused.
    let marks = MarkSet {
        name: true,
        animal: true,
        ..MarkSet::default()
    };
    let state = score_submission(&state, "host-token", 1, "host", marks, t0(), &limits())
        .unwrap()
        .state;
    let err = publish_round(&state, "host-token", 1, t0()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let state = score_submission(
        &state,
        "host-token",
        1,
        "p-ada",
        MarkSet::default(),
        t0(),
        &limits(),
    )
    .unwrap()
    .state;
    let published_at = t0() + Duration::seconds(90);
    let state = publish_round(&state, "host-token", 1, published_at)
        .unwrap()
        .state;
    assert_eq!(
        state.game.completed_rounds[0].score_published_at,
        Some(published_at)
    );

    let snapshot = project(&state);
    let board = &snapshot.game.scoring.leaderboard;
    assert_eq!(board[0].participant_id, "host");
    assert_eq!(board[0].total_score, 20.0);
    assert_eq!(board[1].total_score, 0.0);
}

#[test]
fn test_fair_round_ceiling_with_ten_players() {
    let state = create_room(
        "FAIR10".to_string(),
        "Qudus",
        10,
        "host-token".to_string(),
        t0(),
        &limits(),
    )
    .unwrap();

    let mut state = state;
    for i in 1..10 {
        state = submit_join(&state, &format!("Player{i}"), format!("p{i}"), t0(), &limits())
            .unwrap()
            .state;
        state = review_join(&state, "host-token", &format!("p{i}"), true, t0())
            .unwrap()
            .state;
    }
    let mut state = start_game(&state, "host-token", None, t0(), &limits())
        .unwrap()
        .state;
    assert_eq!(state.game.turn_order.len(), 10);
    assert_eq!(state.rounds_per_player(), 2);
    assert_eq!(state.max_fair_rounds(), 20);

    // Play and discard 20 full rounds.
    for round in 1..=20u32 {
        let caller = state.game.turn_order[state.game.current_turn_index].clone();
        let t_call = t0() + Duration::seconds(i64::from(round) * 60);
        state = call_number(&state, &caller, round as u8, t_call).unwrap().state;
        state = end_round_early(&state, &caller, t_call + Duration::seconds(COUNTDOWN_SECONDS))
            .unwrap()
            .state;
        state = letter_rally_server::game::transitions::discard_round(
            &state,
            "host-token",
            round,
            t_call + Duration::seconds(10),
        )
        .unwrap()
        .state;
    }

    assert_eq!(state.game.completed_rounds.len(), 20);
    let snapshot = project(&state);
    assert!(snapshot.game.scoring.is_complete);

    // The 21st call is refused even though numbers remain.
    let caller = state.game.turn_order[state.game.current_turn_index].clone();
    let err = call_number(&state, &caller, 21, t0() + Duration::seconds(3600)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.message, "maximum fair rounds reached");
}

#[test]
fn test_terminal_states_expire_joins_and_timers() {
    // Cancel mid-round: joins are Gone and the armed deadline is a no-op.
    let state = two_player_game(GameConfigInput::default());
    let t1 = t0() + Duration::seconds(1);
    let state = call_number(&state, "host", 9, t1).unwrap().state;
    let ends_at = state.game.active_round.as_ref().unwrap().ends_at.unwrap();

    let cancelled = cancel_game(&state, "host-token", t1 + Duration::seconds(4))
        .unwrap()
        .state;
    assert_eq!(cancelled.game.status, GameStatus::Cancelled);
    assert!(cancelled.game.active_round.is_none());

    let err = submit_join(&cancelled, "Late", "p-late".to_string(), t0(), &limits()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);

    let err = timer_expired(&cancelled, ends_at + Duration::seconds(1)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // Finish normally: joins are equally Gone.
    let state = two_player_game(GameConfigInput::default());
    let finished = end_game(&state, "host-token", t0() + Duration::seconds(30))
        .unwrap()
        .state;
    assert_eq!(finished.game.status, GameStatus::Finished);
    let err = submit_join(&finished, "Late", "p-late".to_string(), t0(), &limits()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);
}

#[test]
fn test_turn_rotation_and_letter_bijection_across_rounds() {
    let state = two_player_game(GameConfigInput::default());
    let mut state = state;
    for (round, number) in [(1u32, 26u8), (2, 13), (3, 1)] {
        let caller = state.game.turn_order[state.game.current_turn_index].clone();
        let t_call = t0() + Duration::seconds(i64::from(round) * 100);
        state = call_number(&state, &caller, number, t_call).unwrap().state;
        let active = state.game.active_round.as_ref().unwrap();
        assert_eq!(active.active_letter, char::from(64 + number));
        assert_eq!(active.round_number, round);

        let prev_index = state.game.current_turn_index;
        state = end_round_early(&state, &caller, t_call + Duration::seconds(COUNTDOWN_SECONDS))
            .unwrap()
            .state;
        assert_eq!(state.game.current_turn_index, (prev_index + 1) % 2);
        state = letter_rally_server::game::transitions::discard_round(
            &state,
            "host-token",
            round,
            t_call + Duration::seconds(20),
        )
        .unwrap()
        .state;
    }

    let used = state.used_numbers();
    assert_eq!(used, vec![1, 13, 26]);
}
