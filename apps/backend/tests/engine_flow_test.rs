//! Timer-driven round lifecycle tests, run against a paused clock.

mod common;

use std::time::Duration;

use backend::config::settings::GameSettings;
use backend::domain::state::PhaseKind;
use backend::engine::ledger::LEGACY_VOTE_AWARD;
use backend::store::records::Room;
use backend::ws::protocol::ServerMsg;
use common::{advance, legacy_voting_room, seeded_room};

#[tokio::test(start_paused = true)]
async fn full_investor_round_lifecycle() {
    let mut room = seeded_room(3, GameSettings::default()).await;
    let (host, p1, p2) = (room.players[0], room.players[1], room.players[2]);

    room.engine.start_game(room.room_id, host).await.unwrap();
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::Planning)
    );

    // Everyone got a hand; the host opens as investor.
    for player in &room.players {
        assert_eq!(room.store.player(*player).unwrap().venture_cards.len(), 2);
    }
    let round = room.store.current_round(room.room_id).unwrap();
    assert_eq!(round.round_no, 1);
    assert_eq!(round.investor_id, Some(host));
    room.drain_all();

    // Both pitchers submitting early cuts planning short.
    room.engine
        .submit_pitch(room.room_id, p1, "we disrupt disruption".into())
        .await
        .unwrap();
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::Planning)
    );
    room.engine
        .submit_pitch(room.room_id, p2, "uber for pigeons".into())
        .await
        .unwrap();
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::Pitching)
    );

    // Two presentation turns (60s each plus the 5s buffer).
    advance(Duration::from_secs(65)).await;
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::Pitching)
    );
    advance(Duration::from_secs(65)).await;
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::InvestorSelection)
    );

    room.engine
        .select_investment(room.room_id, host, p1)
        .await
        .unwrap();
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::RoundEnd)
    );
    assert_eq!(room.store.player(p1).unwrap().funding, 1_000_000_000);

    let sealed = room.store.round(round.id).unwrap();
    assert_eq!(sealed.winner_id, Some(p1));
    assert!(sealed.is_sealed());

    // The host's connection saw the whole sequence.
    let host_msgs = room.drain(0);
    assert!(host_msgs
        .iter()
        .any(|m| matches!(m, ServerMsg::PitchSubmitted { .. })));
    assert!(host_msgs
        .iter()
        .any(|m| matches!(m, ServerMsg::InvestorSelectionStart { .. })));
    assert!(host_msgs.iter().any(
        |m| matches!(m, ServerMsg::InvestmentDecision { chosen_player_id, .. } if *chosen_player_id == p1)
    ));
    assert!(host_msgs
        .iter()
        .any(|m| matches!(m, ServerMsg::RoundEnd { winner: Some(w), .. } if *w == p1)));

    // After the grace delay round 2 opens with the investor rotated to the
    // next player in join order.
    advance(Duration::from_secs(5)).await;
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::Planning)
    );
    let round2 = room.store.current_round(room.room_id).unwrap();
    assert_eq!(round2.round_no, 2);
    assert_eq!(round2.investor_id, Some(p1));
}

#[tokio::test(start_paused = true)]
async fn planning_expires_into_pitching_without_pitches() {
    let mut room = seeded_room(3, GameSettings::default()).await;
    room.engine
        .start_game(room.room_id, room.host())
        .await
        .unwrap();
    room.drain_all();

    advance(Duration::from_secs(120)).await;
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::Pitching)
    );
    let msgs = room.drain(0);
    assert!(msgs
        .iter()
        .any(|m| matches!(m, ServerMsg::PitchingPhaseStart { .. })));
    assert!(msgs.iter().any(|m| matches!(m, ServerMsg::PlayerTurn { .. })));
}

#[tokio::test(start_paused = true)]
async fn superseded_planning_timer_does_not_refire() {
    let mut room = seeded_room(3, GameSettings::default()).await;
    let (host, p1, p2) = (room.players[0], room.players[1], room.players[2]);
    room.engine.start_game(room.room_id, host).await.unwrap();
    room.drain_all();

    room.engine
        .submit_pitch(room.room_id, p1, "pitch".into())
        .await
        .unwrap();
    room.engine
        .submit_pitch(room.room_id, p2, "pitch".into())
        .await
        .unwrap();

    // Run past the original planning deadline. Turns advance on their own
    // schedule; the aborted planning timer must not restart pitching.
    advance(Duration::from_secs(120)).await;
    let msgs = room.drain(0);
    let phase_starts = msgs
        .iter()
        .filter(|m| matches!(m, ServerMsg::PitchingPhaseStart { .. }))
        .count();
    let turns = msgs
        .iter()
        .filter(|m| matches!(m, ServerMsg::PlayerTurn { .. }))
        .count();
    assert_eq!(phase_starts, 1);
    assert_eq!(turns, 2);
}

#[tokio::test(start_paused = true)]
async fn selection_timeout_seals_round_without_winner() {
    let mut room = seeded_room(3, GameSettings::default()).await;
    room.engine
        .start_game(room.room_id, room.host())
        .await
        .unwrap();
    room.drain_all();

    advance(Duration::from_secs(120)).await;
    advance(Duration::from_secs(65)).await;
    advance(Duration::from_secs(65)).await;
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::InvestorSelection)
    );

    // Investor never picks; selection expires with no votes to fall back on.
    advance(Duration::from_secs(30)).await;
    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::RoundEnd)
    );
    let round = room.store.rounds_in_room(room.room_id)[0].clone();
    assert!(round.is_sealed());
    assert_eq!(round.winner_id, None);
    for player in &room.players {
        assert_eq!(room.store.player(*player).unwrap().funding, 0);
    }

    // The game still moves on.
    advance(Duration::from_secs(5)).await;
    let round2 = room.store.current_round(room.room_id).unwrap();
    assert_eq!(round2.round_no, 2);
}

#[tokio::test(start_paused = true)]
async fn legacy_round_resolves_by_vote() {
    let mut room = legacy_voting_room().await;
    let (p0, p1, p2) = (room.players[0], room.players[1], room.players[2]);

    room.engine.cast_vote(room.room_id, p0, p1).await.unwrap();
    room.engine.cast_vote(room.room_id, p2, p1).await.unwrap();
    // Third ballot completes the electorate and ends the round early.
    room.engine.cast_vote(room.room_id, p1, p0).await.unwrap();

    assert_eq!(
        room.engine.current_phase(room.room_id).await,
        Some(PhaseKind::RoundEnd)
    );
    assert_eq!(room.store.player(p1).unwrap().funding, LEGACY_VOTE_AWARD);
    assert_eq!(room.store.player(p0).unwrap().funding, 0);

    let msgs = room.drain(2);
    assert!(msgs
        .iter()
        .any(|m| matches!(m, ServerMsg::RoundEnd { winner: Some(w), .. } if *w == p1)));
}

#[tokio::test(start_paused = true)]
async fn vote_tie_goes_to_first_candidate_voted_for() {
    let room = legacy_voting_room().await;
    let (p0, p1, p2) = (room.players[0], room.players[1], room.players[2]);

    // One vote each for p1 then p0; strict-majority scan keeps p1.
    room.engine.cast_vote(room.room_id, p2, p1).await.unwrap();
    room.engine.cast_vote(room.room_id, p1, p0).await.unwrap();
    advance(Duration::from_secs(30)).await;

    assert_eq!(room.store.player(p1).unwrap().funding, LEGACY_VOTE_AWARD);
    assert_eq!(room.store.player(p0).unwrap().funding, 0);
}

#[tokio::test(start_paused = true)]
async fn reaching_funding_target_ends_the_game() {
    let settings = GameSettings {
        funding_target_billion: 1.0,
        ..GameSettings::default()
    };
    let mut room = seeded_room(3, settings).await;
    let (host, p1, _) = (room.players[0], room.players[1], room.players[2]);
    room.engine.start_game(room.room_id, host).await.unwrap();
    room.drain_all();

    advance(Duration::from_secs(120)).await;
    advance(Duration::from_secs(65)).await;
    advance(Duration::from_secs(65)).await;
    room.engine
        .select_investment(room.room_id, host, p1)
        .await
        .unwrap();

    // 1B award meets the 1B target: game over, standings broadcast.
    let room_record: Room = room.store.room(room.room_id).unwrap();
    assert_eq!(
        room_record.state,
        backend::domain::state::RoomState::Finished
    );
    assert_eq!(room.engine.current_phase(room.room_id).await, None);

    let msgs = room.drain(1);
    let standings = msgs
        .iter()
        .find_map(|m| match m {
            ServerMsg::GameEnd { final_standings } => Some(final_standings.clone()),
            _ => None,
        })
        .expect("GAME_END broadcast");
    assert_eq!(standings[0].id, p1);
    assert_eq!(standings[0].funding, 1_000_000_000);

    // No further rounds get scheduled.
    advance(Duration::from_secs(10)).await;
    assert_eq!(room.store.rounds_in_room(room.room_id).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn round_cap_ends_the_game_without_a_winner() {
    let settings = GameSettings {
        max_rounds: Some(1),
        ..GameSettings::default()
    };
    let mut room = seeded_room(3, settings).await;
    room.engine
        .start_game(room.room_id, room.host())
        .await
        .unwrap();
    room.drain_all();

    advance(Duration::from_secs(120)).await;
    advance(Duration::from_secs(65)).await;
    advance(Duration::from_secs(65)).await;
    advance(Duration::from_secs(30)).await;

    assert_eq!(room.engine.current_phase(room.room_id).await, None);
    let room_record = room.store.room(room.room_id).unwrap();
    assert_eq!(
        room_record.state,
        backend::domain::state::RoomState::Finished
    );
    let msgs = room.drain(0);
    assert!(msgs.iter().any(|m| matches!(m, ServerMsg::GameEnd { .. })));
}
