//! Property tests for the rules engine and the turn state machine.

use ludo_engine::coords::{self, is_safe_tile};
use ludo_engine::{
    BASE, BlockadePolicy, BoardState, FINISHED, LocalGame, MoveResult, RuleConfig, RulesEngine,
    TOKEN_SLOTS, TOKENS_PER_PLAYER, TurnPhase,
};
use proptest::prelude::*;

/// Any valid board: 2-4 players, active slots anywhere in BASE..=FINISHED.
fn arb_board() -> impl Strategy<Value = BoardState> {
    (2u8..=4)
        .prop_flat_map(|players| {
            let active = usize::from(players) * TOKENS_PER_PLAYER;
            (
                Just(players),
                0..players,
                0u8..3,
                prop::collection::vec(BASE..=FINISHED, active),
            )
        })
        .prop_map(|(players, current, sixes, positions)| {
            let mut tokens = [BASE; TOKEN_SLOTS];
            tokens[..positions.len()].copy_from_slice(&positions);
            BoardState::from_parts(players, current, sixes, tokens).unwrap()
        })
}

fn arb_policy() -> impl Strategy<Value = BlockadePolicy> {
    prop_oneof![
        Just(BlockadePolicy::SafeTilesExempt),
        Just(BlockadePolicy::SafeTilesEnforced),
    ]
}

fn engine_for(policy: BlockadePolicy) -> RulesEngine {
    RulesEngine::new(RuleConfig {
        blockade_policy: policy,
    })
}

proptest! {
    #[test]
    fn prop_positions_stay_in_range(board in arb_board(), dice in 1u8..=6) {
        let engine = RulesEngine::default();
        let mut board = board;
        for token in engine.compute_valid_moves(&board, dice) {
            let mut next = board.clone();
            engine.process_move(&mut next, token, dice).unwrap();
            prop_assert!(next.tokens().iter().all(|p| (BASE..=FINISHED).contains(p)));
        }
        // A failing attempt never touches the board.
        let before = board.clone();
        for token in 0..board.active_slots() {
            if engine.validate_move(&board, token, dice).is_err() {
                prop_assert!(engine.process_move(&mut board, token, dice).is_err());
                prop_assert_eq!(&board, &before);
            }
        }
    }

    #[test]
    fn prop_validate_is_pure(board in arb_board(), dice in 1u8..=6, token in 0usize..16) {
        let engine = RulesEngine::default();
        let first = engine.validate_move(&board, token, dice);
        let second = engine.validate_move(&board, token, dice);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_six_frees_every_unblockaded_base_token(
        board in arb_board(),
        policy in arb_policy(),
    ) {
        let engine = engine_for(policy);
        let seat = board.current_player();
        let start = board.color_of(seat).start_offset();
        // Only another colour's pair can close a start tile, and only when
        // safe tiles hold blockades.
        let start_blocked = policy == BlockadePolicy::SafeTilesEnforced
            && board
                .occupancy(start)
                .iter()
                .enumerate()
                .any(|(other, &count)| other != usize::from(seat) && count >= 2);

        let valid = engine.compute_valid_moves(&board, 6);
        for token in BoardState::seat_tokens(seat).filter(|&t| board.tokens()[t] == BASE) {
            prop_assert_eq!(valid.contains(&token), !start_blocked, "token {}", token);
        }
    }

    #[test]
    fn prop_eviction_leaves_only_the_mover_on_the_tile(
        board in arb_board(),
        policy in arb_policy(),
    ) {
        let engine = engine_for(policy);
        let seat = board.current_player();
        let color = board.color_of(seat);
        for dice in 1u8..=6 {
            for token in engine.compute_valid_moves(&board, dice) {
                let third_six = dice == 6 && board.consecutive_sixes() == 2;
                let destination = engine.validate_move(&board, token, dice).unwrap().to;
                let tile = coords::to_absolute(destination, color);
                let lone_opponent = tile.filter(|&t| !is_safe_tile(t)).is_some_and(|t| {
                    let before = board.occupancy(t);
                    before
                        .iter()
                        .enumerate()
                        .filter(|&(other, &count)| other != usize::from(seat) && count > 0)
                        .count()
                        == 1
                });

                let mut next = board.clone();
                let report = engine.process_move(&mut next, token, dice).unwrap();
                prop_assert_eq!(
                    report.result == MoveResult::SuccessEvictedOpponent,
                    lone_opponent && !third_six
                );
                if report.result != MoveResult::SuccessEvictedOpponent {
                    prop_assert!(report.evicted.is_empty());
                    continue;
                }

                let tile = tile.unwrap();
                let after = next.occupancy(tile);
                for (other, &count) in after.iter().enumerate() {
                    if other == usize::from(seat) {
                        prop_assert!(count >= 1);
                    } else {
                        prop_assert_eq!(count, 0, "seat {} still on tile {}", other, tile);
                    }
                }
                prop_assert!(!report.evicted.is_empty());
                for &victim in &report.evicted {
                    prop_assert_eq!(next.tokens()[victim], BASE);
                    prop_assert_ne!(BoardState::owner(victim), seat);
                }
            }
        }
    }

    #[test]
    fn prop_roll_below_six_never_moves_base_token(board in arb_board(), dice in 1u8..=5) {
        let engine = RulesEngine::default();
        for token in engine.compute_valid_moves(&board, dice) {
            prop_assert_ne!(board.tokens()[token], BASE);
        }
    }

    #[test]
    fn prop_won_iff_all_finished(board in arb_board()) {
        let engine = RulesEngine::default();
        for seat in 0..board.player_count() {
            let all_home = BoardState::seat_tokens(seat).all(|t| board.tokens()[t] == FINISHED);
            prop_assert_eq!(engine.has_player_won(&board, seat), all_home);
        }
    }

    #[test]
    fn prop_plain_success_rotates_turn(board in arb_board()) {
        let engine = RulesEngine::default();
        let mut board = board;
        let current = board.current_player();
        let players = board.player_count();
        prop_assert!(engine.advance_turn(&mut board, MoveResult::Success));
        prop_assert_eq!(board.current_player(), (current + 1) % players);
        prop_assert_eq!(board.consecutive_sixes(), 0);
    }

    #[test]
    fn prop_bytes_restore_board(board in arb_board()) {
        let decoded = BoardState::from_bytes(&board.to_bytes()).unwrap();
        prop_assert_eq!(decoded, board);
    }

    #[test]
    fn prop_random_play_keeps_phase_consistent(
        players in 2u8..=4,
        rolls in prop::collection::vec((1u8..=6, 0usize..4), 1..200),
    ) {
        let (mut game, _) = LocalGame::create(players, RuleConfig::default()).unwrap();
        for (dice, pick) in rolls {
            if game.is_finished() {
                break;
            }
            let roll = game.process_dice_roll(dice).unwrap();
            if roll.no_valid_moves() {
                prop_assert!(roll.turn_switched);
                continue;
            }
            let token = roll.valid_moves[pick % roll.valid_moves.len()];
            let summary = game.move_token(token).unwrap();
            prop_assert!(summary.result.is_success());
            prop_assert!(game.board().consecutive_sixes() < 3);
            match game.phase() {
                TurnPhase::AwaitingRoll { player } => {
                    prop_assert_eq!(*player, game.current_player());
                }
                TurnPhase::Finished { winner } => prop_assert_eq!(*winner, summary.player),
                TurnPhase::AwaitingMove { .. } => prop_assert!(false, "move left a roll pending"),
            }
        }
    }
}
