//! Full turns played through `LocalGame`.

use ludo_engine::{
    BASE, BoardState, GameEvent, LocalGame, MoveResult, RuleConfig, TOKEN_SLOTS,
};

fn game_with(players: u8, current: u8, sixes: u8, placed: &[(usize, i8)]) -> LocalGame {
    let mut tokens = [BASE; TOKEN_SLOTS];
    for &(token, position) in placed {
        tokens[token] = position;
    }
    let board = BoardState::from_parts(players, current, sixes, tokens).unwrap();
    LocalGame::from_board(board, RuleConfig::default())
}

#[test]
fn test_opening_six_then_move_then_pass() {
    let (mut game, _) = LocalGame::create(2, RuleConfig::default()).unwrap();

    let roll = game.process_dice_roll(6).unwrap();
    assert_eq!(roll.valid_moves, vec![0, 1, 2, 3]);
    let moved = game.move_token(0).unwrap();
    assert_eq!(moved.result, MoveResult::SuccessSix);
    assert_eq!(moved.new_position, 0);
    assert_eq!(game.board().consecutive_sixes(), 1);

    let roll = game.process_dice_roll(4).unwrap();
    assert_eq!(roll.valid_moves, vec![0]);
    let moved = game.move_token(0).unwrap();
    assert_eq!(moved.result, MoveResult::Success);
    assert_eq!(moved.next_player, 1);
    assert_eq!(game.board().turn_count(), 1);
}

#[test]
fn test_capture_grants_extra_roll() {
    // Red at 10 lands on absolute 14, where a lone green token sits.
    let mut game = game_with(4, 0, 0, &[(0, 10), (4, 1)]);
    game.process_dice_roll(4).unwrap();
    let moved = game.move_token(0).unwrap();

    assert_eq!(moved.result, MoveResult::SuccessEvictedOpponent);
    assert_eq!(moved.evicted, vec![4]);
    assert_eq!(game.board().tokens()[4], BASE);
    assert_eq!(game.current_player(), 0);
    assert!(moved.events.iter().any(|e| matches!(
        e,
        GameEvent::TokenMoved { evicted, .. } if evicted == &vec![4]
    )));
}

#[test]
fn test_third_six_passes_turn() {
    let mut game = game_with(4, 0, 2, &[(0, 20)]);
    game.process_dice_roll(6).unwrap();
    let moved = game.move_token(0).unwrap();

    assert_eq!(moved.result, MoveResult::SuccessThirdSixPenalty);
    assert_eq!(moved.new_position, 26);
    assert!(moved.turn_switched);
    assert_eq!(game.current_player(), 1);
    assert_eq!(game.board().consecutive_sixes(), 0);
}

#[test]
fn test_event_order_for_passing_move() {
    let mut game = game_with(3, 2, 0, &[(8, 3)]);
    game.process_dice_roll(2).unwrap();
    let moved = game.move_token(8).unwrap();
    assert_eq!(
        moved.events,
        vec![
            GameEvent::TokenMoved {
                player: 2,
                token: 8,
                from: 3,
                to: 5,
                result: MoveResult::Success,
                evicted: vec![],
            },
            GameEvent::TurnEnd { player: 2 },
            GameEvent::TurnStart { player: 0 },
            GameEvent::GameStateChanged,
        ]
    );
}

#[test]
fn test_three_rolled_sixes_bank_then_forfeit_bonus() {
    let (mut game, _) = LocalGame::create(4, RuleConfig::default()).unwrap();

    let expected = [
        (0, MoveResult::SuccessSix, 1),
        (6, MoveResult::SuccessSix, 2),
        (12, MoveResult::SuccessThirdSixPenalty, 0),
    ];
    for (position, result, streak) in expected {
        let roll = game.process_dice_roll(6).unwrap();
        assert_eq!(roll.player, 0);
        assert!(roll.valid_moves.contains(&0));
        let moved = game.move_token(0).unwrap();
        assert_eq!(moved.result, result);
        assert_eq!(moved.new_position, position);
        assert_eq!(game.board().consecutive_sixes(), streak);
    }

    assert_eq!(game.current_player(), 1);
    assert_eq!(game.board().turn_count(), 1);
}
