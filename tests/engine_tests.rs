//! Engine tests - movement, rotation, locking, scoring and garbage

use blockfall::core::{Board, Engine, Piece, SettlePolicy};
use blockfall::types::{PieceKind, Shift, BOARD_WIDTH, GARBAGE_CELL};

fn spawned(kind: PieceKind) -> Engine {
    Engine::new().spawn_piece(Piece::spawn(kind))
}

fn with_board(board: Board, kind: PieceKind) -> Engine {
    Engine {
        board,
        ..Engine::new()
    }
    .spawn_piece(Piece::spawn(kind))
}

fn drop_until_locked(mut engine: Engine) -> Engine {
    for _ in 0..40 {
        if engine.piece.is_none() {
            break;
        }
        engine = engine.translate_down();
    }
    engine
}

/// Rows `20 - k .. 20` filled in every column but the first
fn well_board(k: usize) -> Board {
    let mut board = Board::new();
    for y in (20 - k)..20 {
        for x in 1..BOARD_WIDTH as i8 {
            board.set(x, y as i8, PieceKind::T.color());
        }
    }
    board
}

#[test]
fn test_lock_score_is_100_per_row_plus_10() {
    for k in 0..=4 {
        let mut engine = with_board(well_board(k), PieceKind::Stick);
        for _ in 0..4 {
            engine = engine.translate_side(Shift::Left);
        }
        assert_eq!(engine.piece.unwrap().blocks[0].x, 0);

        let before = engine.score;
        let after = drop_until_locked(engine);
        assert!(after.piece.is_none());
        assert_eq!(after.score - before, 100 * k as u32 + 10, "k = {}", k);
        assert!(!after.board.contains(PieceKind::Stick.color()) || k < 4);
    }
}

#[test]
fn test_side_move_into_wall_is_noop() {
    let mut engine = spawned(PieceKind::Stick);
    for _ in 0..4 {
        engine = engine.translate_side(Shift::Left);
    }
    assert_eq!(engine.translate_side(Shift::Left), engine);

    let mut right = spawned(PieceKind::Cube);
    for _ in 0..10 {
        right = right.translate_side(Shift::Right);
    }
    assert!(right
        .piece
        .unwrap()
        .blocks
        .iter()
        .all(|b| b.x < BOARD_WIDTH as i8));
    assert_eq!(right.translate_side(Shift::Right), right);
}

#[test]
fn test_side_move_into_terrain_is_noop() {
    let mut board = Board::new();
    board.set(3, 2, PieceKind::J.color());
    let engine = with_board(board, PieceKind::Stick);
    assert_eq!(engine.translate_side(Shift::Left), engine);
    assert_ne!(engine.translate_side(Shift::Right), engine);
}

#[test]
fn test_rotate_without_can_rotate_is_identity() {
    let mut engine = spawned(PieceKind::T);
    let mut piece = engine.piece.unwrap();
    piece.can_rotate = false;
    engine.piece = Some(piece);
    assert_eq!(engine.rotate(), engine);
}

#[test]
fn test_invalid_rotation_is_rejected() {
    let mut engine = spawned(PieceKind::Stick);
    for _ in 0..4 {
        engine = engine.translate_side_with(Shift::Left, SettlePolicy::DirectCollision);
    }
    assert!(engine.piece.unwrap().can_rotate);

    let rotated = engine.rotate();
    let piece = rotated.piece.unwrap();
    assert_eq!(piece.blocks, engine.piece.unwrap().blocks);
    assert_eq!(piece.rotation, 1);
    assert!(!piece.can_rotate);
    assert!(rotated.can_exist());
}

#[test]
fn test_cube_rotation_only_clears_flag() {
    let engine = spawned(PieceKind::Cube);
    let rotated = engine.rotate();
    assert_eq!(rotated.piece.unwrap().blocks, engine.piece.unwrap().blocks);
    assert!(!rotated.piece.unwrap().can_rotate);
}

#[test]
fn test_free_move_restores_rotation() {
    let engine = spawned(PieceKind::Cube).rotate();
    assert!(!engine.piece.unwrap().can_rotate);
    let moved = engine.translate_down();
    assert!(moved.piece.unwrap().can_rotate);
}

#[test]
fn test_settle_policies_differ_only_in_flag() {
    // A standing stick against the left wall cannot lie flat there.
    let mut engine = spawned(PieceKind::Stick);
    for _ in 0..4 {
        engine = engine.translate_side_with(Shift::Left, SettlePolicy::DirectCollision);
    }

    let probe = engine.translate_down_with(SettlePolicy::RotateProbe);
    let direct = engine.translate_down_with(SettlePolicy::DirectCollision);
    assert_eq!(probe.piece.unwrap().blocks, direct.piece.unwrap().blocks);
    assert!(!probe.piece.unwrap().can_rotate);
    assert!(direct.piece.unwrap().can_rotate);

    // Away from the wall both policies agree.
    let free = spawned(PieceKind::Stick);
    assert_eq!(
        free.translate_down_with(SettlePolicy::RotateProbe),
        free.translate_down_with(SettlePolicy::DirectCollision)
    );
}

#[test]
fn test_spawn_collision_is_game_over() {
    let mut board = Board::new();
    board.set(4, 1, PieceKind::L.color());
    let engine = with_board(board, PieceKind::T);
    assert!(engine.game_over);
    assert!(engine.piece.is_none());

    // Terminal: nothing changes afterwards.
    assert_eq!(engine.spawn_piece(Piece::spawn(PieceKind::Cube)), engine);
    assert_eq!(engine.translate_side(Shift::Right), engine);
    assert_eq!(engine.rotate(), engine);
}

#[test]
fn test_garbage_collision_locks_piece() {
    let mut engine = spawned(PieceKind::Cube);
    for _ in 0..18 {
        engine = engine.translate_down();
    }
    assert!(engine.piece.unwrap().blocks.iter().all(|b| b.y >= 18));

    let hit = engine.inject_garbage_lines(1);
    assert!(hit.piece.is_none());
    assert_eq!(hit.score, engine.score + 10);
    assert_eq!(hit.board.get(4, 19), Some(GARBAGE_CELL));
    assert_eq!(hit.board.get(4, 18), Some(PieceKind::Cube.color()));
}

#[test]
fn test_garbage_pushes_terrain_up() {
    let mut board = Board::new();
    board.set(0, 19, PieceKind::Z.color());
    let engine = with_board(board, PieceKind::T);
    let raised = engine.inject_garbage_lines(3);
    assert_eq!(raised.board.get(0, 16), Some(PieceKind::Z.color()));
    assert_eq!(raised.board.get(0, 17), Some(GARBAGE_CELL));
    assert_eq!(raised.piece, engine.piece);
    assert_eq!(raised.score, engine.score);
    assert_eq!(engine.inject_garbage_lines(0), engine);
}

#[test]
fn test_transitions_leave_input_untouched() {
    let engine = spawned(PieceKind::L);
    let copy = engine.clone();
    let _ = engine.translate_down().rotate().translate_side(Shift::Right);
    let _ = engine.inject_garbage_lines(2);
    assert_eq!(engine, copy);
}

#[test]
fn test_snapshot_json_round_trips_client_format() {
    let engine = spawned(PieceKind::S).translate_down();
    let v = serde_json::to_value(&engine).unwrap();
    assert!(v["current_board"].is_array());
    assert_eq!(v["current_piece"]["type"], "S");
    assert_eq!(v["game_over"], false);
    assert_eq!(v["score"], 0);

    let back: Engine = serde_json::from_value(v).unwrap();
    assert_eq!(back, engine);
}
