//! Piece catalog tests - spawn shapes, colors and rotation tables

use std::collections::HashSet;

use blockfall::core::{rotation_delta, spawn_blocks, Engine, Piece};
use blockfall::types::PieceKind;

#[test]
fn test_every_kind_spawns_four_distinct_blocks() {
    for kind in PieceKind::ALL {
        let blocks = spawn_blocks(kind);
        let unique: HashSet<_> = blocks.iter().map(|b| (b.x, b.y)).collect();
        assert_eq!(unique.len(), 4, "{:?} has overlapping blocks", kind);
    }
}

#[test]
fn test_colors_are_distinct() {
    let colors: HashSet<_> = PieceKind::ALL.iter().map(|k| k.color()).collect();
    assert_eq!(colors.len(), 7);
}

#[test]
fn test_state_counts() {
    assert_eq!(PieceKind::Cube.state_count(), 1);
    assert_eq!(PieceKind::Stick.state_count(), 2);
    assert_eq!(PieceKind::S.state_count(), 2);
    assert_eq!(PieceKind::Z.state_count(), 2);
    assert_eq!(PieceKind::L.state_count(), 4);
    assert_eq!(PieceKind::J.state_count(), 4);
    assert_eq!(PieceKind::T.state_count(), 4);
}

#[test]
fn test_rotation_states_cycle_in_order() {
    for kind in PieceKind::ALL {
        let count = kind.state_count();
        for state in 1..=count {
            match rotation_delta(kind, state) {
                Some((_, next)) => assert_eq!(next, state % count + 1),
                None => assert_eq!(kind, PieceKind::Cube),
            }
        }
    }
}

#[test]
fn test_rotation_keeps_four_distinct_blocks() {
    for kind in PieceKind::ALL {
        let mut piece = Piece::spawn(kind).shifted(0, 6);
        for _ in 0..kind.state_count() {
            let unique: HashSet<_> = piece.blocks.iter().map(|b| (b.x, b.y)).collect();
            assert_eq!(unique.len(), 4, "{:?} state {}", kind, piece.rotation);
            piece = piece.rotated().unwrap_or(piece);
        }
    }
}

#[test]
fn test_t_piece_turns_through_all_states_on_open_board() {
    let mut engine = Engine::new()
        .spawn_piece(Piece::spawn(PieceKind::T))
        .translate_down()
        .translate_down();
    let mut seen = Vec::new();
    for _ in 0..4 {
        engine = engine.rotate();
        seen.push(engine.piece.unwrap().rotation);
    }
    assert_eq!(seen, vec![2, 3, 4, 1]);
}

#[test]
fn test_piece_kind_names_round_trip() {
    for kind in PieceKind::ALL {
        assert_eq!(PieceKind::from_str(kind.as_str()), Some(kind));
    }
}
