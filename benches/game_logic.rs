use criterion::{black_box, criterion_group, criterion_main, Criterion};
use blockfall::core::{Board, Engine, Piece, PieceSequencer};
use blockfall::server::{ClientMessage, RoomRegistry};
use blockfall::types::{PieceKind, Shift};

fn bench_translate_down(c: &mut Criterion) {
    let engine = Engine::new().spawn_piece(Piece::spawn(PieceKind::T));

    c.bench_function("translate_down", |b| {
        b.iter(|| black_box(&engine).translate_down())
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("clear_4_lines", |b| {
        b.iter(|| {
            let mut board = Board::new();
            // Fill bottom 4 rows
            for y in 16..20 {
                for x in 0..10 {
                    board.set(x, y, PieceKind::Stick.color());
                }
            }
            board.clear_full_rows()
        })
    });
}

fn bench_full_drop(c: &mut Criterion) {
    c.bench_function("spawn_and_drop", |b| {
        b.iter(|| {
            let mut engine = Engine::new().spawn_piece(Piece::spawn(black_box(PieceKind::L)));
            while engine.piece.is_some() {
                engine = engine.translate_down();
            }
            engine
        })
    });
}

fn bench_side_and_rotate(c: &mut Criterion) {
    let engine = Engine::new().spawn_piece(Piece::spawn(PieceKind::J)).translate_down();

    c.bench_function("translate_side", |b| {
        b.iter(|| black_box(&engine).translate_side(Shift::Right))
    });
    c.bench_function("rotate", |b| b.iter(|| black_box(&engine).rotate()));
}

fn bench_garbage(c: &mut Criterion) {
    let engine = Engine::new().spawn_piece(Piece::spawn(PieceKind::S));

    c.bench_function("inject_garbage_2", |b| {
        b.iter(|| black_box(&engine).inject_garbage_lines(2))
    });
}

fn bench_sequencer(c: &mut Criterion) {
    c.bench_function("sequencer_1000", |b| {
        b.iter(|| {
            let mut seq = PieceSequencer::with_seed(12345, 100);
            seq.piece_at(black_box(999))
        })
    });
}

fn bench_room_update(c: &mut Criterion) {
    let mut reg = RoomRegistry::with_seed(12345, 4, 100);
    reg.create(1, "bench".to_string()).ok();
    reg.join(2, "bench").ok();
    reg.start(1, "bench", Engine::new()).ok();
    let snapshot = Engine::new();

    c.bench_function("room_update", |b| {
        b.iter(|| {
            reg.handle(
                1,
                ClientMessage::UpdateGameEngine {
                    room_id: "bench".to_string(),
                    snapshot: snapshot.clone(),
                },
            )
        })
    });
}

criterion_group!(
    benches,
    bench_translate_down,
    bench_line_clear,
    bench_full_drop,
    bench_side_and_rotate,
    bench_garbage,
    bench_sequencer,
    bench_room_update
);
criterion_main!(benches);
