//! Headless bot client.
//!
//! Connects to a room server, creates or joins a room, optionally starts it,
//! and plays every piece it receives with a one-piece lookahead placement.
//!
//! ```text
//! blockfall-bot --room R1 --create --start --players 2
//! blockfall-bot --room R1
//! ```

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use blockfall::core::{Engine, Outcome, VersusSession};
use blockfall::server::{ClientMessage, RoomStatus, ServerMessage};
use blockfall::types::{Shift, BOARD_HEIGHT, BOARD_WIDTH, EMPTY_CELL};

#[derive(Parser)]
#[command(name = "blockfall-bot")]
#[command(about = "Headless player for soak-testing a room server")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value = "8080")]
    port: u16,
    /// Room to play in
    #[arg(long)]
    room: String,
    /// Create the room instead of joining it
    #[arg(long)]
    create: bool,
    /// Start the game once enough players are in the room
    #[arg(long)]
    start: bool,
    /// Roster size to wait for before starting
    #[arg(long, default_value = "1")]
    players: usize,
    /// Milliseconds between two bot inputs
    #[arg(long, default_value = "50")]
    tick_ms: u64,
}

/// Inputs still to apply to the falling piece
#[derive(Debug, Clone, Copy, Default)]
struct Plan {
    rotations: u8,
    shift: i8,
}

fn column_heights(engine: &Engine) -> [u32; BOARD_WIDTH as usize] {
    let mut heights = [0u32; BOARD_WIDTH as usize];
    for (y, row) in engine.board.rows().iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell != EMPTY_CELL && heights[x] == 0 {
                heights[x] = u32::from(BOARD_HEIGHT) - y as u32;
            }
        }
    }
    heights
}

fn holes(engine: &Engine) -> u32 {
    let mut count = 0;
    for x in 0..BOARD_WIDTH as usize {
        let mut roof = false;
        for row in engine.board.rows() {
            if row[x] != EMPTY_CELL {
                roof = true;
            } else if roof {
                count += 1;
            }
        }
    }
    count
}

/// Lower is better
fn cost(before: &Engine, after: &Engine) -> f64 {
    if after.game_over {
        return f64::MAX;
    }
    let heights = column_heights(after);
    let aggregate: u32 = heights.iter().sum();
    let bumpiness: u32 = heights.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
    let gained = after.score.saturating_sub(before.score);
    0.5 * f64::from(aggregate) + 3.5 * f64::from(holes(after)) + 0.3 * f64::from(bumpiness)
        - 0.8 * f64::from(gained)
}

/// Apply a plan to a copy of `engine` and let the piece fall until it locks
fn simulate(engine: &Engine, plan: Plan) -> Option<Engine> {
    let mut sim = engine.clone();
    for _ in 0..plan.rotations {
        let before = sim.piece?.rotation;
        sim = sim.rotate();
        if sim.piece?.rotation == before {
            return None;
        }
    }
    let shift = Shift::from_delta(i64::from(plan.shift.signum()));
    for _ in 0..plan.shift.unsigned_abs() {
        let before = sim.piece?.blocks;
        sim = sim.translate_side(shift?);
        if sim.piece?.blocks == before {
            return None;
        }
    }
    for _ in 0..=BOARD_HEIGHT {
        if sim.piece.is_none() {
            return Some(sim);
        }
        sim = sim.translate_down();
    }
    None
}

fn best_plan(engine: &Engine) -> Plan {
    let Some(piece) = engine.piece else {
        return Plan::default();
    };
    let width = BOARD_WIDTH as i8;
    let mut best = (f64::MAX, Plan::default());
    for rotations in 0..piece.kind.state_count() {
        for shift in -width..=width {
            let plan = Plan { rotations, shift };
            if let Some(after) = simulate(engine, plan) {
                let c = cost(engine, &after);
                if c < best.0 {
                    best = (c, plan);
                }
            }
        }
    }
    best.1
}

fn step(session: &mut VersusSession, plan: &mut Plan) -> Outcome {
    if plan.rotations > 0 {
        plan.rotations -= 1;
        return session.rotate();
    }
    if let Some(shift) = Shift::from_delta(i64::from(plan.shift.signum())) {
        plan.shift -= plan.shift.signum();
        return session.shift(shift);
    }
    session.tick()
}

async fn send<W>(writer: &mut W, msg: &ClientMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(msg)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);
    let stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let room_id = cli.room.clone();
    let hello = if cli.create {
        ClientMessage::CreateRoom {
            room_id: room_id.clone(),
        }
    } else {
        ClientMessage::JoinRoom {
            room_id: room_id.clone(),
        }
    };
    send(&mut writer, &hello).await?;

    let mut session = VersusSession::new();
    let mut plan = Plan::default();
    let mut started = false;
    let mut ticker = tokio::time::interval(Duration::from_millis(cli.tick_ms.max(1)));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("server closed the connection");
                    return Ok(());
                };
                let msg: ServerMessage = match serde_json::from_str(&line) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(error = %e, "unreadable server message");
                        continue;
                    }
                };
                let outcome = match msg {
                    ServerMessage::Welcome { connection_id } => {
                        info!(conn = connection_id, room = %room_id, "connected");
                        Outcome::Continue
                    }
                    ServerMessage::RoomUpdate(view) => {
                        debug!(players = view.players.len(), status = ?view.status, "room update");
                        if cli.start && !started && view.status == RoomStatus::Waiting
                            && view.players.len() >= cli.players
                        {
                            started = true;
                            let start = ClientMessage::StartGame {
                                room_id: room_id.clone(),
                                snapshot: Some(Engine::new()),
                            };
                            send(&mut writer, &start).await?;
                        }
                        Outcome::Continue
                    }
                    ServerMessage::NewPiece { piece } => {
                        let outcome = session.receive_piece(piece.kind);
                        plan = best_plan(session.engine());
                        outcome
                    }
                    ServerMessage::AddUndestructableLine { count } => {
                        debug!(lines = count, "garbage received");
                        let outcome = session.receive_garbage(count);
                        plan = best_plan(session.engine());
                        outcome
                    }
                    ServerMessage::GameOver => {
                        info!(score = session.engine().score, "game over");
                        return Ok(());
                    }
                    ServerMessage::UnknownRoomId { message }
                    | ServerMessage::ExistingRoom { message }
                    | ServerMessage::FullRoom { message } => bail!("room {}: {}", room_id, message),
                    ServerMessage::InvalidMessage { message } => {
                        warn!(%message, "server rejected a message");
                        Outcome::Continue
                    }
                };
                if outcome.needs_report() {
                    report(&mut writer, &room_id, session.engine()).await?;
                }
            }
            _ = ticker.tick() => {
                if session.engine().piece.is_none() {
                    continue;
                }
                if step(&mut session, &mut plan).needs_report() {
                    report(&mut writer, &room_id, session.engine()).await?;
                }
            }
        }
    }
}

async fn report<W>(writer: &mut W, room_id: &str, engine: &Engine) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    debug!(score = engine.score, game_over = engine.game_over, "reporting snapshot");
    send(
        writer,
        &ClientMessage::UpdateGameEngine {
            room_id: room_id.to_string(),
            snapshot: engine.clone(),
        },
    )
    .await
}
