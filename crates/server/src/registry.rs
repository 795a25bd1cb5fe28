//! Room registry - the only owner of room state
//!
//! Every transition takes the acting connection and returns the messages it
//! produced as [`Envelope`]s; the caller delivers them. Nothing here awaits,
//! so one call is one atomic step for the rooms it touches.
//!
//! # Termination
//!
//! After a report, or after a member leaves a running game, the room is
//! checked with [`Room::is_finished`]. A finished room notifies every member
//! with `gameOver` and is deleted.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use blockfall_core::types::{DEFAULT_ROOM_LIMIT, PIECE_BATCH_SIZE};
use blockfall_core::{Engine, PieceSequencer};

use crate::garbage::{garbage_lines_owed, relay};
use crate::protocol::{
    create_new_piece, ClientMessage, ConnectionId, Envelope, RoomStatus, ServerMessage,
};
use crate::room::Room;

/// A rejected room operation, reported to the originating connection only
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room id does not exist!")]
    UnknownRoom(String),
    #[error("Room id already exists!")]
    RoomExists(String),
    #[error("Room is already full!")]
    RoomFull(String),
}

impl From<RoomError> for ServerMessage {
    fn from(err: RoomError) -> Self {
        let message = err.to_string();
        match err {
            RoomError::UnknownRoom(_) => ServerMessage::UnknownRoomId { message },
            RoomError::RoomExists(_) => ServerMessage::ExistingRoom { message },
            RoomError::RoomFull(_) => ServerMessage::FullRoom { message },
        }
    }
}

type Outbox = Result<Vec<Envelope>, RoomError>;

#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    limit: usize,
    batch: usize,
    rng: ChaCha8Rng,
}

impl RoomRegistry {
    pub fn new(limit: usize, batch: usize) -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy(), limit, batch)
    }

    /// Registry whose piece sequences are reproducible
    pub fn with_seed(seed: u64, limit: usize, batch: usize) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed), limit, batch)
    }

    fn from_rng(rng: ChaCha8Rng, limit: usize, batch: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            limit: limit.max(1),
            batch: batch.max(1),
            rng,
        }
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Dispatch one validated message; errors become notifications to `conn`
    pub fn handle(&mut self, conn: ConnectionId, message: ClientMessage) -> Vec<Envelope> {
        let result = match message {
            ClientMessage::CreateRoom { room_id } => self.create(conn, room_id),
            ClientMessage::JoinRoom { room_id } => self.join(conn, &room_id),
            ClientMessage::StartGame { room_id, snapshot } => {
                self.start(conn, &room_id, snapshot.unwrap_or_default())
            }
            ClientMessage::UpdateGameEngine { room_id, snapshot } => {
                self.update(conn, &room_id, snapshot)
            }
            ClientMessage::LeaveRoom { room_id } => self.leave(conn, &room_id),
        };
        result.unwrap_or_else(|err| {
            debug!(conn, error = %err, "room operation rejected");
            vec![Envelope::new(conn, err.into())]
        })
    }

    pub fn create(&mut self, conn: ConnectionId, room_id: String) -> Outbox {
        if self.rooms.contains_key(&room_id) {
            return Err(RoomError::RoomExists(room_id));
        }
        let room = Room::new(room_id.clone(), conn, self.limit);
        let out = room.broadcast_view();
        info!(room = %room_id, conn, "room created");
        self.rooms.insert(room_id, room);
        Ok(out)
    }

    pub fn join(&mut self, conn: ConnectionId, room_id: &str) -> Outbox {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))?;
        if room.contains(conn) {
            return Ok(vec![Envelope::new(
                conn,
                ServerMessage::RoomUpdate(room.view()),
            )]);
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(room_id.to_string()));
        }
        room.add_player(conn);
        info!(room = %room_id, conn, players = room.players.len(), "player joined");
        Ok(room.broadcast_view())
    }

    pub fn start(&mut self, conn: ConnectionId, room_id: &str, snapshot: Engine) -> Outbox {
        let seed = self.rng.gen::<u64>();
        let batch = self.batch;
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))?;
        if !room.contains(conn) {
            warn!(room = %room_id, conn, "start from a non-member ignored");
            return Ok(Vec::new());
        }
        if room.status == RoomStatus::InGame {
            debug!(room = %room_id, conn, "start on a running room ignored");
            return Ok(Vec::new());
        }
        let first = room.start(&snapshot, PieceSequencer::with_seed(seed, batch));
        info!(room = %room_id, conn, players = room.contenders, "game started");

        let mut out = room.broadcast(create_new_piece(first));
        out.extend(room.broadcast_view());
        Ok(out)
    }

    /// Record a reported snapshot, serve the next piece and relay garbage
    pub fn update(&mut self, conn: ConnectionId, room_id: &str, snapshot: Engine) -> Outbox {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))?;
        if room.status == RoomStatus::Waiting {
            debug!(room = %room_id, conn, "report for a waiting room");
            return Ok(vec![Envelope::new(conn, ServerMessage::GameOver)]);
        }
        let Some(player) = room.player_mut(conn) else {
            warn!(room = %room_id, conn, "report from a non-member ignored");
            return Ok(Vec::new());
        };
        if player.game_over {
            return Ok(Vec::new());
        }

        let eliminated = snapshot.game_over;
        let score = snapshot.score;
        player.snapshot = snapshot;

        let mut out = Vec::new();
        if eliminated {
            player.game_over = true;
            info!(room = %room_id, conn, score, "player eliminated");
        } else {
            let lines = garbage_lines_owed(player.previous_score, score);
            player.previous_score = score;
            if lines > 0 {
                debug!(room = %room_id, conn, lines, "relaying garbage");
                out.extend(relay(room, conn, lines));
            }
            if let Some(piece) = room.next_piece(conn) {
                out.push(Envelope::new(conn, create_new_piece(piece)));
            }
        }

        out.extend(self.settle(room_id));
        Ok(out)
    }

    pub fn leave(&mut self, conn: ConnectionId, room_id: &str) -> Outbox {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::UnknownRoom(room_id.to_string()))?;
        if !room.remove_player(conn) {
            warn!(room = %room_id, conn, "leave from a non-member ignored");
            return Ok(Vec::new());
        }
        info!(room = %room_id, conn, players = room.players.len(), "player left");
        Ok(self.settle(room_id))
    }

    /// Remove a closed connection from every room it belonged to
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Envelope> {
        let ids: Vec<String> = self
            .rooms
            .values()
            .filter(|r| r.contains(conn))
            .map(|r| r.id.clone())
            .collect();
        let mut out = Vec::new();
        for id in ids {
            if let Ok(envelopes) = self.leave(conn, &id) {
                out.extend(envelopes);
            }
        }
        out
    }

    /// Delete the room if it is empty or its game is over, otherwise broadcast the roster
    fn settle(&mut self, room_id: &str) -> Vec<Envelope> {
        let Some(room) = self.rooms.get(room_id) else {
            return Vec::new();
        };
        if room.is_empty() {
            self.rooms.remove(room_id);
            info!(room = %room_id, "room deleted (empty)");
            return Vec::new();
        }
        if room.is_finished() {
            let out = room.broadcast(ServerMessage::GameOver);
            info!(
                room = %room_id,
                active = room.active_count(),
                "room deleted (game finished)"
            );
            self.rooms.remove(room_id);
            return out;
        }
        room.broadcast_view()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_LIMIT, PIECE_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to(out: &[Envelope], conn: ConnectionId) -> Vec<&ServerMessage> {
        out.iter().filter(|e| e.to == conn).map(|e| &e.message).collect()
    }

    fn running(players: &[ConnectionId]) -> RoomRegistry {
        let mut reg = RoomRegistry::with_seed(1, 4, 100);
        reg.create(players[0], "R1".to_string()).unwrap();
        for &p in &players[1..] {
            reg.join(p, "R1").unwrap();
        }
        reg.start(players[0], "R1", Engine::new()).unwrap();
        reg
    }

    #[test]
    fn test_create_duplicate_is_rejected() {
        let mut reg = RoomRegistry::with_seed(1, 4, 100);
        reg.create(1, "R1".to_string()).unwrap();
        let out = reg.handle(
            2,
            ClientMessage::CreateRoom {
                room_id: "R1".to_string(),
            },
        );
        assert!(matches!(out[0].message, ServerMessage::ExistingRoom { .. }));
        assert_eq!(out[0].to, 2);
        assert_eq!(reg.room("R1").unwrap().players.len(), 1);
    }

    #[test]
    fn test_update_on_waiting_room_is_game_over() {
        let mut reg = RoomRegistry::with_seed(1, 4, 100);
        reg.create(1, "R1".to_string()).unwrap();
        let out = reg.update(1, "R1", Engine::new()).unwrap();
        assert_eq!(out, vec![Envelope::new(1, ServerMessage::GameOver)]);
    }

    #[test]
    fn test_update_serves_next_piece_to_reporter_only() {
        let mut reg = running(&[1, 2]);
        let out = reg.update(1, "R1", Engine::new()).unwrap();
        let mine = to(&out, 1);
        assert!(mine
            .iter()
            .any(|m| matches!(m, ServerMessage::NewPiece { .. })));
        assert!(!to(&out, 2)
            .iter()
            .any(|m| matches!(m, ServerMessage::NewPiece { .. })));
        assert_eq!(reg.room("R1").unwrap().player(1).unwrap().cursor, 1);
    }

    #[test]
    fn test_garbage_goes_to_opponents() {
        let mut reg = running(&[1, 2, 3]);
        let mut snapshot = Engine::new();
        snapshot.score = 210;
        let out = reg.update(1, "R1", snapshot).unwrap();
        assert!(to(&out, 2).contains(&&ServerMessage::AddUndestructableLine { count: 2 }));
        assert!(to(&out, 3).contains(&&ServerMessage::AddUndestructableLine { count: 2 }));
        assert!(!to(&out, 1)
            .iter()
            .any(|m| matches!(m, ServerMessage::AddUndestructableLine { .. })));
    }

    #[test]
    fn test_eliminated_player_reports_are_ignored() {
        let mut reg = running(&[1, 2, 3]);
        reg.update(1, "R1", Engine::inactive()).unwrap();
        let out = reg.update(1, "R1", Engine::new()).unwrap();
        assert!(out.is_empty());
        assert!(reg.room("R1").unwrap().player(1).unwrap().game_over);
    }

    #[test]
    fn test_start_on_running_room_is_ignored() {
        let mut reg = running(&[1, 2]);
        reg.update(1, "R1", Engine::new()).unwrap();
        assert!(reg.start(1, "R1", Engine::new()).unwrap().is_empty());
        assert_eq!(reg.room("R1").unwrap().player(1).unwrap().cursor, 1);
    }

    #[test]
    fn test_leaving_last_opponent_ends_game() {
        let mut reg = running(&[1, 2]);
        let out = reg.leave(2, "R1").unwrap();
        assert_eq!(out, vec![Envelope::new(1, ServerMessage::GameOver)]);
        assert!(reg.room("R1").is_none());
    }

    #[test]
    fn test_disconnect_removes_from_every_room() {
        let mut reg = RoomRegistry::with_seed(1, 4, 100);
        reg.create(1, "A".to_string()).unwrap();
        reg.create(1, "B".to_string()).unwrap();
        reg.join(2, "B").unwrap();
        let out = reg.disconnect(1);
        assert!(reg.room("A").is_none());
        let b = reg.room("B").unwrap();
        assert_eq!(b.leader, 2);
        assert!(matches!(to(&out, 2)[0], ServerMessage::RoomUpdate(_)));
    }
}
