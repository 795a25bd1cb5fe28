//! Room model - roster, status and the shared piece stream of one room

use blockfall_core::{Engine, Piece, PieceSequencer};

use crate::protocol::{ConnectionId, Envelope, RoomStatus, RoomView, ServerMessage};

/// One member of a room
#[derive(Debug, Clone)]
pub struct Player {
    pub connection: ConnectionId,
    /// Last snapshot the client reported
    pub snapshot: Engine,
    pub game_over: bool,
    /// Index of the piece this player is currently playing
    pub cursor: usize,
    /// Score at the last report, baseline for the garbage delta
    pub previous_score: u32,
}

impl Player {
    /// A member that joined but is not playing yet
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            snapshot: Engine::inactive(),
            game_over: true,
            cursor: 0,
            previous_score: 0,
        }
    }

    fn reset(&mut self, snapshot: &Engine) {
        self.snapshot = snapshot.clone();
        self.game_over = false;
        self.cursor = 0;
        self.previous_score = snapshot.score;
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub leader: ConnectionId,
    pub players: Vec<Player>,
    pub limit: usize,
    pub status: RoomStatus,
    /// Present once the room has been started
    pub sequencer: Option<PieceSequencer>,
    /// Number of players at the last start
    pub contenders: usize,
}

impl Room {
    /// New waiting room with `leader` as its only member
    pub fn new(id: impl Into<String>, leader: ConnectionId, limit: usize) -> Self {
        Self {
            id: id.into(),
            leader,
            players: vec![Player::new(leader)],
            limit,
            status: RoomStatus::Waiting,
            sequencer: None,
            contenders: 0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.players.iter().any(|p| p.connection == connection)
    }

    pub fn player(&self, connection: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.connection == connection)
    }

    pub fn player_mut(&mut self, connection: ConnectionId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.connection == connection)
    }

    pub fn add_player(&mut self, connection: ConnectionId) {
        self.players.push(Player::new(connection));
    }

    /// Remove a member; leadership passes to the first remaining player.
    ///
    /// Returns false if `connection` was not a member.
    pub fn remove_player(&mut self, connection: ConnectionId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.connection != connection);
        if self.players.len() == before {
            return false;
        }
        if self.leader == connection {
            if let Some(first) = self.players.first() {
                self.leader = first.connection;
            }
        }
        true
    }

    /// Number of players still in the running
    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.game_over).count()
    }

    /// Reset every player to `snapshot`, install a fresh sequencer and go in game.
    ///
    /// Returns the first piece of the new sequence.
    pub fn start(&mut self, snapshot: &Engine, mut sequencer: PieceSequencer) -> Piece {
        for player in &mut self.players {
            player.reset(snapshot);
        }
        let first = Piece::spawn(sequencer.piece_at(0));
        self.sequencer = Some(sequencer);
        self.contenders = self.players.len();
        self.status = RoomStatus::InGame;
        first
    }

    /// Advance a player's cursor and return the piece it now points at
    pub fn next_piece(&mut self, connection: ConnectionId) -> Option<Piece> {
        let sequencer = self.sequencer.as_mut()?;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.connection == connection)?;
        player.cursor += 1;
        Some(Piece::spawn(sequencer.piece_at(player.cursor)))
    }

    /// Whether the running game has ended.
    ///
    /// A game started with two or more contenders ends when at most one
    /// player is left; a single-player game ends when that player is out.
    pub fn is_finished(&self) -> bool {
        if self.status != RoomStatus::InGame {
            return false;
        }
        let active = self.active_count();
        active == 0 || (self.contenders >= 2 && active == 1)
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            id: self.id.clone(),
            players: self.players.iter().map(|p| p.snapshot.clone()).collect(),
            limit: self.limit,
            status: self.status,
        }
    }

    /// Address `message` to every member
    pub fn broadcast(&self, message: ServerMessage) -> Vec<Envelope> {
        self.players
            .iter()
            .map(|p| Envelope::new(p.connection, message.clone()))
            .collect()
    }

    pub fn broadcast_view(&self) -> Vec<Envelope> {
        self.broadcast(ServerMessage::RoomUpdate(self.view()))
    }
}
