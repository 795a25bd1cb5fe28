//! Protocol module - JSON message types for the room server
//!
//! Line-delimited JSON: one object per `\n`-terminated line, discriminated by
//! a `"type"` field. Inbound lines are validated into [`ClientMessage`] at the
//! connection boundary; nothing past that point sees raw JSON.

use serde::{Deserialize, Serialize};

use blockfall_core::{Engine, Piece};

/// Server-assigned id of one TCP connection
pub type ConnectionId = u64;

// ============== Client -> Server Messages ==============

/// Every message a client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    /// Start the room; `snapshot` becomes every player's initial state
    StartGame {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(default)]
        snapshot: Option<Engine>,
    },
    /// Report the local engine after a lock or an elimination
    UpdateGameEngine {
        #[serde(rename = "roomId")]
        room_id: String,
        snapshot: Engine,
    },
    LeaveRoom {
        #[serde(rename = "roomId")]
        room_id: String,
    },
}

impl ClientMessage {
    pub fn room_id(&self) -> &str {
        match self {
            ClientMessage::CreateRoom { room_id }
            | ClientMessage::JoinRoom { room_id }
            | ClientMessage::StartGame { room_id, .. }
            | ClientMessage::UpdateGameEngine { room_id, .. }
            | ClientMessage::LeaveRoom { room_id } => room_id,
        }
    }
}

const CLIENT_MESSAGE_TYPES: [&str; 5] = [
    "createRoom",
    "joinRoom",
    "startGame",
    "updateGameEngine",
    "leaveRoom",
];

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InGame,
}

/// Full roster broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub id: String,
    /// Last reported snapshot of each player, in roster order
    pub players: Vec<Engine>,
    pub limit: usize,
    pub status: RoomStatus,
}

/// Every message the server may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "welcome")]
    Welcome {
        #[serde(rename = "connectionId")]
        connection_id: ConnectionId,
    },
    #[serde(rename = "roomUpdate")]
    RoomUpdate(RoomView),
    #[serde(rename = "newPiece")]
    NewPiece { piece: Piece },
    #[serde(rename = "add_undestructable_line")]
    AddUndestructableLine { count: u32 },
    #[serde(rename = "gameOver")]
    GameOver,
    #[serde(rename = "unknownRoomId")]
    UnknownRoomId { message: String },
    #[serde(rename = "existingRoom")]
    ExistingRoom { message: String },
    #[serde(rename = "fullRoom")]
    FullRoom { message: String },
    #[serde(rename = "invalidMessage")]
    InvalidMessage { message: String },
}

/// A message addressed to one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

impl Envelope {
    pub fn new(to: ConnectionId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

// ============== Errors ==============

/// A line that failed boundary validation
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("message exceeds {0} bytes")]
    TooLong(usize),
    #[error("message is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

// ============== Message Parsing ==============

/// Parse one inbound line
pub fn parse_message(json: &str) -> Result<ClientMessage, ProtocolError> {
    match serde_json::from_str::<ClientMessage>(json) {
        Ok(msg) => Ok(msg),
        Err(e) => {
            // Tell a well-formed message of an unsupported type apart from a broken one.
            #[derive(Debug, Deserialize)]
            struct TypeOnly {
                #[serde(rename = "type")]
                msg_type: Option<String>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or_else(|| "unknown".to_string());
            if CLIENT_MESSAGE_TYPES.contains(&msg_type.as_str()) {
                Err(ProtocolError::Malformed(e))
            } else {
                Err(ProtocolError::UnknownType(msg_type))
            }
        }
    }
}

// ============== Utility Functions ==============

pub fn create_welcome(connection_id: ConnectionId) -> ServerMessage {
    ServerMessage::Welcome { connection_id }
}

pub fn create_new_piece(piece: Piece) -> ServerMessage {
    ServerMessage::NewPiece { piece }
}

pub fn create_garbage(count: u32) -> ServerMessage {
    ServerMessage::AddUndestructableLine { count }
}

pub fn create_invalid(err: &ProtocolError) -> ServerMessage {
    ServerMessage::InvalidMessage {
        message: err.to_string(),
    }
}
