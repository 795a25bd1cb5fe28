//! Garbage relay - turns a player's row clears into penalty lines for opponents
//!
//! Every lock scores a flat bonus plus a fixed amount per cleared row, so the
//! rows cleared since the last report are recovered from the score delta.

use blockfall_core::types::{LINE_CLEAR_POINTS, LOCK_BONUS};

use crate::protocol::{create_garbage, ConnectionId, Envelope};
use crate::room::Room;

/// Garbage lines owed after a score change from `previous` to `current`
///
/// `floor((current - 10 - previous) / 100)`, never negative.
pub fn garbage_lines_owed(previous: u32, current: u32) -> u32 {
    current
        .saturating_sub(previous)
        .saturating_sub(LOCK_BONUS)
        / LINE_CLEAR_POINTS
}

/// Send `lines` garbage lines to every active member except `from`
pub fn relay(room: &Room, from: ConnectionId, lines: u32) -> Vec<Envelope> {
    if lines == 0 {
        return Vec::new();
    }
    room.players
        .iter()
        .filter(|p| p.connection != from && !p.game_over)
        .map(|p| Envelope::new(p.connection, create_garbage(lines)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerMessage;

    #[test]
    fn test_lines_owed() {
        assert_eq!(garbage_lines_owed(110, 310), 2);
        assert_eq!(garbage_lines_owed(0, 10), 0);
        assert_eq!(garbage_lines_owed(0, 110), 1);
        assert_eq!(garbage_lines_owed(50, 460), 4);
        assert_eq!(garbage_lines_owed(300, 200), 0);
    }

    #[test]
    fn test_relay_skips_sender_and_eliminated() {
        let mut room = Room::new("R1", 1, 4);
        room.add_player(2);
        room.add_player(3);
        for p in &mut room.players {
            p.game_over = false;
        }
        room.players[2].game_over = true;

        let out = relay(&room, 1, 3);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, 2);
        assert_eq!(out[0].message, ServerMessage::AddUndestructableLine { count: 3 });
        assert!(relay(&room, 1, 0).is_empty());
    }
}
