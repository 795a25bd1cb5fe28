//! Coordinator runtime.
//!
//! A single task owns the [`RoomRegistry`] and the outbound channel of every
//! connection. Connection tasks forward [`InboundEvent`]s over one bounded
//! queue, so events are processed strictly one at a time.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::protocol::{ClientMessage, ConnectionId, Envelope, ServerMessage};
use crate::registry::RoomRegistry;

/// Event delivered to the coordinator.
#[derive(Debug)]
pub struct InboundEvent {
    pub connection_id: ConnectionId,
    pub payload: InboundPayload,
}

/// Event payload.
#[derive(Debug)]
pub enum InboundPayload {
    /// A connection was accepted; messages for it go to this sender
    Connected(mpsc::UnboundedSender<ServerMessage>),
    Message(ClientMessage),
    /// The connection closed; implicit leave from every room
    Disconnected,
}

/// Registry plus the connection table used to deliver its envelopes.
pub struct Coordinator {
    registry: RoomRegistry,
    clients: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
}

impl Coordinator {
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            registry,
            clients: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Apply one event and deliver everything it produced.
    pub fn handle(&mut self, event: InboundEvent) {
        let conn = event.connection_id;
        let out = match event.payload {
            InboundPayload::Connected(tx) => {
                self.clients.insert(conn, tx);
                return;
            }
            InboundPayload::Message(msg) => self.registry.handle(conn, msg),
            InboundPayload::Disconnected => {
                self.clients.remove(&conn);
                self.registry.disconnect(conn)
            }
        };
        self.deliver(out);
    }

    fn deliver(&self, out: Vec<Envelope>) {
        for Envelope { to, message } in out {
            match self.clients.get(&to) {
                Some(tx) => {
                    // A closed receiver means the connection is going away; its
                    // Disconnected event is already queued.
                    let _ = tx.send(message);
                }
                None => debug!(conn = to, "dropping message for unknown connection"),
            }
        }
    }
}

/// Run the coordinator until every event sender is dropped.
pub async fn run_coordinator(mut coordinator: Coordinator, mut rx: mpsc::Receiver<InboundEvent>) {
    while let Some(event) = rx.recv().await {
        coordinator.handle(event);
    }
    info!(
        rooms = coordinator.registry().room_count(),
        "coordinator stopped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(c: &mut Coordinator, id: ConnectionId) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        c.handle(InboundEvent {
            connection_id: id,
            payload: InboundPayload::Connected(tx),
        });
        rx
    }

    fn send(c: &mut Coordinator, id: ConnectionId, msg: ClientMessage) {
        c.handle(InboundEvent {
            connection_id: id,
            payload: InboundPayload::Message(msg),
        });
    }

    #[test]
    fn test_roster_reaches_every_member() {
        let mut c = Coordinator::new(RoomRegistry::with_seed(3, 4, 100));
        let mut a = connect(&mut c, 1);
        let mut b = connect(&mut c, 2);
        send(
            &mut c,
            1,
            ClientMessage::CreateRoom {
                room_id: "R1".to_string(),
            },
        );
        send(
            &mut c,
            2,
            ClientMessage::JoinRoom {
                room_id: "R1".to_string(),
            },
        );

        assert!(matches!(a.try_recv(), Ok(ServerMessage::RoomUpdate(v)) if v.players.len() == 1));
        assert!(matches!(a.try_recv(), Ok(ServerMessage::RoomUpdate(v)) if v.players.len() == 2));
        assert!(matches!(b.try_recv(), Ok(ServerMessage::RoomUpdate(v)) if v.players.len() == 2));
    }

    #[test]
    fn test_disconnect_notifies_remaining_members() {
        let mut c = Coordinator::new(RoomRegistry::with_seed(3, 4, 100));
        let _a = connect(&mut c, 1);
        let mut b = connect(&mut c, 2);
        send(
            &mut c,
            1,
            ClientMessage::CreateRoom {
                room_id: "R1".to_string(),
            },
        );
        send(
            &mut c,
            2,
            ClientMessage::JoinRoom {
                room_id: "R1".to_string(),
            },
        );
        while b.try_recv().is_ok() {}

        c.handle(InboundEvent {
            connection_id: 1,
            payload: InboundPayload::Disconnected,
        });
        match b.try_recv() {
            Ok(ServerMessage::RoomUpdate(v)) => assert_eq!(v.players.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(c.registry().room("R1").map(|r| r.leader), Some(2));
    }
}
