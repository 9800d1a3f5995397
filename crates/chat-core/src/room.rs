use std::time::Instant;

use tracing::debug;

use crate::{
    message_store::MessageStore,
    presence::PresenceTracker,
    types::{ChatMessage, TransportEvent},
};

/// What a dispatched event changed, so the owner knows which snapshots to
/// re-emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomChange {
    /// The ordered message list changed.
    pub messages: bool,
    /// Typing roster or name knowledge changed; the derived typing status
    /// may read differently now.
    pub presence: bool,
}

/// Per-room reconciliation state: the message store plus the presence
/// tracker. Owned by the active session and discarded whole on room exit.
#[derive(Debug, Clone)]
pub struct RoomState {
    messages: MessageStore,
    presence: PresenceTracker,
}

impl RoomState {
    /// Create state for a freshly entered room.
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: MessageStore::new(max_messages),
            presence: PresenceTracker::new(),
        }
    }

    pub fn messages(&self) -> &MessageStore {
        &self.messages
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Owned snapshot of the ordered message list.
    pub fn message_snapshot(&self) -> Vec<ChatMessage> {
        self.messages.snapshot()
    }

    /// Single entry point for room-scoped transport events, routed by tag.
    ///
    /// Mutations run to completion before the caller processes the next
    /// event; observation happens before any derived typing text is read in
    /// the same dispatch cycle.
    pub fn apply(&mut self, event: TransportEvent, now: Instant) -> RoomChange {
        match event {
            TransportEvent::History { messages } => {
                let mut presence = false;
                for message in &messages {
                    presence |= self.presence.observe_message(message);
                }
                let inserted = self.messages.apply_history(messages);
                RoomChange {
                    messages: inserted > 0,
                    presence,
                }
            }
            TransportEvent::LiveMessage(message) => {
                let presence = self.presence.observe_message(&message);
                let inserted = self.messages.append_live(message);
                RoomChange {
                    messages: inserted,
                    presence,
                }
            }
            TransportEvent::PresenceRoster { user_ids } => RoomChange {
                messages: false,
                presence: self.presence.set_typing_roster(&user_ids, now),
            },
            // Connection lifecycle belongs to the session controller.
            TransportEvent::ConnectionOpened | TransportEvent::ConnectionClosed => {
                debug!("connection event reached room dispatch; ignoring");
                RoomChange::default()
            }
        }
    }
}
