use std::collections::HashSet;

use tracing::warn;
use uuid::Uuid;

use crate::types::ChatMessage;

/// Dedup key for a message within a room.
///
/// Some transport paths omit the explicit message identifier, so the key
/// falls back to the `(sender, timestamp, body)` triple. An entry missing
/// both gets a generated key: it is kept and displayed, but can no longer be
/// matched against a later re-delivery of itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Explicit server-assigned message identifier.
    Id(String),
    /// Fallback triple for identifier-less messages.
    Triple {
        sender_id: String,
        timestamp_ms: u64,
        body: String,
    },
    /// Generated key for entries with no usable identity at all.
    Generated(Uuid),
}

impl MessageKey {
    /// Derive the stable key for a message.
    pub fn for_message(message: &ChatMessage) -> Self {
        if let Some(id) = &message.message_id {
            return Self::Id(id.clone());
        }
        if let Some(sender_id) = &message.sender_id {
            return Self::Triple {
                sender_id: sender_id.clone(),
                timestamp_ms: message.timestamp_ms,
                body: message.body.clone(),
            };
        }

        warn!(
            timestamp_ms = message.timestamp_ms,
            "message has neither an id nor fallback key fields; assigning a generated key"
        );
        Self::Generated(Uuid::new_v4())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: MessageKey,
    message: ChatMessage,
}

/// Ordered, deduplicated message list for the active room, with bounded
/// retention (oldest entries are trimmed first).
///
/// Consumers observe messages in non-decreasing timestamp order after every
/// mutation; equal timestamps keep arrival order.
#[derive(Debug, Clone)]
pub struct MessageStore {
    entries: Vec<Entry>,
    max_items: usize,
}

impl MessageStore {
    /// Create a store with an item cap (`max_items >= 1`).
    pub fn new(max_items: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_items: max_items.max(1),
        }
    }

    /// Current messages in display order.
    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().map(|entry| &entry.message)
    }

    /// Owned snapshot of the current messages, for event emission.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages().cloned().collect()
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no messages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a bulk history batch into the list.
    ///
    /// Idempotent: entries whose key is already present are skipped, so
    /// re-delivery of the same batch never duplicates or reorders. Returns
    /// the number of newly inserted messages.
    pub fn apply_history(&mut self, batch: Vec<ChatMessage>) -> usize {
        let mut seen: HashSet<MessageKey> =
            self.entries.iter().map(|entry| entry.key.clone()).collect();

        let mut inserted = 0;
        for message in batch {
            let key = MessageKey::for_message(&message);
            if !seen.insert(key.clone()) {
                continue;
            }
            self.entries.push(Entry { key, message });
            inserted += 1;
        }

        if inserted > 0 {
            // Stable sort: ties keep arrival order, existing entries stay put.
            self.entries
                .sort_by_key(|entry| entry.message.timestamp_ms);
            self.trim_to_max();
        }

        inserted
    }

    /// Append a single live message.
    ///
    /// The transport delivers live events at most once, but the same dedup
    /// key is applied defensively so a history batch covering an overlapping
    /// time range can never produce a duplicate regardless of arrival order.
    /// Returns `true` when the message was inserted.
    pub fn append_live(&mut self, message: ChatMessage) -> bool {
        let key = MessageKey::for_message(&message);
        if self.entries.iter().any(|entry| entry.key == key) {
            return false;
        }

        // Insert after any existing entry with an equal timestamp.
        let position = self
            .entries
            .partition_point(|entry| entry.message.timestamp_ms <= message.timestamp_ms);
        self.entries.insert(position, Entry { key, message });
        self.trim_to_max();
        true
    }

    /// Drop all messages, for room exit.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn trim_to_max(&mut self) {
        if self.entries.len() <= self.max_items {
            return;
        }

        let excess = self.entries.len() - self.max_items;
        self.entries.drain(0..excess);
    }
}
