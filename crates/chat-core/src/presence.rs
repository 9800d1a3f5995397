use std::collections::HashMap;
use std::time::Instant;

use tracing::trace;

use crate::types::ChatMessage;

/// Presence record for one room participant. Entries are append/update-only;
/// there is no leave-cleanup, the whole tracker is discarded on room exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantPresence {
    /// Stable participant identifier.
    pub participant_id: String,
    /// Display nickname, learned opportunistically from observed messages.
    /// Absent until a message from this participant has been seen.
    pub nickname: Option<String>,
    /// Whether the latest roster broadcast flagged this participant as typing.
    pub is_typing: bool,
    /// When this participant last appeared in a typing roster.
    pub last_typing_signal_at: Option<Instant>,
}

/// Maps participant identifiers to nicknames and derives who-is-typing state
/// from periodic roster broadcasts.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    participants: HashMap<String, ParticipantPresence>,
    // Roster order of the latest broadcast; keeps phrasing deterministic.
    typing_order: Vec<String>,
}

impl PresenceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the author's nickname from an observed message.
    ///
    /// Messages are the only source of nickname learning; there is no
    /// roster event carrying names. Returns `true` when a nickname was
    /// newly learned or changed.
    pub fn observe_message(&mut self, message: &ChatMessage) -> bool {
        let (Some(participant_id), Some(nickname)) =
            (&message.sender_id, &message.sender_nickname)
        else {
            return false;
        };

        let entry = self
            .participants
            .entry(participant_id.clone())
            .or_insert_with(|| ParticipantPresence {
                participant_id: participant_id.clone(),
                nickname: None,
                is_typing: false,
                last_typing_signal_at: None,
            });

        if entry.nickname.as_deref() == Some(nickname) {
            return false;
        }

        trace!(participant_id = %participant_id, nickname = %nickname, "learned nickname");
        entry.nickname = Some(nickname.clone());
        true
    }

    /// Replace the set of currently-typing participants.
    ///
    /// Each broadcast is a full replacement: everyone outside `active_ids`
    /// is cleared, so stale entries from earlier broadcasts never
    /// accumulate. Returns `true` when the roster actually changed.
    pub fn set_typing_roster(&mut self, active_ids: &[String], now: Instant) -> bool {
        let mut order: Vec<String> = Vec::with_capacity(active_ids.len());
        for id in active_ids {
            if !order.contains(id) {
                order.push(id.clone());
            }
        }

        if order == self.typing_order {
            return false;
        }

        for entry in self.participants.values_mut() {
            entry.is_typing = false;
        }
        for id in &order {
            let entry = self
                .participants
                .entry(id.clone())
                .or_insert_with(|| ParticipantPresence {
                    participant_id: id.clone(),
                    nickname: None,
                    is_typing: false,
                    last_typing_signal_at: None,
                });
            entry.is_typing = true;
            entry.last_typing_signal_at = Some(now);
        }

        self.typing_order = order;
        true
    }

    /// Presence record for a participant, if one exists.
    pub fn participant(&self, participant_id: &str) -> Option<&ParticipantPresence> {
        self.participants.get(participant_id)
    }

    /// Human-readable typing status, excluding the local participant.
    ///
    /// Typists with unknown nicknames are still counted: when no nickname is
    /// known the phrase degrades to "Someone is typing…"; in a mixed roster
    /// the first known name fronts the phrase and the rest fold into the
    /// others count.
    pub fn describe_typing(&self, exclude_id: Option<&str>) -> String {
        let others: Vec<&str> = self
            .typing_order
            .iter()
            .map(String::as_str)
            .filter(|id| Some(*id) != exclude_id)
            .collect();

        let names: Vec<&str> = others
            .iter()
            .filter_map(|id| self.participants.get(*id))
            .filter_map(|entry| entry.nickname.as_deref())
            .collect();

        match (others.len(), names.as_slice()) {
            (0, _) => String::new(),
            (_, []) => "Someone is typing…".to_owned(),
            (1, [name]) => format!("{name} is typing…"),
            (2, [first, second]) => format!("{first} and {second} are typing…"),
            (count, [first, ..]) => {
                let rest = count - 1;
                let noun = if rest == 1 { "other" } else { "others" };
                format!("{first} and {rest} {noun} are typing…")
            }
        }
    }
}
