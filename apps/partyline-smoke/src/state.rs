//! Frontend-facing state reducer for `partyline-smoke`.

use chat_core::{ChatMessage, ClientEvent, RoomRequestKind, SessionState};
use tracing::debug;

/// Full UI snapshot derived from the reduced event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSnapshot {
    /// One-line connection/room status.
    pub status_text: String,
    /// Rendered message lines in display order.
    pub lines: Vec<String>,
    /// Typing indicator text, empty when nobody else is typing.
    pub typing_text: String,
    /// Whether the send box should be enabled.
    pub can_send: bool,
    /// Latest user-visible error, if any.
    pub error_text: Option<String>,
}

/// Folds runtime events into renderable snapshots.
#[derive(Debug, Default)]
pub struct UiState {
    session: SessionState,
    messages: Vec<ChatMessage>,
    typing_text: String,
    error_text: Option<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one runtime event.
    pub fn apply(&mut self, event: &ClientEvent) {
        match event {
            ClientEvent::ConnectionChanged { connected } => {
                self.session.connected = *connected;
            }
            ClientEvent::SessionChanged { session } => {
                self.session = session.clone();
            }
            ClientEvent::RoomAck(ack) => match &ack.error_code {
                Some(code) => {
                    let action = match ack.kind {
                        RoomRequestKind::Create => "create room",
                        RoomRequestKind::Join => "join room",
                    };
                    self.error_text = Some(format!("failed to {action}: {code}"));
                }
                None => self.error_text = None,
            },
            ClientEvent::MessagesChanged { messages } => {
                self.messages = messages.clone();
            }
            ClientEvent::TypingChanged { status } => {
                self.typing_text = status.clone();
            }
            ClientEvent::Fault { code, message } => {
                debug!(code = %code, "runtime fault reached the ui");
                self.error_text = Some(format!("{message} ({code})"));
            }
        }
    }

    /// Current snapshot for rendering.
    pub fn snapshot(&self) -> UiSnapshot {
        UiSnapshot {
            status_text: self.status_text(),
            lines: self.messages.iter().map(|m| self.render(m)).collect(),
            typing_text: self.typing_text.clone(),
            can_send: self.session.connected && self.session.in_room,
            error_text: self.error_text.clone(),
        }
    }

    fn status_text(&self) -> String {
        if !self.session.connected {
            return "Connecting…".to_owned();
        }
        match &self.session.room_id {
            Some(room_id) => {
                let host = if self.session.is_host { " (host)" } else { "" };
                format!("Room {room_id} — {}{host}", self.session.nickname)
            }
            None => "Connected".to_owned(),
        }
    }

    fn render(&self, message: &ChatMessage) -> String {
        if message.is_system {
            return format!("• {}", message.system_display());
        }

        let name = message.sender_nickname.as_deref().unwrap_or("?");
        let own = message.sender_id.is_some()
            && message.sender_id == self.session.participant_id;
        if own {
            format!("{name} (you): {}", message.body)
        } else {
            format!("{name}: {}", message.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{RoomAck, SessionState};

    fn in_room_session(participant_id: &str, is_host: bool) -> SessionState {
        SessionState {
            connected: true,
            room_id: Some("room-1".to_owned()),
            nickname: "Alice".to_owned(),
            participant_id: Some(participant_id.to_owned()),
            in_room: true,
            is_host,
            ..SessionState::default()
        }
    }

    fn chat_message(sender_id: &str, nickname: &str, body: &str) -> ChatMessage {
        ChatMessage {
            message_id: Some(format!("m-{sender_id}-{body}")),
            sender_id: Some(sender_id.to_owned()),
            sender_nickname: Some(nickname.to_owned()),
            sender_icon: None,
            body: body.to_owned(),
            timestamp_ms: 1,
            is_system: false,
        }
    }

    #[test]
    fn renders_status_through_the_session_lifecycle() {
        let mut ui = UiState::new();
        assert_eq!(ui.snapshot().status_text, "Connecting…");
        assert!(!ui.snapshot().can_send);

        ui.apply(&ClientEvent::ConnectionChanged { connected: true });
        assert_eq!(ui.snapshot().status_text, "Connected");

        ui.apply(&ClientEvent::SessionChanged {
            session: in_room_session("p-1", true),
        });
        let snapshot = ui.snapshot();
        assert_eq!(snapshot.status_text, "Room room-1 — Alice (host)");
        assert!(snapshot.can_send);
    }

    #[test]
    fn marks_own_messages_and_system_lines() {
        let mut ui = UiState::new();
        ui.apply(&ClientEvent::SessionChanged {
            session: in_room_session("p-1", false),
        });

        let mut join = chat_message("p-2", "Bob", "joined the party");
        join.is_system = true;
        ui.apply(&ClientEvent::MessagesChanged {
            messages: vec![
                join,
                chat_message("p-2", "Bob", "hi"),
                chat_message("p-1", "Alice", "hello"),
            ],
        });

        assert_eq!(
            ui.snapshot().lines,
            vec![
                "• Bob joined the party",
                "Bob: hi",
                "Alice (you): hello",
            ]
        );
    }

    #[test]
    fn room_ack_errors_surface_and_clear() {
        let mut ui = UiState::new();
        ui.apply(&ClientEvent::RoomAck(RoomAck {
            kind: RoomRequestKind::Join,
            room_id: None,
            error_code: Some("room_not_found".to_owned()),
        }));
        assert_eq!(
            ui.snapshot().error_text.as_deref(),
            Some("failed to join room: room_not_found")
        );

        ui.apply(&ClientEvent::RoomAck(RoomAck {
            kind: RoomRequestKind::Join,
            room_id: Some("room-1".to_owned()),
            error_code: None,
        }));
        assert_eq!(ui.snapshot().error_text, None);
    }

    #[test]
    fn typing_text_tracks_the_latest_event() {
        let mut ui = UiState::new();
        ui.apply(&ClientEvent::TypingChanged {
            status: "Bob is typing…".to_owned(),
        });
        assert_eq!(ui.snapshot().typing_text, "Bob is typing…");

        ui.apply(&ClientEvent::TypingChanged {
            status: String::new(),
        });
        assert_eq!(ui.snapshot().typing_text, "");
    }
}
