use serde::{Deserialize, Serialize};

/// Icon used for a participant when none was chosen.
pub const DEFAULT_USER_ICON: &str = "👤";

/// Maximum accepted nickname length, matching the room form limit.
pub const MAX_NICKNAME_LEN: usize = 20;

/// Chat message as delivered by the transport.
///
/// Outbound sends carry only `body`; every other field is populated
/// server-side and echoed back through the inbound live-message event, so
/// all of them are optional except the text and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned message identifier, when the transport provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Stable participant identifier of the author.
    #[serde(rename = "permId", default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    /// Display nickname of the author at send time.
    #[serde(rename = "userNickname", default, skip_serializing_if = "Option::is_none")]
    pub sender_nickname: Option<String>,
    /// Icon of the author at send time.
    #[serde(rename = "userIcon", default, skip_serializing_if = "Option::is_none")]
    pub sender_icon: Option<String>,
    /// Message text body.
    pub body: String,
    /// Server timestamp in milliseconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    /// Whether this is a server-generated membership/system message.
    #[serde(rename = "isSystemMessage", default)]
    pub is_system: bool,
}

impl ChatMessage {
    /// Display text for a system message, with a generic fallback when the
    /// author's nickname is unknown.
    ///
    /// The server sends bare verbs ("left") or verb phrases ("created the
    /// party", "joined the party") and expects the client to prepend the
    /// nickname.
    pub fn system_display(&self) -> String {
        let who = self.sender_nickname.as_deref().unwrap_or("Someone");
        if self.body == "left" {
            format!("{who} left the party")
        } else {
            format!("{who} {}", self.body)
        }
    }
}

/// Identifiers handed back by the transport when a room is entered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntry {
    /// Identifier of the created/joined room.
    pub room_id: String,
    /// The local participant's stable identifier within that room.
    pub participant_id: String,
}

/// Which kind of room request produced an outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoomRequestKind {
    /// `create_room` — the requester becomes host.
    Create,
    /// `join_room` — the requester joins an existing room.
    Join,
}

/// Session snapshot reported to the frontend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    /// Whether the transport has signalled connection readiness.
    pub connected: bool,
    /// Active room identifier; set whenever `in_room` is true.
    pub room_id: Option<String>,
    /// Local display nickname, recorded at room entry.
    pub nickname: String,
    /// Local icon, recorded at room entry.
    pub icon: String,
    /// Local participant identifier, assigned by the transport at room entry.
    pub participant_id: Option<String>,
    /// Whether the session is currently inside a room.
    pub in_room: bool,
    /// Whether the local participant created the active room. Fixed at room
    /// entry and never changes for the life of the session.
    pub is_host: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            connected: false,
            room_id: None,
            nickname: String::new(),
            icon: DEFAULT_USER_ICON.to_owned(),
            participant_id: None,
            in_room: false,
            is_host: false,
        }
    }
}

/// Command channel input accepted by the client runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientCommand {
    /// Create a new room and become its host.
    CreateRoom {
        /// Display nickname for the local participant.
        nickname: String,
        /// Icon for the local participant.
        icon: String,
    },
    /// Join an existing room by identifier.
    JoinRoom {
        /// Display nickname for the local participant.
        nickname: String,
        /// Identifier of the room to join.
        room_id: String,
        /// Icon for the local participant.
        icon: String,
    },
    /// Send a chat message. Only the body goes out; the server populates and
    /// echoes everything else.
    SendMessage {
        /// Message text body.
        body: String,
    },
    /// Report the current contents of the message input field. Drives the
    /// typing debouncer; at most one typing signal is emitted per activity
    /// session.
    InputChanged {
        /// Full current input text (may be empty).
        text: String,
    },
    /// Leave the active room and discard its state.
    LeaveRoom,
}

/// Acknowledgement for room create/join requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomAck {
    /// Which request this acknowledges.
    pub kind: RoomRequestKind,
    /// Room identifier on success.
    pub room_id: Option<String>,
    /// Stable error code on failure.
    pub error_code: Option<String>,
}

/// Event channel output emitted by the client runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientEvent {
    /// Transport connection readiness changed.
    ConnectionChanged {
        /// `true` once the transport reports ready.
        connected: bool,
    },
    /// Session snapshot after a state transition.
    SessionChanged {
        /// Latest session snapshot.
        session: SessionState,
    },
    /// Room create/join acknowledgement.
    RoomAck(RoomAck),
    /// Full replacement of the ordered room message list.
    MessagesChanged {
        /// Messages in non-decreasing timestamp order.
        messages: Vec<ChatMessage>,
    },
    /// Derived typing-indicator text changed.
    TypingChanged {
        /// Human-readable status, empty when nobody else is typing.
        status: String,
    },
    /// Non-fatal runtime fault surfaced to the user.
    Fault {
        /// Stable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
}

/// Inbound transport event after decoding, routed by tag through a single
/// dispatch point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Bulk delivery of previously sent messages.
    History {
        /// History entries, in no guaranteed order.
        messages: Vec<ChatMessage>,
    },
    /// A single live message broadcast.
    LiveMessage(ChatMessage),
    /// Full replacement of the set of currently-typing participants.
    PresenceRoster {
        /// Participant identifiers flagged as typing, in roster order.
        user_ids: Vec<String>,
    },
    /// The transport connection became ready.
    ConnectionOpened,
    /// The transport connection closed.
    ConnectionClosed,
}
