//! Core client contract shared between the runtime and frontend consumers.
//!
//! This crate defines the command/event protocol, the message
//! reconciliation store, typing presence derivation, the typing debouncer,
//! the session controller, and common error/channel abstractions. The
//! transport itself (socket lifecycle, room server, delivery guarantees) is
//! an external collaborator.

/// Async command/event channel primitives.
pub mod channel;
/// Stable client error types.
pub mod error;
/// Ordered, deduplicated message list for the active room.
pub mod message_store;
/// Room request outcome normalization helpers.
pub mod normalization;
/// Participant nickname map and typing roster derivation.
pub mod presence;
/// Per-room state and the single-entry transport event dispatch.
pub mod room;
/// Connection/room/identity state and action gating.
pub mod session;
/// Typing debouncer state machine.
pub mod typing;
/// Frontend-facing protocol types (commands, events, payloads).
pub mod types;
/// Defensive decoding of raw transport payloads.
pub mod wire;

pub use channel::{ClientChannelError, ClientChannels, EventStream};
pub use error::{ClientError, ClientErrorCategory};
pub use message_store::{MessageKey, MessageStore};
pub use normalization::{RoomRequestOutcome, normalize_room_outcome};
pub use presence::{ParticipantPresence, PresenceTracker};
pub use room::{RoomChange, RoomState};
pub use session::SessionController;
pub use typing::{DEFAULT_INACTIVITY_WINDOW, TypingDebouncer, TypingSignal};
pub use types::{
    ChatMessage, ClientCommand, ClientEvent, DEFAULT_USER_ICON, MAX_NICKNAME_LEN, RoomAck,
    RoomEntry, RoomRequestKind, SessionState, TransportEvent,
};
