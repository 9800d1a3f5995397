use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use chat_core::{
    ChatMessage, RoomEntry,
    wire::{MSG_TYPE_SEND_MESSAGE, MSG_TYPE_TYPING_PRESENCE},
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::{RoomTransport, TransportError, TransportSignal};

const ROOM_CODE_LEN: usize = 8;

#[derive(Debug, Clone)]
struct Member {
    nickname: String,
    icon: String,
    signal_tx: mpsc::UnboundedSender<TransportSignal>,
}

#[derive(Debug, Default)]
struct RoomRecord {
    history: Vec<ChatMessage>,
    members: HashMap<String, Member>,
    // Currently-typing participant ids, in signal arrival order.
    typing: Vec<String>,
}

impl RoomRecord {
    fn broadcast(&self, payload: serde_json::Value) {
        for member in self.members.values() {
            let _ = member
                .signal_tx
                .send(TransportSignal::Message(payload.clone()));
        }
    }

    /// Append a server-populated message to history and broadcast it live.
    fn broadcast_message(&mut self, message: ChatMessage) {
        match serde_json::to_value(&message) {
            Ok(data) => {
                self.history.push(message);
                self.broadcast(json!({ "type": MSG_TYPE_SEND_MESSAGE, "data": data }));
            }
            Err(err) => warn!(error = %err, "failed to encode loopback message"),
        }
    }

    fn broadcast_typing(&self) {
        self.broadcast(json!({
            "type": MSG_TYPE_TYPING_PRESENCE,
            "data": {
                "anyoneTyping": !self.typing.is_empty(),
                "usersTyping": self.typing,
            }
        }));
    }
}

#[derive(Debug, Default)]
struct HubState {
    rooms: HashMap<String, RoomRecord>,
}

/// In-process stand-in for the party server.
///
/// Every [`LoopbackTransport`] connected through one hub shares its rooms:
/// joiners receive the room history as a bulk payload, sends come back as
/// live broadcasts with server-populated fields, and membership changes
/// produce system messages — the same inbound shapes a real connection
/// would deliver.
#[derive(Debug, Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection; readiness is signalled immediately.
    pub fn connect(&self) -> (LoopbackTransport, mpsc::UnboundedReceiver<TransportSignal>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let _ = signal_tx.send(TransportSignal::ConnectionReady);

        let transport = LoopbackTransport {
            state: Arc::clone(&self.state),
            participant_id: format!("p-{}", Uuid::new_v4().simple()),
            signal_tx,
            connected: AtomicBool::new(true),
            current_room: Mutex::new(None),
        };
        (transport, signal_rx)
    }
}

/// One client connection to a [`LoopbackHub`].
#[derive(Debug)]
pub struct LoopbackTransport {
    state: Arc<Mutex<HubState>>,
    participant_id: String,
    signal_tx: mpsc::UnboundedSender<TransportSignal>,
    connected: AtomicBool,
    current_room: Mutex<Option<String>>,
}

impl LoopbackTransport {
    /// The participant id this connection was assigned.
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Simulate a silent socket drop: requests start failing and a close
    /// notification is delivered, but room membership is left as-is.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.signal_tx.send(TransportSignal::ConnectionClosed);
    }

    fn require_connected(&self) -> Result<(), TransportError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, HubState>, TransportError> {
        self.state
            .lock()
            .map_err(|_| TransportError::Rejected("poisoned hub lock".to_owned()))
    }

    fn set_current_room(&self, room_id: Option<String>) -> Result<(), TransportError> {
        let mut guard = self
            .current_room
            .lock()
            .map_err(|_| TransportError::Rejected("poisoned room lock".to_owned()))?;
        *guard = room_id;
        Ok(())
    }

    fn current_room_id(&self) -> Result<Option<String>, TransportError> {
        self.current_room
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| TransportError::Rejected("poisoned room lock".to_owned()))
    }

    fn require_room_id(&self) -> Result<String, TransportError> {
        self.current_room_id()?
            .ok_or_else(|| TransportError::Rejected("not in a room".to_owned()))
    }
}

#[async_trait::async_trait]
impl RoomTransport for LoopbackTransport {
    async fn create_room(&self, nickname: &str, icon: &str) -> Result<RoomEntry, TransportError> {
        self.require_connected()?;
        if self.current_room_id()?.is_some() {
            return Err(TransportError::Rejected("already in a room".to_owned()));
        }

        let mut state = self.lock_state()?;
        let room_id = room_code();

        let mut room = RoomRecord::default();
        room.members.insert(
            self.participant_id.clone(),
            Member {
                nickname: nickname.to_owned(),
                icon: icon.to_owned(),
                signal_tx: self.signal_tx.clone(),
            },
        );
        room.broadcast_message(server_message(
            &self.participant_id,
            nickname,
            icon,
            "created the party",
            true,
        ));
        state.rooms.insert(room_id.clone(), room);
        drop(state);

        self.set_current_room(Some(room_id.clone()))?;
        Ok(RoomEntry {
            room_id,
            participant_id: self.participant_id.clone(),
        })
    }

    async fn join_room(
        &self,
        nickname: &str,
        room_id: &str,
        icon: &str,
    ) -> Result<RoomEntry, TransportError> {
        self.require_connected()?;
        if self.current_room_id()?.is_some() {
            return Err(TransportError::Rejected("already in a room".to_owned()));
        }

        let mut state = self.lock_state()?;
        let room = state
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| TransportError::RoomNotFound(room_id.to_owned()))?;

        // History goes to the joiner first, then the membership message
        // reaches everyone (joiner included) as a live event.
        match serde_json::to_value(&room.history) {
            Ok(entries) => {
                let _ = self
                    .signal_tx
                    .send(TransportSignal::Message(json!({
                        "data": { "messages": entries }
                    })));
            }
            Err(err) => warn!(error = %err, "failed to encode loopback history"),
        }

        room.members.insert(
            self.participant_id.clone(),
            Member {
                nickname: nickname.to_owned(),
                icon: icon.to_owned(),
                signal_tx: self.signal_tx.clone(),
            },
        );
        room.broadcast_message(server_message(
            &self.participant_id,
            nickname,
            icon,
            "joined the party",
            true,
        ));
        drop(state);

        self.set_current_room(Some(room_id.to_owned()))?;
        Ok(RoomEntry {
            room_id: room_id.to_owned(),
            participant_id: self.participant_id.clone(),
        })
    }

    async fn send_message(&self, body: &str) -> Result<(), TransportError> {
        self.require_connected()?;
        let room_id = self.require_room_id()?;

        let mut state = self.lock_state()?;
        let room = state
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| TransportError::RoomNotFound(room_id.clone()))?;
        let member = room
            .members
            .get(&self.participant_id)
            .ok_or_else(|| TransportError::Rejected("not a room member".to_owned()))?;

        let (nickname, icon) = (member.nickname.clone(), member.icon.clone());
        room.broadcast_message(server_message(
            &self.participant_id,
            &nickname,
            &icon,
            body,
            false,
        ));
        Ok(())
    }

    async fn send_typing(&self, typing: bool) -> Result<(), TransportError> {
        self.require_connected()?;
        let room_id = self.require_room_id()?;

        let mut state = self.lock_state()?;
        let room = state
            .rooms
            .get_mut(&room_id)
            .ok_or_else(|| TransportError::RoomNotFound(room_id.clone()))?;

        if typing {
            if !room.typing.contains(&self.participant_id) {
                room.typing.push(self.participant_id.clone());
            }
        } else {
            room.typing.retain(|id| id != &self.participant_id);
        }
        room.broadcast_typing();
        Ok(())
    }

    async fn leave_room(&self) -> Result<(), TransportError> {
        let Some(room_id) = self.current_room_id()? else {
            return Ok(());
        };
        self.set_current_room(None)?;

        let mut state = self.lock_state()?;
        let Some(room) = state.rooms.get_mut(&room_id) else {
            return Ok(());
        };

        let Some(member) = room.members.remove(&self.participant_id) else {
            return Ok(());
        };

        let was_typing = room.typing.iter().any(|id| id == &self.participant_id);
        room.typing.retain(|id| id != &self.participant_id);
        if was_typing {
            room.broadcast_typing();
        }

        room.broadcast_message(server_message(
            &self.participant_id,
            &member.nickname,
            &member.icon,
            "left",
            true,
        ));

        if room.members.is_empty() {
            state.rooms.remove(&room_id);
        }
        Ok(())
    }
}

fn room_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(ROOM_CODE_LEN);
    code
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

fn server_message(
    sender_id: &str,
    nickname: &str,
    icon: &str,
    body: &str,
    is_system: bool,
) -> ChatMessage {
    ChatMessage {
        message_id: Some(format!("m-{}", Uuid::new_v4().simple())),
        sender_id: Some(sender_id.to_owned()),
        sender_nickname: Some(nickname.to_owned()),
        sender_icon: Some(icon.to_owned()),
        body: body.to_owned(),
        timestamp_ms: now_ms(),
        is_system,
    }
}
