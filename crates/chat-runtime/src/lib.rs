//! Runtime gluing the client core to a room transport.
//!
//! The transport (socket lifecycle, room server, delivery guarantees) sits
//! behind the [`RoomTransport`] trait. The runtime consumes frontend
//! commands, decodes raw transport payloads, routes them through the core's
//! single-entry dispatch, and drives the typing inactivity timer.

/// In-process transport that simulates the party server.
pub mod loopback;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use chat_core::{
    ClientChannels, ClientCommand, ClientError, ClientErrorCategory, ClientEvent, EventStream,
    RoomEntry, RoomRequestKind, RoomRequestOutcome, RoomState, SessionController, TransportEvent,
    TypingDebouncer, TypingSignal, normalize_room_outcome, wire,
};
use serde_json::Value;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

pub use loopback::{LoopbackHub, LoopbackTransport};

const COMMAND_BUFFER: usize = 128;
const EVENT_BUFFER: usize = 512;
const TICK_BUFFER: usize = 8;

/// Default cap on retained room messages.
pub const DEFAULT_HISTORY_MAX_ITEMS: usize = 1_200;

/// Raw notification delivered by a transport connection.
#[derive(Debug, Clone)]
pub enum TransportSignal {
    /// The connection is open and ready for requests.
    ConnectionReady,
    /// The connection closed.
    ConnectionClosed,
    /// An inbound message payload, undecoded.
    Message(Value),
}

/// Errors surfaced by transport requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection is not ready for requests.
    #[error("transport connection is not ready")]
    NotConnected,
    /// The requested room does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(String),
    /// The transport rejected the request.
    #[error("transport rejected the request: {0}")]
    Rejected(String),
}

/// Seam to the external messaging library.
///
/// Outbound message sends carry only the body; the server populates author,
/// identifiers, and timestamps and echoes the message back through the
/// signal stream. Room entry resolves to the identifiers the client needs
/// to exclude itself from typing rosters.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Create a room; the caller becomes host.
    async fn create_room(&self, nickname: &str, icon: &str) -> Result<RoomEntry, TransportError>;

    /// Join an existing room.
    async fn join_room(
        &self,
        nickname: &str,
        room_id: &str,
        icon: &str,
    ) -> Result<RoomEntry, TransportError>;

    /// Send a chat message body.
    async fn send_message(&self, body: &str) -> Result<(), TransportError>;

    /// Send a typing presence signal.
    async fn send_typing(&self, typing: bool) -> Result<(), TransportError>;

    /// Leave the current room.
    async fn leave_room(&self) -> Result<(), TransportError>;
}

fn map_transport_error(err: TransportError) -> ClientError {
    match err {
        TransportError::NotConnected => ClientError::not_ready("transport request"),
        TransportError::RoomNotFound(room_id) => ClientError::new(
            ClientErrorCategory::Request,
            "room_not_found",
            format!("room not found: {room_id}"),
        ),
        TransportError::Rejected(message) => {
            ClientError::new(ClientErrorCategory::Request, "request_rejected", message)
        }
    }
}

/// Runtime tuning values.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Typing inactivity window.
    pub typing_window: Duration,
    /// Cap on retained room messages.
    pub history_max_items: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            typing_window: chat_core::DEFAULT_INACTIVITY_WINDOW,
            history_max_items: DEFAULT_HISTORY_MAX_ITEMS,
        }
    }
}

/// Handle used by frontends to drive a spawned runtime.
#[derive(Clone, Debug)]
pub struct RuntimeHandle {
    channels: ClientChannels,
}

impl RuntimeHandle {
    /// Send one command to the runtime.
    pub async fn send(&self, command: ClientCommand) -> Result<(), chat_core::ClientChannelError> {
        self.channels.send_command(command).await
    }

    /// Subscribe to emitted client events.
    pub fn subscribe(&self) -> EventStream {
        self.channels.subscribe()
    }
}

/// Spawn the runtime task for one transport connection.
pub fn spawn_runtime(
    transport: Arc<dyn RoomTransport>,
    signals: mpsc::UnboundedReceiver<TransportSignal>,
    config: RuntimeConfig,
) -> RuntimeHandle {
    let (channels, command_rx) = ClientChannels::new(COMMAND_BUFFER, EVENT_BUFFER);
    let runtime = ChatRuntime::new(channels.clone(), command_rx, signals, transport, config);
    tokio::spawn(async move {
        runtime.run().await;
    });

    RuntimeHandle { channels }
}

struct TypingTimer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    deadline: Instant,
}

enum Step {
    Command(Option<ClientCommand>),
    Signal(Option<TransportSignal>),
    Tick(Option<Instant>),
}

struct ChatRuntime {
    channels: ClientChannels,
    command_rx: mpsc::Receiver<ClientCommand>,
    signal_rx: mpsc::UnboundedReceiver<TransportSignal>,
    tick_tx: mpsc::Sender<Instant>,
    tick_rx: mpsc::Receiver<Instant>,
    transport: Arc<dyn RoomTransport>,
    session: SessionController,
    room: Option<RoomState>,
    debouncer: TypingDebouncer,
    typing_timer: Option<TypingTimer>,
    last_typing_status: String,
    config: RuntimeConfig,
}

impl ChatRuntime {
    fn new(
        channels: ClientChannels,
        command_rx: mpsc::Receiver<ClientCommand>,
        signal_rx: mpsc::UnboundedReceiver<TransportSignal>,
        transport: Arc<dyn RoomTransport>,
        config: RuntimeConfig,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::channel(TICK_BUFFER);
        Self {
            channels,
            command_rx,
            signal_rx,
            tick_tx,
            tick_rx,
            transport,
            session: SessionController::default(),
            room: None,
            debouncer: TypingDebouncer::new(config.typing_window),
            typing_timer: None,
            last_typing_status: String::new(),
            config,
        }
    }

    async fn run(mut self) {
        loop {
            let step = tokio::select! {
                maybe_command = self.command_rx.recv() => Step::Command(maybe_command),
                maybe_signal = self.signal_rx.recv() => Step::Signal(maybe_signal),
                maybe_tick = self.tick_rx.recv() => Step::Tick(maybe_tick),
            };

            match step {
                Step::Command(Some(command)) => self.handle_command(command).await,
                Step::Signal(Some(signal)) => self.handle_signal(signal),
                Step::Tick(Some(deadline)) => self.handle_typing_tick(deadline).await,
                Step::Command(None) | Step::Signal(None) => break,
                // The runtime holds its own tick sender; None here only
                // happens at shutdown.
                Step::Tick(None) => break,
            }
        }

        self.cancel_typing_timer().await;
    }

    async fn handle_command(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::CreateRoom { nickname, icon } => {
                self.handle_room_request(RoomRequestKind::Create, nickname, icon, None)
                    .await;
            }
            ClientCommand::JoinRoom {
                nickname,
                room_id,
                icon,
            } => {
                self.handle_room_request(RoomRequestKind::Join, nickname, icon, Some(room_id))
                    .await;
            }
            ClientCommand::SendMessage { body } => self.handle_send_message(body).await,
            ClientCommand::InputChanged { text } => self.handle_input_changed(text).await,
            ClientCommand::LeaveRoom => self.handle_leave_room().await,
        }
    }

    async fn handle_room_request(
        &mut self,
        kind: RoomRequestKind,
        nickname: String,
        icon: String,
        room_id: Option<String>,
    ) {
        let nickname = nickname.trim().to_owned();
        let room_id = room_id.map(|id| id.trim().to_owned());

        if let Err(error) =
            self.session
                .begin_room_request(kind, &nickname, &icon, room_id.as_deref())
        {
            self.channels
                .emit(normalize_room_outcome(kind, RoomRequestOutcome::Failure {
                    error,
                }));
            return;
        }

        let result = match kind {
            RoomRequestKind::Create => self.transport.create_room(&nickname, &icon).await,
            RoomRequestKind::Join => {
                let room_id = room_id.unwrap_or_default();
                self.transport.join_room(&nickname, &room_id, &icon).await
            }
        };

        match result {
            Ok(entry) => {
                if let Err(error) = self.session.complete_room_request(entry.clone()) {
                    self.channels.emit(ClientEvent::Fault {
                        code: error.code,
                        message: error.message,
                    });
                    return;
                }

                self.room = Some(RoomState::new(self.config.history_max_items));
                self.last_typing_status.clear();
                self.channels
                    .emit(normalize_room_outcome(kind, RoomRequestOutcome::Success {
                        entry,
                    }));
                self.emit_session();
            }
            Err(err) => {
                self.session.fail_room_request();
                self.channels
                    .emit(normalize_room_outcome(kind, RoomRequestOutcome::Failure {
                        error: map_transport_error(err),
                    }));
            }
        }
    }

    async fn handle_send_message(&mut self, body: String) {
        let body = body.trim().to_owned();
        if body.is_empty() {
            debug!("ignoring empty message submit");
            return;
        }
        if !self.session.can_send() {
            // Blocked at the boundary; not surfaced as a system error.
            debug!("cannot send: not connected or not in a room");
            return;
        }

        if let Err(err) = self.transport.send_message(&body).await {
            let mapped = map_transport_error(err);
            self.channels.emit(ClientEvent::Fault {
                code: mapped.code,
                message: mapped.message,
            });
        }

        let signal = self.debouncer.message_submitted();
        self.sync_typing_timer().await;
        if let Some(signal) = signal {
            self.send_typing_signal(signal).await;
        }
    }

    async fn handle_input_changed(&mut self, text: String) {
        if !self.session.in_room() {
            trace!("input change outside a room; ignoring");
            return;
        }

        let signal = self.debouncer.input_changed(&text, Instant::now());
        self.sync_typing_timer().await;
        if let Some(signal) = signal {
            self.send_typing_signal(signal).await;
        }
    }

    async fn handle_leave_room(&mut self) {
        if !self.session.leave_room() {
            debug!("leave requested outside a room; ignoring");
            return;
        }

        // The session is ending: cancel any pending inactivity timer without
        // emitting a final typing=false.
        self.debouncer.reset();
        self.cancel_typing_timer().await;
        self.room = None;

        if let Err(err) = self.transport.leave_room().await {
            warn!(error = %err, "leave notification failed");
        }

        self.emit_session();
        self.channels.emit(ClientEvent::MessagesChanged {
            messages: Vec::new(),
        });
        self.emit_typing_if_changed();
    }

    fn handle_signal(&mut self, signal: TransportSignal) {
        match signal {
            TransportSignal::ConnectionReady => self.dispatch(TransportEvent::ConnectionOpened),
            TransportSignal::ConnectionClosed => self.dispatch(TransportEvent::ConnectionClosed),
            TransportSignal::Message(payload) => {
                match wire::decode_transport_payload(&payload) {
                    Ok(Some(event)) => self.dispatch(event),
                    Ok(None) => trace!("ignoring unhandled transport payload"),
                    Err(err) => warn!(code = %err.code, "dropping malformed transport payload"),
                }
            }
        }
    }

    /// Single entry point for decoded transport events, routed by tag.
    fn dispatch(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ConnectionOpened => {
                if self.session.set_connected(true) {
                    self.channels
                        .emit(ClientEvent::ConnectionChanged { connected: true });
                    self.emit_session();
                }
            }
            TransportEvent::ConnectionClosed => {
                if self.session.set_connected(false) {
                    self.channels
                        .emit(ClientEvent::ConnectionChanged { connected: false });
                    self.emit_session();
                }
            }
            room_event => {
                let change = match self.room.as_mut() {
                    Some(room) => room.apply(room_event, Instant::now()),
                    None => {
                        debug!("dropping room event outside an active room");
                        return;
                    }
                };

                if change.messages {
                    let messages = self
                        .room
                        .as_ref()
                        .map(RoomState::message_snapshot)
                        .unwrap_or_default();
                    self.channels.emit(ClientEvent::MessagesChanged { messages });
                }
                if change.presence {
                    self.emit_typing_if_changed();
                }
            }
        }
    }

    async fn handle_typing_tick(&mut self, fired_deadline: Instant) {
        let signal = self.debouncer.tick(fired_deadline);
        if self.debouncer.deadline().is_none() {
            self.cancel_typing_timer().await;
        }
        if let Some(signal) = signal {
            self.send_typing_signal(signal).await;
        }
    }

    async fn send_typing_signal(&mut self, signal: TypingSignal) {
        let typing = signal == TypingSignal::Started;
        if let Err(err) = self.transport.send_typing(typing).await {
            warn!(error = %err, typing, "typing signal failed");
        }
    }

    /// Keep the armed timer aligned with the debouncer's deadline; a
    /// superseded timer is cancelled, not merely ignored.
    async fn sync_typing_timer(&mut self) {
        match self.debouncer.deadline() {
            Some(deadline) => {
                if self.typing_timer.as_ref().map(|timer| timer.deadline) != Some(deadline) {
                    self.arm_typing_timer(deadline).await;
                }
            }
            None => self.cancel_typing_timer().await,
        }
    }

    async fn arm_typing_timer(&mut self, deadline: Instant) {
        self.cancel_typing_timer().await;

        let cancel = CancellationToken::new();
        let stop = cancel.child_token();
        let tick_tx = self.tick_tx.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = stop.cancelled() => {}
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                    let _ = tick_tx.send(deadline).await;
                }
            }
        });

        self.typing_timer = Some(TypingTimer {
            cancel,
            task,
            deadline,
        });
    }

    async fn cancel_typing_timer(&mut self) {
        if let Some(timer) = self.typing_timer.take() {
            timer.cancel.cancel();
            let _ = timer.task.await;
        }
    }

    fn emit_session(&self) {
        self.channels.emit(ClientEvent::SessionChanged {
            session: self.session.snapshot(),
        });
    }

    fn emit_typing_if_changed(&mut self) {
        let status = match &self.room {
            Some(room) => room.presence().describe_typing(self.session.participant_id()),
            None => String::new(),
        };

        if status != self.last_typing_status {
            self.last_typing_status = status.clone();
            self.channels.emit(ClientEvent::TypingChanged { status });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{DEFAULT_USER_ICON, RoomAck};
    use tokio::time::timeout;

    const EVENT_WAIT: Duration = Duration::from_secs(2);

    fn test_config() -> RuntimeConfig {
        RuntimeConfig {
            typing_window: Duration::from_millis(50),
            history_max_items: 100,
        }
    }

    fn spawn_client(hub: &LoopbackHub, config: RuntimeConfig) -> RuntimeHandle {
        let (transport, signals) = hub.connect();
        spawn_runtime(Arc::new(transport), signals, config)
    }

    async fn wait_for<F, T>(events: &mut EventStream, mut pick: F) -> T
    where
        F: FnMut(ClientEvent) -> Option<T>,
    {
        loop {
            let event = timeout(EVENT_WAIT, events.recv())
                .await
                .expect("event timeout")
                .expect("event receive");
            if let Some(found) = pick(event) {
                return found;
            }
        }
    }

    async fn wait_for_ack(events: &mut EventStream) -> RoomAck {
        wait_for(events, |event| match event {
            ClientEvent::RoomAck(ack) => Some(ack),
            _ => None,
        })
        .await
    }

    async fn enter_room(
        handle: &RuntimeHandle,
        events: &mut EventStream,
        command: ClientCommand,
    ) -> RoomAck {
        wait_for(events, |event| match event {
            ClientEvent::ConnectionChanged { connected: true } => Some(()),
            _ => None,
        })
        .await;

        handle.send(command).await.expect("command should enqueue");
        wait_for_ack(events).await
    }

    #[tokio::test]
    async fn create_room_acks_and_reports_host_session() {
        let hub = LoopbackHub::new();
        let handle = spawn_client(&hub, test_config());
        let mut events = handle.subscribe();

        let ack = enter_room(
            &handle,
            &mut events,
            ClientCommand::CreateRoom {
                nickname: "Alice".into(),
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;
        assert_eq!(ack.kind, RoomRequestKind::Create);
        assert!(ack.room_id.is_some());
        assert_eq!(ack.error_code, None);

        let session = wait_for(&mut events, |event| match event {
            ClientEvent::SessionChanged { session } if session.in_room => Some(session),
            _ => None,
        })
        .await;
        assert!(session.is_host);
        assert_eq!(session.nickname, "Alice");

        // The server-side membership message arrives as a live event.
        let messages = wait_for(&mut events, |event| match event {
            ClientEvent::MessagesChanged { messages } => Some(messages),
            _ => None,
        })
        .await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_system);
        assert_eq!(messages[0].system_display(), "Alice created the party");
    }

    #[tokio::test]
    async fn validation_failures_ack_without_touching_the_session() {
        let hub = LoopbackHub::new();
        let handle = spawn_client(&hub, test_config());
        let mut events = handle.subscribe();

        let ack = enter_room(
            &handle,
            &mut events,
            ClientCommand::JoinRoom {
                nickname: "Bob".into(),
                room_id: "   ".into(),
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;
        assert_eq!(ack.error_code.as_deref(), Some("empty_room_id"));

        // The form stays usable: a corrected request succeeds or fails on
        // its own merits (here: unknown room).
        handle
            .send(ClientCommand::JoinRoom {
                nickname: "Bob".into(),
                room_id: "nope".into(),
                icon: DEFAULT_USER_ICON.into(),
            })
            .await
            .expect("command should enqueue");
        let ack = wait_for_ack(&mut events).await;
        assert_eq!(ack.error_code.as_deref(), Some("room_not_found"));
    }

    #[tokio::test]
    async fn messages_flow_between_participants() {
        let hub = LoopbackHub::new();
        let host = spawn_client(&hub, test_config());
        let guest = spawn_client(&hub, test_config());
        let mut host_events = host.subscribe();
        let mut guest_events = guest.subscribe();

        let ack = enter_room(
            &host,
            &mut host_events,
            ClientCommand::CreateRoom {
                nickname: "Alice".into(),
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;
        let room_id = ack.room_id.expect("create should return a room id");

        let ack = enter_room(
            &guest,
            &mut guest_events,
            ClientCommand::JoinRoom {
                nickname: "Bob".into(),
                room_id,
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;
        assert_eq!(ack.error_code, None);

        guest
            .send(ClientCommand::SendMessage {
                body: "hello from Bob".into(),
            })
            .await
            .expect("command should enqueue");

        let messages = wait_for(&mut host_events, |event| match event {
            ClientEvent::MessagesChanged { messages }
                if messages.iter().any(|m| m.body == "hello from Bob") =>
            {
                Some(messages)
            }
            _ => None,
        })
        .await;

        // Join history + membership messages + chat message, ordered.
        let timestamps: Vec<u64> = messages.iter().map(|m| m.timestamp_ms).collect();
        let mut sorted = timestamps.clone();
        sorted.sort_unstable();
        assert_eq!(timestamps, sorted);

        let last = messages.last().expect("at least one message");
        assert_eq!(last.sender_nickname.as_deref(), Some("Bob"));
        assert!(!last.is_system);
    }

    #[tokio::test]
    async fn typing_indicator_resolves_names_and_clears_after_the_window() {
        let hub = LoopbackHub::new();
        let host = spawn_client(&hub, test_config());
        let guest = spawn_client(&hub, test_config());
        let mut host_events = host.subscribe();
        let mut guest_events = guest.subscribe();

        let ack = enter_room(
            &host,
            &mut host_events,
            ClientCommand::CreateRoom {
                nickname: "Alice".into(),
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;
        let room_id = ack.room_id.expect("create should return a room id");

        enter_room(
            &guest,
            &mut guest_events,
            ClientCommand::JoinRoom {
                nickname: "Bob".into(),
                room_id,
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;

        guest
            .send(ClientCommand::InputChanged { text: "h".into() })
            .await
            .expect("command should enqueue");

        // Bob's nickname is already known from his join membership message.
        let status = wait_for(&mut host_events, |event| match event {
            ClientEvent::TypingChanged { status } if !status.is_empty() => Some(status),
            _ => None,
        })
        .await;
        assert_eq!(status, "Bob is typing…");

        // No further input: the inactivity window elapses and the roster
        // clears without another keystroke.
        let status = wait_for(&mut host_events, |event| match event {
            ClientEvent::TypingChanged { status } if status.is_empty() => Some(status),
            _ => None,
        })
        .await;
        assert_eq!(status, "");
    }

    #[tokio::test]
    async fn local_typist_is_excluded_from_own_status() {
        let hub = LoopbackHub::new();
        let host = spawn_client(&hub, test_config());
        let mut host_events = host.subscribe();

        enter_room(
            &host,
            &mut host_events,
            ClientCommand::CreateRoom {
                nickname: "Alice".into(),
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;

        host.send(ClientCommand::InputChanged { text: "h".into() })
            .await
            .expect("command should enqueue");
        host.send(ClientCommand::SendMessage { body: "h".into() })
            .await
            .expect("command should enqueue");

        // The roster broadcast for the local typist comes back around, but
        // the derived status must stay empty; the send itself lands.
        let messages = wait_for(&mut host_events, |event| match event {
            ClientEvent::MessagesChanged { messages }
                if messages.iter().any(|m| m.body == "h") =>
            {
                Some(messages)
            }
            _ => None,
        })
        .await;
        assert!(messages.iter().any(|m| !m.is_system));

        let mut probe = host.subscribe();
        host.send(ClientCommand::LeaveRoom)
            .await
            .expect("command should enqueue");
        // Drain until the leave empties the list; no non-empty typing status
        // may have been emitted in between.
        loop {
            let event = timeout(EVENT_WAIT, probe.recv())
                .await
                .expect("event timeout")
                .expect("event receive");
            match event {
                ClientEvent::TypingChanged { status } => assert_eq!(status, ""),
                ClientEvent::MessagesChanged { messages } if messages.is_empty() => break,
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn leaving_discards_room_state() {
        let hub = LoopbackHub::new();
        let handle = spawn_client(&hub, test_config());
        let mut events = handle.subscribe();

        enter_room(
            &handle,
            &mut events,
            ClientCommand::CreateRoom {
                nickname: "Alice".into(),
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;

        handle
            .send(ClientCommand::LeaveRoom)
            .await
            .expect("command should enqueue");

        let session = wait_for(&mut events, |event| match event {
            ClientEvent::SessionChanged { session } if !session.in_room => Some(session),
            _ => None,
        })
        .await;
        assert_eq!(session.room_id, None);
        assert!(!session.is_host);

        let messages = wait_for(&mut events, |event| match event {
            ClientEvent::MessagesChanged { messages } => Some(messages),
            _ => None,
        })
        .await;
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn history_and_live_overlap_never_duplicates() {
        // Drive the dispatch path directly with a raw transport: a live
        // message followed by a history batch covering it.
        struct NullTransport;

        #[async_trait]
        impl RoomTransport for NullTransport {
            async fn create_room(
                &self,
                _nickname: &str,
                _icon: &str,
            ) -> Result<RoomEntry, TransportError> {
                Ok(RoomEntry {
                    room_id: "room-1".into(),
                    participant_id: "p-local".into(),
                })
            }

            async fn join_room(
                &self,
                _nickname: &str,
                _room_id: &str,
                _icon: &str,
            ) -> Result<RoomEntry, TransportError> {
                Err(TransportError::Rejected("unused".into()))
            }

            async fn send_message(&self, _body: &str) -> Result<(), TransportError> {
                Ok(())
            }

            async fn send_typing(&self, _typing: bool) -> Result<(), TransportError> {
                Ok(())
            }

            async fn leave_room(&self) -> Result<(), TransportError> {
                Ok(())
            }
        }

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let handle = spawn_runtime(Arc::new(NullTransport), signal_rx, test_config());
        let mut events = handle.subscribe();

        signal_tx
            .send(TransportSignal::ConnectionReady)
            .expect("signal should send");
        let ack = enter_room(
            &handle,
            &mut events,
            ClientCommand::CreateRoom {
                nickname: "Alice".into(),
                icon: DEFAULT_USER_ICON.into(),
            },
        )
        .await;
        assert_eq!(ack.error_code, None);

        let history = serde_json::json!({
            "data": {
                "messages": [
                    { "messageId": "1", "permId": "u1", "body": "hi", "timestamp": 100 }
                ]
            }
        });
        let live = serde_json::json!({
            "type": "sendMessage",
            "data": { "messageId": "2", "permId": "u2", "body": "yo", "timestamp": 150 }
        });

        signal_tx
            .send(TransportSignal::Message(history.clone()))
            .expect("signal should send");
        signal_tx
            .send(TransportSignal::Message(live))
            .expect("signal should send");
        signal_tx
            .send(TransportSignal::Message(history))
            .expect("signal should send");
        // A trailing probe proves the redelivery produced no list change.
        signal_tx
            .send(TransportSignal::Message(serde_json::json!({
                "type": "sendMessage",
                "data": { "messageId": "3", "permId": "u1", "body": "done", "timestamp": 200 }
            })))
            .expect("signal should send");

        let messages = wait_for(&mut events, |event| match event {
            ClientEvent::MessagesChanged { messages }
                if messages.iter().any(|m| m.body == "done") =>
            {
                Some(messages)
            }
            _ => None,
        })
        .await;

        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["hi", "yo", "done"]);
    }
}
