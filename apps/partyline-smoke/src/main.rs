//! Headless smoke run: two participants chat over the in-process loopback
//! hub, exercising room entry, history delivery, typing presence, and
//! message broadcast end to end.

mod config;
mod logging;
mod state;

use std::{process, sync::Arc, time::Duration};

use chat_core::{ClientCommand, ClientEvent, DEFAULT_USER_ICON, EventStream, RoomAck};
use chat_runtime::{LoopbackHub, RuntimeHandle, spawn_runtime};
use tokio::time::timeout;

use crate::{config::SmokeConfig, state::UiState};

const EVENT_WAIT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    logging::init();

    let config = match SmokeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = run(config).await {
        eprintln!("smoke run failed: {err}");
        process::exit(1);
    }
}

struct Participant {
    handle: RuntimeHandle,
    events: EventStream,
    ui: UiState,
}

impl Participant {
    fn spawn(hub: &LoopbackHub, config: &SmokeConfig) -> Self {
        let (transport, signals) = hub.connect();
        let handle = spawn_runtime(Arc::new(transport), signals, config.runtime_config());
        let events = handle.subscribe();
        Self {
            handle,
            events,
            ui: UiState::new(),
        }
    }

    async fn send(&self, command: ClientCommand) -> Result<(), String> {
        self.handle
            .send(command)
            .await
            .map_err(|err| err.to_string())
    }

    /// Wait for a matching event, folding everything seen into the UI state.
    async fn wait_for<T>(
        &mut self,
        mut pick: impl FnMut(&ClientEvent) -> Option<T>,
    ) -> Result<T, String> {
        loop {
            let event = timeout(EVENT_WAIT, self.events.recv())
                .await
                .map_err(|_| "timed out waiting for an event".to_owned())?
                .map_err(|err| err.to_string())?;
            self.ui.apply(&event);
            if let Some(found) = pick(&event) {
                return Ok(found);
            }
        }
    }

    async fn wait_for_ack(&mut self) -> Result<RoomAck, String> {
        self.wait_for(|event| match event {
            ClientEvent::RoomAck(ack) => Some(ack.clone()),
            _ => None,
        })
        .await
    }

    fn print_view(&self, label: &str) {
        let snapshot = self.ui.snapshot();
        println!("--- {label}: {} ---", snapshot.status_text);
        for line in &snapshot.lines {
            println!("  {line}");
        }
        if !snapshot.typing_text.is_empty() {
            println!("  [{}]", snapshot.typing_text);
        }
        if let Some(error) = &snapshot.error_text {
            println!("  !! {error}");
        }
    }
}

async fn run(config: SmokeConfig) -> Result<(), String> {
    let hub = LoopbackHub::new();
    let mut host = Participant::spawn(&hub, &config);
    let mut guest = Participant::spawn(&hub, &config);

    // Host creates the room.
    host.send(ClientCommand::CreateRoom {
        nickname: config.host_nickname.clone(),
        icon: DEFAULT_USER_ICON.to_owned(),
    })
    .await?;
    let ack = host.wait_for_ack().await?;
    let room_id = ack
        .room_id
        .ok_or_else(|| format!("room create rejected: {:?}", ack.error_code))?;
    println!("{} created room {room_id}", config.host_nickname);

    // Guest joins and receives the room history.
    guest
        .send(ClientCommand::JoinRoom {
            nickname: config.guest_nickname.clone(),
            room_id: room_id.clone(),
            icon: DEFAULT_USER_ICON.to_owned(),
        })
        .await?;
    let ack = guest.wait_for_ack().await?;
    if let Some(code) = ack.error_code {
        return Err(format!("room join rejected: {code}"));
    }
    println!("{} joined room {room_id}", config.guest_nickname);

    // Guest starts typing; host observes the derived indicator.
    guest
        .send(ClientCommand::InputChanged {
            text: "hey".to_owned(),
        })
        .await?;
    let status = host
        .wait_for(|event| match event {
            ClientEvent::TypingChanged { status } if !status.is_empty() => Some(status.clone()),
            _ => None,
        })
        .await?;
    println!("host sees: {status}");

    // Guest submits; the echoed broadcast reaches both participants.
    guest
        .send(ClientCommand::SendMessage {
            body: "hey everyone!".to_owned(),
        })
        .await?;
    host.wait_for(|event| match event {
        ClientEvent::MessagesChanged { messages }
            if messages.iter().any(|m| m.body == "hey everyone!") =>
        {
            Some(())
        }
        _ => None,
    })
    .await?;

    host.send(ClientCommand::SendMessage {
        body: "welcome to the party".to_owned(),
    })
    .await?;
    guest
        .wait_for(|event| match event {
            ClientEvent::MessagesChanged { messages }
                if messages.iter().any(|m| m.body == "welcome to the party") =>
            {
                Some(())
            }
            _ => None,
        })
        .await?;

    // Guest leaves; host sees the membership message.
    guest.send(ClientCommand::LeaveRoom).await?;
    host.wait_for(|event| match event {
        ClientEvent::MessagesChanged { messages }
            if messages.iter().any(|m| m.is_system && m.body == "left") =>
        {
            Some(())
        }
        _ => None,
    })
    .await?;

    host.print_view("host");
    guest.print_view("guest");
    println!("smoke run finished");
    Ok(())
}
