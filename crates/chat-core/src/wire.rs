use serde_json::Value;
use tracing::warn;

use crate::{
    error::ClientError,
    types::{ChatMessage, TransportEvent},
};

/// Wire tag for a live chat message broadcast.
pub const MSG_TYPE_SEND_MESSAGE: &str = "sendMessage";
/// Wire tag for a typing roster broadcast.
pub const MSG_TYPE_TYPING_PRESENCE: &str = "setTypingPresence";

/// Decode one raw transport payload into a tagged event.
///
/// Returns `Ok(None)` for payload types this client does not handle, and an
/// error for payloads that carry a known tag but are missing expected
/// fields — the caller drops those rather than letting them reach the
/// reconciliation logic.
///
/// The bulk-history shape (`data.messages` as an array) is checked before
/// the type tag: some transport paths deliver history without any tag.
pub fn decode_transport_payload(payload: &Value) -> Result<Option<TransportEvent>, ClientError> {
    if let Some(entries) = payload
        .get("data")
        .and_then(|data| data.get("messages"))
        .and_then(Value::as_array)
    {
        return Ok(Some(TransportEvent::History {
            messages: decode_history_entries(entries),
        }));
    }

    let Some(kind) = payload.get("type").and_then(Value::as_str) else {
        return Err(ClientError::malformed(
            "missing_event_type",
            "transport payload has neither a history shape nor a type tag",
        ));
    };

    match kind {
        MSG_TYPE_SEND_MESSAGE => {
            let data = payload.get("data").cloned().ok_or_else(|| {
                ClientError::malformed("missing_message_data", "live message without data")
            })?;
            let message: ChatMessage = serde_json::from_value(data).map_err(|err| {
                ClientError::malformed(
                    "invalid_message_data",
                    format!("live message failed to decode: {err}"),
                )
            })?;
            if message.body.is_empty() {
                return Err(ClientError::malformed(
                    "empty_message_body",
                    "live message with an empty body",
                ));
            }
            Ok(Some(TransportEvent::LiveMessage(message)))
        }
        MSG_TYPE_TYPING_PRESENCE => Ok(Some(TransportEvent::PresenceRoster {
            user_ids: decode_typing_roster(payload.get("data")),
        })),
        _ => Ok(None),
    }
}

fn decode_history_entries(entries: &[Value]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<ChatMessage>(entry.clone()) {
            Ok(message) => messages.push(message),
            Err(err) => {
                // One unreadable entry must not sink the rest of the batch.
                warn!(error = %err, "skipping undecodable history entry");
            }
        }
    }
    messages
}

fn decode_typing_roster(data: Option<&Value>) -> Vec<String> {
    let Some(data) = data else {
        return Vec::new();
    };

    // A false/absent anyoneTyping clears the roster outright.
    if data.get("anyoneTyping").and_then(Value::as_bool) != Some(true) {
        return Vec::new();
    }

    data.get("usersTyping")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
