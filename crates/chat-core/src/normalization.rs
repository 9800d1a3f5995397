use crate::{
    error::ClientError,
    types::{ClientEvent, RoomAck, RoomEntry, RoomRequestKind},
};

/// Internal helper describing a room request's success/failure before
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRequestOutcome {
    /// The transport entered the room and returned identifiers.
    Success { entry: RoomEntry },
    /// The request failed with client error details.
    Failure { error: ClientError },
}

/// Convert a room request outcome to a stable `ClientEvent::RoomAck`.
pub fn normalize_room_outcome(kind: RoomRequestKind, outcome: RoomRequestOutcome) -> ClientEvent {
    match outcome {
        RoomRequestOutcome::Success { entry } => ClientEvent::RoomAck(RoomAck {
            kind,
            room_id: Some(entry.room_id),
            error_code: None,
        }),
        RoomRequestOutcome::Failure { error } => ClientEvent::RoomAck(RoomAck {
            kind,
            room_id: None,
            error_code: Some(error.code),
        }),
    }
}
