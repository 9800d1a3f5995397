use crate::{
    error::{ClientError, ClientErrorCategory},
    types::{MAX_NICKNAME_LEN, RoomEntry, RoomRequestKind, SessionState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Membership {
    Outside,
    Requesting(RoomRequestKind),
    Inside {
        room_id: String,
        participant_id: String,
        is_host: bool,
    },
}

/// Connection/room/identity state for the session; gates room actions.
#[derive(Debug, Clone)]
pub struct SessionController {
    connected: bool,
    nickname: String,
    icon: String,
    membership: Membership,
}

impl Default for SessionController {
    fn default() -> Self {
        Self {
            connected: false,
            nickname: String::new(),
            icon: crate::types::DEFAULT_USER_ICON.to_owned(),
            membership: Membership::Outside,
        }
    }
}

impl SessionController {
    /// Record transport readiness; returns `true` on change.
    ///
    /// A connection loss does not evict the session from its room; it only
    /// gates sends until the transport reports ready again.
    pub fn set_connected(&mut self, connected: bool) -> bool {
        if self.connected == connected {
            return false;
        }
        self.connected = connected;
        true
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn in_room(&self) -> bool {
        matches!(self.membership, Membership::Inside { .. })
    }

    pub fn is_host(&self) -> bool {
        matches!(self.membership, Membership::Inside { is_host: true, .. })
    }

    pub fn room_id(&self) -> Option<&str> {
        match &self.membership {
            Membership::Inside { room_id, .. } => Some(room_id),
            _ => None,
        }
    }

    pub fn participant_id(&self) -> Option<&str> {
        match &self.membership {
            Membership::Inside { participant_id, .. } => Some(participant_id),
            _ => None,
        }
    }

    /// Whether a chat message may be sent right now.
    pub fn can_send(&self) -> bool {
        self.connected && self.in_room()
    }

    /// Validate and start a create/join request.
    ///
    /// On success the request is marked in flight and the trimmed nickname
    /// and icon are recorded. On failure nothing changes and the caller
    /// surfaces the error with the form left editable.
    pub fn begin_room_request(
        &mut self,
        kind: RoomRequestKind,
        nickname: &str,
        icon: &str,
        room_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let action = match kind {
            RoomRequestKind::Create => "create_room",
            RoomRequestKind::Join => "join_room",
        };

        if !self.connected {
            return Err(ClientError::not_ready(action));
        }
        match self.membership {
            Membership::Outside => {}
            Membership::Requesting(_) => {
                return Err(ClientError::new(
                    ClientErrorCategory::Internal,
                    "room_request_in_flight",
                    "another room request is already in flight",
                ));
            }
            Membership::Inside { .. } => {
                return Err(ClientError::new(
                    ClientErrorCategory::Internal,
                    "already_in_room",
                    format!("cannot run '{action}' while already in a room"),
                ));
            }
        }

        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(ClientError::validation(
                "empty_nickname",
                "please enter a nickname",
            ));
        }
        if nickname.chars().count() > MAX_NICKNAME_LEN {
            return Err(ClientError::validation(
                "nickname_too_long",
                format!("nicknames are limited to {MAX_NICKNAME_LEN} characters"),
            ));
        }
        if kind == RoomRequestKind::Join && room_id.is_none_or(|id| id.trim().is_empty()) {
            return Err(ClientError::validation(
                "empty_room_id",
                "please enter a room id",
            ));
        }

        self.nickname = nickname.to_owned();
        self.icon = icon.to_owned();
        self.membership = Membership::Requesting(kind);
        Ok(())
    }

    /// Commit a successful room entry. The host flag is derived from the
    /// request kind here and never changes afterwards.
    pub fn complete_room_request(&mut self, entry: RoomEntry) -> Result<(), ClientError> {
        let Membership::Requesting(kind) = self.membership else {
            return Err(ClientError::new(
                ClientErrorCategory::Internal,
                "no_room_request_in_flight",
                "room entry arrived without a pending request",
            ));
        };

        self.membership = Membership::Inside {
            room_id: entry.room_id,
            participant_id: entry.participant_id,
            is_host: kind == RoomRequestKind::Create,
        };
        Ok(())
    }

    /// Roll back a failed request; returns the kind that failed, if any.
    pub fn fail_room_request(&mut self) -> Option<RoomRequestKind> {
        let Membership::Requesting(kind) = self.membership else {
            return None;
        };
        self.membership = Membership::Outside;
        Some(kind)
    }

    /// Leave the active room; returns `true` when there was one.
    pub fn leave_room(&mut self) -> bool {
        if !self.in_room() {
            return false;
        }
        self.membership = Membership::Outside;
        true
    }

    /// Snapshot for event emission.
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            connected: self.connected,
            room_id: self.room_id().map(ToOwned::to_owned),
            nickname: self.nickname.clone(),
            icon: self.icon.clone(),
            participant_id: self.participant_id().map(ToOwned::to_owned),
            in_room: self.in_room(),
            is_host: self.is_host(),
        }
    }
}
