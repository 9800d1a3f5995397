use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad error category used for user-facing handling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientErrorCategory {
    /// Action attempted before the transport signalled readiness. Blocked at
    /// the boundary rather than surfaced as a system failure.
    NotReady,
    /// Invalid user input; the originating form stays editable.
    Validation,
    /// A create/join/send request was rejected by the transport. Terminal
    /// for that attempt; no retry is made at this layer.
    Request,
    /// An inbound event was missing expected fields and was dropped.
    MalformedEvent,
    /// Internal invariant break or closed channel.
    Internal,
}

/// Stable error payload emitted across the command/event boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{category:?}:{code}: {message}")]
pub struct ClientError {
    /// High-level error category.
    pub category: ClientErrorCategory,
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ClientError {
    /// Construct a new client error.
    pub fn new(
        category: ClientErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Build a standard connection-not-ready error for a blocked action.
    pub fn not_ready(action: impl Into<String>) -> Self {
        let action = action.into();
        Self::new(
            ClientErrorCategory::NotReady,
            "connection_not_ready",
            format!("cannot run '{action}' before the connection is ready"),
        )
    }

    /// Build a validation error with a stable code.
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ClientErrorCategory::Validation, code, message)
    }

    /// Build a malformed-event error with a stable code.
    pub fn malformed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ClientErrorCategory::MalformedEvent, code, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_not_ready_error_code_stable() {
        let err = ClientError::not_ready("create_room");
        assert_eq!(err.code, "connection_not_ready");
        assert_eq!(err.category, ClientErrorCategory::NotReady);
        assert!(err.message.contains("create_room"));
    }

    #[test]
    fn renders_category_and_code_in_display() {
        let err = ClientError::validation("empty_nickname", "enter a nickname");
        assert_eq!(
            err.to_string(),
            "Validation:empty_nickname: enter a nickname"
        );
    }
}
