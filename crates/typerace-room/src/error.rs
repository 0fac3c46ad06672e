//! Error types for the room layer.

use typerace_protocol::{ConnectionId, RoomId};

/// Errors that can occur during room operations.
///
/// Every variant is local to the one request that caused it: a rejected
/// request never disturbs the race for anyone else in the room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full: no more participant slots available.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The connection is already in this room.
    #[error("connection {0} already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomId),

    /// The connection is not in any room.
    #[error("connection {0} is not in any room")]
    NotInAnyRoom(ConnectionId),

    /// The participant is not in this room's roster.
    #[error("no participant {0} in this room")]
    NoSuchParticipant(ConnectionId),

    /// Only the host may do this.
    #[error("connection {0} is not the host")]
    NotHost(ConnectionId),

    /// The room is in a state that doesn't allow this operation, e.g.
    /// sending progress during the countdown or joining a running race.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The race configuration was rejected.
    #[error("invalid race configuration: {0}")]
    InvalidConfig(String),

    /// No race strategy can serve this configuration. Configs are
    /// validated before they reach a room, so this is a bug, not a user
    /// error.
    #[error("unsupported race mode: {0}")]
    UnsupportedMode(String),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// A stable machine-readable code for the wire `Error` event.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "room_not_found",
            Self::RoomFull(_) => "room_full",
            Self::AlreadyInRoom(..) => "already_in_room",
            Self::NotInAnyRoom(_) => "not_in_room",
            Self::NoSuchParticipant(_) => "no_such_participant",
            Self::NotHost(_) => "not_host",
            Self::InvalidState(_) => "invalid_state",
            Self::InvalidConfig(_) => "invalid_config",
            Self::UnsupportedMode(_) => "unsupported_mode",
            Self::Unavailable(_) => "room_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_subject() {
        let err = RoomError::NotHost(ConnectionId(3));
        assert_eq!(err.to_string(), "connection C-3 is not the host");

        let err = RoomError::RoomFull(RoomId::new("XYZ"));
        assert_eq!(err.to_string(), "room R-XYZ is full");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(RoomError::NotHost(ConnectionId(1)).code(), "not_host");
        assert_eq!(
            RoomError::InvalidState("racing".into()).code(),
            "invalid_state"
        );
        assert_eq!(
            RoomError::UnsupportedMode("words".into()).code(),
            "unsupported_mode"
        );
    }
}
