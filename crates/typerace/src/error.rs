//! Unified error type for Typerace.

use tracing_subscriber::util::TryInitError;
use typerace_protocol::ProtocolError;
use typerace_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `typerace` crate you deal with this single error type
/// instead of importing errors from each sub-crate. `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum TyperaceError {
    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not host, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A global tracing subscriber was already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Tracing(#[from] TryInitError),
}

impl TyperaceError {
    /// A stable machine-readable code for the wire `Error` event.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Protocol(_) => "invalid_message",
            Self::Room(e) => e.code(),
            Self::Tracing(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use typerace_protocol::{ConnectionId, RoomId};

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let typerace_err: TyperaceError = err.into();
        assert!(matches!(typerace_err, TyperaceError::Protocol(_)));
        assert!(typerace_err.to_string().contains("bad"));
        assert_eq!(typerace_err.code(), "invalid_message");
    }

    #[test]
    fn test_from_room_error_keeps_room_code() {
        let err = RoomError::NotHost(ConnectionId(4));
        let typerace_err: TyperaceError = err.into();
        assert!(matches!(typerace_err, TyperaceError::Room(_)));
        assert_eq!(typerace_err.code(), "not_host");

        let err: TyperaceError = RoomError::NotFound(RoomId::new("X")).into();
        assert_eq!(err.code(), "room_not_found");
    }
}
