//! Core protocol types for Typerace's wire format.
//!
//! This module defines every type that crosses the boundary between a
//! racer's client and the room coordinator: identifiers, race
//! configuration, the events a client sends, and the events and
//! snapshots a room broadcasts back.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for one client connection.
///
/// This identifies a *connection*, not a person: the same human who
/// reconnects gets a new `ConnectionId`. Newtype over `u64` so it can't be
/// mixed up with other integers, and `#[serde(transparent)]` so it goes on
/// the wire as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A room identifier.
///
/// Rooms are addressed by a short code that clients share with each other
/// ("join room `KXQTRB`"), so unlike connection ids this is a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Creates a room id from anything string-like.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The raw room code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Race configuration
// ---------------------------------------------------------------------------

/// The race mode, without its parameters. Handy for logging and matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceMode {
    Words,
    Time,
}

impl fmt::Display for RaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Words => write!(f, "words"),
            Self::Time => write!(f, "time"),
        }
    }
}

/// How a race is decided: by finishing a fixed number of words, or by
/// typing as much as possible within a fixed time.
///
/// Internally tagged on `mode`:
///   `{ "mode": "words", "word_count": 25 }`
///   `{ "mode": "time", "duration_secs": 60 }`
/// An unknown mode tag fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RaceConfig {
    /// Race ends for a participant once the whole text is typed.
    Words { word_count: u32 },
    /// Race ends for everyone when the clock runs out.
    Time { duration_secs: u32 },
}

impl RaceConfig {
    /// Returns the mode tag of this configuration.
    pub fn mode(&self) -> RaceMode {
        match self {
            Self::Words { .. } => RaceMode::Words,
            Self::Time { .. } => RaceMode::Time,
        }
    }

    /// Largest accepted `word_count`.
    pub const MAX_WORD_COUNT: u32 = 1_000;

    /// Largest accepted `duration_secs`.
    pub const MAX_DURATION_SECS: u32 = 600;

    /// Checks the parameters are usable: word count and duration must be
    /// positive and no larger than [`Self::MAX_WORD_COUNT`] /
    /// [`Self::MAX_DURATION_SECS`]. Returns a human-readable reason on
    /// failure.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Words { word_count: 0 } => {
                Err("word_count must be greater than zero".into())
            }
            Self::Words { word_count } if word_count > Self::MAX_WORD_COUNT => {
                Err(format!(
                    "word_count must be at most {}",
                    Self::MAX_WORD_COUNT
                ))
            }
            Self::Time { duration_secs: 0 } => {
                Err("duration_secs must be greater than zero".into())
            }
            Self::Time { duration_secs } if duration_secs > Self::MAX_DURATION_SECS => {
                Err(format!(
                    "duration_secs must be at most {}",
                    Self::MAX_DURATION_SECS
                ))
            }
            _ => Ok(()),
        }
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self::Words { word_count: 25 }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus: lifecycle state machine
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Lobby → Countdown → Racing → Finished
///   ↑                              │
///   └────────── restart ───────────┘
/// ```
///
/// - **Lobby**: accepting joins, host may configure and start.
/// - **Countdown**: text is fixed and sent out, clock not yet running.
/// - **Racing**: progress updates are accepted.
/// - **Finished**: ranks are final; host may restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Lobby,
    Countdown,
    Racing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new participants.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` if progress updates are accepted.
    pub fn accepts_progress(&self) -> bool {
        matches!(self, Self::Racing)
    }

    /// The state this one moves to next.
    pub fn next(self) -> Self {
        match self {
            Self::Lobby => Self::Countdown,
            Self::Countdown => Self::Racing,
            Self::Racing => Self::Finished,
            Self::Finished => Self::Lobby,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Countdown => write!(f, "Countdown"),
            Self::Racing => write!(f, "Racing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One participant as seen by everyone in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub is_host: bool,
    pub wpm: f64,
    pub accuracy: f64,
    pub progress: f64,
    /// Finish position, once assigned.
    pub rank: Option<u32>,
    /// Milliseconds from race start to this participant's finish.
    pub finished_after_ms: Option<u64>,
}

/// The full observable state of a room, broadcast after every accepted
/// change. Participants are listed in join order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub config: RaceConfig,
    pub participants: Vec<ParticipantView>,
}

impl RoomSnapshot {
    /// Looks up one participant's view.
    pub fn participant(&self, id: ConnectionId) -> Option<&ParticipantView> {
        self.participants.iter().find(|p| p.connection_id == id)
    }

    /// The current host, if the room is non-empty.
    pub fn host(&self) -> Option<ConnectionId> {
        self.participants
            .iter()
            .find(|p| p.is_host)
            .map(|p| p.connection_id)
    }
}

/// One row of a final race ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub rank: u32,
}

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub status: RoomStatus,
    pub mode: RaceMode,
    pub participant_count: usize,
    /// `None` when the room has no capacity limit.
    pub max_participants: Option<usize>,
}

// ---------------------------------------------------------------------------
// Client → room events
// ---------------------------------------------------------------------------

/// Everything a client can ask of the coordinator.
///
/// Internally tagged on `type`:
///   `{ "type": "ProgressUpdate", "typed_length": 12, "correct_chars": 11, "typed_chars": 12 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Join (or create) the room `room`. `config` is used only when the
    /// room doesn't exist yet.
    Join {
        room: RoomId,
        name: String,
        #[serde(default)]
        config: Option<RaceConfig>,
    },

    /// Leave the current room.
    Leave,

    /// Host only: begin the countdown.
    StartRace,

    /// Host only: go back to the lobby after a race, optionally with a
    /// different configuration.
    RestartRace {
        #[serde(default)]
        config: Option<RaceConfig>,
    },

    /// Host only: hand the host role to another participant.
    TransferHost { target: ConnectionId },

    /// Host only, lobby only: change the race configuration.
    UpdateConfig { config: RaceConfig },

    /// The client's current position in the text. `typed_length` is how
    /// far into the text the racer is; `correct_chars`/`typed_chars` are
    /// the running keystroke totals used for accuracy.
    ProgressUpdate {
        typed_length: u32,
        correct_chars: u32,
        typed_chars: u32,
    },

    /// Ask for the list of joinable rooms.
    ListRooms,
}

// ---------------------------------------------------------------------------
// Room → client events
// ---------------------------------------------------------------------------

/// Everything the coordinator sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Full room state after an accepted change.
    Snapshot(RoomSnapshot),

    /// The text for the upcoming race, sent on entering countdown.
    RaceText { words: Vec<String> },

    /// Countdown ticks left before the race clock starts.
    Countdown { remaining: u32 },

    /// Final ranking, ordered by rank. Ranks can skip numbers when a
    /// finisher left before the race ended.
    RaceFinished { ranking: Vec<RankingEntry> },

    /// Answer to `ListRooms`.
    RoomList { rooms: Vec<RoomListEntry> },

    /// The room was torn down (idle expiry or shutdown) while this client
    /// was still in it.
    RoomClosed { reason: String },

    /// A request from this client was rejected. Only the offending client
    /// receives this.
    Error { code: String, message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! JSON shape checks. A mismatch here means clients can't parse us.

    use super::*;

    #[test]
    fn test_connection_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ConnectionId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "C-7");
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::new("ABCD")).unwrap();
        assert_eq!(json, "\"ABCD\"");
        assert_eq!(RoomId::new("ABCD").to_string(), "R-ABCD");
    }

    #[test]
    fn test_race_config_is_tagged_by_mode() {
        let json = serde_json::to_value(RaceConfig::Words { word_count: 10 }).unwrap();
        assert_eq!(json["mode"], "words");
        assert_eq!(json["word_count"], 10);

        let json = serde_json::to_value(RaceConfig::Time { duration_secs: 60 }).unwrap();
        assert_eq!(json["mode"], "time");
        assert_eq!(json["duration_secs"], 60);
    }

    #[test]
    fn test_race_config_unknown_mode_fails_to_decode() {
        let result: Result<RaceConfig, _> =
            serde_json::from_str(r#"{"mode": "zen", "word_count": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_race_config_validate_rejects_zero() {
        assert!(RaceConfig::Words { word_count: 0 }.validate().is_err());
        assert!(RaceConfig::Time { duration_secs: 0 }.validate().is_err());
        assert!(RaceConfig::Words { word_count: 1 }.validate().is_ok());
        assert!(RaceConfig::Time { duration_secs: 15 }.validate().is_ok());
    }

    #[test]
    fn test_race_config_validate_rejects_oversized() {
        let max_words = RaceConfig::MAX_WORD_COUNT;
        let max_secs = RaceConfig::MAX_DURATION_SECS;
        assert!(RaceConfig::Words { word_count: max_words }.validate().is_ok());
        assert!(RaceConfig::Time { duration_secs: max_secs }.validate().is_ok());
        assert!(RaceConfig::Words { word_count: max_words + 1 }.validate().is_err());
        assert!(RaceConfig::Time { duration_secs: max_secs + 1 }.validate().is_err());
        assert!(RaceConfig::Words { word_count: u32::MAX }.validate().is_err());
        assert!(RaceConfig::Time { duration_secs: u32::MAX }.validate().is_err());
    }

    #[test]
    fn test_race_config_mode() {
        assert_eq!(RaceConfig::default().mode(), RaceMode::Words);
        assert_eq!(
            RaceConfig::Time { duration_secs: 30 }.mode(),
            RaceMode::Time
        );
        assert_eq!(RaceMode::Time.to_string(), "time");
    }

    #[test]
    fn test_room_status_cycle() {
        assert_eq!(RoomStatus::Lobby.next(), RoomStatus::Countdown);
        assert_eq!(RoomStatus::Countdown.next(), RoomStatus::Racing);
        assert_eq!(RoomStatus::Racing.next(), RoomStatus::Finished);
        assert_eq!(RoomStatus::Finished.next(), RoomStatus::Lobby);
        assert!(!RoomStatus::Lobby.can_transition_to(RoomStatus::Racing));
        assert!(RoomStatus::Finished.can_transition_to(RoomStatus::Lobby));
    }

    #[test]
    fn test_room_status_predicates() {
        assert!(RoomStatus::Lobby.is_joinable());
        assert!(!RoomStatus::Countdown.is_joinable());
        assert!(RoomStatus::Racing.accepts_progress());
        assert!(!RoomStatus::Countdown.accepts_progress());
    }

    #[test]
    fn test_client_event_progress_json_format() {
        let json = r#"{"type": "ProgressUpdate", "typed_length": 12, "correct_chars": 11, "typed_chars": 12}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::ProgressUpdate {
                typed_length: 12,
                correct_chars: 11,
                typed_chars: 12
            }
        );
    }

    #[test]
    fn test_client_event_join_config_is_optional() {
        let json = r#"{"type": "Join", "room": "LOBBY1", "name": "ada"}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join {
                room: RoomId::new("LOBBY1"),
                name: "ada".into(),
                config: None
            }
        );
    }

    #[test]
    fn test_client_event_unknown_type_fails() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type": "Teleport"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_error_json_format() {
        let event = ServerEvent::Error {
            code: "not_host".into(),
            message: "only the host can start".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], "not_host");
    }

    #[test]
    fn test_server_event_snapshot_flattens_fields() {
        let snapshot = RoomSnapshot {
            room_id: RoomId::new("R1"),
            status: RoomStatus::Racing,
            config: RaceConfig::Time { duration_secs: 30 },
            participants: vec![ParticipantView {
                connection_id: ConnectionId(1),
                display_name: "ada".into(),
                is_host: true,
                wpm: 0.0,
                accuracy: 100.0,
                progress: 0.0,
                rank: None,
                finished_after_ms: None,
            }],
        };
        let json = serde_json::to_value(ServerEvent::Snapshot(snapshot.clone())).unwrap();
        assert_eq!(json["type"], "Snapshot");
        assert_eq!(json["status"], "racing");
        assert_eq!(json["config"]["mode"], "time");
        assert_eq!(json["participants"][0]["display_name"], "ada");
        assert_eq!(snapshot.host(), Some(ConnectionId(1)));
        assert!(snapshot.participant(ConnectionId(2)).is_none());
    }
}
