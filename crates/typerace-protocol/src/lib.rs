//! Wire protocol for Typerace.
//!
//! This crate defines the "language" racers' clients and the room
//! coordinator speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomSnapshot`],
//!   [`RaceConfig`], etc.): the messages that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer doesn't know about sockets or rooms; it only knows
//! how messages look and how to (de)serialize them.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Room coordinator
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ConnectionId, ParticipantView, RaceConfig, RaceMode,
    RankingEntry, RoomId, RoomListEntry, RoomSnapshot, RoomStatus,
    ServerEvent,
};
