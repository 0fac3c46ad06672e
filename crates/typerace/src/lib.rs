//! # Typerace
//!
//! Room coordinator for multiplayer typing races.
//!
//! Clients join rooms, the host starts a countdown, everyone types the same
//! text, and the room ranks racers in the order they finish. Each room is
//! an isolated actor; the [`RoomRegistry`](typerace_room::RoomRegistry)
//! creates rooms on demand and drops them once empty. The [`Gateway`]
//! turns wire frames into registry calls and room events back into frames.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typerace::prelude::*;
//!
//! # async fn run() -> Result<(), TyperaceError> {
//! init_tracing("info")?;
//! let registry = RoomRegistry::builder()
//!     .config(CoordinatorConfig::default())
//!     .text_provider(WordBank::english())
//!     .build();
//! let gateway = Gateway::json(registry);
//!
//! let mut client = gateway.connect();
//! client
//!     .handle_frame(br#"{"type":"Join","room":"LOBBY1","name":"ada"}"#)
//!     .await?;
//! while let Some(frame) = client.next_frame().await {
//!     let _bytes = frame?; // hand to the transport
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod gateway;
mod telemetry;

pub use error::TyperaceError;
pub use gateway::{ClientConnection, Gateway, MAX_FRAME_BYTES};
pub use telemetry::init_tracing;

pub use typerace_protocol as protocol;
pub use typerace_room as room;
pub use typerace_timer as timer;

/// Everything needed to embed the coordinator.
pub mod prelude {
    pub use crate::{
        ClientConnection, Gateway, MAX_FRAME_BYTES, TyperaceError, init_tracing,
    };
    pub use typerace_protocol::{
        ClientEvent, Codec, ConnectionId, JsonCodec, ProtocolError, RaceConfig,
        RaceMode, RankingEntry, RoomId, RoomSnapshot, RoomStatus, ServerEvent,
    };
    pub use typerace_room::{
        CoordinatorConfig, LogSink, ResultSink, RoomError, RoomRegistry,
        TextProvider, WordBank,
    };
    pub use typerace_timer::CountdownConfig;
}
