//! Race rooms for Typerace.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, race state and timers. The registry creates rooms on demand and
//! routes connections to them; an emptied room removes itself.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates/destroys rooms, routes connections
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RaceRule`]: per-mode progress and finish rules ([`WordsMode`], [`TimeMode`])
//! - [`RaceStats`]: a participant's WPM, accuracy and progress
//! - [`TextProvider`] / [`ResultSink`]: where race text comes from and results go
//! - [`CoordinatorConfig`]: deployment settings (countdown, deadlines, limits)

mod config;
mod error;
mod participant;
mod registry;
mod room;
mod sink;
mod stats;
mod strategy;
mod text;

pub use config::CoordinatorConfig;
pub use error::RoomError;
pub use participant::{Participant, ParticipantSender, Roster};
pub use registry::{RoomRegistry, RoomRegistryBuilder};
pub use room::RoomHandle;
pub use sink::{LogSink, ResultSink};
pub use stats::{CHARS_PER_WORD, RaceStats, accuracy, gross_wpm};
pub use strategy::{RaceRule, TimeMode, WordsMode, strategy_for};
pub use text::{TIME_RACE_WORDS_PER_SECOND, TextProvider, WordBank, text_length};
