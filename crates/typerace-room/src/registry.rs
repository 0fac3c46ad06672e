//! Room registry: creates rooms on demand, tracks them, and routes
//! connections to the room they're in.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use typerace_protocol::{
    ConnectionId, RaceConfig, RoomId, RoomListEntry, RoomSnapshot,
};

use crate::room::{RoomDeps, RoomHandle, spawn_room};
use crate::{
    CoordinatorConfig, LogSink, ParticipantSender, ResultSink, RoomError,
    TextProvider, WordBank,
};

/// Letters used in generated room codes. No I or O, which read as digits.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of generated room codes.
const ROOM_CODE_LEN: usize = 6;

/// How many times a join retries after racing a room's shutdown.
const JOIN_ATTEMPTS: usize = 3;

/// Longest accepted display name, in characters.
const MAX_NAME_CHARS: usize = 32;

/// The shared maps behind a registry. Room actors hold it too, so an empty
/// room can remove itself.
#[derive(Default)]
pub(crate) struct Directory {
    rooms: DashMap<RoomId, RoomHandle>,
    connections: DashMap<ConnectionId, RoomId>,
}

impl Directory {
    /// Drops a stopped room and the routing of anyone still listed in it.
    /// A newer room under the same id is left alone.
    pub(crate) fn release_room(
        &self,
        room_id: &RoomId,
        instance: u64,
        members: &[ConnectionId],
    ) {
        let removed = self
            .rooms
            .remove_if(room_id, |_, handle| handle.instance() == instance)
            .is_some();
        for connection_id in members {
            self.connections
                .remove_if(connection_id, |_, rid| rid == room_id);
        }
        if removed {
            tracing::info!(%room_id, "room destroyed");
        }
    }

    fn handle(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }
}

/// Process-wide set of rooms.
///
/// This is the entry point for room operations from higher layers (the
/// gateway, tests, embedding servers). Cheap to clone; clones share the
/// same rooms. A connection is in at most one room at a time.
#[derive(Clone)]
pub struct RoomRegistry {
    directory: Arc<Directory>,
    config: Arc<CoordinatorConfig>,
    text: Arc<dyn TextProvider>,
    sink: Arc<dyn ResultSink>,
}

impl RoomRegistry {
    /// Creates a registry with default configuration, the built-in English
    /// word bank and a logging result sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for configuring a registry.
    pub fn builder() -> RoomRegistryBuilder {
        RoomRegistryBuilder::new()
    }

    /// The configuration this registry's rooms run under.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    fn spawn(&self, room_id: RoomId, race: RaceConfig) -> RoomHandle {
        spawn_room(
            room_id,
            race,
            RoomDeps {
                settings: Arc::clone(&self.config),
                text: Arc::clone(&self.text),
                sink: Arc::clone(&self.sink),
                directory: Arc::clone(&self.directory),
            },
        )
    }

    fn validate(config: Option<RaceConfig>) -> Result<Option<RaceConfig>, RoomError> {
        if let Some(config) = config {
            config.validate().map_err(RoomError::InvalidConfig)?;
        }
        Ok(config)
    }

    /// Creates a room under a fresh random code and returns its id.
    ///
    /// The room starts in the lobby with `race`, or the default race if
    /// `None`. Nobody is in it yet; it is reaped after the idle timeout if
    /// nobody joins.
    pub fn create_room(
        &self,
        race: Option<RaceConfig>,
    ) -> Result<RoomId, RoomError> {
        let race = Self::validate(race)?.unwrap_or(self.config.default_race);
        let mut rng = rand::rng();
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| {
                    let i = rng.random_range(0..ROOM_CODE_ALPHABET.len());
                    char::from(ROOM_CODE_ALPHABET[i])
                })
                .collect();
            let room_id = RoomId::new(code);
            if let Entry::Vacant(slot) = self.directory.rooms.entry(room_id.clone()) {
                slot.insert(self.spawn(room_id.clone(), race));
                tracing::info!(%room_id, mode = %race.mode(), "room created");
                return Ok(room_id);
            }
        }
    }

    /// Puts `connection_id` into `room_id`, creating the room if it doesn't
    /// exist.
    ///
    /// `race` configures a newly created room; it is ignored when the room
    /// already exists. A blank `display_name` is replaced by a generated
    /// one. Returns the room snapshot after the join.
    pub async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        display_name: &str,
        race: Option<RaceConfig>,
        sender: ParticipantSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let race = Self::validate(race)?;

        match self.directory.connections.entry(connection_id) {
            Entry::Occupied(current) if *current.get() == room_id => {
                return Err(RoomError::AlreadyInRoom(connection_id, room_id));
            }
            Entry::Occupied(current) => {
                return Err(RoomError::InvalidState(format!(
                    "connection {connection_id} is already in room {}",
                    current.get()
                )));
            }
            // Reserved up front so concurrent joins by one connection can't
            // land it in two rooms.
            Entry::Vacant(slot) => {
                slot.insert(room_id.clone());
            }
        }

        let name = display_name_or_default(display_name, connection_id);
        let result = self
            .join_reserved(&room_id, connection_id, name, race, sender)
            .await;
        if result.is_err() {
            self.directory
                .connections
                .remove_if(&connection_id, |_, rid| *rid == room_id);
        }
        result
    }

    async fn join_reserved(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        name: String,
        race: Option<RaceConfig>,
        sender: ParticipantSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let mut last_err = RoomError::Unavailable(room_id.clone());
        for _ in 0..JOIN_ATTEMPTS {
            let handle = match self.directory.rooms.entry(room_id.clone()) {
                Entry::Occupied(entry) => entry.get().clone(),
                Entry::Vacant(slot) => {
                    let race = race.unwrap_or(self.config.default_race);
                    let handle = self.spawn(room_id.clone(), race);
                    slot.insert(handle.clone());
                    tracing::info!(%room_id, mode = %race.mode(), "room created");
                    handle
                }
            };

            match handle.join(connection_id, name.clone(), sender.clone()).await {
                Err(RoomError::Unavailable(_)) => {
                    // The room stopped between lookup and join. Clear it
                    // out (unless already replaced) and try a fresh one.
                    tracing::debug!(%room_id, %connection_id, "room closing, retrying join");
                    let instance = handle.instance();
                    self.directory
                        .rooms
                        .remove_if(room_id, |_, h| h.instance() == instance);
                    last_err = RoomError::Unavailable(room_id.clone());
                }
                result => return result,
            }
        }
        Err(last_err)
    }

    fn room_for(
        &self,
        connection_id: ConnectionId,
    ) -> Result<(RoomId, RoomHandle), RoomError> {
        let room_id = self
            .directory
            .connections
            .get(&connection_id)
            .map(|entry| entry.value().clone())
            .ok_or(RoomError::NotInAnyRoom(connection_id))?;
        let handle = self
            .directory
            .handle(&room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        Ok((room_id, handle))
    }

    /// Removes a connection from its room. The room is destroyed if this
    /// empties it.
    pub async fn leave(&self, connection_id: ConnectionId) -> Result<(), RoomError> {
        let (room_id, handle) = match self.room_for(connection_id) {
            Ok(found) => found,
            Err(RoomError::NotFound(room_id)) => {
                // Routing outlived its room.
                self.directory
                    .connections
                    .remove_if(&connection_id, |_, rid| *rid == room_id);
                return Err(RoomError::NotFound(room_id));
            }
            Err(e) => return Err(e),
        };

        let result = handle.leave(connection_id).await;
        // Whatever the room said, the connection is no longer routed there.
        self.directory
            .connections
            .remove_if(&connection_id, |_, rid| *rid == room_id);
        match result {
            Err(RoomError::Unavailable(_)) => Ok(()),
            other => other,
        }
    }

    /// Host only: starts the race in the connection's room.
    pub async fn start(&self, connection_id: ConnectionId) -> Result<(), RoomError> {
        let (_, handle) = self.room_for(connection_id)?;
        handle.start(connection_id).await
    }

    /// Host only: returns the connection's finished room to the lobby,
    /// optionally with a new configuration.
    pub async fn restart(
        &self,
        connection_id: ConnectionId,
        race: Option<RaceConfig>,
    ) -> Result<(), RoomError> {
        let race = Self::validate(race)?;
        let (_, handle) = self.room_for(connection_id)?;
        handle.restart(connection_id, race).await
    }

    /// Host only: hands the host role to `target`.
    pub async fn transfer_host(
        &self,
        connection_id: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), RoomError> {
        let (_, handle) = self.room_for(connection_id)?;
        handle.transfer_host(connection_id, target).await
    }

    /// Host only, lobby only: changes the race configuration.
    pub async fn update_config(
        &self,
        connection_id: ConnectionId,
        race: RaceConfig,
    ) -> Result<(), RoomError> {
        race.validate().map_err(RoomError::InvalidConfig)?;
        let (_, handle) = self.room_for(connection_id)?;
        handle.update_config(connection_id, race).await
    }

    /// Routes a progress report to the connection's room.
    pub async fn progress(
        &self,
        connection_id: ConnectionId,
        typed_length: u32,
        correct_chars: u32,
        typed_chars: u32,
    ) -> Result<(), RoomError> {
        let (_, handle) = self.room_for(connection_id)?;
        handle
            .progress(connection_id, typed_length, correct_chars, typed_chars)
            .await
    }

    /// Returns the current snapshot of a room.
    pub async fn snapshot(&self, room_id: &RoomId) -> Result<RoomSnapshot, RoomError> {
        let handle = self
            .directory
            .handle(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.snapshot().await
    }

    /// Lists rooms that are currently accepting participants.
    ///
    /// Rooms that fail to respond (e.g. shutting down) are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        let handles: Vec<RoomHandle> = self
            .directory
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(info) = handle.info().await {
                let has_space = info
                    .max_participants
                    .is_none_or(|max| info.participant_count < max);
                if info.status.is_joinable() && has_space {
                    rooms.push(info);
                }
            }
        }
        rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        rooms
    }

    /// Shuts a room down. Anyone still in it is told and unrouted.
    pub async fn destroy_room(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let handle = self
            .directory
            .handle(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.shutdown().await?;
        // The actor releases itself; this covers a dead actor too.
        let instance = handle.instance();
        self.directory
            .rooms
            .remove_if(room_id, |_, h| h.instance() == instance);
        self.directory.connections.retain(|_, rid| rid != room_id);
        Ok(())
    }

    /// The room a connection is currently in, if any.
    pub fn room_of(&self, connection_id: ConnectionId) -> Option<RoomId> {
        self.directory
            .connections
            .get(&connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Returns a handle to a live room, for driving it directly.
    pub fn room(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.directory.handle(room_id)
    }

    /// Whether a room with this id is live.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.directory.rooms.contains_key(room_id)
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.directory.rooms.len()
    }

    /// Lists all live room ids.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.directory
            .rooms
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name_or_default(name: &str, connection_id: ConnectionId) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return format!("racer-{}", connection_id.0);
    }
    trimmed.chars().take(MAX_NAME_CHARS).collect()
}

/// Builder for [`RoomRegistry`].
///
/// ```no_run
/// use typerace_room::{CoordinatorConfig, LogSink, RoomRegistry, WordBank};
///
/// let registry = RoomRegistry::builder()
///     .config(CoordinatorConfig::default())
///     .text_provider(WordBank::english())
///     .result_sink(LogSink)
///     .build();
/// ```
pub struct RoomRegistryBuilder {
    config: CoordinatorConfig,
    text: Arc<dyn TextProvider>,
    sink: Arc<dyn ResultSink>,
}

impl RoomRegistryBuilder {
    fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            text: Arc::new(WordBank::english()),
            sink: Arc::new(LogSink),
        }
    }

    /// Sets the coordinator configuration. Out-of-range values are clamped
    /// at build time.
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets where race text comes from.
    pub fn text_provider(mut self, provider: impl TextProvider) -> Self {
        self.text = Arc::new(provider);
        self
    }

    /// Sets where finished rankings go.
    pub fn result_sink(mut self, sink: impl ResultSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Like [`result_sink`](Self::result_sink), for a sink the caller keeps
    /// a handle to.
    pub fn shared_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> RoomRegistry {
        RoomRegistry {
            directory: Arc::new(Directory::default()),
            config: Arc::new(self.config.validated()),
            text: self.text,
            sink: self.sink,
        }
    }
}

impl Default for RoomRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_names_get_a_default() {
        assert_eq!(display_name_or_default("  ", ConnectionId(7)), "racer-7");
        assert_eq!(display_name_or_default(" ada ", ConnectionId(7)), "ada");
    }

    #[test]
    fn test_long_names_are_truncated() {
        let long = "x".repeat(100);
        assert_eq!(
            display_name_or_default(&long, ConnectionId(1)).chars().count(),
            MAX_NAME_CHARS
        );
    }

    #[tokio::test]
    async fn test_create_room_uses_generated_code() {
        let registry = RoomRegistry::new();
        let room_id = registry.create_room(None).unwrap();
        assert_eq!(room_id.as_str().len(), ROOM_CODE_LEN);
        assert!(
            room_id
                .as_str()
                .bytes()
                .all(|b| ROOM_CODE_ALPHABET.contains(&b))
        );
        assert!(registry.contains(&room_id));
        assert_eq!(registry.room_count(), 1);
    }

    #[tokio::test]
    async fn test_create_room_rejects_invalid_config() {
        let registry = RoomRegistry::new();
        let result = registry.create_room(Some(RaceConfig::Time { duration_secs: 0 }));
        assert!(matches!(result, Err(RoomError::InvalidConfig(_))));
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_configs_are_rejected() {
        let registry = RoomRegistry::new();
        let huge_words = RaceConfig::Words { word_count: u32::MAX };
        let huge_time = RaceConfig::Time { duration_secs: u32::MAX };

        let result = registry.create_room(Some(huge_time));
        assert!(matches!(result, Err(RoomError::InvalidConfig(_))));

        let (sender, _inbox) = tokio::sync::mpsc::unbounded_channel();
        let result = registry
            .join(RoomId::new("HUGE"), ConnectionId(1), "ada", Some(huge_words), sender.clone())
            .await;
        assert!(matches!(result, Err(RoomError::InvalidConfig(_))));
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.room_of(ConnectionId(1)), None);

        registry
            .join(RoomId::new("HUGE"), ConnectionId(1), "ada", None, sender)
            .await
            .unwrap();
        let result = registry.update_config(ConnectionId(1), huge_words).await;
        assert!(matches!(result, Err(RoomError::InvalidConfig(_))));
        let result = registry.update_config(ConnectionId(1), huge_time).await;
        assert!(matches!(result, Err(RoomError::InvalidConfig(_))));
        let snapshot = registry.snapshot(&RoomId::new("HUGE")).await.unwrap();
        assert_eq!(snapshot.config, RaceConfig::default());
    }
}
