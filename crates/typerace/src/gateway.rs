//! Bytes-in, bytes-out adapter between client connections and the room
//! registry.
//!
//! A transport (WebSocket server, test harness, in-process bot) calls
//! [`Gateway::connect`] once per client, feeds every inbound frame to
//! [`ClientConnection::handle_frame`], and drains
//! [`ClientConnection::next_frame`] back to the client. The flow per frame:
//!   1. Decode → `ClientEvent`
//!   2. Route to the registry (and from there to the connection's room)
//!   3. On rejection, send an `Error` event to this connection only

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use typerace_protocol::{
    ClientEvent, Codec, ConnectionId, JsonCodec, ProtocolError, ServerEvent,
};
use typerace_room::{ParticipantSender, RoomRegistry};

use crate::TyperaceError;

/// Largest inbound frame accepted, in bytes. Larger frames are rejected
/// without being decoded.
pub const MAX_FRAME_BYTES: usize = 16 * 1024;

struct Shared<C: Codec> {
    registry: RoomRegistry,
    codec: C,
    next_connection: AtomicU64,
}

/// Entry point for client traffic.
///
/// Cheap to clone; clones share the registry and the connection id
/// counter.
pub struct Gateway<C: Codec = JsonCodec> {
    shared: Arc<Shared<C>>,
}

impl<C: Codec> Clone for Gateway<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Gateway<JsonCodec> {
    /// A JSON gateway over `registry`.
    pub fn json(registry: RoomRegistry) -> Self {
        Self::new(registry, JsonCodec)
    }
}

impl<C: Codec> Gateway<C> {
    /// Creates a gateway over `registry` speaking `codec`.
    pub fn new(registry: RoomRegistry, codec: C) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry,
                codec,
                next_connection: AtomicU64::new(1),
            }),
        }
    }

    /// The registry behind this gateway.
    pub fn registry(&self) -> &RoomRegistry {
        &self.shared.registry
    }

    /// Registers a new client and returns its connection.
    pub fn connect(&self) -> ClientConnection<C> {
        let id = ConnectionId(
            self.shared.next_connection.fetch_add(1, Ordering::Relaxed),
        );
        let (sender, outbound) = mpsc::unbounded_channel();
        tracing::debug!(connection_id = %id, "client connected");
        ClientConnection {
            id,
            shared: Arc::clone(&self.shared),
            sender,
            outbound,
            closed: false,
        }
    }
}

/// One client's view of the coordinator.
///
/// Dropping a connection that is still in a room removes it from the room
/// in the background. Prefer [`disconnect`](Self::disconnect), which waits
/// for that to happen.
pub struct ClientConnection<C: Codec = JsonCodec> {
    id: ConnectionId,
    shared: Arc<Shared<C>>,
    sender: ParticipantSender,
    outbound: mpsc::UnboundedReceiver<ServerEvent>,
    closed: bool,
}

impl<C: Codec> ClientConnection<C> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Decodes one inbound frame and handles it.
    ///
    /// Rejections are also reported to this client as an `Error` event, so
    /// a transport may ignore the returned error.
    pub async fn handle_frame(&self, data: &[u8]) -> Result<(), TyperaceError> {
        if data.len() > MAX_FRAME_BYTES {
            tracing::debug!(
                connection_id = %self.id,
                len = data.len(),
                "oversized client frame"
            );
            let err = TyperaceError::from(ProtocolError::InvalidMessage(format!(
                "frame of {} bytes exceeds the {MAX_FRAME_BYTES} byte limit",
                data.len()
            )));
            self.send_error(&err);
            return Err(err);
        }
        let event: ClientEvent = match self.shared.codec.decode(data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    connection_id = %self.id,
                    error = %e,
                    "failed to decode client event"
                );
                let err = TyperaceError::from(e);
                self.send_error(&err);
                return Err(err);
            }
        };
        self.handle_event(event).await
    }

    /// Handles one decoded event.
    pub async fn handle_event(&self, event: ClientEvent) -> Result<(), TyperaceError> {
        let result = self.dispatch(event).await;
        if let Err(e) = &result {
            tracing::debug!(
                connection_id = %self.id,
                code = e.code(),
                error = %e,
                "client request rejected"
            );
            self.send_error(e);
        }
        result
    }

    async fn dispatch(&self, event: ClientEvent) -> Result<(), TyperaceError> {
        let registry = &self.shared.registry;
        match event {
            ClientEvent::Join { room, name, config } => {
                // The room broadcasts the new snapshot to everyone,
                // including us.
                registry
                    .join(room, self.id, &name, config, self.sender.clone())
                    .await?;
            }
            ClientEvent::Leave => registry.leave(self.id).await?,
            ClientEvent::StartRace => registry.start(self.id).await?,
            ClientEvent::RestartRace { config } => {
                registry.restart(self.id, config).await?
            }
            ClientEvent::TransferHost { target } => {
                registry.transfer_host(self.id, target).await?
            }
            ClientEvent::UpdateConfig { config } => {
                registry.update_config(self.id, config).await?
            }
            ClientEvent::ProgressUpdate {
                typed_length,
                correct_chars,
                typed_chars,
            } => {
                registry
                    .progress(self.id, typed_length, correct_chars, typed_chars)
                    .await?
            }
            ClientEvent::ListRooms => {
                let rooms = registry.list_rooms().await;
                let _ = self.sender.send(ServerEvent::RoomList { rooms });
            }
        }
        Ok(())
    }

    fn send_error(&self, error: &TyperaceError) {
        let _ = self.sender.send(ServerEvent::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        });
    }

    /// Waits for the next event addressed to this client.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.outbound.recv().await
    }

    /// Returns an already-queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<ServerEvent> {
        self.outbound.try_recv().ok()
    }

    /// Waits for the next event and encodes it for the wire.
    pub async fn next_frame(&mut self) -> Option<Result<Vec<u8>, TyperaceError>> {
        let event = self.outbound.recv().await?;
        Some(self.shared.codec.encode(&event).map_err(TyperaceError::from))
    }

    /// Leaves the current room, if any, and closes the connection.
    pub async fn disconnect(mut self) {
        self.closed = true;
        if self.shared.registry.room_of(self.id).is_some() {
            if let Err(e) = self.shared.registry.leave(self.id).await {
                tracing::debug!(connection_id = %self.id, error = %e, "leave on disconnect failed");
            }
        }
        tracing::debug!(connection_id = %self.id, "client disconnected");
    }
}

impl<C: Codec> Drop for ClientConnection<C> {
    fn drop(&mut self) {
        if self.closed || self.shared.registry.room_of(self.id).is_none() {
            return;
        }
        // Drop is synchronous; leave in a fire-and-forget task.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(connection_id = %self.id, "dropped outside a runtime, room not notified");
            return;
        };
        let registry = self.shared.registry.clone();
        let id = self.id;
        runtime.spawn(async move {
            if let Err(e) = registry.leave(id).await {
                tracing::debug!(connection_id = %id, error = %e, "leave on drop failed");
            }
        });
    }
}
