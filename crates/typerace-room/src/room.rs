//! Room actor: an isolated Tokio task that owns one race.
//!
//! Each room runs in its own task and is reached only through an mpsc
//! channel. The actor drains that channel one command at a time, so every
//! join, progress update and transition in a room is applied in arrival
//! order by a single writer. Rooms share nothing with each other.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use typerace_protocol::{
    ConnectionId, RaceConfig, RankingEntry, RoomId, RoomListEntry,
    RoomSnapshot, RoomStatus, ServerEvent,
};
use typerace_timer::{Fired, Timers};

use crate::registry::Directory;
use crate::stats::{accuracy, gross_wpm};
use crate::strategy::{RaceRule, strategy_for};
use crate::text::text_length;
use crate::{
    CoordinatorConfig, ParticipantSender, RaceStats, ResultSink, RoomError,
    Roster, TextProvider,
};

/// Timer lateness worth a log line.
const LATE_TIMER_WARNING: Duration = Duration::from_millis(250);

/// Counter distinguishing successive rooms that reuse the same id.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Commands sent to a room actor through its channel.
///
/// Each carries a `oneshot` reply channel: the caller sends the command
/// and waits for the room's answer on it.
pub(crate) enum RoomCommand {
    Join {
        connection_id: ConnectionId,
        display_name: String,
        sender: ParticipantSender,
        reply: oneshot::Sender<Result<RoomSnapshot, RoomError>>,
    },
    Leave {
        connection_id: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Start {
        requester: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Restart {
        requester: ConnectionId,
        config: Option<RaceConfig>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    TransferHost {
        requester: ConnectionId,
        target: ConnectionId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    UpdateConfig {
        requester: ConnectionId,
        config: RaceConfig,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Progress {
        connection_id: ConnectionId,
        typed_length: u32,
        correct_chars: u32,
        typed_chars: u32,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Info {
        reply: oneshot::Sender<RoomListEntry>,
    },
    Shutdown,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the room's id.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    instance: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's id.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }

    /// Sends a command built around a fresh reply channel and waits for
    /// the answer.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Adds a participant. Returns the room snapshot after the join.
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        display_name: String,
        sender: ParticipantSender,
    ) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Join {
            connection_id,
            display_name,
            sender,
            reply,
        })
        .await?
    }

    /// Removes a participant.
    pub async fn leave(
        &self,
        connection_id: ConnectionId,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave {
            connection_id,
            reply,
        })
        .await?
    }

    /// Host only: starts the countdown.
    pub async fn start(&self, requester: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { requester, reply })
            .await?
    }

    /// Host only: returns a finished room to the lobby.
    pub async fn restart(
        &self,
        requester: ConnectionId,
        config: Option<RaceConfig>,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Restart {
            requester,
            config,
            reply,
        })
        .await?
    }

    /// Host only: hands the host role to `target`.
    pub async fn transfer_host(
        &self,
        requester: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::TransferHost {
            requester,
            target,
            reply,
        })
        .await?
    }

    /// Host only, lobby only: replaces the race configuration.
    pub async fn update_config(
        &self,
        requester: ConnectionId,
        config: RaceConfig,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::UpdateConfig {
            requester,
            config,
            reply,
        })
        .await?
    }

    /// Reports a participant's position in the text.
    pub async fn progress(
        &self,
        connection_id: ConnectionId,
        typed_length: u32,
        correct_chars: u32,
        typed_chars: u32,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Progress {
            connection_id,
            typed_length,
            correct_chars,
            typed_chars,
            reply,
        })
        .await?
    }

    /// Requests the current room snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { reply }).await
    }

    /// Requests the room's listing summary.
    pub async fn info(&self) -> Result<RoomListEntry, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// What a room is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoomTimer {
    /// Next countdown step.
    CountdownTick,
    /// End of a time race.
    RaceClock,
    /// Upper bound on any race.
    SafetyDeadline,
    /// Tear-down of an empty-from-birth or finished room.
    IdleExpiry,
}

/// Everything a room needs from its registry.
pub(crate) struct RoomDeps {
    pub(crate) settings: Arc<CoordinatorConfig>,
    pub(crate) text: Arc<dyn TextProvider>,
    pub(crate) sink: Arc<dyn ResultSink>,
    pub(crate) directory: Arc<Directory>,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    instance: u64,
    status: RoomStatus,
    race: RaceConfig,
    roster: Roster,
    /// Chosen at countdown entry, held until restart.
    strategy: Option<Box<dyn RaceRule>>,
    text_length: u32,
    start_time: Option<Instant>,
    countdown_remaining: u32,
    next_rank: u32,
    timers: Timers<RoomTimer>,
    deps: RoomDeps,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room empties, idles out, or is shut
    /// down.
    async fn run(mut self) {
        tracing::info!(
            room_id = %self.room_id,
            mode = %self.race.mode(),
            "room actor started"
        );

        let reason = loop {
            // Timers first: a command queued after a deadline passed must
            // see the state that deadline produced.
            let flow = tokio::select! {
                biased;
                fired = self.timers.fired() => self.handle_timer(fired),
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => ControlFlow::Break("registry dropped"),
                },
            };
            if let ControlFlow::Break(reason) = flow {
                break reason;
            }
        };

        self.close(reason);
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> ControlFlow<&'static str> {
        match cmd {
            RoomCommand::Join {
                connection_id,
                display_name,
                sender,
                reply,
            } => {
                let result = self.handle_join(connection_id, display_name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave {
                connection_id,
                reply,
            } => {
                let result = self.handle_leave(connection_id);
                let left = result.is_ok();
                let _ = reply.send(result);
                if left && self.roster.is_empty() {
                    return ControlFlow::Break("room empty");
                }
            }
            RoomCommand::Start { requester, reply } => {
                let result = self.handle_start(requester);
                self.reject_log(requester, "start", &result);
                let _ = reply.send(result);
            }
            RoomCommand::Restart {
                requester,
                config,
                reply,
            } => {
                let result = self.handle_restart(requester, config);
                self.reject_log(requester, "restart", &result);
                let _ = reply.send(result);
            }
            RoomCommand::TransferHost {
                requester,
                target,
                reply,
            } => {
                let result = self.handle_transfer_host(requester, target);
                self.reject_log(requester, "transfer host", &result);
                let _ = reply.send(result);
            }
            RoomCommand::UpdateConfig {
                requester,
                config,
                reply,
            } => {
                let result = self.handle_update_config(requester, config);
                self.reject_log(requester, "update config", &result);
                let _ = reply.send(result);
            }
            RoomCommand::Progress {
                connection_id,
                typed_length,
                correct_chars,
                typed_chars,
                reply,
            } => {
                let result = self.handle_progress(
                    connection_id,
                    typed_length,
                    correct_chars,
                    typed_chars,
                );
                self.reject_log(connection_id, "progress", &result);
                let _ = reply.send(result);
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                return ControlFlow::Break("room shut down");
            }
        }
        ControlFlow::Continue(())
    }

    /// Timed transitions take effect at the scheduled deadline, not when
    /// the actor got around to them.
    fn handle_timer(&mut self, fired: Fired<RoomTimer>) -> ControlFlow<&'static str> {
        if fired.late_by > LATE_TIMER_WARNING {
            tracing::debug!(
                room_id = %self.room_id,
                timer = ?fired.key,
                late_ms = fired.late_by.as_millis() as u64,
                "room timer ran late"
            );
        }
        let now = fired.deadline;
        match fired.key {
            RoomTimer::CountdownTick => self.on_countdown_tick(now),
            RoomTimer::RaceClock => {
                if self.status == RoomStatus::Racing {
                    self.finish_race(now, "time limit reached");
                }
            }
            RoomTimer::SafetyDeadline => {
                if self.status == RoomStatus::Racing {
                    tracing::warn!(
                        room_id = %self.room_id,
                        unfinished = self.roster.len() - self.roster.finished_count(),
                        "safety deadline reached, forcing finish"
                    );
                    self.finish_race(now, "safety deadline");
                }
            }
            RoomTimer::IdleExpiry => return ControlFlow::Break("idle timeout"),
        }
        ControlFlow::Continue(())
    }

    // -- Roster ------------------------------------------------------------

    fn handle_join(
        &mut self,
        connection_id: ConnectionId,
        display_name: String,
        sender: ParticipantSender,
    ) -> Result<RoomSnapshot, RoomError> {
        if !self.status.is_joinable() {
            return Err(RoomError::InvalidState(format!(
                "cannot join room in state {}",
                self.status
            )));
        }
        let is_host = self.roster.join(connection_id, display_name, sender)?.is_host();
        tracing::info!(
            room_id = %self.room_id,
            %connection_id,
            host = is_host,
            participants = self.roster.len(),
            "participant joined"
        );

        self.timers.cancel(RoomTimer::IdleExpiry);
        let snapshot = self.snapshot();
        self.roster.broadcast(&ServerEvent::Snapshot(snapshot.clone()));
        Ok(snapshot)
    }

    fn handle_leave(&mut self, connection_id: ConnectionId) -> Result<(), RoomError> {
        let removed = self.roster.leave(connection_id)?;
        tracing::info!(
            room_id = %self.room_id,
            %connection_id,
            was_host = removed.is_host(),
            participants = self.roster.len(),
            "participant left"
        );

        if self.roster.is_empty() {
            return Ok(());
        }
        if self.status == RoomStatus::Racing && self.roster.all_finished() {
            self.finish_race(Instant::now(), "remaining racers finished");
        } else {
            self.broadcast_snapshot();
        }
        Ok(())
    }

    fn handle_transfer_host(
        &mut self,
        requester: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), RoomError> {
        self.roster.transfer_host(requester, target)?;
        tracing::info!(
            room_id = %self.room_id,
            from = %requester,
            to = %target,
            "host transferred"
        );
        self.broadcast_snapshot();
        Ok(())
    }

    // -- Lifecycle ---------------------------------------------------------

    fn ensure_host(&self, requester: ConnectionId) -> Result<(), RoomError> {
        if self.roster.is_host(requester) {
            Ok(())
        } else {
            Err(RoomError::NotHost(requester))
        }
    }

    fn handle_update_config(
        &mut self,
        requester: ConnectionId,
        config: RaceConfig,
    ) -> Result<(), RoomError> {
        self.ensure_host(requester)?;
        if self.status != RoomStatus::Lobby {
            return Err(RoomError::InvalidState(format!(
                "configuration is fixed in state {}",
                self.status
            )));
        }
        config.validate().map_err(RoomError::InvalidConfig)?;
        self.race = config;
        tracing::info!(room_id = %self.room_id, mode = %config.mode(), "race reconfigured");
        self.broadcast_snapshot();
        Ok(())
    }

    /// Lobby → Countdown.
    fn handle_start(&mut self, requester: ConnectionId) -> Result<(), RoomError> {
        self.ensure_host(requester)?;
        if !self.status.can_transition_to(RoomStatus::Countdown) {
            return Err(RoomError::InvalidState(format!(
                "cannot start a race in state {}",
                self.status
            )));
        }
        if self.roster.is_empty() {
            return Err(RoomError::InvalidState(
                "cannot start a race with no participants".into(),
            ));
        }

        let strategy = strategy_for(&self.race).inspect_err(|e| {
            tracing::error!(
                room_id = %self.room_id,
                config = ?self.race,
                error = %e,
                "no race strategy for validated config"
            );
        })?;

        let words = self.deps.text.get_text(&self.race);
        self.transition(RoomStatus::Countdown)?;
        self.text_length = text_length(&words);
        self.strategy = Some(strategy);
        self.countdown_remaining = self.deps.settings.countdown.ticks;

        tracing::info!(
            room_id = %self.room_id,
            mode = %self.race.mode(),
            words = words.len(),
            participants = self.roster.len(),
            "countdown started"
        );

        self.roster.broadcast(&ServerEvent::RaceText { words });
        self.broadcast_snapshot();

        if self.countdown_remaining == 0 {
            self.begin_race(Instant::now());
        } else {
            self.roster.broadcast(&ServerEvent::Countdown {
                remaining: self.countdown_remaining,
            });
            self.timers.arm_in(
                RoomTimer::CountdownTick,
                self.deps.settings.countdown.interval,
            );
        }
        Ok(())
    }

    fn on_countdown_tick(&mut self, now: Instant) {
        if self.status != RoomStatus::Countdown {
            return;
        }
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.countdown_remaining == 0 {
            self.begin_race(now);
        } else {
            self.roster.broadcast(&ServerEvent::Countdown {
                remaining: self.countdown_remaining,
            });
            self.timers.arm_at(
                RoomTimer::CountdownTick,
                now + self.deps.settings.countdown.interval,
            );
        }
    }

    /// Countdown → Racing. `now` becomes the race's reference instant.
    fn begin_race(&mut self, now: Instant) {
        if self.transition(RoomStatus::Racing).is_err() {
            return;
        }
        self.start_time = Some(now);
        self.next_rank = 1;

        let deadline = self.deps.settings.safety_deadline(&self.race);
        self.timers.arm_at(RoomTimer::SafetyDeadline, now + deadline);
        if let Some(at) = self.strategy.as_ref().and_then(|s| s.natural_deadline(now)) {
            self.timers.arm_at(RoomTimer::RaceClock, at);
        }

        tracing::info!(
            room_id = %self.room_id,
            safety_deadline_secs = deadline.as_secs(),
            "race started"
        );
        self.broadcast_snapshot();
    }

    fn handle_progress(
        &mut self,
        connection_id: ConnectionId,
        typed_length: u32,
        correct_chars: u32,
        typed_chars: u32,
    ) -> Result<(), RoomError> {
        if !self.status.accepts_progress() {
            return Err(RoomError::InvalidState(format!(
                "progress not accepted in state {}",
                self.status
            )));
        }
        let (Some(strategy), Some(start)) = (self.strategy.as_deref(), self.start_time)
        else {
            return Err(RoomError::InvalidState("race clock not running".into()));
        };
        let participant = self
            .roster
            .get_mut(connection_id)
            .ok_or(RoomError::NoSuchParticipant(connection_id))?;
        if participant.is_finished() {
            return Err(RoomError::InvalidState(
                "participant already finished".into(),
            ));
        }

        let now = Instant::now();
        let stats = compute_stats(
            strategy,
            participant.stats(),
            typed_length,
            correct_chars,
            typed_chars,
            self.text_length,
            start,
            now,
        );
        participant.record_progress(typed_length, correct_chars, typed_chars, stats);

        if strategy.is_finished(&stats, &self.race, start, now) {
            let rank = self.next_rank;
            if participant.finish(now, rank) {
                self.next_rank += 1;
                tracing::info!(
                    room_id = %self.room_id,
                    %connection_id,
                    rank,
                    wpm = stats.wpm(),
                    "participant finished"
                );
            }
        } else {
            tracing::trace!(
                room_id = %self.room_id,
                %connection_id,
                typed_length,
                progress = stats.progress(),
                "progress"
            );
        }

        if self.roster.all_finished() {
            self.finish_race(now, "all racers finished");
        } else {
            self.broadcast_snapshot();
        }
        Ok(())
    }

    /// Racing → Finished. Anyone still racing is finished at `now`,
    /// ranked after everyone already done by typed length (longest first),
    /// ties by join order.
    fn finish_race(&mut self, now: Instant, reason: &'static str) {
        if self.transition(RoomStatus::Finished).is_err() {
            return;
        }

        let mut pending: Vec<(ConnectionId, u32)> = self
            .roster
            .iter()
            .filter(|p| !p.is_finished())
            .map(|p| (p.connection_id(), p.typed_length()))
            .collect();
        // Stable: equal lengths keep join order.
        pending.sort_by(|a, b| b.1.cmp(&a.1));

        for (connection_id, _) in pending {
            let Some(participant) = self.roster.get_mut(connection_id) else {
                continue;
            };
            if let (Some(strategy), Some(start)) = (self.strategy.as_deref(), self.start_time) {
                let (correct, typed) = participant.keystrokes();
                let typed_length = participant.typed_length();
                let stats = compute_stats(
                    strategy,
                    participant.stats(),
                    typed_length,
                    correct,
                    typed,
                    self.text_length,
                    start,
                    now,
                );
                participant.record_progress(typed_length, correct, typed, stats);
            }
            if participant.finish(now, self.next_rank) {
                self.next_rank += 1;
            }
        }

        self.timers.clear();
        self.timers
            .arm_at(RoomTimer::IdleExpiry, now + self.deps.settings.idle_timeout);

        let ranking = self.ranking();
        tracing::info!(
            room_id = %self.room_id,
            reason,
            participants = ranking.len(),
            winner = ranking.first().map(|e| e.display_name.as_str()).unwrap_or("-"),
            "race finished"
        );
        self.deps.sink.record(&self.room_id, &ranking);
        self.roster.broadcast(&ServerEvent::RaceFinished { ranking });
        self.broadcast_snapshot();
    }

    /// Finished → Lobby.
    fn handle_restart(
        &mut self,
        requester: ConnectionId,
        config: Option<RaceConfig>,
    ) -> Result<(), RoomError> {
        self.ensure_host(requester)?;
        if !self.status.can_transition_to(RoomStatus::Lobby) {
            return Err(RoomError::InvalidState(format!(
                "cannot restart a race in state {}",
                self.status
            )));
        }
        if let Some(config) = config {
            config.validate().map_err(RoomError::InvalidConfig)?;
        }
        self.transition(RoomStatus::Lobby)?;
        if let Some(config) = config {
            self.race = config;
        }

        for participant in self.roster.iter_mut() {
            participant.reset();
        }
        self.strategy = None;
        self.text_length = 0;
        self.start_time = None;
        self.countdown_remaining = 0;
        self.next_rank = 1;
        self.timers.clear();

        tracing::info!(
            room_id = %self.room_id,
            mode = %self.race.mode(),
            "room back in lobby"
        );
        self.broadcast_snapshot();
        Ok(())
    }

    /// Moves the room one step along Lobby → Countdown → Racing →
    /// Finished → Lobby. Any other move is refused and leaves the status
    /// as it was.
    fn transition(&mut self, to: RoomStatus) -> Result<(), RoomError> {
        let from = self.status;
        if !from.can_transition_to(to) {
            tracing::debug!(room_id = %self.room_id, %from, %to, "transition refused");
            return Err(RoomError::InvalidState(format!(
                "cannot move from {from} to {to}"
            )));
        }
        tracing::debug!(room_id = %self.room_id, %from, %to, "status changed");
        self.status = to;
        Ok(())
    }

    // -- Output ------------------------------------------------------------

    /// Ranked members still in the room. Departed finishers keep their
    /// ranks, so the list can have gaps.
    fn ranking(&self) -> Vec<RankingEntry> {
        let mut ranking: Vec<RankingEntry> = self
            .roster
            .iter()
            .filter_map(|p| {
                Some(RankingEntry {
                    connection_id: p.connection_id(),
                    display_name: p.display_name().to_string(),
                    wpm: p.stats().wpm(),
                    accuracy: p.stats().accuracy(),
                    rank: p.rank()?,
                })
            })
            .collect();
        ranking.sort_by_key(|e| e.rank);
        ranking
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            status: self.status,
            config: self.race,
            participants: self.roster.views(self.start_time),
        }
    }

    fn info(&self) -> RoomListEntry {
        RoomListEntry {
            room_id: self.room_id.clone(),
            status: self.status,
            mode: self.race.mode(),
            participant_count: self.roster.len(),
            max_participants: self.roster.capacity(),
        }
    }

    fn broadcast_snapshot(&self) {
        self.roster.broadcast(&ServerEvent::Snapshot(self.snapshot()));
    }

    fn reject_log(
        &self,
        connection_id: ConnectionId,
        op: &'static str,
        result: &Result<(), RoomError>,
    ) {
        if let Err(e) = result {
            tracing::debug!(
                room_id = %self.room_id,
                %connection_id,
                op,
                error = %e,
                "request rejected"
            );
        }
    }

    /// Final cleanup: tell anyone still here, then drop out of the
    /// registry. Timers go with the actor.
    fn close(self, reason: &'static str) {
        if !self.roster.is_empty() {
            self.roster.broadcast(&ServerEvent::RoomClosed {
                reason: reason.to_string(),
            });
        }
        let members: Vec<ConnectionId> =
            self.roster.iter().map(|p| p.connection_id()).collect();
        self.deps
            .directory
            .release_room(&self.room_id, self.instance, &members);
        tracing::info!(room_id = %self.room_id, reason, "room actor stopped");
    }
}

/// Recomputes a participant's stats from a progress report.
#[allow(clippy::too_many_arguments)]
fn compute_stats(
    strategy: &dyn RaceRule,
    previous: RaceStats,
    typed_length: u32,
    correct_chars: u32,
    typed_chars: u32,
    total_length: u32,
    start: Instant,
    now: Instant,
) -> RaceStats {
    let progress = strategy.calculate_progress(typed_length, total_length, start, now);
    let wpm = gross_wpm(typed_length, strategy.scoring_elapsed(start, now));
    previous.update(wpm, accuracy(correct_chars, typed_chars), progress)
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    race: RaceConfig,
    deps: RoomDeps,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(deps.settings.channel_size);
    let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);

    let mut timers = Timers::new();
    // Reaped if nobody ever joins.
    timers.arm_in(RoomTimer::IdleExpiry, deps.settings.idle_timeout);

    let actor = RoomActor {
        roster: Roster::new(room_id.clone(), deps.settings.max_participants),
        room_id: room_id.clone(),
        instance,
        status: RoomStatus::Lobby,
        race,
        strategy: None,
        text_length: 0,
        start_time: None,
        countdown_remaining: 0,
        next_rank: 1,
        timers,
        deps,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        instance,
        sender: tx,
    }
}
