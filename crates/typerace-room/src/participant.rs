//! Participants and the room roster.

use tokio::sync::mpsc;
use tokio::time::Instant;
use typerace_protocol::{ConnectionId, ParticipantView, RoomId, ServerEvent};

use crate::{RaceStats, RoomError};

/// Channel sender for delivering outbound events to one connection.
pub type ParticipantSender = mpsc::UnboundedSender<ServerEvent>;

/// One connected racer and their race state.
#[derive(Debug)]
pub struct Participant {
    connection_id: ConnectionId,
    display_name: String,
    is_host: bool,
    stats: RaceStats,
    rank: Option<u32>,
    finished_at: Option<Instant>,
    typed_length: u32,
    /// Last reported keystroke totals, kept so a forced finish can
    /// recompute final stats.
    correct_chars: u32,
    typed_chars: u32,
    sender: ParticipantSender,
}

impl Participant {
    fn new(
        connection_id: ConnectionId,
        display_name: String,
        sender: ParticipantSender,
    ) -> Self {
        Self {
            connection_id,
            display_name,
            is_host: false,
            stats: RaceStats::default(),
            rank: None,
            finished_at: None,
            typed_length: 0,
            correct_chars: 0,
            typed_chars: 0,
            sender,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn stats(&self) -> RaceStats {
        self.stats
    }

    pub fn rank(&self) -> Option<u32> {
        self.rank
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    pub fn typed_length(&self) -> u32 {
        self.typed_length
    }

    /// Last reported `(correct_chars, typed_chars)`.
    pub fn keystrokes(&self) -> (u32, u32) {
        (self.correct_chars, self.typed_chars)
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Stores an accepted progress report. Ignored once finished: a
    /// finished participant's numbers are frozen.
    pub(crate) fn record_progress(
        &mut self,
        typed_length: u32,
        correct_chars: u32,
        typed_chars: u32,
        stats: RaceStats,
    ) {
        if self.is_finished() {
            return;
        }
        self.typed_length = typed_length;
        self.correct_chars = correct_chars;
        self.typed_chars = typed_chars;
        self.stats = stats;
    }

    /// Stamps the finish. Rank is assigned once; returns `false` (and
    /// changes nothing) if already finished.
    pub(crate) fn finish(&mut self, at: Instant, rank: u32) -> bool {
        if self.is_finished() {
            return false;
        }
        self.finished_at = Some(at);
        self.rank = Some(rank);
        true
    }

    /// Clears all race state for a rematch.
    pub(crate) fn reset(&mut self) {
        self.stats = RaceStats::default();
        self.rank = None;
        self.finished_at = None;
        self.typed_length = 0;
        self.correct_chars = 0;
        self.typed_chars = 0;
    }

    /// Sends an event to this participant. Silently drops it if the
    /// connection's receiver is gone.
    pub(crate) fn send(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// The public view of this participant.
    pub fn view(&self, race_start: Option<Instant>) -> ParticipantView {
        let finished_after_ms = match (race_start, self.finished_at) {
            (Some(start), Some(end)) => {
                Some(end.saturating_duration_since(start).as_millis() as u64)
            }
            _ => None,
        };
        ParticipantView {
            connection_id: self.connection_id,
            display_name: self.display_name.clone(),
            is_host: self.is_host,
            wpm: self.stats.wpm(),
            accuracy: self.stats.accuracy(),
            progress: self.stats.progress(),
            rank: self.rank,
            finished_after_ms,
        }
    }
}

/// The participants of one room, in join order.
///
/// Join order matters: it picks the next host when the host leaves and
/// breaks ties in forced rankings. While non-empty, exactly one member is
/// host.
#[derive(Debug)]
pub struct Roster {
    room_id: RoomId,
    capacity: Option<usize>,
    members: Vec<Participant>,
}

impl Roster {
    /// Creates an empty roster. `capacity` of `None` means unlimited.
    pub fn new(room_id: RoomId, capacity: Option<usize>) -> Self {
        Self {
            room_id,
            capacity,
            members: Vec::new(),
        }
    }

    /// Adds a participant. The first one in becomes host.
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        display_name: String,
        sender: ParticipantSender,
    ) -> Result<&Participant, RoomError> {
        if self.contains(connection_id) {
            return Err(RoomError::AlreadyInRoom(
                connection_id,
                self.room_id.clone(),
            ));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }

        let mut participant =
            Participant::new(connection_id, display_name, sender);
        participant.is_host = self.members.is_empty();
        self.members.push(participant);
        Ok(&self.members[self.members.len() - 1])
    }

    /// Removes a participant. If they were host and others remain, the
    /// earliest-joined remaining participant becomes host.
    pub fn leave(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<Participant, RoomError> {
        let index = self
            .position(connection_id)
            .ok_or(RoomError::NoSuchParticipant(connection_id))?;
        let removed = self.members.remove(index);
        if removed.is_host {
            if let Some(next) = self.members.first_mut() {
                next.is_host = true;
            }
        }
        Ok(removed)
    }

    /// Moves the host role from `requester` to `target`.
    pub fn transfer_host(
        &mut self,
        requester: ConnectionId,
        target: ConnectionId,
    ) -> Result<(), RoomError> {
        if !self.is_host(requester) {
            return Err(RoomError::NotHost(requester));
        }
        let target_index = self
            .position(target)
            .ok_or(RoomError::NoSuchParticipant(target))?;
        for member in &mut self.members {
            member.is_host = false;
        }
        self.members[target_index].is_host = true;
        Ok(())
    }

    /// The current host.
    pub fn host(&self) -> Option<ConnectionId> {
        self.members
            .iter()
            .find(|p| p.is_host)
            .map(|p| p.connection_id)
    }

    pub fn is_host(&self, connection_id: ConnectionId) -> bool {
        self.host() == Some(connection_id)
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.position(connection_id).is_some()
    }

    fn position(&self, connection_id: ConnectionId) -> Option<usize> {
        self.members
            .iter()
            .position(|p| p.connection_id == connection_id)
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<&Participant> {
        self.members
            .iter()
            .find(|p| p.connection_id == connection_id)
    }

    pub(crate) fn get_mut(
        &mut self,
        connection_id: ConnectionId,
    ) -> Option<&mut Participant> {
        self.members
            .iter_mut()
            .find(|p| p.connection_id == connection_id)
    }

    /// Participants in join order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.members.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.members.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.members.len() >= cap)
    }

    /// Number of participants with a finish stamped.
    pub fn finished_count(&self) -> usize {
        self.members.iter().filter(|p| p.is_finished()).count()
    }

    /// `true` when the roster is non-empty and everyone has finished.
    pub fn all_finished(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(|p| p.is_finished())
    }

    /// Sends `event` to every participant.
    pub(crate) fn broadcast(&self, event: &ServerEvent) {
        for member in &self.members {
            member.send(event.clone());
        }
    }

    /// Public views of everyone, in join order.
    pub fn views(&self, race_start: Option<Instant>) -> Vec<ParticipantView> {
        self.members.iter().map(|p| p.view(race_start)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId(id)
    }

    fn sender() -> ParticipantSender {
        mpsc::unbounded_channel().0
    }

    fn roster(capacity: Option<usize>) -> Roster {
        Roster::new(RoomId::new("TEST"), capacity)
    }

    #[test]
    fn test_first_joiner_is_host() {
        let mut r = roster(None);
        assert!(r.join(cid(1), "ada".into(), sender()).unwrap().is_host());
        assert!(!r.join(cid(2), "bob".into(), sender()).unwrap().is_host());
        assert_eq!(r.host(), Some(cid(1)));
    }

    #[test]
    fn test_join_rejects_duplicate_and_full() {
        let mut r = roster(Some(2));
        r.join(cid(1), "ada".into(), sender()).unwrap();
        assert!(matches!(
            r.join(cid(1), "ada".into(), sender()),
            Err(RoomError::AlreadyInRoom(..))
        ));
        r.join(cid(2), "bob".into(), sender()).unwrap();
        assert!(matches!(
            r.join(cid(3), "cy".into(), sender()),
            Err(RoomError::RoomFull(_))
        ));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_host_leaving_promotes_earliest_joined() {
        let mut r = roster(None);
        r.join(cid(1), "ada".into(), sender()).unwrap();
        r.join(cid(2), "bob".into(), sender()).unwrap();
        r.join(cid(3), "cy".into(), sender()).unwrap();

        r.leave(cid(1)).unwrap();
        assert_eq!(r.host(), Some(cid(2)));
        assert_eq!(r.iter().filter(|p| p.is_host()).count(), 1);
    }

    #[test]
    fn test_non_host_leaving_keeps_host() {
        let mut r = roster(None);
        r.join(cid(1), "ada".into(), sender()).unwrap();
        r.join(cid(2), "bob".into(), sender()).unwrap();
        r.leave(cid(2)).unwrap();
        assert_eq!(r.host(), Some(cid(1)));
    }

    #[test]
    fn test_leave_unknown_participant() {
        let mut r = roster(None);
        assert!(matches!(
            r.leave(cid(9)),
            Err(RoomError::NoSuchParticipant(_))
        ));
    }

    #[test]
    fn test_transfer_host() {
        let mut r = roster(None);
        r.join(cid(1), "ada".into(), sender()).unwrap();
        r.join(cid(2), "bob".into(), sender()).unwrap();

        assert!(matches!(
            r.transfer_host(cid(2), cid(1)),
            Err(RoomError::NotHost(_))
        ));
        assert!(matches!(
            r.transfer_host(cid(1), cid(7)),
            Err(RoomError::NoSuchParticipant(_))
        ));
        assert_eq!(r.host(), Some(cid(1)));

        r.transfer_host(cid(1), cid(2)).unwrap();
        assert_eq!(r.host(), Some(cid(2)));
        assert_eq!(r.iter().filter(|p| p.is_host()).count(), 1);
    }

    #[test]
    fn test_transferred_host_leaving_promotes_earliest_joined() {
        let mut r = roster(None);
        r.join(cid(1), "ada".into(), sender()).unwrap();
        r.join(cid(2), "bob".into(), sender()).unwrap();
        r.join(cid(3), "cy".into(), sender()).unwrap();
        r.transfer_host(cid(1), cid(3)).unwrap();

        r.leave(cid(3)).unwrap();
        assert_eq!(r.host(), Some(cid(1)));
    }

    #[test]
    fn test_finish_is_assigned_once() {
        let mut r = roster(None);
        r.join(cid(1), "ada".into(), sender()).unwrap();
        let now = Instant::now();
        let p = r.get_mut(cid(1)).unwrap();

        assert!(p.finish(now, 1));
        assert!(!p.finish(now, 5));
        assert_eq!(p.rank(), Some(1));

        let frozen = p.stats();
        p.record_progress(99, 99, 99, RaceStats::default().update(1.0, 1.0, 1.0));
        assert_eq!(p.stats(), frozen);
        assert_eq!(p.typed_length(), 0);
        assert!(r.all_finished());
    }

    #[test]
    fn test_reset_clears_race_state() {
        let mut r = roster(None);
        r.join(cid(1), "ada".into(), sender()).unwrap();
        let p = r.get_mut(cid(1)).unwrap();
        p.record_progress(5, 4, 5, RaceStats::default().update(30.0, 80.0, 50.0));
        p.finish(Instant::now(), 1);

        p.reset();
        assert_eq!(p.stats(), RaceStats::default());
        assert_eq!(p.rank(), None);
        assert!(!p.is_finished());
        assert_eq!(p.keystrokes(), (0, 0));
    }
}
