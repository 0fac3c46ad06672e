//! Where finished races go.

use typerace_protocol::{RankingEntry, RoomId};

/// Records the outcome of a finished race.
///
/// Persistence lives outside the coordinator; this is the seam it plugs
/// into. Called from the room's actor, so implementations should hand the
/// work off (spawn, queue) rather than block.
pub trait ResultSink: Send + Sync + 'static {
    /// `ranking` is ordered by rank and holds the participants still in
    /// the room. A racer who finished and then left keeps their rank, so
    /// the ranks may skip numbers (`[1, 3]`, or `[2]` on its own).
    fn record(&self, room_id: &RoomId, ranking: &[RankingEntry]);
}

/// A [`ResultSink`] that only logs the ranking.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn record(&self, room_id: &RoomId, ranking: &[RankingEntry]) {
        for entry in ranking {
            tracing::info!(
                %room_id,
                rank = entry.rank,
                connection_id = %entry.connection_id,
                name = %entry.display_name,
                wpm = entry.wpm,
                accuracy = entry.accuracy,
                "race result"
            );
        }
    }
}
