//! Room: shared broadcast domain for one listening port
//!
//! Holds the current members and a bounded backlog of recent messages.
//! Every line broadcast to the room is appended to the backlog and fanned
//! out to all members, sender included; new joiners get the backlog
//! replayed before any live traffic.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::participant::Participant;
use crate::types::SessionId;

/// Broadcast domain shared by all sessions on one port.
///
/// Membership and backlog live behind a single mutex. The lock is held
/// across the fan-out so every member's queue sees broadcasts in the
/// same global order; that is safe because `Participant::deliver` is a
/// non-blocking enqueue, so the critical section never waits on a slow
/// peer. The lock is never held across an await point.
pub struct Room {
    state: Mutex<RoomState>,
    max_backlog: usize,
}

struct RoomState {
    /// Insertion-ordered, unique by session id
    participants: Vec<Arc<dyn Participant>>,
    backlog: VecDeque<String>,
}

impl Room {
    /// Create an empty room retaining up to `max_backlog` recent messages
    pub fn new(max_backlog: usize) -> Self {
        Self {
            state: Mutex::new(RoomState {
                participants: Vec::new(),
                backlog: VecDeque::new(),
            }),
            max_backlog,
        }
    }

    /// Add a participant and replay the current backlog to it, oldest
    /// first. Joining twice with the same id is a no-op.
    ///
    /// The replay lands in the participant's queue before any broadcast
    /// that follows this join, so a joiner never sees live traffic ahead
    /// of history.
    pub fn join(&self, participant: Arc<dyn Participant>) {
        let mut state = self.state.lock().expect("room lock poisoned");

        if state.participants.iter().any(|p| p.id() == participant.id()) {
            return;
        }

        for msg in &state.backlog {
            participant.deliver(msg);
        }
        state.participants.push(participant);

        debug!(members = state.participants.len(), "participant joined");
    }

    /// Remove a participant by id. No-op if it is not a member: leave
    /// races with concurrent broadcasts, and a stop sequence may run
    /// more than once.
    pub fn leave(&self, id: SessionId) {
        let mut state = self.state.lock().expect("room lock poisoned");
        state.participants.retain(|p| p.id() != id);

        debug!(members = state.participants.len(), "participant left");
    }

    /// Append a message to the backlog (evicting the oldest past
    /// capacity) and deliver it to every current member, sender
    /// included. Individual delivery failures are the participant's
    /// problem and never abort the fan-out.
    pub fn broadcast(&self, msg: &str) {
        let mut state = self.state.lock().expect("room lock poisoned");

        state.backlog.push_back(msg.to_string());
        while state.backlog.len() > self.max_backlog {
            state.backlog.pop_front();
        }

        for participant in &state.participants {
            participant.deliver(msg);
        }
    }

    /// Current number of members
    pub fn member_count(&self) -> usize {
        self.state.lock().expect("room lock poisoned").participants.len()
    }

    /// Copy of the current backlog, oldest first
    pub fn backlog_snapshot(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("room lock poisoned")
            .backlog
            .iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory participant recording everything delivered to it
    struct FakeParticipant {
        id: SessionId,
        received: Mutex<Vec<String>>,
    }

    impl FakeParticipant {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: SessionId::new(),
                received: Mutex::new(Vec::new()),
            })
        }

        fn received(&self) -> Vec<String> {
            self.received.lock().unwrap().clone()
        }
    }

    impl Participant for FakeParticipant {
        fn id(&self) -> SessionId {
            self.id
        }

        fn deliver(&self, msg: &str) {
            self.received.lock().unwrap().push(msg.to_string());
        }
    }

    #[test]
    fn test_broadcast_reaches_all_members_including_sender() {
        let room = Room::new(100);
        let a = FakeParticipant::new();
        let b = FakeParticipant::new();
        room.join(a.clone());
        room.join(b.clone());

        room.broadcast("hi");

        assert_eq!(a.received(), vec!["hi"]);
        assert_eq!(b.received(), vec!["hi"]);
    }

    #[test]
    fn test_backlog_bounded_to_capacity() {
        let room = Room::new(100);
        for i in 1..=101 {
            room.broadcast(&format!("msg-{i}"));
        }

        let backlog = room.backlog_snapshot();
        assert_eq!(backlog.len(), 100);
        // Oldest message evicted: backlog holds broadcasts #2..=#101.
        assert_eq!(backlog.first().unwrap(), "msg-2");
        assert_eq!(backlog.last().unwrap(), "msg-101");
    }

    #[test]
    fn test_join_replays_backlog_in_order() {
        let room = Room::new(100);
        room.broadcast("one");
        room.broadcast("two");
        room.broadcast("three");

        let late = FakeParticipant::new();
        room.join(late.clone());

        assert_eq!(late.received(), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_join_replay_precedes_live_traffic() {
        let room = Room::new(100);
        room.broadcast("old");

        let p = FakeParticipant::new();
        room.join(p.clone());
        room.broadcast("new");

        assert_eq!(p.received(), vec!["old", "new"]);
    }

    #[test]
    fn test_per_participant_order_matches_broadcast_order() {
        let room = Room::new(100);
        let p = FakeParticipant::new();
        room.join(p.clone());

        for i in 0..50 {
            room.broadcast(&format!("{i}"));
        }

        let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(p.received(), expected);
    }

    #[test]
    fn test_leave_stops_delivery() {
        let room = Room::new(100);
        let a = FakeParticipant::new();
        let b = FakeParticipant::new();
        room.join(a.clone());
        room.join(b.clone());

        room.broadcast("hi");
        room.leave(b.id());
        room.broadcast("bye");

        assert_eq!(a.received(), vec!["hi", "bye"]);
        assert_eq!(b.received(), vec!["hi"]);
        assert_eq!(room.member_count(), 1);
        assert_eq!(room.backlog_snapshot(), vec!["hi", "bye"]);
    }

    #[test]
    fn test_leave_is_idempotent() {
        let room = Room::new(100);
        let a = FakeParticipant::new();
        let b = FakeParticipant::new();
        room.join(a.clone());
        room.join(b.clone());

        room.leave(b.id());
        room.leave(b.id());

        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_leave_of_unknown_participant_is_noop() {
        let room = Room::new(100);
        let a = FakeParticipant::new();
        room.join(a.clone());

        room.leave(SessionId::new());

        assert_eq!(room.member_count(), 1);
    }

    #[test]
    fn test_duplicate_join_keeps_single_membership() {
        let room = Room::new(100);
        let a = FakeParticipant::new();
        room.join(a.clone());
        room.join(a.clone());

        room.broadcast("hi");

        assert_eq!(room.member_count(), 1);
        // Delivered once, not once per join.
        assert_eq!(a.received(), vec!["hi"]);
    }

    #[test]
    fn test_broadcast_with_no_members_still_records_backlog() {
        let room = Room::new(100);
        room.broadcast("lonely");
        assert_eq!(room.backlog_snapshot(), vec!["lonely"]);
    }
}
