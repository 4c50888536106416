//! Cancellable one-shot timers, one slot per kind.
//!
//! A timer is just a deadline. Cancelling clears the slot, so a cancelled
//! timer can never fire. Arming an armed slot replaces it, which keeps at
//! most one timer of each kind alive.

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Next countdown number.
    CountdownTick,
    /// Robot commits its gesture shortly before the cue.
    RobotCommit,
    /// End of the committal cue; opens the detection window.
    Reveal,
    /// Detection window closes without a player gesture.
    DetectionTimeout,
    /// Pause between a judged round and the next countdown.
    NextRound,
}

impl TimerKind {
    pub const ALL: [TimerKind; 5] = [
        Self::CountdownTick,
        Self::RobotCommit,
        Self::Reveal,
        Self::DetectionTimeout,
        Self::NextRound,
    ];

    fn slot(&self) -> usize {
        match self {
            Self::CountdownTick => 0,
            Self::RobotCommit => 1,
            Self::Reveal => 2,
            Self::DetectionTimeout => 3,
            Self::NextRound => 4,
        }
    }
}

#[derive(Debug, Default)]
pub struct Timers {
    deadlines: [Option<Instant>; 5],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: TimerKind, at: Instant) {
        self.deadlines[kind.slot()] = Some(at);
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.deadlines[kind.slot()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.deadlines = [None; 5];
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.deadlines[kind.slot()].is_some()
    }

    pub fn armed(&self) -> Vec<TimerKind> {
        TimerKind::ALL.into_iter().filter(|k| self.is_armed(*k)).collect()
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.iter().flatten().min().copied()
    }

    /// Disarm and return the earliest timer due at `now`.
    /// Ties resolve in `TimerKind::ALL` order.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerKind, Instant)> {
        let mut due: Option<(TimerKind, Instant)> = None;
        for kind in TimerKind::ALL {
            if let Some(at) = self.deadlines[kind.slot()] {
                if at <= now && due.is_none_or(|(_, best)| at < best) {
                    due = Some((kind, at));
                }
            }
        }
        if let Some((kind, _)) = due {
            self.cancel(kind);
        }
        due
    }
}
