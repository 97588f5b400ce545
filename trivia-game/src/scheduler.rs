//! Virtual-clock alarms for opponent answers and mode deadlines.
//!
//! Tasks carry the session generation they were scheduled under. The session
//! bumps its generation on start and reset, so a task captured before a reset
//! can be recognised as stale when it is finally delivered.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// The opponent's answer to question number `seq` (1-based).
    OpponentAnswer { seq: u32 },
    LightningDeadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: u64,
    pub due_ms: u64,
    pub generation: u64,
    pub kind: TaskKind,
}

/// Pending tasks ordered by due time, then by scheduling order.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    next_id: u64,
    pending: Vec<ScheduledTask>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, generation: u64, kind: TaskKind) -> ScheduledTask {
        self.next_id += 1;
        let task = ScheduledTask {
            id: self.next_id,
            due_ms,
            generation,
            kind,
        };
        let at = self
            .pending
            .partition_point(|t| (t.due_ms, t.id) <= (task.due_ms, task.id));
        self.pending.insert(at, task);
        task
    }

    /// Drop every pending task. Returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    /// Remove and return the earliest task due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledTask> {
        if self.pending.first().is_some_and(|t| t.due_ms <= now_ms) {
            Some(self.pending.remove(0))
        } else {
            None
        }
    }

    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.pending.first().map(|t| t.due_ms)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.pending.iter()
    }
}
