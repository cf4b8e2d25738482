use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

const DEFAULT_EVICTION_GRACE_HOURS: i64 = 24;

#[derive(Debug)]
struct ReminderEntry {
    due_at: DateTime<Utc>,
    claimed: HashSet<Duration>,
}

/// Remembers which (assignment, lead-time) pairs have already been handed
/// to a reminder task. Shared across the per-course loops, so all access
/// goes through one lock.
pub struct ReminderTracker {
    entries: Mutex<HashMap<i64, ReminderEntry>>,
    grace: TimeDelta,
}

impl ReminderTracker {
    pub fn new() -> Self {
        Self::with_grace(TimeDelta::hours(DEFAULT_EVICTION_GRACE_HOURS))
    }

    pub fn with_grace(grace: TimeDelta) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            grace,
        }
    }

    /// Atomically claim a (assignment, lead-time) pair. Returns false when
    /// the pair was already claimed; a claimed pair is never offered again,
    /// so repeated evaluation passes cannot double-schedule a reminder.
    pub fn claim(&self, assignment_id: i64, due_at: DateTime<Utc>, lead: Duration) -> bool {
        let mut entries = self.entries.lock().expect("reminder tracker lock poisoned");
        let entry = entries.entry(assignment_id).or_insert_with(|| ReminderEntry {
            due_at,
            claimed: HashSet::new(),
        });
        entry.due_at = due_at;
        entry.claimed.insert(lead)
    }

    /// Drop assignments whose due time passed the grace window, keeping the
    /// map bounded over a long-running process.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().expect("reminder tracker lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| entry.due_at + self.grace > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("reminder tracker lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReminderTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Last-observed numeric score per course. A course never seen reads as
/// 0.0, so the first real fetch registers as a change unless the score is
/// exactly zero.
#[derive(Default)]
pub struct ScoreTracker {
    scores: Mutex<HashMap<i64, f64>>,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest score, returning the previous value when it
    /// differs.
    pub fn record(&self, course_id: i64, score: f64) -> Option<f64> {
        let mut scores = self.scores.lock().expect("score tracker lock poisoned");
        let previous = scores.get(&course_id).copied().unwrap_or(0.0);
        if previous == score {
            return None;
        }
        scores.insert(course_id, score);
        Some(previous)
    }
}
