use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeDelta, Utc};

use crate::canvas::{Assignment, CanvasClient};
use crate::composer;
use crate::llm::Rephraser;
use crate::telegram::Notifier;
use crate::tracker::ReminderTracker;

/// Lead times before the due date at which a reminder may fire.
pub const REMINDER_LEADS: [Duration; 4] = [
    Duration::from_secs(12 * 3600),
    Duration::from_secs(6 * 3600),
    Duration::from_secs(3 * 3600),
    Duration::from_secs(3600),
];

/// Assignments qualify when due in the future but within this window.
pub const REMINDER_WINDOW: Duration = Duration::from_secs(48 * 3600);

/// Per-course daily loop: one pass at startup, then one pass at every
/// daily wall-clock boundary, forever. Fetch failures are logged and the
/// loop waits for its next natural tick.
pub struct ReminderLoop {
    canvas: CanvasClient,
    notifier: Arc<Notifier>,
    rephraser: Arc<dyn Rephraser>,
    tracker: Arc<ReminderTracker>,
    course_id: i64,
    daily_hour: u32,
}

impl ReminderLoop {
    pub fn new(
        canvas: CanvasClient,
        notifier: Arc<Notifier>,
        rephraser: Arc<dyn Rephraser>,
        tracker: Arc<ReminderTracker>,
        course_id: i64,
        daily_hour: u32,
    ) -> Self {
        Self {
            canvas,
            notifier,
            rephraser,
            tracker,
            course_id,
            daily_hour,
        }
    }

    pub async fn run(self) {
        tracing::info!(course_id = self.course_id, "Starting initial assignment fetch");
        self.tick().await;

        loop {
            let now = Local::now();
            let next_run = next_daily_run(now, self.daily_hour);
            tracing::info!(
                course_id = self.course_id,
                next_run = %next_run.to_rfc2822(),
                "Next assignment check scheduled"
            );
            let wait = (next_run - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
            self.tick().await;
        }
    }

    async fn tick(&self) {
        let assignments = match self.canvas.assignments(self.course_id).await {
            Ok(assignments) => assignments,
            Err(e) => {
                tracing::error!(course_id = self.course_id, error = %e, "Failed to fetch assignments");
                return;
            }
        };

        let now = Utc::now();
        let evicted = self.tracker.evict_expired(now);
        if evicted > 0 {
            tracing::debug!(evicted, "Dropped expired reminder entries");
        }

        for (assignment, lead) in plan_reminders(&assignments, now, &self.tracker) {
            self.spawn_reminder(assignment, lead);
        }
    }

    fn spawn_reminder(&self, assignment: Assignment, lead: Duration) {
        let Some(due_at) = assignment.due_at else {
            return;
        };
        let reminder_time = due_at - TimeDelta::seconds(lead.as_secs() as i64);
        let notifier = Arc::clone(&self.notifier);
        let rephraser = Arc::clone(&self.rephraser);

        tokio::spawn(async move {
            tracing::info!(
                assignment = %assignment.name,
                fire_at = %reminder_time.to_rfc2822(),
                "Reminder scheduled"
            );
            let wait = (reminder_time - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            let message = composer::compose(rephraser.as_ref(), &assignment).await;
            notifier.broadcast(&message).await;
        });
    }
}

/// Decide which (assignment, lead-time) reminders a pass should schedule,
/// claiming each pair so a later pass cannot schedule it again.
pub fn plan_reminders(
    assignments: &[Assignment],
    now: DateTime<Utc>,
    tracker: &ReminderTracker,
) -> Vec<(Assignment, Duration)> {
    let mut planned = Vec::new();
    for assignment in assignments {
        if !due_within_window(assignment, now) {
            continue;
        }
        if assignment.has_submitted_submissions {
            tracing::info!(assignment = %assignment.name, "Already submitted, skipping");
            continue;
        }
        let Some(due_at) = assignment.due_at else {
            continue;
        };
        for lead in pending_leads(due_at, now) {
            if tracker.claim(assignment.id, due_at, lead) {
                planned.push((assignment.clone(), lead));
            }
        }
    }
    planned
}

/// Due strictly in the future and no more than the reminder window away.
pub fn due_within_window(assignment: &Assignment, now: DateTime<Utc>) -> bool {
    let Some(due_at) = assignment.due_at else {
        return false;
    };
    let remaining = due_at - now;
    remaining > TimeDelta::zero() && remaining <= window_delta()
}

/// Lead times whose reminder moment has not already passed.
pub fn pending_leads(due_at: DateTime<Utc>, now: DateTime<Utc>) -> Vec<Duration> {
    REMINDER_LEADS
        .iter()
        .copied()
        .filter(|lead| due_at - TimeDelta::seconds(lead.as_secs() as i64) > now)
        .collect()
}

/// Next wall-clock boundary: today at `hour` if still ahead, else
/// tomorrow.
pub fn next_daily_run(now: DateTime<Local>, hour: u32) -> DateTime<Local> {
    let wall = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(wall);
    if let Some(candidate) = today.and_local_timezone(Local).earliest() {
        if candidate > now {
            return candidate;
        }
    }
    // Tomorrow; falls back to a plain 24h step if the wall-clock time does
    // not exist on that date (DST gap).
    (today + TimeDelta::days(1))
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or(now + TimeDelta::days(1))
}

fn window_delta() -> TimeDelta {
    TimeDelta::seconds(REMINDER_WINDOW.as_secs() as i64)
}
