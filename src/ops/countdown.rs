//! Live countdowns for unfinished tasks.
//!
//! One scheduler drives every countdown: each tick walks the running
//! entries in display order and re-evaluates their phase against the
//! current time. Entries are keyed by [`TaskId`], so deleting a task never
//! disturbs the countdowns of the tasks after it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::task::{Task, TaskId};
use crate::util::time::{Hms, diff};

/// Countdown resolution. Display precision is whole seconds.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub const DEADLINE_PASSED: &str = "Deadline passed!";

/// Where a task sits relative to its start and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `now < start`
    Pending { starts_in: Hms },
    /// `start <= now < deadline`
    Active { time_left: Hms },
    /// `now >= deadline`; terminal
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Pending,
    Active,
    Expired,
}

impl Phase {
    /// The deadline check comes first, so `deadline <= start` is Expired
    /// from the outset.
    pub fn evaluate(start: DateTime<Utc>, deadline: DateTime<Utc>, now: DateTime<Utc>) -> Phase {
        if now >= deadline {
            Phase::Expired
        } else if now < start {
            Phase::Pending {
                starts_in: Hms::from_delta(diff(start, now)),
            }
        } else {
            Phase::Active {
                time_left: Hms::from_delta(diff(deadline, now)),
            }
        }
    }

    pub fn of(task: &Task, now: DateTime<Utc>) -> Phase {
        Self::evaluate(task.start, task.deadline, now)
    }

    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Pending { .. } => PhaseKind::Pending,
            Phase::Active { .. } => PhaseKind::Active,
            Phase::Expired => PhaseKind::Expired,
        }
    }

    /// The countdown currently shown, if any
    pub fn remaining(&self) -> Option<Hms> {
        match self {
            Phase::Pending { starts_in } => Some(*starts_in),
            Phase::Active { time_left } => Some(*time_left),
            Phase::Expired => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Expired)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Pending { starts_in } => write!(f, "Starts in: {}", starts_in),
            Phase::Active { time_left } => write!(f, "Time left: {}", time_left),
            Phase::Expired => f.write_str(DEADLINE_PASSED),
        }
    }
}

/// One evaluation of one task's countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownUpdate {
    pub id: TaskId,
    pub phase: Phase,
    /// The phase kind differs from the previous report (or there was none)
    pub transitioned: bool,
}

/// Tracks which tasks have a running countdown and what each last showed.
#[derive(Debug, Default)]
pub struct CountdownScheduler {
    running: HashSet<TaskId>,
    last: HashMap<TaskId, Phase>,
}

impl CountdownScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the countdown for `task` and evaluate it immediately.
    ///
    /// Any running entry for the same id is replaced. A task whose first
    /// evaluation is already Expired reports once and is not kept running.
    /// Completed tasks get no countdown.
    pub fn start(&mut self, task: &Task, now: DateTime<Utc>) -> Option<CountdownUpdate> {
        self.running.remove(&task.id);
        if task.completed {
            self.last.remove(&task.id);
            return None;
        }
        let update = self.record(task.id, Phase::of(task, now));
        if !update.phase.is_terminal() {
            self.running.insert(task.id);
        }
        Some(update)
    }

    /// Stop a countdown and forget its display. True if it was running.
    pub fn stop(&mut self, id: TaskId) -> bool {
        self.last.remove(&id);
        self.running.remove(&id)
    }

    /// Evaluate every running countdown once.
    ///
    /// Entries whose task is gone or completed are dropped without an
    /// update. Entries that reach Expired report it and stop.
    pub fn tick(&mut self, tasks: &[Task], now: DateTime<Utc>) -> Vec<CountdownUpdate> {
        self.forget_missing(tasks);
        let mut updates = Vec::new();
        for task in tasks {
            if !self.running.contains(&task.id) {
                continue;
            }
            if task.completed {
                self.stop(task.id);
                continue;
            }
            let update = self.record(task.id, Phase::of(task, now));
            if update.phase.is_terminal() {
                self.running.remove(&task.id);
            }
            updates.push(update);
        }
        updates
    }

    /// Bring the running set in line with the task list after a reload or
    /// a full redraw: start every unfinished task that isn't running, stop
    /// completed ones and forget removed ones.
    pub fn sync(&mut self, tasks: &[Task], now: DateTime<Utc>) -> Vec<CountdownUpdate> {
        self.forget_missing(tasks);
        let mut updates = Vec::new();
        for task in tasks {
            if task.completed {
                self.stop(task.id);
            } else if !self.running.contains(&task.id)
                && let Some(update) = self.start(task, now)
            {
                updates.push(update);
            }
        }
        updates
    }

    pub fn is_running(&self, id: TaskId) -> bool {
        self.running.contains(&id)
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Last reported phase, for drawing
    pub fn phase(&self, id: TaskId) -> Option<Phase> {
        self.last.get(&id).copied()
    }

    fn record(&mut self, id: TaskId, phase: Phase) -> CountdownUpdate {
        let previous = self.last.insert(id, phase);
        let transitioned = previous.is_none_or(|p| p.kind() != phase.kind());
        if transitioned {
            tracing::debug!(task = %id, phase = ?phase.kind(), "countdown phase");
        }
        CountdownUpdate {
            id,
            phase,
            transitioned,
        }
    }

    fn forget_missing(&mut self, tasks: &[Task]) {
        let live: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();
        self.running.retain(|id| live.contains(id));
        self.last.retain(|id, _| live.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;

    fn now0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        now0() + TimeDelta::seconds(secs)
    }

    /// Starts 10s after now0, due an hour after that
    fn write_report() -> Task {
        let t0 = at(10);
        Task::new(
            TaskId(1),
            "Write report".into(),
            t0,
            t0 + TimeDelta::milliseconds(3_600_000),
        )
    }

    fn hms(hours: i64, minutes: i64, seconds: i64) -> Hms {
        Hms {
            hours,
            minutes,
            seconds,
        }
    }

    #[test]
    fn write_report_scenario() {
        let task = write_report();
        let tasks = vec![task.clone()];
        let mut sched = CountdownScheduler::new();

        let first = sched.start(&task, now0()).unwrap();
        assert_eq!(first.phase, Phase::Pending { starts_in: hms(0, 0, 10) });
        assert!(first.transitioned);

        let updates = sched.tick(&tasks, at(1));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].phase.to_string(), "Starts in: 0h 0m 9s");
        assert!(!updates[0].transitioned);

        let updates = sched.tick(&tasks, at(11));
        assert_eq!(updates[0].phase.kind(), PhaseKind::Active);
        assert_eq!(updates[0].phase.to_string(), "Time left: 0h 59m 59s");
        assert!(updates[0].transitioned);

        let updates = sched.tick(&tasks, at(3611));
        assert_eq!(updates[0].phase, Phase::Expired);
        assert_eq!(updates[0].phase.to_string(), "Deadline passed!");
        assert!(!sched.is_running(task.id));
        assert_eq!(sched.running_count(), 0);

        assert!(sched.tick(&tasks, at(3612)).is_empty());
        assert_eq!(sched.phase(task.id), Some(Phase::Expired));
    }

    #[test]
    fn pending_countdown_strictly_decreases_until_start() {
        let task = write_report();
        let tasks = vec![task.clone()];
        let mut sched = CountdownScheduler::new();
        sched.start(&task, now0());

        let mut previous = i64::MAX;
        for s in 1..10 {
            let update = sched.tick(&tasks, at(s))[0];
            let remaining = update.phase.remaining().unwrap().total_seconds();
            assert_eq!(update.phase.kind(), PhaseKind::Pending);
            assert!(remaining < previous);
            previous = remaining;
        }
        let update = sched.tick(&tasks, at(10))[0];
        assert_eq!(update.phase, Phase::Active { time_left: hms(1, 0, 0) });
    }

    #[test]
    fn sub_second_remainders_floor() {
        let task = write_report();
        let now = now0() + TimeDelta::milliseconds(500);
        assert_eq!(
            Phase::of(&task, now),
            Phase::Pending { starts_in: hms(0, 0, 9) }
        );
    }

    #[test]
    fn deadline_before_start_is_expired_immediately() {
        let mut task = write_report();
        task.deadline = task.start - TimeDelta::hours(1);
        let mut sched = CountdownScheduler::new();

        let update = sched.start(&task, now0()).unwrap();
        assert_eq!(update.phase, Phase::Expired);
        assert!(!sched.is_running(task.id));
    }

    #[test]
    fn deadline_equal_to_now_is_expired() {
        let task = write_report();
        assert_eq!(Phase::of(&task, task.deadline), Phase::Expired);
        assert_eq!(
            Phase::of(&task, task.start).kind(),
            PhaseKind::Active
        );
    }

    #[test]
    fn restart_keeps_one_entry_per_task() {
        let task = write_report();
        let mut sched = CountdownScheduler::new();
        sched.start(&task, now0());
        let again = sched.start(&task, at(2)).unwrap();

        assert_eq!(sched.running_count(), 1);
        assert!(!again.transitioned);
        assert_eq!(sched.tick(&[task], at(3)).len(), 1);
    }

    #[test]
    fn completed_tasks_get_no_countdown() {
        let mut task = write_report();
        task.completed = true;
        let mut sched = CountdownScheduler::new();
        assert!(sched.start(&task, now0()).is_none());
        assert_eq!(sched.running_count(), 0);
        assert_eq!(sched.phase(task.id), None);
    }

    #[test]
    fn stop_is_immediate() {
        let task = write_report();
        let mut sched = CountdownScheduler::new();
        sched.start(&task, now0());

        assert!(sched.stop(task.id));
        assert!(!sched.stop(task.id));
        assert!(sched.tick(&[task.clone()], at(1)).is_empty());
        assert_eq!(sched.phase(task.id), None);
    }

    #[test]
    fn tick_drops_entries_for_removed_tasks() {
        let a = write_report();
        let mut b = write_report();
        b.id = TaskId(2);
        let mut sched = CountdownScheduler::new();
        sched.start(&a, now0());
        sched.start(&b, now0());

        // `a` deleted from under the scheduler
        let updates = sched.tick(&[b.clone()], at(1));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, b.id);
        assert!(!sched.is_running(a.id));
        assert_eq!(sched.phase(a.id), None);
    }

    #[test]
    fn tick_stops_tasks_completed_elsewhere() {
        let mut task = write_report();
        let mut sched = CountdownScheduler::new();
        sched.start(&task, now0());
        task.completed = true;

        assert!(sched.tick(&[task.clone()], at(1)).is_empty());
        assert!(!sched.is_running(task.id));
    }

    #[test]
    fn tick_reports_in_display_order() {
        let mut tasks = Vec::new();
        for id in [3, 1, 2] {
            let mut t = write_report();
            t.id = TaskId(id);
            tasks.push(t);
        }
        let mut sched = CountdownScheduler::new();
        for t in &tasks {
            sched.start(t, now0());
        }
        let ids: Vec<TaskId> = sched.tick(&tasks, at(1)).iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![TaskId(3), TaskId(1), TaskId(2)]);
    }

    #[test]
    fn sync_starts_unfinished_and_stops_completed() {
        let a = write_report();
        let mut b = write_report();
        b.id = TaskId(2);
        let mut expired = write_report();
        expired.id = TaskId(3);
        expired.deadline = now0();

        let mut sched = CountdownScheduler::new();
        let updates = sched.sync(&[a.clone(), b.clone(), expired.clone()], now0());
        assert_eq!(updates.len(), 3);
        assert_eq!(sched.running_count(), 2);
        assert_eq!(sched.phase(expired.id), Some(Phase::Expired));

        b.completed = true;
        let updates = sched.sync(&[a.clone(), b.clone()], at(1));
        assert!(updates.is_empty());
        assert!(sched.is_running(a.id));
        assert!(!sched.is_running(b.id));
        assert_eq!(sched.phase(expired.id), None);
    }
}
