use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::io::store::{StoreError, TaskStore};
use crate::model::config::Config;
use crate::model::task::{Task, TaskId};
use crate::ops::countdown::{CountdownScheduler, CountdownUpdate, Phase};
use crate::util::time::{TimeParseError, parse_instant};

/// Input fields of a new task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Text,
    Start,
    Deadline,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text => write!(f, "task"),
            Field::Start => write!(f, "start"),
            Field::Deadline => write!(f, "deadline"),
        }
    }
}

/// Rejected input. Nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("please fill in all fields ({0} is empty)")]
    MissingField(Field),
    #[error("invalid {field} time: {source}")]
    InvalidTime {
        field: Field,
        #[source]
        source: TimeParseError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A user-facing reference to a task: a 1-based list position or `@id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRef {
    Position(usize),
    Id(TaskId),
}

impl FromStr for TaskRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(id) = s.strip_prefix('@') {
            return id
                .parse::<u64>()
                .map(|n| TaskRef::Id(TaskId(n)))
                .map_err(|_| format!("invalid task id '{}'", s));
        }
        match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(format!(
                "invalid task '{}' (expected a list position like 3 or an id like @7)",
                s
            )),
            Ok(n) => Ok(TaskRef::Position(n)),
        }
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskRef::Position(n) => write!(f, "{}", n),
            TaskRef::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Application state: the task list and its countdowns.
///
/// Every mutation is persisted before the matching countdown is started
/// or stopped.
#[derive(Debug)]
pub struct TaskBoard {
    store: TaskStore,
    countdowns: CountdownScheduler,
}

impl TaskBoard {
    pub fn new(store: TaskStore, now: DateTime<Utc>) -> Self {
        let mut countdowns = CountdownScheduler::new();
        countdowns.sync(store.tasks(), now);
        TaskBoard { store, countdowns }
    }

    pub fn open(data_dir: &Path, config: &Config, now: DateTime<Utc>) -> Self {
        Self::new(TaskStore::in_data_dir(data_dir, config), now)
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn countdowns(&self) -> &CountdownScheduler {
        &self.countdowns
    }

    pub fn phase(&self, id: TaskId) -> Option<Phase> {
        self.countdowns.phase(id)
    }

    /// Resolve a position or id to a task that currently exists.
    pub fn resolve(&self, task_ref: TaskRef) -> Option<TaskId> {
        match task_ref {
            TaskRef::Position(n) => self.store.id_at(n.checked_sub(1)?),
            TaskRef::Id(id) => self.store.get(id).map(|t| t.id),
        }
    }

    /// Add a task from raw form input.
    pub fn add(
        &mut self,
        text: &str,
        start: &str,
        deadline: &str,
        now: DateTime<Utc>,
    ) -> Result<TaskId, BoardError> {
        let text = require(text, Field::Text)?;
        let start = require(start, Field::Start)?;
        let deadline = require(deadline, Field::Deadline)?;
        let start = parse_field(start, Field::Start, now)?;
        let deadline = parse_field(deadline, Field::Deadline, now)?;
        self.add_task(text, start, deadline, now)
    }

    /// Add a task with already-parsed times. No ordering between start and
    /// deadline is enforced.
    pub fn add_task(
        &mut self,
        text: &str,
        start: DateTime<Utc>,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<TaskId, BoardError> {
        let text = require(text, Field::Text)?;
        let id = self.store.add(text.to_string(), start, deadline)?;
        tracing::info!(task = %id, "added task");
        if let Some(task) = self.store.get(id) {
            self.countdowns.start(task, now);
        }
        Ok(id)
    }

    /// Returns false if the task doesn't exist.
    pub fn mark_completed(&mut self, id: TaskId) -> Result<bool, StoreError> {
        if !self.store.set_completed(id, true)? {
            return Ok(false);
        }
        self.countdowns.stop(id);
        tracing::info!(task = %id, "completed task");
        Ok(true)
    }

    /// Clear the completed flag and restart the countdown.
    pub fn undo(&mut self, id: TaskId, now: DateTime<Utc>) -> Result<bool, StoreError> {
        if !self.store.set_completed(id, false)? {
            return Ok(false);
        }
        if let Some(task) = self.store.get(id) {
            self.countdowns.start(task, now);
        }
        tracing::info!(task = %id, "reopened task");
        Ok(true)
    }

    /// Remove a task and its countdown. Other countdowns are unaffected.
    pub fn delete(&mut self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let removed = self.store.remove(id)?;
        if removed.is_some() {
            self.countdowns.stop(id);
            tracing::info!(task = %id, "deleted task");
        }
        Ok(removed)
    }

    /// One scheduler tick
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<CountdownUpdate> {
        self.countdowns.tick(self.store.tasks(), now)
    }

    /// Re-read the store after an outside change and resync countdowns.
    pub fn reload(&mut self, now: DateTime<Utc>) -> Vec<CountdownUpdate> {
        self.store.reload();
        tracing::debug!(count = self.store.len(), "reloaded tasks");
        self.countdowns.sync(self.store.tasks(), now)
    }
}

fn require(value: &str, field: Field) -> Result<&str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

fn parse_field(
    value: &str,
    field: Field,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ValidationError> {
    parse_instant(value, now).map_err(|source| ValidationError::InvalidTime { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store;
    use crate::ops::countdown::PhaseKind;
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn now0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn board_in(tmp: &TempDir) -> TaskBoard {
        TaskBoard::open(tmp.path(), &Config::default(), now0())
    }

    fn add_n(board: &mut TaskBoard, n: usize) -> Vec<TaskId> {
        (0..n)
            .map(|i| {
                board
                    .add(&format!("task {}", i), "+10s", "+1h", now0())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn add_then_load_yields_same_task() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let start = now0() + TimeDelta::seconds(10);
        let deadline = start + TimeDelta::hours(1);

        let id = board.add_task("Write report", start, deadline, now0()).unwrap();

        let loaded = store::load(&tmp.path().join("tasks.json"));
        assert_eq!(
            loaded,
            vec![Task {
                id,
                text: "Write report".into(),
                start,
                deadline,
                completed: false,
            }]
        );
        assert!(board.countdowns().is_running(id));
        assert_eq!(board.phase(id).unwrap().kind(), PhaseKind::Pending);
    }

    #[test]
    fn add_trims_text() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let id = board.add("  Write report \n", "now", "+1h", now0()).unwrap();
        assert_eq!(board.store().get(id).unwrap().text, "Write report");
    }

    #[test]
    fn add_with_empty_field_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        add_n(&mut board, 1);

        let cases = [
            ("", "+1m", "+1h", Field::Text),
            ("   ", "+1m", "+1h", Field::Text),
            ("x", "", "+1h", Field::Start),
            ("x", "+1m", " ", Field::Deadline),
        ];
        for (text, start, deadline, field) in cases {
            let err = board.add(text, start, deadline, now0()).unwrap_err();
            assert!(matches!(
                err,
                BoardError::Validation(ValidationError::MissingField(f)) if f == field
            ));
        }
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(store::load(board.store().path()).len(), 1);
    }

    #[test]
    fn add_with_bad_time_is_a_validation_error() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let err = board.add("x", "soon", "+1h", now0()).unwrap_err();
        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::InvalidTime {
                field: Field::Start,
                ..
            })
        ));
        assert!(board.tasks().is_empty());
    }

    #[test]
    fn deadline_before_start_is_accepted_and_expired() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let id = board.add("Backwards", "+2h", "+1h", now0()).unwrap();
        assert_eq!(board.phase(id), Some(Phase::Expired));
        assert!(!board.countdowns().is_running(id));
    }

    #[test]
    fn complete_stops_and_undo_restarts() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let id = add_n(&mut board, 1)[0];

        assert!(board.mark_completed(id).unwrap());
        assert!(!board.countdowns().is_running(id));
        assert!(store::load(board.store().path())[0].completed);

        assert!(board.undo(id, now0()).unwrap());
        assert!(board.countdowns().is_running(id));
        assert!(!store::load(board.store().path())[0].completed);
    }

    #[test]
    fn delete_leaves_other_countdowns_bound_to_their_tasks() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let ids = add_n(&mut board, 3);

        let removed = board.delete(ids[0]).unwrap().unwrap();
        assert_eq!(removed.text, "task 0");
        assert_eq!(board.tasks().len(), 2);
        assert!(!board.countdowns().is_running(ids[0]));
        assert_eq!(board.countdowns().running_count(), 2);

        // every running countdown refers to a task that still exists
        for task in board.tasks() {
            assert!(board.countdowns().is_running(task.id));
        }
        let updates = board.tick(now0() + TimeDelta::seconds(1));
        let ticked: Vec<TaskId> = updates.iter().map(|u| u.id).collect();
        assert_eq!(ticked, vec![ids[1], ids[2]]);
    }

    #[test]
    fn stale_ids_are_noops() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        add_n(&mut board, 1);
        let ghost = TaskId(999);

        assert!(!board.mark_completed(ghost).unwrap());
        assert!(!board.undo(ghost, now0()).unwrap());
        assert!(board.delete(ghost).unwrap().is_none());
        assert_eq!(board.tasks().len(), 1);
    }

    #[test]
    fn stale_id_from_another_process_stays_stale() {
        let tmp = TempDir::new().unwrap();
        let mut a = board_in(&tmp);
        add_n(&mut a, 1);
        let doomed = add_n(&mut a, 1)[0];

        let mut b = board_in(&tmp);
        b.delete(doomed).unwrap();

        let mut c = board_in(&tmp);
        let fresh = add_n(&mut c, 1)[0];
        assert_ne!(fresh, doomed);

        a.reload(now0());
        assert!(a.delete(doomed).unwrap().is_none());
        assert!(!a.mark_completed(doomed).unwrap());
        assert_eq!(a.tasks().len(), 2);
        assert!(a.store().get(fresh).is_some());
    }

    #[test]
    fn resolve_positions_and_ids() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let ids = add_n(&mut board, 2);

        assert_eq!(board.resolve(TaskRef::Position(1)), Some(ids[0]));
        assert_eq!(board.resolve(TaskRef::Position(2)), Some(ids[1]));
        assert_eq!(board.resolve(TaskRef::Position(3)), None);
        assert_eq!(board.resolve(TaskRef::Id(ids[1])), Some(ids[1]));
        assert_eq!(board.resolve(TaskRef::Id(TaskId(77))), None);

        board.delete(ids[0]).unwrap();
        assert_eq!(board.resolve(TaskRef::Position(1)), Some(ids[1]));
    }

    #[test]
    fn open_starts_countdowns_for_unfinished_tasks() {
        let tmp = TempDir::new().unwrap();
        let ids = {
            let mut board = board_in(&tmp);
            let ids = add_n(&mut board, 2);
            board.mark_completed(ids[1]).unwrap();
            ids
        };

        let board = board_in(&tmp);
        assert!(board.countdowns().is_running(ids[0]));
        assert!(!board.countdowns().is_running(ids[1]));
    }

    #[test]
    fn reload_syncs_with_outside_writes() {
        let tmp = TempDir::new().unwrap();
        let mut board = board_in(&tmp);
        let mut other = board_in(&tmp);
        let id = add_n(&mut other, 1)[0];

        let updates = board.reload(now0());
        assert_eq!(updates.len(), 1);
        assert!(board.countdowns().is_running(id));

        other.delete(id).unwrap();
        board.reload(now0());
        assert_eq!(board.countdowns().running_count(), 0);
    }

    #[test]
    fn task_ref_parsing() {
        assert_eq!("3".parse::<TaskRef>(), Ok(TaskRef::Position(3)));
        assert_eq!("@12".parse::<TaskRef>(), Ok(TaskRef::Id(TaskId(12))));
        assert!("0".parse::<TaskRef>().is_err());
        assert!("@x".parse::<TaskRef>().is_err());
        assert!("three".parse::<TaskRef>().is_err());
    }
}
