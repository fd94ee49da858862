use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::util::time::parse_stored_instant;

/// Stable identifier for a task.
///
/// Assigned once at creation and never reused while the store is open.
/// Positions shift when tasks are deleted; identifiers do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Zero means "not yet assigned"; the store fixes these up on load
    #[serde(default)]
    pub id: TaskId,
    /// Display label
    pub text: String,
    /// Instant after which the task is considered active
    #[serde(deserialize_with = "deserialize_instant")]
    pub start: DateTime<Utc>,
    /// Instant by which the task must be finished
    #[serde(deserialize_with = "deserialize_instant")]
    pub deadline: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: TaskId, text: String, start: DateTime<Utc>, deadline: DateTime<Utc>) -> Self {
        Task {
            id,
            text,
            start,
            deadline,
            completed: false,
        }
    }
}

/// Accept RFC 3339 as well as the naive `YYYY-MM-DDTHH:MM` form that
/// older records were written with.
fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_stored_instant(&raw).map_err(serde::de::Error::custom)
}
