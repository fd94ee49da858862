use chrono::SecondsFormat;
use serde::Serialize;

use crate::model::task::Task;
use crate::ops::countdown::{Phase, PhaseKind};
use crate::util::text::pad_to_width;
use crate::util::time::format_instant;

/// Width of the task text column in `tm list`
const TEXT_COLUMN: usize = 28;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    /// 1-based list position
    pub position: usize,
    pub id: u64,
    pub text: String,
    pub start: String,
    pub deadline: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<String>,
}

#[derive(Serialize)]
pub struct ExportJson {
    pub path: String,
    pub rows: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(position: usize, task: &Task, phase: Option<Phase>) -> TaskJson {
    TaskJson {
        position,
        id: task.id.0,
        text: task.text.clone(),
        start: task.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        deadline: task.deadline.to_rfc3339_opts(SecondsFormat::Secs, true),
        completed: task.completed,
        phase: phase.map(|p| p.kind()),
        remaining_seconds: phase.and_then(|p| p.remaining()).map(|h| h.total_seconds()),
        countdown: phase.map(|p| p.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// Status column: the countdown for unfinished tasks, "Completed" otherwise
pub fn status_text(task: &Task, phase: Option<Phase>) -> String {
    if task.completed {
        return "Completed".into();
    }
    phase.map(|p| p.to_string()).unwrap_or_default()
}

/// One `tm list` row:
/// `  1 [ ] Write report   5/1/2025, 9:00:00 AM → 5/1/2025, 10:00:00 AM  Starts in: 0h 0m 9s  @1`
pub fn format_task_line(position: usize, task: &Task, phase: Option<Phase>, time_format: &str) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    format!(
        "{:>3} [{}] {}  {} \u{2192} {}  {}  {}",
        position,
        check,
        pad_to_width(&task.text, TEXT_COLUMN),
        format_instant(task.start, time_format),
        format_instant(task.deadline, time_format),
        status_text(task, phase),
        task.id,
    )
}
