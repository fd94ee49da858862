use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ops::board::TaskRef;

#[derive(Parser)]
#[command(name = "tm", about = concat!("tminus v", env!("CARGO_PKG_VERSION"), " - to-dos with live countdowns"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory (default: $TMINUS_DIR or ~/.local/share/tminus)
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks with their countdowns
    List(ListArgs),
    /// Mark a task completed
    Done(TaskArgs),
    /// Mark a completed task as not completed
    Undo(TaskArgs),
    /// Delete a task
    Rm(TaskArgs),
    /// Export tasks as CSV (Task, Start, Deadline, Completed), which any
    /// spreadsheet app opens
    Export(ExportArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// When the task starts: 2025-05-01T14:30, RFC 3339, now, or +15m/+2h/+1d
    #[arg(short, long)]
    pub start: String,
    /// When the task is due (same forms as --start)
    #[arg(short, long)]
    pub deadline: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only tasks that haven't started yet
    #[arg(long)]
    pub pending: bool,
    /// Only tasks that have started and are not yet due
    #[arg(long)]
    pub active: bool,
    /// Only unfinished tasks past their deadline
    #[arg(long)]
    pub expired: bool,
    /// Only completed tasks
    #[arg(long)]
    pub completed: bool,
}

impl ListArgs {
    /// No filter flag means show everything
    pub fn is_unfiltered(&self) -> bool {
        !(self.pending || self.active || self.expired || self.completed)
    }
}

#[derive(Args)]
pub struct TaskArgs {
    /// List position (1-based) or id like @7
    pub task: TaskRef,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output CSV file (default: [export] file from config, todo_tasks.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
