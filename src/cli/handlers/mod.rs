use std::path::PathBuf;

use chrono::Utc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::read_config;
use crate::io::export::export_tasks;
use crate::io::lock::StoreLock;
use crate::io::paths::resolve_data_dir;
use crate::model::config::Config;
use crate::model::task::TaskId;
use crate::ops::board::{TaskBoard, TaskRef};
use crate::ops::countdown::PhaseKind;

/// Resolved per-invocation settings
struct Context {
    data_dir: PathBuf,
    config: Config,
    json: bool,
}

impl Context {
    fn open_board(&self) -> TaskBoard {
        TaskBoard::open(&self.data_dir, &self.config, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = resolve_data_dir(cli.data_dir.as_deref());
    let config = read_config(&data_dir);
    let ctx = Context {
        data_dir,
        config,
        json: cli.json,
    };

    match cli.command {
        None => Err("no command given (run `tm` without arguments for the interactive view)".into()),
        Some(cmd) => match cmd {
            Commands::Add(args) => cmd_add(&ctx, args),
            Commands::List(args) => cmd_list(&ctx, args),
            Commands::Done(args) => cmd_done(&ctx, args),
            Commands::Undo(args) => cmd_undo(&ctx, args),
            Commands::Rm(args) => cmd_rm(&ctx, args),
            Commands::Export(args) => cmd_export(&ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve(board: &TaskBoard, task_ref: TaskRef) -> Result<TaskId, String> {
    board
        .resolve(task_ref)
        .ok_or_else(|| format!("task not found: {}", task_ref))
}

/// Print a single task in the requested format
fn print_task(ctx: &Context, board: &TaskBoard, id: TaskId) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(position), Some(task)) = (board.store().position(id), board.store().get(id)) else {
        return Ok(());
    };
    let phase = board.phase(id);
    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&task_to_json(position + 1, task, phase))?
        );
    } else {
        println!(
            "{}",
            format_task_line(position + 1, task, phase, &ctx.config.ui.time_format)
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = ctx.open_board();
    let all = args.is_unfiltered();

    let rows: Vec<_> = board
        .tasks()
        .iter()
        .enumerate()
        .map(|(i, task)| (i + 1, task, board.phase(task.id)))
        .filter(|(_, task, phase)| {
            all || match (task.completed, phase.map(|p| p.kind())) {
                (true, _) => args.completed,
                (false, Some(PhaseKind::Pending)) => args.pending,
                (false, Some(PhaseKind::Active)) => args.active,
                (false, Some(PhaseKind::Expired)) => args.expired,
                (false, None) => false,
            }
        })
        .collect();

    if ctx.json {
        let tasks: Vec<TaskJson> = rows
            .iter()
            .map(|(pos, task, phase)| task_to_json(*pos, task, *phase))
            .collect();
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if rows.is_empty() {
        println!("no tasks");
    } else {
        for (pos, task, phase) in &rows {
            println!(
                "{}",
                format_task_line(*pos, task, *phase, &ctx.config.ui.time_format)
            );
        }
    }
    Ok(())
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let board = ctx.open_board();
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&ctx.config.export.file));
    let rows = export_tasks(board.tasks(), &path, &ctx.config.ui.time_format)?;

    if ctx.json {
        let out = ExportJson {
            path: path.display().to_string(),
            rows,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("exported {} tasks to {}", rows, path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = StoreLock::acquire_default(&ctx.data_dir)?;
    let mut board = ctx.open_board();
    let id = board.add(&args.text, &args.start, &args.deadline, Utc::now())?;
    print_task(ctx, &board, id)
}

fn cmd_done(ctx: &Context, args: TaskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = StoreLock::acquire_default(&ctx.data_dir)?;
    let mut board = ctx.open_board();
    let id = resolve(&board, args.task)?;
    board.mark_completed(id)?;
    print_task(ctx, &board, id)
}

fn cmd_undo(ctx: &Context, args: TaskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = StoreLock::acquire_default(&ctx.data_dir)?;
    let mut board = ctx.open_board();
    let id = resolve(&board, args.task)?;
    board.undo(id, Utc::now())?;
    print_task(ctx, &board, id)
}

fn cmd_rm(ctx: &Context, args: TaskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = StoreLock::acquire_default(&ctx.data_dir)?;
    let mut board = ctx.open_board();
    let id = resolve(&board, args.task)?;
    let position = board.store().position(id).map_or(0, |p| p + 1);
    if let Some(task) = board.delete(id)? {
        if ctx.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&task_to_json(position, &task, None))?
            );
        } else {
            println!("deleted {} {}", task.id, task.text);
        }
    }
    Ok(())
}
