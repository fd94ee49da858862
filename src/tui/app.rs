use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;

use crate::io::config_io::read_config;
use crate::io::export::export_tasks;
use crate::io::lock::StoreLock;
use crate::io::paths::resolve_data_dir;
use crate::io::watcher::StoreWatcher;
use crate::logging;
use crate::model::{Config, Task, TaskId};
use crate::ops::board::{BoardError, Field, TaskBoard};
use crate::ops::countdown::{Phase, TICK_INTERVAL};

use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Filling in the new-task form
    Add,
    /// Waiting for y/n on deleting `pending_delete`
    ConfirmDelete,
}

/// The three-field new-task form
#[derive(Debug, Clone)]
pub struct AddForm {
    pub text: String,
    pub start: String,
    pub deadline: String,
    pub focus: Field,
}

impl Default for AddForm {
    fn default() -> Self {
        AddForm {
            text: String::new(),
            start: String::new(),
            deadline: String::new(),
            focus: Field::Text,
        }
    }
}

impl AddForm {
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Text => &mut self.text,
            Field::Start => &mut self.start,
            Field::Deadline => &mut self.deadline,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            Field::Text => Field::Start,
            Field::Start => Field::Deadline,
            Field::Deadline => Field::Text,
        };
    }

    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            Field::Text => Field::Deadline,
            Field::Start => Field::Text,
            Field::Deadline => Field::Start,
        };
    }
}

/// One line of feedback in the status row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct App {
    pub board: TaskBoard,
    pub data_dir: PathBuf,
    pub config: Config,
    pub theme: Theme,
    pub mode: Mode,
    /// Selection and scroll for the task list
    pub list_state: ListState,
    pub form: AddForm,
    pub pending_delete: Option<TaskId>,
    pub status: Option<StatusMessage>,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(board: TaskBoard, data_dir: PathBuf, config: Config) -> Self {
        let theme = Theme::from_config(&config.ui);
        let mut list_state = ListState::default();
        if !board.tasks().is_empty() {
            list_state.select(Some(0));
        }
        App {
            board,
            data_dir,
            config,
            theme,
            mode: Mode::Navigate,
            list_state,
            form: AddForm::default(),
            pending_delete: None,
            status: None,
            show_help: false,
            should_quit: false,
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.board.tasks().get(self.cursor()?)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.board.tasks().len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let current = self.cursor().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.list_state.select(Some(next as usize));
    }

    /// Put the cursor on `id`, or keep it in range if `id` is gone
    pub fn select_task(&mut self, id: Option<TaskId>) {
        if let Some(pos) = id.and_then(|id| self.board.store().position(id)) {
            self.list_state.select(Some(pos));
        } else {
            self.move_cursor(0);
        }
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// Run a store mutation under the data-dir lock, after picking up any
    /// writes another process made. Errors land in the status row.
    pub fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut TaskBoard, DateTime<Utc>) -> Result<T, BoardError>,
    ) -> Option<T> {
        let _lock = match StoreLock::acquire_default(&self.data_dir) {
            Ok(lock) => lock,
            Err(e) => {
                self.set_error(e.to_string());
                return None;
            }
        };
        let now = Utc::now();
        let selected = self.selected_task().map(|t| t.id);
        self.board.reload(now);
        self.select_task(selected);
        match f(&mut self.board, now) {
            Ok(value) => Some(value),
            Err(e) => {
                self.set_error(e.to_string());
                None
            }
        }
    }

    /// Complete the selected task, or reopen it if already completed
    pub fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let (id, text, completed) = (task.id, task.text.clone(), task.completed);
        let changed = self.mutate(|board, now| {
            let changed = if completed {
                board.undo(id, now)?
            } else {
                board.mark_completed(id)?
            };
            Ok(changed)
        });
        if changed == Some(true) {
            if completed {
                self.set_info(format!("Reopened: {}", text));
            } else {
                self.set_info(format!("Completed: {}", text));
            }
        }
        self.select_task(Some(id));
    }

    pub fn request_delete(&mut self) {
        if let Some(task) = self.selected_task() {
            self.pending_delete = Some(task.id);
            self.mode = Mode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.mode = Mode::Navigate;
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        let removed = self.mutate(|board, _| Ok(board.delete(id)?)).flatten();
        if let Some(task) = removed {
            self.set_info(format!("Deleted: {}", task.text));
        }
        self.move_cursor(0);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.mode = Mode::Navigate;
    }

    pub fn open_form(&mut self) {
        self.form = AddForm::default();
        self.mode = Mode::Add;
        self.status = None;
    }

    pub fn cancel_form(&mut self) {
        self.mode = Mode::Navigate;
    }

    /// Validation errors keep the form open with its contents
    pub fn submit_form(&mut self) {
        let form = self.form.clone();
        let added = self.mutate(|board, now| board.add(&form.text, &form.start, &form.deadline, now));
        if let Some(id) = added {
            self.mode = Mode::Navigate;
            self.form = AddForm::default();
            self.select_task(Some(id));
            self.set_info(format!("Added: {}", form.text.trim()));
        }
    }

    pub fn export(&mut self) {
        let path = PathBuf::from(&self.config.export.file);
        match export_tasks(self.board.tasks(), &path, &self.config.ui.time_format) {
            Ok(rows) => self.set_info(format!("Exported {} tasks to {}", rows, path.display())),
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// One scheduler tick. Phase changes are announced in the status row.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        for update in self.board.tick(now) {
            if !update.transitioned {
                continue;
            }
            let Some(task) = self.board.store().get(update.id) else {
                continue;
            };
            let message = match update.phase {
                Phase::Active { .. } => format!("Started: {}", task.text),
                Phase::Expired => format!("Deadline passed: {}", task.text),
                Phase::Pending { .. } => continue,
            };
            self.set_info(message);
        }
    }

    /// The store changed on disk
    pub fn reload(&mut self, now: DateTime<Utc>) {
        let selected = self.selected_task().map(|t| t.id);
        self.board.reload(now);
        self.select_task(selected);
    }
}

/// Run the TUI application
pub fn run(data_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = resolve_data_dir(data_dir);
    logging::init_file(&data_dir)?;
    let config = read_config(&data_dir);
    let board = TaskBoard::open(&data_dir, &config, Utc::now());

    let watcher = match StoreWatcher::start(board.store().path()) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "store watcher unavailable; outside changes won't show until restart");
            None
        }
    };

    let mut app = App::new(board, data_dir, config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal if we panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&StoreWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        let timeout = TICK_INTERVAL.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if watcher.is_some_and(|w| w.poll()) {
            app.reload(Utc::now());
        }

        if last_tick.elapsed() >= TICK_INTERVAL {
            app.tick(Utc::now());
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
