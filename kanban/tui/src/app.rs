//! Session controller: turns key presses and auth results into screen changes
//! and board transitions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use kanban_core::{
    Board, Direction, ListItem, PersistMode, StoreError, TaskPlacement, TaskStatus, TaskStore,
};
use tracing::error;

use crate::auth::{AuthMode, AuthOutcome, AuthRequest};
use crate::forms::Form;

pub const MENU_OPTIONS: [&str; 2] = ["Sign-in", "Sign-up"];

/// Frames of the spinner shown while credentials are being checked.
pub const SPINNER_FRAMES: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// What the user is currently looking at.
pub enum Screen {
    Menu { selected: usize },
    Credentials { mode: AuthMode, form: Form },
    Submitting { mode: AuthMode },
    Authenticated(Box<BoardScreen>),
}

/// An open task form and where its task will go.
pub struct TaskForm {
    pub status: TaskStatus,
    pub placement: TaskPlacement,
    pub form: Form,
}

pub struct BoardScreen {
    pub board: Board<TaskStore>,
    pub task_form: Option<TaskForm>,
    pub show_full_help: bool,
}

pub struct App {
    screen: Screen,
    error: Option<String>,
    tasks: TaskStore,
    persist_mode: PersistMode,
    spinner_frame: usize,
    should_quit: bool,
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

fn direction_for(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Left | KeyCode::Char('h') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => Some(Direction::Right),
        KeyCode::Up | KeyCode::Char('k') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Direction::Down),
        _ => None,
    }
}

impl App {
    pub fn new(tasks: TaskStore, persist_mode: PersistMode) -> Self {
        Self {
            screen: Screen::Menu { selected: 0 },
            error: None,
            tasks,
            persist_mode,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// The last error to show the user, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Advances time-based animation. Called once per loop iteration.
    pub fn on_tick(&mut self) {
        if matches!(self.screen, Screen::Submitting { .. }) {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    /// Handles a key press. Returns a credential request when a sign-in or
    /// sign-up form was submitted; the caller runs it in the background.
    pub fn on_key(&mut self, key: KeyEvent) -> Option<AuthRequest> {
        if is_ctrl_c(&key) {
            self.quit();
            return None;
        }

        match &mut self.screen {
            Screen::Menu { selected } => {
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') | KeyCode::Down | KeyCode::Char('j') => {
                        *selected = (*selected + 1) % MENU_OPTIONS.len();
                    }
                    KeyCode::Enter => {
                        let (mode, form) = match *selected {
                            0 => (AuthMode::SignIn, Form::sign_in()),
                            _ => (AuthMode::SignUp, Form::sign_up()),
                        };
                        self.error = None;
                        self.screen = Screen::Credentials { mode, form };
                    }
                    KeyCode::Char('q') => self.quit(),
                    _ => {}
                }
                None
            }
            Screen::Credentials { .. } => self.on_credentials_key(key),
            Screen::Submitting { .. } => {
                if key.code == KeyCode::Char('q') {
                    self.quit();
                }
                None
            }
            Screen::Authenticated(_) => {
                self.on_board_key(key);
                None
            }
        }
    }

    fn on_credentials_key(&mut self, key: KeyEvent) -> Option<AuthRequest> {
        let Screen::Credentials { mode, form } = &mut self.screen else {
            return None;
        };
        let mode = *mode;

        match key.code {
            KeyCode::Esc => {
                self.error = None;
                self.screen = Screen::Menu { selected: 0 };
            }
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.push_char(c),
            KeyCode::Enter if !form.is_on_last_field() => form.focus_next(),
            KeyCode::Enter => {
                let validated = match mode {
                    AuthMode::SignIn => form.validate_sign_in(),
                    AuthMode::SignUp => form.validate_sign_up(),
                };
                match validated {
                    Ok((username, password)) => {
                        self.error = None;
                        self.spinner_frame = 0;
                        self.screen = Screen::Submitting { mode };
                        return Some(AuthRequest {
                            mode,
                            username,
                            password,
                        });
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
            }
            _ => {}
        }
        None
    }

    fn on_board_key(&mut self, key: KeyEvent) {
        let Screen::Authenticated(screen) = &mut self.screen else {
            return;
        };

        let result = match screen.task_form.take() {
            Some(task_form) => Self::on_task_form_key(screen, task_form, key, &mut self.error),
            None => {
                let board = &mut screen.board;
                if let Some(direction) = direction_for(key.code) {
                    board.navigate(direction);
                    return;
                }
                match key.code {
                    KeyCode::Enter => board.move_task(),
                    KeyCode::Char('d') => board.delete_task(),
                    KeyCode::Char('n') => {
                        screen.task_form = Some(TaskForm {
                            status: board.focused(),
                            placement: TaskPlacement::Append,
                            form: Form::task("", ""),
                        });
                        Ok(())
                    }
                    KeyCode::Char('e') => {
                        let status = board.focused();
                        let index = board.column(status).selected_index();
                        if let (Some(task), Some(index)) = (board.selected_task(), index) {
                            screen.task_form = Some(TaskForm {
                                status,
                                placement: TaskPlacement::Replace(index),
                                form: Form::task(task.title(), task.description()),
                            });
                        }
                        Ok(())
                    }
                    KeyCode::Char('?') => {
                        screen.show_full_help = !screen.show_full_help;
                        Ok(())
                    }
                    KeyCode::Char('q') => {
                        self.should_quit = true;
                        board.quit()
                    }
                    _ => Ok(()),
                }
            }
        };

        if let Err(err) = result {
            self.report_store_error(err);
        }
    }

    fn on_task_form_key(
        screen: &mut BoardScreen,
        mut task_form: TaskForm,
        key: KeyEvent,
        error: &mut Option<String>,
    ) -> Result<(), StoreError> {
        let form = &mut task_form.form;
        match key.code {
            KeyCode::Esc => {
                *error = None;
                return Ok(());
            }
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.push_char(c),
            KeyCode::Enter if !form.is_on_last_field() => form.focus_next(),
            KeyCode::Enter => match form.validate_task() {
                Ok((title, description)) => {
                    *error = None;
                    return screen.board.submit_task_form(
                        task_form.status,
                        task_form.placement,
                        title,
                        description,
                    );
                }
                Err(err) => *error = Some(err.to_string()),
            },
            _ => {}
        }
        screen.task_form = Some(task_form);
        Ok(())
    }

    /// Applies the result of a background credential request.
    pub fn on_auth_outcome(&mut self, outcome: AuthOutcome) {
        let Screen::Submitting { mode } = self.screen else {
            return;
        };

        match outcome {
            AuthOutcome::Success { username } => {
                match Board::load(self.tasks.clone(), username, self.persist_mode) {
                    Ok(board) => {
                        self.error = None;
                        self.screen = Screen::Authenticated(Box::new(BoardScreen {
                            board,
                            task_form: None,
                            show_full_help: true,
                        }));
                    }
                    Err(err) => {
                        error!("could not load board: {err}");
                        self.error = Some(format!("could not load board: {err}"));
                        self.screen = Screen::Menu { selected: 0 };
                    }
                }
            }
            AuthOutcome::Failure { message } => {
                let form = match mode {
                    AuthMode::SignIn => Form::sign_in(),
                    AuthMode::SignUp => Form::sign_up(),
                };
                self.error = Some(message);
                self.screen = Screen::Credentials { mode, form };
            }
        }
    }

    fn quit(&mut self) {
        if let Screen::Authenticated(screen) = &mut self.screen {
            if let Err(err) = screen.board.quit() {
                self.report_store_error(err);
            }
        }
        self.should_quit = true;
    }

    /// Only reached in strict mode; best-effort boards log and return `Ok`.
    fn report_store_error(&mut self, err: StoreError) {
        error!("board change was not saved: {err}");
        self.error = Some(format!("changes were not saved: {err}"));
    }
}
