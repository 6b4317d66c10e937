//! The in-memory board and the transitions that keep it in sync with storage.
//!
//! Every mutating transition writes the affected columns through the
//! [`TaskRepository`] before returning. What happens when that write fails is
//! decided by the board's [`PersistMode`].

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::tasks::{Task, TaskRepository, TaskStatus};

/// How a board reacts to a failed write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistMode {
    /// Log the failure and carry on with the in-memory state.
    #[default]
    BestEffort,
    /// Return the failure to the caller. The in-memory state is still kept.
    Strict,
}

/// Keyboard-style navigation. Left and right move focus between columns, up
/// and down move the selection inside the focused column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Where a submitted task form puts its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPlacement {
    /// Add a new task to the end of the column.
    Append,
    /// Overwrite the task at this index. Out-of-range indexes append.
    Replace(usize),
}

/// One of the three task lists on a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    status: TaskStatus,
    tasks: Vec<Task>,
    selected: usize,
}

impl Column {
    fn new(status: TaskStatus, tasks: Vec<Task>) -> Self {
        Self {
            status,
            tasks,
            selected: 0,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Index of the selected task, or `None` when the column is empty.
    pub fn selected_index(&self) -> Option<usize> {
        (!self.tasks.is_empty()).then_some(self.selected)
    }

    pub fn selected(&self) -> Option<&Task> {
        self.tasks.get(self.selected)
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.tasks.len() {
            self.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn remove_selected(&mut self) -> Option<Task> {
        if self.tasks.is_empty() {
            return None;
        }
        let task = self.tasks.remove(self.selected);
        self.selected = self.selected.min(self.tasks.len().saturating_sub(1));
        Some(task)
    }

    fn place(&mut self, placement: TaskPlacement, task: Task) {
        match placement {
            TaskPlacement::Replace(index) if index < self.tasks.len() => self.tasks[index] = task,
            TaskPlacement::Replace(index) => {
                debug!(index, "replace target out of range, appending");
                self.tasks.push(task);
            }
            TaskPlacement::Append => self.tasks.push(task),
        }
    }
}

/// A signed-in user's kanban board.
pub struct Board<R: TaskRepository> {
    repo: R,
    username: String,
    focused: TaskStatus,
    columns: [Column; 3],
    persist_mode: PersistMode,
    quitting: bool,
}

impl<R: TaskRepository> Board<R> {
    /// Builds the board for `username` from stored state.
    ///
    /// A user with no stored task lists at all gets the demonstration tasks,
    /// which are persisted straight away.
    ///
    /// # Errors
    ///
    /// Returns any error raised while reading the stored lists.
    #[tracing::instrument(skip(repo, username), fields(username = tracing::field::Empty))]
    pub fn load(
        repo: R,
        username: impl Into<String>,
        persist_mode: PersistMode,
    ) -> Result<Self, StoreError> {
        let username = username.into();
        tracing::Span::current().record("username", username.as_str());

        let seed = !repo.has_board(&username)?;
        let columns = if seed {
            info!("no stored board, seeding demonstration tasks");
            TaskStatus::ALL.map(|status| Column::new(status, demo_tasks(status)))
        } else {
            let load = |status| {
                repo.load_tasks(&username, status)
                    .map(|tasks| Column::new(status, tasks))
            };
            [
                load(TaskStatus::Todo)?,
                load(TaskStatus::InProgress)?,
                load(TaskStatus::Done)?,
            ]
        };

        let board = Self {
            repo,
            username,
            focused: TaskStatus::Todo,
            columns,
            persist_mode,
            quitting: false,
        };
        if seed {
            board.persist(&TaskStatus::ALL)?;
        }
        Ok(board)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The column currently receiving task operations.
    pub fn focused(&self) -> TaskStatus {
        self.focused
    }

    pub fn column(&self, status: TaskStatus) -> &Column {
        &self.columns[status.index()]
    }

    pub fn columns(&self) -> &[Column; 3] {
        &self.columns
    }

    pub fn persist_mode(&self) -> PersistMode {
        self.persist_mode
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// The selected task of the focused column.
    pub fn selected_task(&self) -> Option<&Task> {
        self.focused_column().selected()
    }

    /// Total number of tasks across all columns.
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|column| column.tasks.len()).sum()
    }

    /// Moves focus or selection. Never touches storage.
    pub fn navigate(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.focused = self.focused.prev(),
            Direction::Right => self.focused = self.focused.next(),
            Direction::Up => self.focused_column_mut().select_prev(),
            Direction::Down => self.focused_column_mut().select_next(),
        }
    }

    /// Puts a task built from a submitted form into the `status` column and
    /// saves that column.
    #[tracing::instrument(skip(self, title, description), fields(username = %self.username))]
    pub fn submit_task_form(
        &mut self,
        status: TaskStatus,
        placement: TaskPlacement,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), StoreError> {
        let task = Task::new(status, title, description);
        self.columns[status.index()].place(placement, task);
        self.persist(&[status])
    }

    /// Moves the selected task to the next column, wrapping from Done to
    /// Todo, and saves both columns together.
    #[tracing::instrument(skip(self), fields(username = %self.username))]
    pub fn move_task(&mut self) -> Result<(), StoreError> {
        let source = self.focused;
        let target = source.next();
        let Some(task) = self.focused_column_mut().remove_selected() else {
            return Ok(());
        };
        self.columns[target.index()].tasks.push(task.with_status(target));
        self.persist(&[source, target])
    }

    /// Removes the selected task and saves its column.
    #[tracing::instrument(skip(self), fields(username = %self.username))]
    pub fn delete_task(&mut self) -> Result<(), StoreError> {
        let status = self.focused;
        if self.focused_column_mut().remove_selected().is_none() {
            return Ok(());
        }
        self.persist(&[status])
    }

    /// Saves every column and marks the board as finished.
    #[tracing::instrument(skip(self), fields(username = %self.username))]
    pub fn quit(&mut self) -> Result<(), StoreError> {
        self.quitting = true;
        self.persist(&TaskStatus::ALL)
    }

    fn focused_column(&self) -> &Column {
        &self.columns[self.focused.index()]
    }

    fn focused_column_mut(&mut self) -> &mut Column {
        &mut self.columns[self.focused.index()]
    }

    fn persist(&self, statuses: &[TaskStatus]) -> Result<(), StoreError> {
        let result = match statuses {
            [status] => self
                .repo
                .save_tasks(&self.username, *status, self.column(*status).tasks()),
            _ => {
                let columns: Vec<(TaskStatus, Vec<Task>)> = statuses
                    .iter()
                    .map(|status| (*status, self.column(*status).tasks.clone()))
                    .collect();
                self.repo.save_columns(&self.username, &columns)
            }
        };

        match (result, self.persist_mode) {
            (Ok(()), _) => Ok(()),
            (Err(err), PersistMode::BestEffort) => {
                error!("Error saving tasks {statuses:?}: {err}");
                Ok(())
            }
            (Err(err), PersistMode::Strict) => Err(err),
        }
    }
}

/// Tasks a brand new board starts with.
fn demo_tasks(status: TaskStatus) -> Vec<Task> {
    let entries: &[(&str, &str)] = match status {
        TaskStatus::Todo => &[
            ("buy milk", "strawberry milk"),
            ("eat sushi", "negitoro roll, miso soup, rice"),
            ("fold laundry", "or wear wrinkly t-shirts"),
        ],
        TaskStatus::InProgress => &[("write code", "don't worry, it's Rust")],
        TaskStatus::Done => &[("stay cool", "as a cucumber")],
    };
    entries
        .iter()
        .map(|(title, description)| Task::new(status, *title, *description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{ListItem, MockTaskRepository};
    use mockall::predicate::*;

    fn task(status: TaskStatus, title: &str) -> Task {
        Task::new(status, title, "")
    }

    fn storage_failure() -> StoreError {
        StoreError::StorageIo(rusqlite::Error::InvalidQuery)
    }

    /// A repository that already holds one task per column.
    fn hydrated_repo() -> MockTaskRepository {
        let mut repo = MockTaskRepository::new();
        repo.expect_has_board().returning(|_| Ok(true));
        repo.expect_load_tasks()
            .returning(|_, status| Ok(vec![task(status, &format!("{} task", status.slug()))]));
        repo
    }

    fn assert_statuses_match<R: TaskRepository>(board: &Board<R>) {
        for column in board.columns() {
            for task in column.tasks() {
                assert_eq!(task.status(), column.status(), "task '{}'", task.title());
            }
        }
    }

    mod load_tests {
        use super::*;

        #[test]
        fn load_hydrates_each_column_and_focuses_todo() {
            // Arrange
            let repo = hydrated_repo();

            // Act
            let board = Board::load(repo, "alice", PersistMode::BestEffort).unwrap();

            // Assert
            assert_eq!(board.username(), "alice");
            assert_eq!(board.focused(), TaskStatus::Todo);
            assert_eq!(board.column(TaskStatus::InProgress).tasks()[0].title(), "in-progress task");
            assert_eq!(board.task_count(), 3);
            assert_statuses_match(&board);
        }

        #[test]
        fn load_seeds_and_saves_demo_tasks_for_a_new_user() {
            // Arrange
            let mut repo = MockTaskRepository::new();
            repo.expect_has_board().with(eq("alice")).returning(|_| Ok(false));
            repo.expect_load_tasks().never();
            repo.expect_save_columns()
                .with(
                    eq("alice"),
                    function(|columns: &[(TaskStatus, Vec<Task>)]| columns.len() == 3),
                )
                .times(1)
                .returning(|_, _| Ok(()));

            // Act
            let board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            // Assert
            assert_eq!(board.column(TaskStatus::Todo).tasks().len(), 3);
            assert_eq!(board.column(TaskStatus::InProgress).tasks().len(), 1);
            assert_eq!(board.column(TaskStatus::Done).tasks().len(), 1);
            assert_statuses_match(&board);
        }

        #[test]
        fn load_does_not_seed_an_emptied_board() {
            let mut repo = MockTaskRepository::new();
            repo.expect_has_board().returning(|_| Ok(true));
            repo.expect_load_tasks().returning(|_, _| Ok(Vec::new()));
            repo.expect_save_columns().never();

            let board = Board::load(repo, "alice", PersistMode::BestEffort).unwrap();

            assert_eq!(board.task_count(), 0);
        }

        #[test]
        fn load_propagates_read_failures() {
            let mut repo = MockTaskRepository::new();
            repo.expect_has_board().returning(|_| Ok(true));
            repo.expect_load_tasks().returning(|_, _| Err(storage_failure()));

            let result = Board::load(repo, "alice", PersistMode::BestEffort);

            assert!(matches!(result, Err(StoreError::StorageIo(_))));
        }
    }

    mod navigate_tests {
        use super::*;

        #[test]
        fn left_and_right_wrap_around_without_saving() {
            // The hydrated mock has no save expectations, so any write panics.
            let mut board = Board::load(hydrated_repo(), "alice", PersistMode::Strict).unwrap();

            board.navigate(Direction::Left);
            assert_eq!(board.focused(), TaskStatus::Done);
            board.navigate(Direction::Right);
            assert_eq!(board.focused(), TaskStatus::Todo);
            board.navigate(Direction::Right);
            assert_eq!(board.focused(), TaskStatus::InProgress);
        }

        #[test]
        fn up_and_down_stay_within_the_column() {
            // Arrange
            let mut repo = MockTaskRepository::new();
            repo.expect_has_board().returning(|_| Ok(true));
            repo.expect_load_tasks().returning(|_, status| {
                Ok(vec![task(status, "first"), task(status, "second")])
            });
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            // Act & Assert
            board.navigate(Direction::Up);
            assert_eq!(board.selected_task().unwrap().title(), "first");
            board.navigate(Direction::Down);
            board.navigate(Direction::Down);
            assert_eq!(board.selected_task().unwrap().title(), "second");
        }
    }

    mod submit_tests {
        use super::*;

        #[test]
        fn append_adds_task_and_saves_only_that_column() {
            // Arrange
            let mut repo = hydrated_repo();
            repo.expect_save_tasks()
                .with(
                    eq("alice"),
                    eq(TaskStatus::InProgress),
                    function(|tasks: &[Task]| tasks.len() == 2),
                )
                .times(1)
                .returning(|_, _, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            // Act
            board
                .submit_task_form(TaskStatus::InProgress, TaskPlacement::Append, "new", "desc")
                .unwrap();

            // Assert
            let tasks = board.column(TaskStatus::InProgress).tasks();
            assert_eq!(tasks[1], Task::new(TaskStatus::InProgress, "new", "desc"));
        }

        #[test]
        fn replace_overwrites_task_in_place() {
            let mut repo = hydrated_repo();
            repo.expect_save_tasks().times(1).returning(|_, _, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            board
                .submit_task_form(TaskStatus::Todo, TaskPlacement::Replace(0), "edited", "")
                .unwrap();

            assert_eq!(board.column(TaskStatus::Todo).tasks(), &[task(TaskStatus::Todo, "edited")]);
        }

        #[test]
        fn replace_out_of_range_appends() {
            let mut repo = hydrated_repo();
            repo.expect_save_tasks().times(1).returning(|_, _, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            board
                .submit_task_form(TaskStatus::Done, TaskPlacement::Replace(7), "late", "")
                .unwrap();

            assert_eq!(board.column(TaskStatus::Done).tasks().len(), 2);
        }
    }

    mod move_tests {
        use super::*;

        #[test]
        fn move_relocates_task_and_saves_both_columns_together() {
            // Arrange
            let mut repo = hydrated_repo();
            repo.expect_save_columns()
                .with(
                    eq("alice"),
                    function(|columns: &[(TaskStatus, Vec<Task>)]| {
                        columns.len() == 2
                            && columns[0].0 == TaskStatus::Todo
                            && columns[0].1.is_empty()
                            && columns[1].0 == TaskStatus::InProgress
                            && columns[1].1.len() == 2
                    }),
                )
                .times(1)
                .returning(|_, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            // Act
            board.move_task().unwrap();

            // Assert
            let moved = &board.column(TaskStatus::InProgress).tasks()[1];
            assert_eq!(moved.title(), "todo task");
            assert_eq!(moved.status(), TaskStatus::InProgress);
            assert!(board.column(TaskStatus::Todo).tasks().is_empty());
            assert_eq!(board.focused(), TaskStatus::Todo);
        }

        #[test]
        fn move_from_done_wraps_to_todo() {
            let mut repo = hydrated_repo();
            repo.expect_save_columns().times(1).returning(|_, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();
            board.navigate(Direction::Left);

            board.move_task().unwrap();

            let todo = board.column(TaskStatus::Todo).tasks();
            assert_eq!(todo.last().unwrap().title(), "done task");
            assert_eq!(todo.last().unwrap().status(), TaskStatus::Todo);
            assert_statuses_match(&board);
        }

        #[test]
        fn moves_conserve_total_task_count() {
            // Arrange
            let mut repo = hydrated_repo();
            repo.expect_save_columns().returning(|_, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();
            let total = board.task_count();

            // Act
            for step in 0..20 {
                if step % 3 == 0 {
                    board.navigate(Direction::Right);
                }
                board.move_task().unwrap();
                // Assert
                assert_eq!(board.task_count(), total);
                assert_statuses_match(&board);
            }
        }

        #[test]
        fn move_on_empty_column_does_nothing() {
            let mut repo = MockTaskRepository::new();
            repo.expect_has_board().returning(|_| Ok(true));
            repo.expect_load_tasks().returning(|_, _| Ok(Vec::new()));
            repo.expect_save_columns().never();
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            board.move_task().unwrap();

            assert_eq!(board.task_count(), 0);
        }
    }

    mod delete_tests {
        use super::*;

        #[test]
        fn delete_removes_selected_and_saves_its_column() {
            let mut repo = hydrated_repo();
            repo.expect_save_tasks()
                .with(
                    eq("alice"),
                    eq(TaskStatus::Todo),
                    function(|tasks: &[Task]| tasks.is_empty()),
                )
                .times(1)
                .returning(|_, _, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            board.delete_task().unwrap();

            assert!(board.column(TaskStatus::Todo).tasks().is_empty());
            assert_eq!(board.column(TaskStatus::Todo).selected_index(), None);
        }

        #[test]
        fn delete_last_item_moves_selection_up() {
            let mut repo = MockTaskRepository::new();
            repo.expect_has_board().returning(|_| Ok(true));
            repo.expect_load_tasks()
                .returning(|_, status| Ok(vec![task(status, "a"), task(status, "b")]));
            repo.expect_save_tasks().returning(|_, _, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();
            board.navigate(Direction::Down);

            board.delete_task().unwrap();

            assert_eq!(board.selected_task().unwrap().title(), "a");
        }
    }

    mod persist_mode_tests {
        use super::*;

        fn failing_repo() -> MockTaskRepository {
            let mut repo = hydrated_repo();
            repo.expect_save_tasks().returning(|_, _, _| Err(storage_failure()));
            repo.expect_save_columns().returning(|_, _| Err(storage_failure()));
            repo
        }

        #[test]
        fn best_effort_swallows_failure_and_keeps_mutation() {
            let mut board = Board::load(failing_repo(), "alice", PersistMode::BestEffort).unwrap();

            let result = board.delete_task();

            assert!(result.is_ok());
            assert!(board.column(TaskStatus::Todo).tasks().is_empty());
        }

        #[test]
        fn strict_returns_failure_and_keeps_mutation() {
            let mut board = Board::load(failing_repo(), "alice", PersistMode::Strict).unwrap();

            let result = board.move_task();

            assert!(matches!(result, Err(StoreError::StorageIo(_))));
            assert_eq!(board.column(TaskStatus::InProgress).tasks().len(), 2);
        }

        #[test]
        fn quit_flushes_all_columns_and_marks_quitting() {
            let mut repo = hydrated_repo();
            repo.expect_save_columns()
                .with(
                    eq("alice"),
                    function(|columns: &[(TaskStatus, Vec<Task>)]| {
                        columns.iter().map(|(status, _)| *status).eq(TaskStatus::ALL)
                    }),
                )
                .times(1)
                .returning(|_, _| Ok(()));
            let mut board = Board::load(repo, "alice", PersistMode::Strict).unwrap();

            board.quit().unwrap();

            assert!(board.is_quitting());
        }

        #[test]
        fn best_effort_quit_still_terminates_on_failure() {
            let mut board = Board::load(failing_repo(), "alice", PersistMode::BestEffort).unwrap();

            assert!(board.quit().is_ok());
            assert!(board.is_quitting());
        }
    }
}
