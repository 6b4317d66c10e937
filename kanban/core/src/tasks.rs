//! Tasks and their durable per-user, per-status storage.
//!
//! Each user owns three independent entries, one per [`TaskStatus`], stored
//! under `tasks:<username>:<status>`. An entry holds the column's tasks as an
//! ordered JSON array of `{title, description}`; the status is implied by the
//! key and re-attached when the list is loaded.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::kv::{KvStore, KvTxn};

/// The three fixed stages of the board, cycling Todo → InProgress → Done → Todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// All statuses in board order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// The status after this one, wrapping from `Done` back to `Todo`.
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Todo => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Todo,
        }
    }

    /// The status before this one, wrapping from `Todo` back to `Done`.
    pub fn prev(self) -> Self {
        match self {
            TaskStatus::Todo => TaskStatus::Done,
            TaskStatus::InProgress => TaskStatus::Todo,
            TaskStatus::Done => TaskStatus::InProgress,
        }
    }

    /// Position of the status's column on the board.
    pub fn index(self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Done => 2,
        }
    }

    /// Stable identifier used in storage keys.
    pub fn slug(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let title = match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        };
        write!(f, "{title}")
    }
}

/// Something that can be shown as an entry in a column list.
pub trait ListItem {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    /// Text matched against when filtering a list.
    fn filter_value(&self) -> &str;
}

/// A single card on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    status: TaskStatus,
    title: String,
    description: String,
}

impl Task {
    /// Creates a new task in the given column.
    pub fn new(
        status: TaskStatus,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            status,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Returns the column this task belongs to.
    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the same task relocated to `status`.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

impl ListItem for Task {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn filter_value(&self) -> &str {
        &self.title
    }
}

/// On-disk shape of a task. The status lives in the key, not the record.
#[derive(Serialize, Deserialize)]
struct StoredTask {
    title: String,
    description: String,
}

/// Durable access to a user's task lists.
///
/// The board is written against this trait so its persistence behavior can be
/// exercised without a database.
#[cfg_attr(test, mockall::automock)]
pub trait TaskRepository {
    /// Loads the tasks stored for `username` under `status`.
    ///
    /// Returns an empty list when nothing has been saved yet.
    fn load_tasks(&self, username: &str, status: TaskStatus) -> Result<Vec<Task>, StoreError>;

    /// Replaces the stored list for `username` under `status` with `tasks`.
    fn save_tasks(
        &self,
        username: &str,
        status: TaskStatus,
        tasks: &[Task],
    ) -> Result<(), StoreError>;

    /// Replaces several lists for `username` in one transaction.
    fn save_columns(
        &self,
        username: &str,
        columns: &[(TaskStatus, Vec<Task>)],
    ) -> Result<(), StoreError>;

    /// Returns whether any task list has ever been saved for `username`.
    fn has_board(&self, username: &str) -> Result<bool, StoreError>;
}

/// [`TaskRepository`] backed by the key-value store.
#[derive(Clone)]
pub struct TaskStore {
    kv: KvStore,
}

fn tasks_key(username: &str, status: TaskStatus) -> String {
    format!("tasks:{username}:{}", status.slug())
}

impl TaskStore {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    fn write(
        txn: &KvTxn<'_>,
        username: &str,
        status: TaskStatus,
        tasks: &[Task],
    ) -> Result<(), StoreError> {
        let stored: Vec<StoredTask> = tasks
            .iter()
            .map(|task| StoredTask {
                title: task.title.clone(),
                description: task.description.clone(),
            })
            .collect();
        let encoded = serde_json::to_vec(&stored)?;
        txn.put(&tasks_key(username, status), &encoded)
    }
}

impl TaskRepository for TaskStore {
    #[tracing::instrument(skip(self))]
    fn load_tasks(&self, username: &str, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        let Some(raw) = self.kv.get(&tasks_key(username, status))? else {
            debug!("no stored tasks yet");
            return Ok(Vec::new());
        };

        let stored: Vec<StoredTask> = serde_json::from_slice(&raw)?;
        Ok(stored
            .into_iter()
            .map(|record| Task::new(status, record.title, record.description))
            .collect())
    }

    #[tracing::instrument(skip(self, tasks), fields(count = tasks.len()))]
    fn save_tasks(
        &self,
        username: &str,
        status: TaskStatus,
        tasks: &[Task],
    ) -> Result<(), StoreError> {
        self.kv.update(|txn| Self::write(txn, username, status, tasks))
    }

    #[tracing::instrument(skip(self, columns), fields(columns = columns.len()))]
    fn save_columns(
        &self,
        username: &str,
        columns: &[(TaskStatus, Vec<Task>)],
    ) -> Result<(), StoreError> {
        self.kv.update(|txn| {
            for (status, tasks) in columns {
                Self::write(txn, username, *status, tasks)?;
            }
            Ok(())
        })
    }

    fn has_board(&self, username: &str) -> Result<bool, StoreError> {
        self.kv.view(|txn| {
            for status in TaskStatus::ALL {
                if txn.contains(&tasks_key(username, status))? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }
}
