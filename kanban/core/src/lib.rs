//! Core persistence and board logic for the kanban board.
//!
//! - [`KvStore`] wraps the embedded database file.
//! - [`CredentialStore`] creates and authenticates users.
//! - [`TaskStore`] reads and writes a user's task lists.
//! - [`Board`] holds the in-memory columns and writes through on every change.
pub mod board;
pub mod credentials;
pub mod error;
pub mod kv;
pub mod tasks;

pub use board::{Board, Column, Direction, PersistMode, TaskPlacement};
pub use credentials::CredentialStore;
pub use error::StoreError;
pub use kv::KvStore;
pub use tasks::{ListItem, Task, TaskRepository, TaskStatus, TaskStore};
