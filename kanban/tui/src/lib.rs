//! Terminal front end for the kanban board.
pub mod app;
pub mod auth;
pub mod forms;
pub mod settings;
pub mod telemetry;
pub mod ui;
