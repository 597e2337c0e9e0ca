//!  Storage is split between finished work and in-flight state:
//!   - `records/sessions` and `records/tasks` hold append-only day files,
//!     one JSON value per line, for a UTC day each.
//!   - `state.json` holds the open session and open tasks.
//!   - `tags.json` is the tag library, `attachments/` the photo store.

pub mod attachments;
pub mod entities;
pub mod record_store;
pub mod state;
pub mod tag_store;

use std::path::{Path, PathBuf};

pub fn session_records_dir(app_dir: &Path) -> PathBuf {
    app_dir.join("records").join("sessions")
}

pub fn task_records_dir(app_dir: &Path) -> PathBuf {
    app_dir.join("records").join("tasks")
}
