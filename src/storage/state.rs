use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use uuid::Uuid;

/// A workday that has been started but not ended yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenSession {
    pub id: Uuid,
    pub project: Arc<str>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
}

/// A task that is being worked on right now. The title can still be missing,
/// it only becomes mandatory when the task is finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenTask {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<Arc<str>>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub call: bool,
}

/// Everything that is in flight. Finished work moves into the day files and
/// disappears from here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveState {
    #[serde(default)]
    pub session: Option<OpenSession>,
    #[serde(default)]
    pub tasks: Vec<OpenTask>,
}

impl ActiveState {
    pub fn has_open_regular_tasks(&self) -> bool {
        self.tasks.iter().any(|t| !t.call)
    }

    /// Picks the open task a command refers to. Without a selector there has
    /// to be exactly one candidate; a selector matches on an id prefix.
    pub fn find_task(&self, selector: Option<&str>) -> Result<&OpenTask> {
        let Some(selector) = selector else {
            return match self.tasks.as_slice() {
                [] => bail!("There is no open task"),
                [single] => Ok(single),
                _ => bail!(
                    "There are {} open tasks, pick one with --task <id>",
                    self.tasks.len()
                ),
            };
        };

        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.to_string().starts_with(selector));
        let found = matches
            .next()
            .ok_or_else(|| anyhow!("No open task matches id {selector}"))?;
        if matches.next().is_some() {
            bail!("Id {selector} is ambiguous between open tasks");
        }
        Ok(found)
    }

    pub fn remove_task(&mut self, id: Uuid) -> Option<OpenTask> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(index))
    }
}

/// Handle on `state.json`. All mutation goes through [StateFile::update] so
/// the read-modify-write cycle happens under one exclusive lock and two
/// concurrent invocations can't both open a session.
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(app_dir: &Path) -> Self {
        Self {
            path: app_dir.join("state.json"),
        }
    }

    pub async fn load(&self) -> Result<ActiveState> {
        let mut file = match File::open(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ActiveState::default())
            }
            Err(e) => return Err(e).context("Failed to open state file"),
        };

        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        Self::parse(&content)
    }

    /// Applies `update` to the current state and persists the result. When
    /// the closure errors nothing is written.
    pub async fn update<T>(
        &self,
        update: impl FnOnce(&mut ActiveState) -> Result<T>,
    ) -> Result<T> {
        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .context("Failed to open state file")?;

        file.lock_exclusive()?;
        let result = Self::update_with_file(&mut file, update).await;
        file.unlock_async().await?;
        result
    }

    async fn update_with_file<T>(
        file: &mut File,
        update: impl FnOnce(&mut ActiveState) -> Result<T>,
    ) -> Result<T> {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        let mut state = Self::parse(&content)?;

        let value = update(&mut state)?;

        let serialized = serde_json::to_string_pretty(&state)?;
        file.set_len(0).await?;
        file.seek(std::io::SeekFrom::Start(0)).await?;
        file.write_all(serialized.as_bytes()).await?;
        file.flush().await?;

        Ok(value)
    }

    fn parse(content: &str) -> Result<ActiveState> {
        if content.trim().is_empty() {
            return Ok(ActiveState::default());
        }
        // State is precious, a broken file is surfaced instead of wiped.
        serde_json::from_str(content).context("State file is corrupted")
    }
}
