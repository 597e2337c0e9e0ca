use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::warn;
use uuid::Uuid;

/// A task holds at most this many photos.
pub const MAX_TASK_IMAGES: usize = 5;

/// Keeps task photos under `<app-dir>/attachments/<task-id>/`. The stand-in
/// for the object storage bucket the records used to point into.
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(app_dir: &Path) -> Self {
        Self {
            root: app_dir.join("attachments"),
        }
    }

    /// Copies the given files into the task's directory and returns their
    /// stored paths, relative to the application directory. Files beyond the
    /// per-task limit are skipped with a warning.
    pub async fn store_for_task(&self, task_id: Uuid, sources: &[PathBuf]) -> Result<Vec<String>> {
        if sources.is_empty() {
            return Ok(vec![]);
        }

        if sources.len() > MAX_TASK_IMAGES {
            warn!(
                "Only {MAX_TASK_IMAGES} of {} images fit on one task, the rest are skipped",
                sources.len()
            );
        }

        let task_dir = self.root.join(task_id.to_string());
        tokio::fs::create_dir_all(&task_dir).await?;

        let mut stored = vec![];
        for (index, source) in sources.iter().take(MAX_TASK_IMAGES).enumerate() {
            let file_name = source
                .file_name()
                .ok_or_else(|| anyhow!("{source:?} has no file name"))?
                .to_string_lossy();
            let stored_name = format!("{index}-{file_name}");

            tokio::fs::copy(source, task_dir.join(&stored_name))
                .await
                .with_context(|| format!("Failed to copy image {source:?}"))?;

            stored.push(format!("attachments/{task_id}/{stored_name}"));
        }

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Result;
    use tempfile::tempdir;
    use uuid::Uuid;

    use super::{AttachmentStore, MAX_TASK_IMAGES};

    fn image_fixtures(dir: &std::path::Path, count: usize) -> Result<Vec<PathBuf>> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("photo-{i}.jpg"));
                std::fs::write(&path, format!("image {i}"))?;
                Ok(path)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_copies_into_task_directory() -> Result<()> {
        let sources = tempdir()?;
        let app = tempdir()?;
        let store = AttachmentStore::new(app.path());
        let task_id = Uuid::new_v4();

        let stored = store
            .store_for_task(task_id, &image_fixtures(sources.path(), 2)?)
            .await?;

        assert_eq!(
            stored,
            vec![
                format!("attachments/{task_id}/0-photo-0.jpg"),
                format!("attachments/{task_id}/1-photo-1.jpg"),
            ]
        );
        for path in &stored {
            assert!(app.path().join(path).exists());
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_limit_drops_extra_images() -> Result<()> {
        let sources = tempdir()?;
        let app = tempdir()?;
        let store = AttachmentStore::new(app.path());

        let stored = store
            .store_for_task(
                Uuid::new_v4(),
                &image_fixtures(sources.path(), MAX_TASK_IMAGES + 2)?,
            )
            .await?;

        assert_eq!(stored.len(), MAX_TASK_IMAGES);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_fails() -> Result<()> {
        let app = tempdir()?;
        let store = AttachmentStore::new(app.path());

        let result = store
            .store_for_task(Uuid::new_v4(), &[PathBuf::from("/nowhere/photo.jpg")])
            .await;
        assert!(result.is_err());

        Ok(())
    }
}
