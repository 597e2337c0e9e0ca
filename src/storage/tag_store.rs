use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::{Deserialize, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};

/// A known tag together with how often it has been used. The cli lists tags
/// most-used first, which is what makes reusing old tags cheap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    pub name: String,
    pub count: u64,
}

/// The tag library, a json map from tag name to usage count in
/// `<app-dir>/tags.json`. Every finished task bumps its tags by one.
pub struct TagStore {
    path: PathBuf,
}

impl TagStore {
    pub fn new(app_dir: &Path) -> Self {
        Self {
            path: app_dir.join("tags.json"),
        }
    }

    /// All known tags, usage count descending, name as tie breaker.
    pub async fn load(&self) -> Result<Vec<TagUsage>> {
        let counts = match File::open(&self.path).await {
            Ok(mut file) => {
                file.lock_shared()?;
                let mut content = String::new();
                let read = file.read_to_string(&mut content).await;
                file.unlock_async().await?;
                read?;
                Self::parse(&content)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e).context("Failed to open tag library"),
        };

        let mut usages = counts
            .into_iter()
            .map(|(name, count)| TagUsage { name, count })
            .collect::<Vec<_>>();
        usages.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        Ok(usages)
    }

    /// Increments each given tag by one, creating unknown ones at one.
    pub async fn bump(&self, tags: &[String]) -> Result<()> {
        if tags.is_empty() {
            return Ok(());
        }

        let mut file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .context("Failed to open tag library")?;

        file.lock_exclusive()?;
        let result = Self::bump_with_file(&mut file, tags).await;
        file.unlock_async().await?;
        result
    }

    async fn bump_with_file(file: &mut File, tags: &[String]) -> Result<()> {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        let mut counts = Self::parse(&content)?;

        for tag in tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }

        let serialized = serde_json::to_string_pretty(&counts)?;
        file.set_len(0).await?;
        file.seek(std::io::SeekFrom::Start(0)).await?;
        file.write_all(serialized.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn parse(content: &str) -> Result<HashMap<String, u64>> {
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(content).context("Tag library is corrupted")
    }
}
