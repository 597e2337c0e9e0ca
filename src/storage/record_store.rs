use std::{
    future::Future,
    io::ErrorKind,
    marker::PhantomData,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::utils::time::date_to_record_name;

/// Interface for abstracting storage of completed records. Sessions and
/// tasks both live in day files, so the store is generic over the entity.
pub trait RecordStore<T> {
    /// Appends finished records to the file of the given UTC day.
    fn append(
        &self,
        date: NaiveDate,
        records: Vec<T>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Retrieves all records logged on a certain UTC day.
    fn get_data_for(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<T>>> + Send;
}

impl<T, S: Deref + Sync> RecordStore<T> for S
where
    S::Target: RecordStore<T> + Sync,
    T: Send,
{
    fn append(
        &self,
        date: NaiveDate,
        records: Vec<T>,
    ) -> impl Future<Output = Result<()>> + Send {
        self.deref().append(date, records)
    }

    fn get_data_for(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<T>>> + Send {
        self.deref().get_data_for(date)
    }
}

/// The main realization of [RecordStore]. One JSON value per line, one file
/// per UTC day, shared/exclusive file locks around every access so two cli
/// invocations can't interleave.
pub struct RecordStoreImpl<T> {
    record_dir: PathBuf,
    _entity: PhantomData<fn() -> T>,
}

impl<T> RecordStoreImpl<T> {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self {
            record_dir,
            _entity: PhantomData,
        })
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(date))
    }

    /// Days that have a record file, ascending. File names that aren't dates
    /// are someone else's business and get skipped.
    pub fn record_dates(&self) -> Result<Vec<NaiveDate>> {
        let entries = match std::fs::read_dir(&self.record_dir) {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut dates = vec![];
        for entry in entries {
            let name = entry?.file_name();
            if let Ok(date) = NaiveDate::parse_from_str(&name.to_string_lossy(), "%Y-%m-%d") {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }
}

impl<T> RecordStoreImpl<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn read_all_inner(path: &Path) -> Result<Vec<T>> {
        async fn extract<T: DeserializeOwned>(
            path: &Path,
        ) -> std::result::Result<Vec<T>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let buffer = BufReader::new(file);
            let mut lines = buffer.lines();
            let mut records = vec![];
            while let Ok(Some(v)) = lines.next_line().await {
                match serde_json::from_str::<T>(&v) {
                    Ok(v) => records.push(v),
                    Err(e) => {
                        // ignore illegal values. Might happen after shutdowns
                        warn!(
                            "During parsing in path {:?} found illegal json string {}:  {e}",
                            path, &v
                        )
                    }
                }
            }

            lines.into_inner().into_inner().unlock_async().await?;

            Ok(records)
        }

        match extract(path).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }

    async fn append_inner(path: &Path, records: Vec<T>) -> Result<()> {
        let mut file = File::options()
            .append(true)
            .create(true)
            .open(path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, records).await;
        file.unlock_async().await?;
        result
    }

    async fn append_with_file(file: &mut File, records: Vec<T>) -> Result<()> {
        let mut buffer = Vec::<u8>::new();
        for record in records {
            serde_json::to_writer(&mut buffer, &record)?;
            buffer.push(b'\n');
        }

        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

impl<T> RecordStore<T> for RecordStoreImpl<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn append(&self, date: NaiveDate, records: Vec<T>) -> Result<()> {
        Self::append_inner(&self.day_path(date), records).await
    }

    async fn get_data_for(&self, date: NaiveDate) -> Result<Vec<T>> {
        Self::read_all_inner(&self.day_path(date)).await
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    use crate::storage::entities::{SessionEntity, TaskEntity};

    use super::{RecordStore, RecordStoreImpl};

    const TEST_DATE_TIME: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn test_date() -> NaiveDate {
        TEST_DATE_TIME.date()
    }

    fn test_task(title: &str, offset_minutes: i64) -> TaskEntity {
        let start = Utc.from_utc_datetime(&TEST_DATE_TIME) + Duration::minutes(offset_minutes);
        TaskEntity::test_value(title, start, start + Duration::minutes(30))
    }

    #[tokio::test]
    async fn test_store_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let storage = RecordStoreImpl::<TaskEntity>::new(dir.path().to_owned())?;

        let records = vec![test_task("first", 0), test_task("second", 40)];
        storage.append(test_date(), records.clone()).await?;

        let stored = storage.get_data_for(test_date()).await?;
        assert_eq!(stored, records);

        Ok(())
    }

    #[tokio::test]
    async fn test_store_appends_accumulate() -> Result<()> {
        let dir = tempdir()?;
        let storage = RecordStoreImpl::<TaskEntity>::new(dir.path().to_owned())?;

        storage
            .append(test_date(), vec![test_task("first", 0)])
            .await?;
        storage
            .append(test_date(), vec![test_task("second", 40)])
            .await?;

        let stored = storage.get_data_for(test_date()).await?;
        assert_eq!(stored.len(), 2);
        assert_eq!(&*stored[0].title, "first");
        assert_eq!(&*stored[1].title, "second");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_day_reads_empty() -> Result<()> {
        let dir = tempdir()?;
        let storage = RecordStoreImpl::<SessionEntity>::new(dir.path().to_owned())?;

        let stored = storage.get_data_for(test_date()).await?;
        assert!(stored.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_corrupted_line_is_skipped() -> Result<()> {
        let dir = tempdir()?;
        let storage = RecordStoreImpl::<TaskEntity>::new(dir.path().to_owned())?;

        storage
            .append(test_date(), vec![test_task("kept", 0)])
            .await?;

        // A write cut short by a shutdown leaves a truncated line behind.
        let path = dir.path().join("2018-07-04");
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .await?;
        file.write_all(b"{\"id\":\"oops").await?;
        file.flush().await?;

        let stored = storage.get_data_for(test_date()).await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(&*stored[0].title, "kept");

        Ok(())
    }

    #[tokio::test]
    async fn test_record_dates_are_sorted() -> Result<()> {
        let dir = tempdir()?;
        let storage = RecordStoreImpl::<TaskEntity>::new(dir.path().to_owned())?;

        let later = test_date() + Duration::days(3);
        storage.append(later, vec![test_task("later", 0)]).await?;
        storage
            .append(test_date(), vec![test_task("earlier", 0)])
            .await?;
        std::fs::write(dir.path().join("notes.txt"), "not a record")?;

        assert_eq!(storage.record_dates()?, vec![test_date(), later]);

        Ok(())
    }
}
