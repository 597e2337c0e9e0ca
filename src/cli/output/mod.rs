pub mod calendar;

use std::{future, sync::Arc};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use futures::{stream, Stream, StreamExt};
use tracing::error;

use crate::storage::{entities::Timestamped, record_store::RecordStore};

pub struct ExtractConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ExtractConfig {
    /// A record belongs to the range when it starts inside it. Aggregation
    /// keys off the start too, so both agree on which day owns a record.
    fn filter<T: Timestamped>(&self, entity: T) -> Option<T> {
        if self.start <= entity.start() && entity.start() < self.end {
            Some(entity)
        } else {
            None
        }
    }
}

/// Extracts records between 2 dates. To do it in an efficient manner streams
/// are used: day files are read a few at a time and flattened in order.
pub fn extract_between<T>(
    storage: impl RecordStore<T> + Send + Sync + 'static,
    config: ExtractConfig,
) -> impl Stream<Item = Result<T>>
where
    T: Timestamped + Send + 'static,
{
    let storage = Arc::new(storage);
    let start = config.start;
    let end = config.end;

    let date_iteration = date_range(start.date_naive(), end.date_naive());

    let files = date_iteration
        .map(move |day| {
            let storage = storage.clone();
            async move { (day, storage.get_data_for(day).await) }
        })
        .buffered(4);

    let result = files
        .flat_map(|(day, data)| match data {
            Ok(data) => stream::iter(data).map(Ok).boxed(),
            Err(e) => {
                error!("Failed to process file {day} {e}");
                stream::once(future::ready(Err(e))).boxed()
            }
        })
        .filter_map(move |v| future::ready(v.map(|v| config.filter(v)).transpose()));

    result
}

/// Returns a stream of dates between start (inclusive) and end (inclusive).
fn date_range(start: NaiveDate, end: NaiveDate) -> impl Stream<Item = NaiveDate> {
    stream::unfold((start, end), |(mut current, end)| {
        future::ready({
            if current <= end {
                let last_current = current;
                current = current.succ_opt().expect("End of time should never happen");
                Some(((last_current), (current, end)))
            } else {
                None
            }
        })
    })
}
