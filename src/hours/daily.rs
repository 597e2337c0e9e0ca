use std::collections::BTreeMap;
use std::pin::pin;

use anyhow::Result;
use chrono::{NaiveDate, TimeZone};
use futures::{Stream, StreamExt};
use tracing::instrument;

use crate::storage::entities::{SessionEntity, TaskEntity};

use super::{classify_work, round_quarter_minutes, BaseWindow};

/// Minutes logged on one calendar day, split by category.
/// `task_minutes` only counts regular tasks, calls land in `call_minutes`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayBuckets {
    pub base_minutes: i64,
    pub overtime_minutes: i64,
    pub task_minutes: i64,
    pub call_minutes: i64,
}

impl DayBuckets {
    pub fn is_empty(&self) -> bool {
        *self == DayBuckets::default()
    }
}

/// Day keys are naive dates in the timezone the caller aggregates in.
pub type DayMap = BTreeMap<NaiveDate, DayBuckets>;

/// Groups sessions and tasks into per-day buckets.
///
/// Every record lands on the day its start falls on in `tz` (an interval is
/// assumed not to span days). Sessions are split against the base window,
/// regular tasks contribute quarter-rounded minutes, calls raw minutes.
#[instrument(skip_all)]
pub async fn daily_buckets<Tz: TimeZone>(
    sessions: impl Stream<Item = Result<SessionEntity>>,
    tasks: impl Stream<Item = Result<TaskEntity>>,
    tz: &Tz,
    window: BaseWindow,
) -> Result<DayMap> {
    let mut days = DayMap::new();
    fold_sessions(sessions, tz, window, &mut days).await?;
    fold_tasks(tasks, tz, &mut days).await?;
    Ok(days)
}

async fn fold_sessions<Tz: TimeZone>(
    sessions: impl Stream<Item = Result<SessionEntity>>,
    tz: &Tz,
    window: BaseWindow,
    days: &mut DayMap,
) -> Result<()> {
    let mut sessions = pin!(sessions);
    while let Some(session) = sessions.next().await.transpose()? {
        let start = session.start.with_timezone(tz);
        let split = classify_work(start.clone(), session.end.with_timezone(tz), window);

        let buckets = days.entry(start.date_naive()).or_default();
        buckets.base_minutes += split.base_minutes;
        buckets.overtime_minutes += split.overtime_minutes;
    }
    Ok(())
}

async fn fold_tasks<Tz: TimeZone>(
    tasks: impl Stream<Item = Result<TaskEntity>>,
    tz: &Tz,
    days: &mut DayMap,
) -> Result<()> {
    let mut tasks = pin!(tasks);
    while let Some(task) = tasks.next().await.transpose()? {
        let day = task.start.with_timezone(tz).date_naive();
        let buckets = days.entry(day).or_default();
        if task.call {
            buckets.call_minutes += task.raw_minutes();
        } else {
            // Rounding is per task, matching how a finished task is shown.
            buckets.task_minutes += round_quarter_minutes(task.raw_minutes());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use futures::{stream, StreamExt};

    use crate::{
        hours::BaseWindow,
        storage::entities::{SessionEntity, TaskEntity},
        utils::logging::TEST_LOGGING,
    };

    use super::daily_buckets;

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();

    fn at(date: NaiveDate, hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::new(
            date,
            NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn sessions_and_tasks_group_by_start_day() -> Result<()> {
        *TEST_LOGGING;

        let next_date = TEST_DATE.succ_opt().unwrap();
        let sessions = vec![
            SessionEntity::test_value(at(TEST_DATE, 9, 0), at(TEST_DATE, 19, 0)),
            SessionEntity::test_value(at(next_date, 8, 0), at(next_date, 12, 0)),
        ];
        let tasks = vec![
            TaskEntity::test_value("report", at(TEST_DATE, 10, 0), at(TEST_DATE, 10, 50)),
            TaskEntity::test_value("callout", at(TEST_DATE, 22, 0), at(TEST_DATE, 22, 20))
                .with_call(true),
        ];

        let days = daily_buckets(
            stream::iter(sessions).map(Ok),
            stream::iter(tasks).map(Ok),
            &Utc,
            BaseWindow::default(),
        )
        .await?;

        assert_eq!(days.len(), 2);

        let first = &days[&TEST_DATE];
        assert_eq!(first.base_minutes, 9 * 60);
        assert_eq!(first.overtime_minutes, 60);
        // 50 raw task minutes round to 45.
        assert_eq!(first.task_minutes, 45);
        assert_eq!(first.call_minutes, 20);

        let second = &days[&next_date];
        assert_eq!(second.base_minutes, 3 * 60);
        assert_eq!(second.overtime_minutes, 60);
        assert_eq!(second.task_minutes, 0);

        Ok(())
    }

    #[tokio::test]
    async fn several_sessions_on_one_day_accumulate() -> Result<()> {
        let sessions = vec![
            SessionEntity::test_value(at(TEST_DATE, 9, 0), at(TEST_DATE, 12, 0)),
            SessionEntity::test_value(at(TEST_DATE, 13, 0), at(TEST_DATE, 17, 0)),
        ];

        let days = daily_buckets(
            stream::iter(sessions).map(Ok),
            stream::empty(),
            &Utc,
            BaseWindow::default(),
        )
        .await?;

        assert_eq!(days[&TEST_DATE].base_minutes, 7 * 60);
        Ok(())
    }

    #[tokio::test]
    async fn day_key_follows_the_requested_timezone() -> Result<()> {
        // 23:30 UTC is already the next day at +03:00.
        let offset = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        let sessions = vec![SessionEntity::test_value(
            at(TEST_DATE, 23, 30),
            at(TEST_DATE, 23, 30) + Duration::hours(1),
        )];

        let days = daily_buckets(
            stream::iter(sessions).map(Ok),
            stream::empty(),
            &offset,
            BaseWindow::default(),
        )
        .await?;

        assert_eq!(days.keys().next(), Some(&TEST_DATE.succ_opt().unwrap()));
        Ok(())
    }

    #[tokio::test]
    async fn storage_errors_propagate() {
        let tasks = stream::once(async { Err(anyhow::anyhow!("broken day file")) });
        let result = daily_buckets(
            stream::empty(),
            tasks,
            &Utc,
            BaseWindow::default(),
        )
        .await;
        assert!(result.is_err());
    }
}
