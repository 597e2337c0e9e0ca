use std::{collections::BTreeSet, path::Path};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser};
use now::DateTimeNow;

use crate::{
    config::Config,
    hours::{
        daily::{daily_buckets, DayMap},
        monthly::{monthly_rollup, MonthSummary},
    },
    storage::{
        entities::{SessionEntity, TaskEntity},
        record_store::{RecordStore, RecordStoreImpl},
        session_records_dir, task_records_dir,
    },
    utils::{
        clock::Clock,
        time::{format_minutes, next_day_start},
    },
};

use super::{
    output::{calendar::render_month, extract_between, ExtractConfig},
    Args, DateStyle,
};

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    #[arg(
        long = "month",
        short,
        help = "Month to show. Examples are \"march\", \"15/03/2025\". Defaults to the current month, or the latest one with data"
    )]
    month: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

pub async fn process_summary_command(
    SummaryCommand { month, date_style }: SummaryCommand,
    app_dir: &Path,
    config: &Config,
    clock: &dyn Clock,
) -> Result<()> {
    let now = clock.time().with_timezone(&Local);

    let (year, month) = match month {
        Some(month) => match parse_date_string(&month, now, date_style.into()) {
            Ok(v) => (v.year(), v.month()),
            Err(e) => {
                return Err(Args::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!("Failed to validate month {e}"),
                    )
                    .into());
            }
        },
        None => {
            // Today's month when it has data, the latest recorded month
            // otherwise.
            let available = available_months(app_dir).await?;
            let current = (now.year(), now.month());
            if available.contains(&current) {
                current
            } else {
                match available.last() {
                    Some(v) => *v,
                    None => bail!("Nothing is logged yet"),
                }
            }
        }
    };

    let days = month_days(app_dir, config, year, month).await?;
    let rows = monthly_rollup(&days);

    print_summary_table(&rows);
    println!();
    print!("{}", render_month(year, month, &days, now.date_naive()));

    Ok(())
}

pub async fn process_months_command(app_dir: &Path, clock: &dyn Clock) -> Result<()> {
    let available = available_months(app_dir).await?;
    if available.is_empty() {
        println!("Nothing is logged yet");
        return Ok(());
    }

    let now = clock.time().with_timezone(&Local);
    for (year, month) in available {
        let marker = if (year, month) == (now.year(), now.month()) {
            "\t(current)"
        } else {
            ""
        };
        println!("{year:04}-{month:02}{marker}");
    }
    Ok(())
}

fn print_summary_table(rows: &[MonthSummary]) {
    if rows.is_empty() {
        println!("No data for the month summary");
        return;
    }

    println!("Month\tBase\tOvertime\tTotal\tTasks");
    for row in rows {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            row.label(),
            format_minutes(row.base_minutes),
            format_minutes(row.overtime_minutes),
            format_minutes(row.grand_total_minutes()),
            format_minutes(row.task_minutes),
        );
    }
}

/// Aggregates one month into day buckets, in local time.
async fn month_days(app_dir: &Path, config: &Config, year: i32, month: u32) -> Result<DayMap> {
    let anchor = month_anchor(year, month)?;
    let start = anchor.beginning_of_month();
    let end = next_day_start(anchor.end_of_month());

    let sessions = extract_between(
        RecordStoreImpl::<SessionEntity>::new(session_records_dir(app_dir))?,
        ExtractConfig {
            start: start.to_utc(),
            end: end.to_utc(),
        },
    );
    let tasks = extract_between(
        RecordStoreImpl::<TaskEntity>::new(task_records_dir(app_dir))?,
        ExtractConfig {
            start: start.to_utc(),
            end: end.to_utc(),
        },
    );

    daily_buckets(sessions, tasks, &Local, config.base_window()?).await
}

fn month_anchor(year: i32, month: u32) -> Result<DateTime<Local>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("{year}-{month} is not a month"))?;
    Local
        .from_local_datetime(&first.and_time(NaiveTime::MIN))
        .earliest()
        .context("Month start does not exist in the local timezone")
}

/// Months that have any workday or any regular task logged, ascending.
/// Months with nothing but calls don't show up.
async fn available_months(app_dir: &Path) -> Result<Vec<(i32, u32)>> {
    let mut months = BTreeSet::new();

    let sessions = RecordStoreImpl::<SessionEntity>::new(session_records_dir(app_dir))?;
    for date in sessions.record_dates()? {
        months.insert((date.year(), date.month()));
    }

    let tasks = RecordStoreImpl::<TaskEntity>::new(task_records_dir(app_dir))?;
    for date in tasks.record_dates()? {
        let month = (date.year(), date.month());
        if months.contains(&month) {
            continue;
        }
        if tasks.get_data_for(date).await?.iter().any(|t| !t.call) {
            months.insert(month);
        }
    }

    Ok(months.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::storage::{
        entities::{SessionEntity, TaskEntity},
        record_store::{RecordStore, RecordStoreImpl},
        session_records_dir, task_records_dir,
    };

    use super::available_months;

    fn at(date: NaiveDate, hour: u32) -> chrono::DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::new(
            date,
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_available_months() -> Result<()> {
        let dir = tempdir()?;

        let session_day = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        RecordStoreImpl::new(session_records_dir(dir.path()))?
            .append(
                session_day,
                vec![SessionEntity::test_value(
                    at(session_day, 9),
                    at(session_day, 17),
                )],
            )
            .await?;

        let tasks = RecordStoreImpl::new(task_records_dir(dir.path()))?;
        // A month with only calls doesn't count.
        let call_day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        tasks
            .append(
                call_day,
                vec![TaskEntity::test_value(
                    "outage",
                    at(call_day, 22),
                    at(call_day, 22) + Duration::minutes(30),
                )
                .with_call(true)],
            )
            .await?;
        // A month with a regular task does.
        let task_day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        tasks
            .append(
                task_day,
                vec![TaskEntity::test_value(
                    "report",
                    at(task_day, 10),
                    at(task_day, 11),
                )],
            )
            .await?;

        assert_eq!(
            available_months(dir.path()).await?,
            vec![(2024, 3), (2024, 5)]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_no_data_means_no_months() -> Result<()> {
        let dir = tempdir()?;
        assert!(available_months(dir.path()).await?.is_empty());
        Ok(())
    }
}
