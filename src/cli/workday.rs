use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Subcommand};
use futures::TryStreamExt;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::Config,
    hours::{call_minutes, classify_work, HoursBreakdown},
    storage::{
        entities::{SessionEntity, TaskEntity},
        record_store::{RecordStore, RecordStoreImpl},
        session_records_dir,
        state::{OpenSession, StateFile},
        task_records_dir,
    },
    utils::{
        clock::Clock,
        time::{format_minutes, next_day_start},
    },
};

use super::{
    output::{extract_between, ExtractConfig},
    Args, DateStyle,
};

#[derive(Debug, Subcommand)]
pub enum DayCommand {
    #[command(about = "Start a workday session")]
    Start {
        #[arg(
            long,
            help = "Project name stamped on the session. Falls back to the configured default"
        )]
        project: Option<String>,
    },
    #[command(about = "End the open workday session. Open tasks have to be finished first")]
    End {},
    #[command(about = "Show everything logged on a date")]
    Show {
        #[arg(help = "Date to show. Examples are \"yesterday\", \"15/03/2025\". Defaults to today")]
        date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
}

pub async fn process_day_command(
    command: DayCommand,
    app_dir: &Path,
    config: &Config,
    clock: &dyn Clock,
) -> Result<()> {
    match command {
        DayCommand::Start { project } => {
            let project = project.unwrap_or_else(|| config.project.clone());
            let session = start_workday(&StateFile::new(app_dir), clock, project).await?;
            println!(
                "Workday '{}' started at {}",
                session.project,
                session.start.with_timezone(&Local).format("%H:%M")
            );
            Ok(())
        }
        DayCommand::End {} => {
            let session = end_workday(app_dir, clock).await?;
            println!(
                "Workday ended, {} logged",
                format_minutes(session.raw_minutes())
            );
            Ok(())
        }
        DayCommand::Show { date, date_style } => {
            let date = parse_day_argument(date, date_style, clock)?;
            let report = day_report(app_dir, config, date).await?;
            print_day_report(&report);
            Ok(())
        }
    }
}

pub async fn process_status_command(app_dir: &Path, clock: &dyn Clock) -> Result<()> {
    let state = StateFile::new(app_dir).load().await?;
    let now = clock.time();

    match &state.session {
        Some(session) => println!(
            "Workday '{}' open since {}, {} so far",
            session.project,
            session.start.with_timezone(&Local).format("%H:%M"),
            format_minutes((now - session.start).num_minutes().max(0))
        ),
        None => println!("No workday is open"),
    }

    for task in &state.tasks {
        println!(
            "  [{}] {}{} ({} elapsed)",
            &task.id.to_string()[..8],
            task.title.as_deref().unwrap_or("untitled"),
            if task.call { " (call)" } else { "" },
            format_minutes((now - task.started).num_minutes().max(0))
        );
    }

    Ok(())
}

pub(crate) async fn start_workday(
    state_file: &StateFile,
    clock: &dyn Clock,
    project: String,
) -> Result<OpenSession> {
    let now = clock.time();
    let session = state_file
        .update(move |state| {
            if let Some(open) = &state.session {
                bail!(
                    "A workday is already open since {}",
                    open.start.with_timezone(&Local).format("%H:%M %x")
                );
            }
            let session = OpenSession {
                id: Uuid::new_v4(),
                project: project.into(),
                start: now,
            };
            state.session = Some(session.clone());
            Ok(session)
        })
        .await?;

    info!("Opened workday {}", session.id);
    Ok(session)
}

pub(crate) async fn end_workday(app_dir: &Path, clock: &dyn Clock) -> Result<SessionEntity> {
    let state_file = StateFile::new(app_dir);
    let state = state_file.load().await?;

    if state.has_open_regular_tasks() {
        bail!("Finish all tasks before ending the workday");
    }
    let Some(open) = state.session else {
        bail!("There is no open workday");
    };

    let entity = SessionEntity {
        id: open.id,
        project: open.project,
        start: open.start,
        end: clock.time(),
    };

    let sessions = RecordStoreImpl::new(session_records_dir(app_dir))?;
    sessions
        .append(entity.start.date_naive(), vec![entity.clone()])
        .await?;

    state_file
        .update(|state| match &state.session {
            Some(current) if current.id == entity.id => {
                state.session = None;
                Ok(())
            }
            _ => bail!("The open workday changed while ending it"),
        })
        .await?;

    info!("Closed workday {}", entity.id);
    Ok(entity)
}

/// Everything `day show` needs, separated from printing.
pub(crate) struct DayReport {
    pub date: NaiveDate,
    pub sessions: Vec<SessionEntity>,
    pub tasks: Vec<TaskEntity>,
    pub split: HoursBreakdown,
    pub call_minutes: i64,
}

pub(crate) async fn day_report(
    app_dir: &Path,
    config: &Config,
    date: NaiveDate,
) -> Result<DayReport> {
    let window = config.base_window()?;
    let start = local_day_start(date)?;
    let end = next_day_start(start.clone());

    let sessions: Vec<SessionEntity> = extract_between(
        RecordStoreImpl::new(session_records_dir(app_dir))?,
        ExtractConfig {
            start: start.to_utc(),
            end: end.to_utc(),
        },
    )
    .try_collect()
    .await?;

    let tasks: Vec<TaskEntity> = extract_between(
        RecordStoreImpl::new(task_records_dir(app_dir))?,
        ExtractConfig {
            start: start.to_utc(),
            end: end.to_utc(),
        },
    )
    .try_collect()
    .await?;

    let mut split = HoursBreakdown::default();
    for session in &sessions {
        let piece = classify_work(
            session.start.with_timezone(&Local),
            session.end.with_timezone(&Local),
            window,
        );
        split.base_minutes += piece.base_minutes;
        split.overtime_minutes += piece.overtime_minutes;
    }

    Ok(DayReport {
        date,
        call_minutes: call_minutes(&tasks),
        sessions,
        tasks,
        split,
    })
}

fn print_day_report(report: &DayReport) {
    println!("{}", report.date.format("%Y-%m-%d"));

    if report.sessions.is_empty() && report.tasks.is_empty() {
        println!("No records");
        return;
    }

    for session in &report.sessions {
        println!(
            "Worked {} - {}",
            session.start.with_timezone(&Local).format("%H:%M"),
            session.end.with_timezone(&Local).format("%H:%M"),
        );
    }
    println!(
        "Base: {}\tOvertime: {}\tCalls: {}",
        format_minutes(report.split.base_minutes),
        format_minutes(report.split.overtime_minutes),
        format_minutes(report.call_minutes),
    );

    if report.tasks.is_empty() {
        println!("No tasks");
        return;
    }
    println!("Tasks:");
    for task in &report.tasks {
        println!(
            "  {} - {}\t{}{}",
            task.start.with_timezone(&Local).format("%H:%M"),
            task.end.with_timezone(&Local).format("%H:%M"),
            task.title,
            if task.call { " (call)" } else { "" },
        );
        if !task.notes.is_empty() {
            println!("    {}", task.notes);
        }
        if !task.tags.is_empty() {
            println!("    tags: {}", task.tags.join(", "));
        }
        if !task.images.is_empty() {
            println!("    {} attachment(s)", task.images.len());
        }
    }
}

fn parse_day_argument(
    date: Option<String>,
    date_style: DateStyle,
    clock: &dyn Clock,
) -> Result<NaiveDate> {
    let now = clock.time().with_timezone(&Local);
    let Some(date) = date else {
        return Ok(now.date_naive());
    };

    match parse_date_string(&date, now, date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
    }
}

fn local_day_start(date: NaiveDate) -> Result<DateTime<Local>> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .context("Day start does not exist in the local timezone")
}
