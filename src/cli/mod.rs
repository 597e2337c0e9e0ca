pub mod output;
pub mod summary;
pub mod task;
pub mod workday;

use std::{fmt::Display, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;

use crate::{
    config::Config,
    utils::{
        clock::DefaultClock,
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "Worklog", version, long_about = None)]
#[command(about = "Journal for workdays, tasks and on-call time", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start, end or review a workday")]
    Day {
        #[command(subcommand)]
        command: workday::DayCommand,
    },
    #[command(about = "Log tasks inside the workday")]
    Task {
        #[command(subcommand)]
        command: task::TaskCommand,
    },
    #[command(about = "Show the open workday and open tasks")]
    Status {},
    #[command(about = "Display a monthly summary table with a calendar")]
    Summary {
        #[command(flatten)]
        command: summary::SummaryCommand,
    },
    #[command(about = "List months that have anything logged")]
    Months {},
    #[command(about = "List known tags, most used first")]
    Tags {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let config = Config::load(&app_dir)?;
    let clock = DefaultClock;

    match args.commands {
        Commands::Day { command } => {
            workday::process_day_command(command, &app_dir, &config, &clock).await
        }
        Commands::Task { command } => {
            task::process_task_command(command, &app_dir, &clock).await
        }
        Commands::Status {} => workday::process_status_command(&app_dir, &clock).await,
        Commands::Summary { command } => {
            summary::process_summary_command(command, &app_dir, &config, &clock).await
        }
        Commands::Months {} => summary::process_months_command(&app_dir, &clock).await,
        Commands::Tags {} => task::process_tags_command(&app_dir).await,
    }
}
