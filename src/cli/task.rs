use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Result};
use chrono::Local;
use clap::Subcommand;
use tracing::info;
use uuid::Uuid;

use crate::{
    storage::{
        attachments::AttachmentStore,
        entities::TaskEntity,
        record_store::{RecordStore, RecordStoreImpl},
        state::{OpenTask, StateFile},
        tag_store::TagStore,
        task_records_dir,
    },
    tags::extract_task_tags,
    utils::{clock::Clock, time::format_minutes},
};

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    #[command(about = "Open a new task. Requires an open workday unless it's a call")]
    Start {
        #[arg(help = "Task title. Can also be given on finish")]
        title: Option<String>,
        #[arg(long, help = "Log an on-call interval instead of a workday task")]
        call: bool,
    },
    #[command(about = "Finish an open task and write it to the journal")]
    Finish {
        #[arg(long, help = "Id prefix of the task, needed when several are open")]
        task: Option<String>,
        #[arg(long, help = "Task title, required unless given on start")]
        title: Option<String>,
        #[arg(long, help = "What was done. Hashtags like #deploy become tags")]
        notes: String,
        #[arg(long = "image", help = "Photo to attach, up to 5 per task")]
        images: Vec<PathBuf>,
    },
    #[command(about = "Drop an open task without recording it")]
    Cancel {
        #[arg(long, help = "Id prefix of the task, needed when several are open")]
        task: Option<String>,
    },
}

pub async fn process_task_command(
    command: TaskCommand,
    app_dir: &Path,
    clock: &dyn Clock,
) -> Result<()> {
    match command {
        TaskCommand::Start { title, call } => {
            let task = start_task(&StateFile::new(app_dir), clock, title, call).await?;
            println!(
                "{} [{}] started at {}",
                if task.call { "Call" } else { "Task" },
                &task.id.to_string()[..8],
                task.started.with_timezone(&Local).format("%H:%M")
            );
            Ok(())
        }
        TaskCommand::Finish {
            task,
            title,
            notes,
            images,
        } => {
            let entity = finish_task(
                app_dir,
                clock,
                FinishArgs {
                    task,
                    title,
                    notes,
                    images,
                },
            )
            .await?;
            println!(
                "Finished '{}', {}",
                entity.title,
                format_minutes(entity.raw_minutes())
            );
            if !entity.tags.is_empty() {
                println!("tags: {}", entity.tags.join(", "));
            }
            Ok(())
        }
        TaskCommand::Cancel { task } => {
            let dropped = cancel_task(&StateFile::new(app_dir), task).await?;
            println!(
                "Dropped {}",
                dropped.title.as_deref().unwrap_or("untitled task")
            );
            Ok(())
        }
    }
}

pub async fn process_tags_command(app_dir: &Path) -> Result<()> {
    let tags = TagStore::new(app_dir).load().await?;
    if tags.is_empty() {
        println!("No tags yet. Hashtags in task titles and notes land here");
        return Ok(());
    }
    for tag in tags {
        println!("{}\t#{}", tag.count, tag.name);
    }
    Ok(())
}

pub(crate) async fn start_task(
    state_file: &StateFile,
    clock: &dyn Clock,
    title: Option<String>,
    call: bool,
) -> Result<OpenTask> {
    let now = clock.time();
    let task = state_file
        .update(move |state| {
            if !call && state.session.is_none() {
                bail!("Start a workday before logging tasks, or use --call for on-call work");
            }
            let task = OpenTask {
                id: Uuid::new_v4(),
                title: title.map(Into::into),
                started: now,
                call,
            };
            state.tasks.push(task.clone());
            Ok(task)
        })
        .await?;

    info!("Opened task {}", task.id);
    Ok(task)
}

pub(crate) struct FinishArgs {
    pub task: Option<String>,
    pub title: Option<String>,
    pub notes: String,
    pub images: Vec<PathBuf>,
}

pub(crate) async fn finish_task(
    app_dir: &Path,
    clock: &dyn Clock,
    args: FinishArgs,
) -> Result<TaskEntity> {
    let state_file = StateFile::new(app_dir);
    let state = state_file.load().await?;

    let open = state.find_task(args.task.as_deref())?.clone();

    let title: Arc<str> = match args.title.map(Arc::from).or_else(|| open.title.clone()) {
        Some(v) if !v.trim().is_empty() => v,
        _ => bail!("A task needs a title, pass --title"),
    };
    if args.notes.trim().is_empty() {
        bail!("A task needs notes describing what was done");
    }

    let tags = extract_task_tags(&title, &args.notes);
    let images = AttachmentStore::new(app_dir)
        .store_for_task(open.id, &args.images)
        .await?;

    let entity = TaskEntity {
        id: open.id,
        // Calls are their own thing, they don't join the session.
        session_id: state.session.as_ref().map(|s| s.id).filter(|_| !open.call),
        title,
        notes: args.notes.into(),
        tags: tags.clone(),
        images,
        start: open.started,
        end: clock.time(),
        call: open.call,
    };

    let store = RecordStoreImpl::new(task_records_dir(app_dir))?;
    store
        .append(entity.start.date_naive(), vec![entity.clone()])
        .await?;

    TagStore::new(app_dir).bump(&tags).await?;

    state_file
        .update(|state| {
            state.remove_task(entity.id);
            Ok(())
        })
        .await?;

    info!("Finished task {}", entity.id);
    Ok(entity)
}

pub(crate) async fn cancel_task(
    state_file: &StateFile,
    selector: Option<String>,
) -> Result<OpenTask> {
    state_file
        .update(move |state| {
            let id = state.find_task(selector.as_deref())?.id;
            Ok(state
                .remove_task(id)
                .expect("A task that was just found should be removable"))
        })
        .await
}
