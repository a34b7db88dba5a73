/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Uploads, task listings and live task tracking on stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or shutdown handling
*/

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vdub_adapter::{ProgressCallback, SubtitleMode};

use vdub_tracker::config::API_URL_ENV;
use vdub_tracker::{Session, SubmitOptions, TrackerConfig, WatchManager, cli, render};

#[derive(Parser, Debug)]
#[command(name = "vdub-tracker", version, about = "Upload videos for dubbing and track their progress")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    /// Write logs to this file instead of stderr
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,
    /// Backend API base URL, overrides the config file and VDUB_API_URL
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,
    /// Validate configuration and exit
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a video and create a dubbing task
    Submit {
        video: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "from", value_name = "LANG")]
        source_language: Option<String>,
        #[arg(long = "to", value_name = "LANG")]
        target_language: Option<String>,
        #[arg(long = "subtitles", value_name = "none|external|burn")]
        subtitle_mode: Option<SubtitleMode>,
        /// Keep tracking the new task until it finishes
        #[arg(long)]
        follow: bool,
    },
    /// List tasks, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
        /// One of the pipeline stages; anything else lists all tasks
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show one task with its segments
    Show {
        id: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Delete a task
    Delete { id: Uuid },
    /// Print download links of a completed task
    Result { id: Uuid },
    /// Backend health
    Health,
    /// Task and worker statistics
    Stats,
    /// Keep refreshing a task list page and/or individual tasks until Ctrl-C
    Watch {
        /// Tasks to follow; without any, the first list page is watched
        ids: Vec<Uuid>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Interactively write a configuration file
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_file.as_ref())?;

    if let Some(Command::Init { output }) = args.command {
        return init(output);
    }

    let config = load_config(&args)?;

    if args.dry_run {
        info!(base_url = %config.api.base_url, "dry-run requested; configuration validated");
        return Ok(());
    }

    let Some(command) = args.command else {
        bail!("no command given; run with --help to see the available commands");
    };
    let session = Session::new(config)?;
    run_command(session, command).await
}

async fn run_command(session: Session, command: Command) -> Result<()> {
    match command {
        Command::Submit {
            video,
            title,
            source_language,
            target_language,
            subtitle_mode,
            follow,
        } => {
            let options = SubmitOptions {
                title,
                source_language,
                target_language,
                subtitle_mode,
            };
            let task = session
                .submit(&video, options, Some(progress_printer()))
                .await
                .context("submit video")?;
            println!();
            println!("created task {} ({})", task.id, render::status_badge(&task.status));
            if follow {
                watch(session, vec![task.id], None, 1).await?;
            }
        }
        Command::List {
            page,
            page_size,
            status,
            json,
        } => {
            let mut query = session.config().list_query(status.as_deref()).page(page);
            if let Some(page_size) = page_size {
                query = query.page_size(page_size);
            }
            let list = session.list(&query).await.context("list tasks")?;
            let navigator = render::navigator_at(&list, page)
                .ok_or_else(|| anyhow!(render::page_out_of_range(page, list.total_pages)))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print!("{}", render::task_table(&list, &navigator));
            }
        }
        Command::Show { id, json } => {
            let detail = session.show(id).await.with_context(|| format!("fetch task {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", render::task_detail(&detail));
            }
        }
        Command::Delete { id } => {
            session.delete(id).await.with_context(|| format!("delete task {id}"))?;
            println!("deleted task {id}");
        }
        Command::Result { id } => {
            let links = session
                .result_links(id)
                .await
                .with_context(|| format!("fetch result of task {id}"))?;
            print!("{}", render::download_links(&links));
        }
        Command::Health => {
            let health = session.health().await.context("fetch backend health")?;
            print!("{}", render::health(&health));
            if !health.is_healthy() {
                return Err(anyhow!("backend reports status {}", health.status));
            }
        }
        Command::Stats => {
            let stats = session.stats().await.context("fetch backend stats")?;
            print!("{}", render::stats(&stats));
        }
        Command::Watch { ids, status, page } => {
            watch(session, ids, status, page).await?;
        }
        Command::Init { output } => init(output)?,
    }
    Ok(())
}

async fn watch(session: Session, ids: Vec<Uuid>, status: Option<String>, page: u32) -> Result<()> {
    let list_query = ids
        .is_empty()
        .then(|| session.config().list_query(status.as_deref()).page(page));
    if let Some(query) = &list_query {
        let list = session.list(query).await.context("list tasks")?;
        if render::navigator_at(&list, page).is_none() {
            return Err(anyhow!(render::page_out_of_range(page, list.total_pages)));
        }
    }
    let mut manager = WatchManager::new(session);
    setup_signal_handlers(manager.shutdown_token());

    if let Some(query) = list_query {
        manager.watch_list(query);
    }
    for id in ids {
        manager.watch_task(id);
    }

    manager.run_until_done().await;
    info!("stopping watches");
    manager.shutdown_and_wait().await.context("shutdown watches")?;
    Ok(())
}

fn init(output: Option<PathBuf>) -> Result<()> {
    let output = output
        .or_else(TrackerConfig::default_path)
        .context("no output path given and no user config directory available")?;
    cli::init::run_init(&output)
}

fn progress_printer() -> ProgressCallback {
    Arc::new(|percent| {
        print!("\r{}", render::progress_bar(percent));
        let _ = std::io::stdout().flush();
    })
}

fn init_tracing(log_level: &str, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let guard = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            builder
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            Some(guard)
        }
        None => {
            builder
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| anyhow!(err))
                .context("initialize tracing subscriber")?;
            None
        }
    };
    Ok(guard)
}

fn load_config(args: &Cli) -> Result<TrackerConfig> {
    let (mut config, source) = TrackerConfig::load(args.config_path.as_deref()).context("load config")?;
    match &source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => info!("no configuration file found; using defaults"),
    }
    let env_url = std::env::var(API_URL_ENV).ok();
    config.apply_base_url_override(args.api_url.as_deref(), env_url.as_deref());
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
