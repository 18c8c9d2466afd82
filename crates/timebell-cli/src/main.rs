use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use timebell_core::{Clock, SkillRequest, SystemClock, interpret};
use timebell_server::ServerConfig;
use timebell_source::{
    HttpSource, InitializerConfig, ScheduleSource, SnapshotSource, SourceOptions, prepare,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timebell", version, about = "Class timetable skill server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the chatbot skill webhook server.
    Serve(ServeArgs),
    /// Run one request through the pipeline and print the reply text.
    Ask(AskArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// School to look up in the schedule source.
    #[arg(long, env = "SCHOOL_NAME", default_value = "불곡고")]
    school: String,

    /// JSON snapshot file to serve timetables from.
    #[arg(long, env = "TIMETABLE_SNAPSHOT", conflicts_with = "source_url")]
    snapshot: Option<PathBuf>,

    /// Base URL of an HTTP timetable gateway.
    #[arg(long, env = "TIMETABLE_SOURCE_URL")]
    source_url: Option<String>,

    /// How long the source may reuse upstream data.
    #[arg(long, env = "SOURCE_CACHE_SECS", default_value_t = 1800)]
    source_cache_secs: u64,

    /// Upper bound on a single timetable fetch.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 10)]
    fetch_timeout_secs: u64,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Delay between failed initialization attempts.
    #[arg(long, env = "INIT_RETRY_DELAY_SECS", default_value_t = 60)]
    retry_delay_secs: u64,

    /// Lifetime of the shared timetable memo; 0 disables it.
    #[arg(long, env = "TABLE_CACHE_SECS", default_value_t = 600)]
    table_cache_secs: u64,
}

#[derive(Args)]
struct AskArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Free-text utterance, e.g. "2학년 5반 내일".
    #[arg(default_value = "")]
    utterance: String,

    #[arg(long)]
    grade: Option<i64>,

    #[arg(long)]
    classroom: Option<i64>,

    /// Structured day parameter ("today" or "tomorrow").
    #[arg(long)]
    day: Option<String>,
}

impl SourceArgs {
    fn build(&self) -> anyhow::Result<Arc<dyn ScheduleSource>> {
        match (&self.snapshot, &self.source_url) {
            (Some(path), None) => Ok(Arc::new(SnapshotSource::new(path.clone()))),
            (None, Some(url)) => Ok(Arc::new(HttpSource::new(url.clone()))),
            _ => anyhow::bail!("exactly one of --snapshot or --source-url is required"),
        }
    }

    fn options(&self) -> SourceOptions {
        SourceOptions {
            cache_ttl: Duration::from_secs(self.source_cache_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("timebell v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Ask(args) => ask(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let source = args.source.build()?;
    let config = ServerConfig {
        listen: SocketAddr::new(args.host, args.port),
        initializer: InitializerConfig {
            school_name: args.source.school.clone(),
            retry_delay: Duration::from_secs(args.retry_delay_secs),
            options: args.source.options(),
        },
        table_cache_ttl: Duration::from_secs(args.table_cache_secs),
        fetch_timeout: Duration::from_secs(args.source.fetch_timeout_secs),
    };
    timebell_server::run_server(source, config).await
}

/// Prepares the source inline, without the background retry loop.
async fn ask(args: AskArgs) -> anyhow::Result<()> {
    let source = args.source.build()?;
    let school = prepare(source.as_ref(), &args.source.school, &args.source.options())
        .await
        .context("preparing schedule source")?;
    tracing::info!(school = %school.name, code = %school.code, "schedule source ready");

    let request = SkillRequest::from_value(serde_json::json!({
        "action": { "params": {
            "grade": args.grade,
            "classroom": args.classroom,
            "day": args.day,
        } },
        "userRequest": { "utterance": args.utterance },
    }));

    let plan = interpret(&request, SystemClock.now());
    let text = match plan.terminal_reply() {
        Some(text) => text,
        None => {
            let timeout = Duration::from_secs(args.source.fetch_timeout_secs);
            let table = tokio::time::timeout(timeout, source.fetch_full_timetable())
                .await
                .context("timetable fetch timed out")?
                .context("fetching timetable")?;
            plan.render(&table)
        }
    };
    println!("{text}");
    Ok(())
}
