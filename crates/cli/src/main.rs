mod commands;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidgen_core::job_status::StatusFilter;
use vidgen_core::video_request::{DEFAULT_DURATION_SECS, DEFAULT_MODEL, DEFAULT_SIZE};
use vidgen_videos::api::{SortOrder, VideoApi};
use vidgen_videos::config::ClientConfig;
use vidgen_videos::download::DownloadVariant;

#[derive(Parser, Debug)]
#[command(
    name = "vidgen",
    version,
    about = "Submit, track, and download AI video renders"
)]
struct Cli {
    /// API key; overrides `OPENAI_API_KEY`
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API root; overrides `OPENAI_BASE_URL`
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Seconds between status polls; overrides `VIDEO_POLL_INTERVAL_SECS`
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a render and wait for it to finish
    Generate {
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Submit a render and print its id without waiting
    Create {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Resume polling an existing job until it finishes
    Poll {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the latest state of a job
    Get {
        id: String,
        /// Write the raw job payload as JSON to this path
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// List recent jobs
    List {
        /// all, in-progress, completed, or failed
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        /// Maximum number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Only show jobs created on or after this local date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Only show jobs created on or before this local date (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Download a finished job's media
    Download {
        id: String,
        /// video, thumbnail, or spritesheet
        #[arg(long)]
        variant: Option<DownloadVariant>,
        /// Destination file; defaults to `<id>.<ext>`
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Permanently delete a job
    Delete { id: String },
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// What the video should show
    #[arg(long, short)]
    prompt: String,
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
    /// Clip length in seconds
    #[arg(long, default_value_t = DEFAULT_DURATION_SECS)]
    seconds: u32,
    /// WIDTHxHEIGHT
    #[arg(long, default_value = DEFAULT_SIZE)]
    size: String,
    /// PNG or JPEG image the render should start from
    #[arg(long)]
    reference: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Where to save the rendered MP4; defaults to `<id>.mp4`
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Write the raw job payload as JSON to this path
    #[arg(long)]
    metadata: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = ClientConfig::from_env();
    if let Some(api_key) = cli.api_key {
        config.api_key = api_key;
    }
    if let Some(base_url) = cli.base_url {
        config = ClientConfig {
            request_timeout_secs: config.request_timeout_secs,
            poll_interval_secs: config.poll_interval_secs,
            ..ClientConfig::new(config.api_key, Some(base_url))
        };
    }
    if let Some(secs) = cli.poll_interval {
        config.poll_interval_secs = secs;
    }

    let api = VideoApi::new(&config)?;
    tracing::debug!(api_url = %api.api_url(), "Video client ready");

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    commands::run(cli.command, &api, &config, &cancel).await
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vidgen=info,vidgen_videos=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Cancel in-flight polling on the first Ctrl-C.
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping");
            cancel.cancel();
        }
    });
}
