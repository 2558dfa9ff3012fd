mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::Context;
use crate::config::Config;
use topicscope::{global_identity, BackendFactory};

/// Topicscope - predict the topic of web pages and curate retraining data
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file to use instead of config/default.toml and config/{ENV}.toml
    #[arg(short, long, env = "TOPICSCOPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict the topic of a single URL
    Predict {
        url: String,
        /// Also save the page content into the download directory
        #[arg(long)]
        save: bool,
        /// How many of the most frequent words to show
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Predict every URL listed in a plain-text file, one per line
    Batch { file: PathBuf },
    /// Browse past predictions
    History {
        /// Case-insensitive search over URL and topic
        #[arg(short, long)]
        filter: Option<String>,
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        /// How many entries to fetch from the backend
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Retrain the model on URLs from the history
    Retrain {
        /// URLs to select
        urls: Vec<String>,
        #[arg(short, long)]
        filter: Option<String>,
        /// Select every URL matching the filter
        #[arg(long)]
        all: bool,
    },
    /// Delete one history entry by id
    Delete { id: String },
    /// Topic distribution and daily activity
    Analytics {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Show the anonymous identity used for requests
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);
    tracing::debug!("Using backend at {}", config.backend.base_url);

    let identity = global_identity(&config.identity_store());
    let backend = BackendFactory::create_backend(&config.gateway())?;
    let ctx = Context {
        backend,
        identity: identity.clone(),
        config,
    };

    match args.command {
        Command::Predict { url, save, top } => commands::predict(&ctx, &url, save, top).await,
        Command::Batch { file } => commands::batch(&ctx, &file).await,
        Command::History {
            filter,
            page,
            page_size,
            limit,
        } => commands::history(&ctx, filter.as_deref(), page, page_size, limit).await,
        Command::Retrain { urls, filter, all } => {
            commands::retrain(&ctx, &urls, filter.as_deref(), all).await
        }
        Command::Delete { id } => commands::delete(&ctx, &id).await,
        Command::Analytics { days } => commands::analytics(&ctx, days).await,
        Command::Whoami => {
            commands::whoami(&ctx);
            Ok(())
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so command output stays clean
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
