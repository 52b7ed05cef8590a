use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use umbra_agent::{Agent, CycleOutcome};
use umbra_core::{ThreadRandom, UmbraConfig};
use umbra_expression::CyclePacer;
use umbra_feed::HttpFeedClient;
use umbra_memory::{build_embedder, SqliteStore};
use umbra_reasoning::{ChatGenerator, PersonaPrompt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "UMBRA_CONFIG", default_value = "umbra.toml")]
    config: PathBuf,

    /// Database path (overrides storage.db_path)
    #[arg(short, long)]
    db: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Also write daily-rotated log files into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

/// Returns the file appender guard, which must live until exit.
fn init_tracing(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into());

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "umbra.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let _log_guard = init_tracing(&args);

    info!("Initializing Umbra...");

    let mut config = UmbraConfig::load_or_default(&args.config)?;
    if let Some(db) = &args.db {
        config.storage.db_path = db.clone();
    }
    config.validate()?;
    if config.feed.host_account.is_empty() {
        warn!("No host account configured; only mentions and daily posts will be handled");
    }

    info!("Opening store at {}...", config.storage.db_path);
    let store = Arc::new(
        SqliteStore::open(&config.storage.db_path, config.embedding.dimension)
            .await
            .with_context(|| format!("Failed to open store at {}", config.storage.db_path))?,
    );

    let embedder = build_embedder(&config.embedding)?;
    let persona = PersonaPrompt::from_config(&config.llm, config.cycle.max_post_chars);
    let generator = Arc::new(ChatGenerator::from_env(&config.llm, persona)?);
    let feed = Arc::new(HttpFeedClient::new(&config.feed)?);
    let pacer = CyclePacer::from_config(&config.cycle);

    let mut agent = Agent::new(
        &config,
        feed,
        generator,
        embedder,
        store,
        Box::new(ThreadRandom),
    )?;

    agent.login().await.context("Login failed")?;
    info!("Umbra online");

    // A started cycle always runs to completion; Ctrl-C is only honoured between cycles
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current cycle");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut rng = ThreadRandom;
    loop {
        match agent.run_cycle().await {
            Ok(CycleOutcome::Idle) => {}
            Ok(CycleOutcome::Published { post_id, persisted, .. }) => {
                if !persisted {
                    warn!(post_id = %post_id, "Published but not persisted");
                }
            }
            Err(e) if e.is_fatal() => {
                error!("Stopping: {}", e);
                return Err(e.into());
            }
            Err(e) => warn!("Cycle aborted: {}", e),
        }

        if args.once || *shutdown_rx.borrow() {
            break;
        }

        let delay = pacer.next_delay(&mut rng);
        info!("Next cycle in {}s", delay.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.changed() => break,
        }
    }

    info!("Umbra stopped");
    Ok(())
}
