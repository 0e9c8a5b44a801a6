use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agent20::agent::Agent;
use agent20::config::Config;
use agent20::distill::{Distiller, Splitter};
use agent20::gatekeeper::{HeuristicSignals, SplitGate};
use agent20::integrations::{DiscordNotifier, NotionSink, SupabaseQueue};
use agent20::llm::{CompletionService, OpenAiClient};
use agent20::queue::QueueWorker;
use agent20::routing::Router;

#[derive(Parser, Debug)]
#[command(name = "agent20", version, about = "Distill free-form thoughts and route them")]
struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split, distill and route one block of text
    Distill {
        /// Raw thought text
        text: String,
    },
    /// Process pending rows from the queue table
    Queue {
        /// Keep polling, sleeping this many seconds between drains
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
        /// Stop after this many rows per drain
        #[arg(long, value_name = "N")]
        max: Option<usize>,
    },
    /// Show the local split heuristic for a text (no network)
    Gate {
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agent20=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Gate { text } => {
            let signals = HeuristicSignals::measure(&text);
            println!("{}", serde_json::to_string_pretty(&signals)?);
            println!("might contain multiple thoughts: {}", signals.suggests_split());
            Ok(())
        }
        Commands::Distill { text } => {
            let config = Config::load(cli.config.as_deref())?;
            config.validate_for_interactive()?;
            let llm = completion_service(&config)?;

            let agent = Agent::new(
                SplitGate::new(llm.clone()),
                Splitter::new(llm.clone()),
                Distiller::new(llm),
                router(&config)?,
                config.agent.source.clone(),
            );
            let report = agent.run(&text).await?;
            for entry in &report.entries {
                let d = &entry.distillation;
                println!(
                    "[{}] {} ({}) {}",
                    d.confidence.capitalized(),
                    d.entry_type,
                    d.tags.join(", "),
                    d.summary
                );
            }
            Ok(())
        }
        Commands::Queue { watch, max } => {
            let config = Config::load(cli.config.as_deref())?;
            config.validate_for_queue()?;
            let llm = completion_service(&config)?;

            let worker = QueueWorker::new(
                Arc::new(SupabaseQueue::from_config(&config.supabase)?),
                Distiller::new(llm),
                router(&config)?,
                config.agent.queue_source.clone(),
            );
            match watch {
                Some(secs) => worker.watch(Duration::from_secs(secs), max).await,
                None => {
                    let summary = worker.drain(max).await?;
                    println!(
                        "completed: {}, failed: {}, contended: {}",
                        summary.completed, summary.failed, summary.contended
                    );
                    Ok(())
                }
            }
        }
    }
}

fn completion_service(config: &Config) -> Result<Arc<dyn CompletionService>> {
    if config.llm.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, every stage will use its fallback");
    }
    Ok(Arc::new(OpenAiClient::from_config(&config.llm)?))
}

fn router(config: &Config) -> Result<Router> {
    Ok(Router::new(
        Arc::new(NotionSink::from_config(&config.notion)?),
        Arc::new(DiscordNotifier::from_config(&config.discord)?),
    ))
}
