//! Smart home controller entry point.
//!
//! Runs either the interactive dialogue loop against a local
//! OpenAI-compatible model server, or the scripted benchmark comparing a
//! base model against its fine-tuned variant.

mod benchmark;

use std::io::Write as _;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hearth_chat::Orchestrator;
use hearth_dispatch::{ActionDispatcher, DEFAULT_WEBHOOK_URL};
use hearth_llm::{SlmClient, SlmConfig};

#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(about = "Smart home voice controller backed by a small tool-calling model")]
struct Args {
    /// Model name served by the completion endpoint
    #[arg(long, default_value = "functiongemma-270m-it")]
    model: String,

    /// Port of the local OpenAI-compatible server
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// API key passed to the completion endpoint
    #[arg(long, default_value = "EMPTY")]
    api_key: String,

    /// Webhook endpoint that receives dispatched device actions
    #[arg(long, default_value = DEFAULT_WEBHOOK_URL)]
    webhook_url: String,

    /// Enable debug logging of model decisions and dispatch attempts
    #[arg(long)]
    debug: bool,

    /// Run the benchmark suite instead of the interactive loop
    #[arg(long)]
    benchmark: bool,

    /// Base model to benchmark
    #[arg(long, default_value = "functiongemma-270m-it")]
    base_model: String,

    /// Fine-tuned model to benchmark against the base
    #[arg(long, default_value = "distil-functiongemma-smart-home")]
    distil_model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if args.benchmark {
        return run_benchmark_mode(&args).await;
    }

    run_interactive(&args).await
}

async fn run_benchmark_mode(args: &Args) -> Result<()> {
    let mut results = Vec::new();
    for model in [args.base_model.clone(), args.distil_model.clone()] {
        info!(%model, "benchmarking");
        let config = SlmConfig::new(model)
            .with_port(args.port)
            .with_api_key(args.api_key.clone());
        results.push(benchmark::run_benchmark(config, &args.webhook_url).await?);
    }
    benchmark::print_report(&results);
    Ok(())
}

async fn run_interactive(args: &Args) -> Result<()> {
    let config = SlmConfig::new(args.model.clone())
        .with_port(args.port)
        .with_api_key(args.api_key.clone());
    let backend = SlmClient::new(config);
    let sink = ActionDispatcher::new(args.webhook_url.clone());
    let mut orchestrator = Orchestrator::new(backend, sink)?;

    println!("Smart Home Controller (type 'quit' or 'exit' to stop)\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => {
                println!("\nBot: Goodbye!");
                break;
            }
        };
        let transcript = line.trim();
        if transcript.is_empty() {
            continue;
        }

        match orchestrator.process_utterance(transcript).await? {
            Some(outcome) => {
                if args.debug {
                    info!(latency_ms = outcome.latency_ms, "turn complete");
                }
                println!("Bot: {}\n", outcome.reply);
            }
            None => {
                println!("Bot: Goodbye!");
                break;
            }
        }
    }

    Ok(())
}
