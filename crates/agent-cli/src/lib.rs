//! # agent-cli
//!
//! `stripe-agent`: hands the agent one fixed assignment (create a payment
//! link for a "Test" product at $100), prints the final reply on stdout and
//! exits non-zero when the turn failed. Logs go to stderr.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{LlmProvider, Turn};
use agent_runtime::{ProviderKind, RuntimeConfig};
use stripe_toolkit::{ONE_SHOT_ASSIGNMENT, StripeAgentToolkit, extract_link};

#[derive(Debug, Parser)]
#[command(
    name = "stripe-agent",
    version,
    about = "Ask an LLM agent to create a Stripe payment link",
    after_help = "Examples:\n  stripe-agent\n  stripe-agent --provider ollama --model llama3.2\n  stripe-agent --offline"
)]
pub struct Cli {
    /// LLM backend (overrides LLM_PROVIDER): openai or ollama
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Model name (overrides LLM_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// Use the in-memory payment provider; no Stripe key needed
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    /// Environment settings with the command-line overrides applied
    pub fn runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        let mut config = match self.provider {
            Some(provider) => RuntimeConfig::new(provider),
            None => RuntimeConfig::from_env().context("LLM configuration")?,
        };
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        Ok(config)
    }

    pub fn toolkit(&self) -> anyhow::Result<StripeAgentToolkit> {
        if self.offline {
            return Ok(StripeAgentToolkit::offline());
        }
        StripeAgentToolkit::from_env().context("Stripe configuration")
    }
}

/// Run the fixed assignment once
pub async fn one_shot(
    toolkit: &StripeAgentToolkit,
    llm: Arc<dyn LlmProvider>,
    model: &str,
) -> anyhow::Result<Turn> {
    let orchestrator = toolkit.orchestrator(llm, model)?;
    let turn = orchestrator.run_once(ONE_SHOT_ASSIGNMENT).await?;

    match extract_link(turn.content()) {
        Some(url) => tracing::info!(%url, "Payment link created"),
        None if turn.failed() => {}
        None => tracing::warn!("Reply contains no checkout link"),
    }
    Ok(turn)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn execute(cli: &Cli) -> anyhow::Result<Turn> {
    // configuration is checked before any capability call
    let runtime = cli.runtime_config()?;
    let toolkit = cli.toolkit()?;
    let llm = runtime.build_provider().context("LLM provider")?;

    tracing::info!(
        provider = ?runtime.provider,
        model = %runtime.model,
        payments = toolkit.provider().name(),
        "Running one-shot assignment"
    );
    one_shot(&toolkit, llm, &runtime.model).await
}

pub async fn run(cli: Cli) -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match execute(&cli).await {
        Ok(turn) => {
            println!("{}", turn.content());
            if turn.failed() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
