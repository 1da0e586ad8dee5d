//! `stripe-mcp`: payment tools over MCP stdio.
//!
//! ```bash
//! STRIPE_SECRET_KEY=sk_test_... stripe-mcp
//! STRIPE_AGENT_OFFLINE=1 stripe-mcp   # in-memory payments
//! ```

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_mcp::StripeMcpServer;
use stripe_toolkit::StripeAgentToolkit;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout belongs to the MCP transport
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let offline = std::env::var("STRIPE_AGENT_OFFLINE").is_ok_and(|v| matches!(v.as_str(), "1" | "true"));
    let toolkit = if offline {
        StripeAgentToolkit::offline()
    } else {
        StripeAgentToolkit::from_env().context("Stripe configuration")?
    };

    StripeMcpServer::new(&toolkit).run_stdio().await
}
