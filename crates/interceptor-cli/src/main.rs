//! Demonstration binary entry point.
//!
//! ```bash
//! interceptor-cli --log-level debug
//! ```

use clap::Parser;
use interceptor_cli::Args;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    interceptor_cli::run(args).await?;

    Ok(())
}
