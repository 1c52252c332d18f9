use std::net::SocketAddr;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use commitdiff::server::{self, AppState, ServerConfig};
use tracing::info;

/// commitdiff relay: turns diffs into commit messages via OpenRouter.
#[derive(Parser)]
#[command(name = "commitdiff-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "COMMITDIFF_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Keep rate-limit counters in process memory instead of Redis.
    ///
    /// Only correct with a single replica.
    #[arg(long)]
    in_memory_rate_limit: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");

        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }

        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = ServerConfig::from_env()?;
    let state = AppState::from_config(&config, args.in_memory_rate_limit).await?;
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("commitdiff relay listening on http://{}", args.bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
