//! sysdeck_agent: serves host snapshots over HTTP for remote sysdeck use.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sysdeck::config::Config;
use sysdeck_agent::cli::{parse_port, usage, wants_help, DEFAULT_PORT};
use sysdeck_agent::routes::router;
use sysdeck_agent::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if wants_help(args.iter().cloned()) {
        let prog = args.first().map(String::as_str).unwrap_or("sysdeck_agent");
        println!("{}", usage(prog));
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::load(None)?;
    let state = AppState::from_config(&cfg);
    if state.auth_token.is_some() {
        info!("token auth enabled");
    }

    let port = parse_port(args, DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    info!(%addr, "sysdeck agent listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
