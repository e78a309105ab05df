use std::net::SocketAddr;

use anyhow::Result;
use planner_core::PlannerConfig;
use planner_server::{AppState, app};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "planner_server=debug,planner_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PlannerConfig::load()?;
    let state = AppState::new(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("planner-server listening on http://{}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
