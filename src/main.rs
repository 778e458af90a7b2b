use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timmyos::{api, config::Settings, sync};

#[derive(Parser)]
#[command(name = "timmyos")]
#[command(about = "Personal assistant status dashboard with live updates")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server (default)
    Serve,
    /// Print the resolved configuration and exit
    CheckConfig,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "timmyos=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(cli.settings).await?,
        Commands::CheckConfig => println!("{:#?}", cli.settings),
    }

    Ok(())
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    if settings.api_key == timmyos::config::DEFAULT_API_KEY {
        tracing::warn!("Using the development API key; set TIMMYOS_API_KEY in production");
    }
    let addr = settings.listen_addr();
    let health_interval = settings.health_interval();
    let state = api::AppState::new(settings);

    let _ticker = sync::spawn_health_ticker(state.health.clone(), state.hub.clone(), health_interval);
    let _watchers = sync::watch_changes(state.tasks.clone(), state.memory.clone(), state.hub.clone())?;

    let app = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("TimmyOS server listening on http://{}", addr);
    tracing::info!("WebSocket enabled for real-time updates at ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("TimmyOS server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
