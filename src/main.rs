//! Stick Brawl entry point
//!
//! One binary, three roles picked by `NET_MODE`:
//! - offline: both players share the local input set
//! - host: runs the simulation, accepts one peer over WebSocket
//! - client: mirrors a host and forwards its input

use rand::Rng;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stick_brawl::app::console::spawn_stdin;
use stick_brawl::app::runner::{establish_link, run};
use stick_brawl::app::{ConnectionStatus, Selection, Session};
use stick_brawl::config::Config;
use stick_brawl::ws::EVENT_CAPACITY;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Stick Brawl");
    info!(mode = %config.net_mode, tick_rate = config.tick_rate, "Configuration loaded");

    let seed = config.sim_seed.unwrap_or_else(|| rand::thread_rng().gen());
    let selection = Selection {
        p1: config.p1_character,
        p2: config.p2_character,
    };
    let mut session = Session::new(config.net_mode, seed, selection);

    let (link_tx, link_rx) = mpsc::channel(EVENT_CAPACITY);
    establish_link(&mut session, &config, link_tx).await?;

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let console = spawn_stdin(cmd_tx);
    info!("Console ready: keys <codes...> | select <1|2> <ARCHETYPE> | start | menu");

    let mut session = run(session, link_rx, cmd_rx, config.tick_rate, shutdown_signal()).await;

    console.abort();
    session.disconnect(ConnectionStatus::Disconnected);
    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
