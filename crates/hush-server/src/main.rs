//! hush game server.
//!
//! ```bash
//! HUSH_BIND=0.0.0.0:8080 RUST_LOG=hush=debug hush-server
//! ```

use std::time::Duration;

use clap::Parser;
use hush::prelude::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Every flag can also be set through the environment.
#[derive(Parser, Debug)]
#[command(name = "hush-server")]
#[command(about = "WebSocket server for the hush party game")]
struct Config {
    /// Listen address.
    #[arg(long, env = "HUSH_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Players needed to start a game, and to keep one going. At least 4.
    #[arg(long, env = "HUSH_MIN_PLAYERS", default_value_t = 4)]
    min_players: usize,

    /// Largest roster a room accepts. At most 8.
    #[arg(long, env = "HUSH_MAX_PLAYERS", default_value_t = 8)]
    max_players: usize,

    /// Seconds of silence before a connection is dropped.
    #[arg(long, env = "HUSH_IDLE_TIMEOUT_SECS", default_value_t = 60)]
    idle_timeout_secs: u64,
}

impl Config {
    fn room_config(&self) -> RoomConfig {
        RoomConfig {
            min_players: self.min_players,
            max_players: self.max_players,
        }
    }

    fn builder(&self) -> HushServerBuilder {
        HushServer::builder()
            .bind(&self.bind)
            .room_config(self.room_config())
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    tracing::info!(bind = %config.bind, ?config, "starting hush server");

    let server = config.builder().build().await?;
    server
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("no ctrl-c handler, running until killed");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("hush server stopped");
    Ok(())
}
