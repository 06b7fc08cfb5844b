//! Room-based WebSocket chat gateway.
//!
//! Run with:
//! ```not_rust
//! AGORA_TOKEN_SECRET=change-me cargo run --bin agora-server
//! cargo run --bin agora-server -- --host 0.0.0.0 --port 3000 --token-secret change-me --default-room general
//! ```

use std::sync::Arc;

use agora_server::{
    domain::{NewRoom, RoomName, RoomRepository, UserId},
    infrastructure::{
        message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        token::HmacTokenService,
    },
    ui::{Server, ServerConfig, state::AppState},
};
use agora_shared::{logger::setup_logger, time::SystemClock};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "agora-server")]
#[command(about = "Room-based WebSocket chat gateway", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "AGORA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "AGORA_PORT", default_value = "8080")]
    port: u16,

    /// Shared secret used to sign and verify bearer tokens
    #[arg(long, env = "AGORA_TOKEN_SECRET", hide_env_values = true)]
    token_secret: String,

    /// Number of recent messages replayed after authentication
    #[arg(
        long,
        env = "AGORA_HISTORY_LIMIT",
        default_value = "50",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    history_limit: u64,

    /// Public room created at startup
    #[arg(long)]
    default_room: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository
    // 2. Identity verifier
    // 3. MessagePusher
    // 4. AppState (UseCases + presence)
    // 5. Server

    // 1. Create Repository (in-memory store)
    let repository = Arc::new(InMemoryRoomRepository::new(Arc::new(SystemClock)));
    if let Some(name) = args.default_room {
        if let Err(e) = seed_room(repository.as_ref(), name).await {
            tracing::error!("Failed to create default room: {}", e);
            std::process::exit(1);
        }
    }

    // 2. Create the token service
    let verifier = match HmacTokenService::new(args.token_secret) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!("Invalid token secret: {}", e);
            std::process::exit(1);
        }
    };

    // 3. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 4. Wire the use cases
    let history_limit = usize::try_from(args.history_limit).unwrap_or(usize::MAX);
    let state = Arc::new(AppState::new(
        repository,
        verifier,
        message_pusher,
        history_limit,
    ));

    // 5. Create and run the server
    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    let server = Server::new(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Create a public room owned by the system user (id 0)
async fn seed_room(
    repository: &dyn RoomRepository,
    name: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let room = repository
        .create_room(NewRoom {
            name: RoomName::new(name)?,
            is_private: false,
            secret: None,
            created_by: UserId::new(0),
        })
        .await?;
    tracing::info!("Room '{}' created!", room.name);
    Ok(())
}
