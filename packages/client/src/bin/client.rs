//! Terminal chat client for Agora.
//!
//! Connects to one room, authenticates with an access token and sends each
//! input line as a chat message. Reconnects on connection loss (max 5 attempts
//! with 5 second interval) but exits at once when the server rejects the token
//! or the session is taken over by another connection.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-client -- --room lobby --token <ACCESS_TOKEN>
//! AGORA_TOKEN=... cargo run --bin agora-client -- -r "team chat"
//! ```

use clap::Parser;

use agora_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "agora-client")]
#[command(about = "Terminal client for Agora chat rooms", long_about = None)]
struct Args {
    /// WebSocket server URL (without the /ws path)
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080")]
    url: String,

    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Access token
    #[arg(short = 't', long, env = "AGORA_TOKEN", hide_env_values = true)]
    token: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = agora_client::run_client(args.url, args.room, args.token).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
