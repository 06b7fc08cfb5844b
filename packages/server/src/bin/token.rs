//! Bearer token tool: mint, rotate and inspect Agora tokens.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin agora-token -- issue --secret change-me --user-id 1 --name alice
//! cargo run --bin agora-token -- inspect <TOKEN> --secret change-me
//! ```

use agora_server::{
    domain::{DisplayName, Identity, Role, UserId},
    infrastructure::token::{HmacTokenService, TokenKind, TokenPair, inspect},
};
use agora_shared::{logger::setup_logger, time::timestamp_to_rfc3339};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agora-token")]
#[command(about = "Issue and inspect Agora bearer tokens", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mint an access/refresh pair
    Issue {
        #[arg(long, env = "AGORA_TOKEN_SECRET", hide_env_values = true)]
        secret: String,
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        name: String,
        /// user or admin
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Exchange a refresh token for a fresh pair
    Rotate {
        #[arg(long, env = "AGORA_TOKEN_SECRET", hide_env_values = true)]
        secret: String,
        refresh_token: String,
    },
    /// Print the claims of a token; verify it when a secret is given
    Inspect {
        token: String,
        #[arg(long)]
        secret: Option<String>,
    },
}

fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    if let Err(e) = run(Args::parse().command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Issue {
            secret,
            user_id,
            name,
            role,
        } => {
            let identity = Identity::new(
                UserId::new(user_id),
                DisplayName::new(name)?,
                Role::try_from(role.as_str())?,
            );
            let pair = HmacTokenService::new(secret)?.issue_pair(&identity)?;
            print_pair(&pair);
        }
        Command::Rotate {
            secret,
            refresh_token,
        } => {
            let pair = HmacTokenService::new(secret)?.rotate(&refresh_token)?;
            print_pair(&pair);
        }
        Command::Inspect { token, secret } => {
            let claims = inspect(&token)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
            println!("expires: {}", timestamp_to_rfc3339(claims.exp.saturating_mul(1000)));

            if let Some(secret) = secret {
                match HmacTokenService::new(secret)?.decode(&token, claims.kind) {
                    Ok(_) => println!("status: valid {:?} token", claims.kind),
                    Err(e) => println!("status: rejected ({})", e),
                }
            }
        }
    }
    Ok(())
}

fn print_pair(pair: &TokenPair) {
    println!("{:?}: {}", TokenKind::Access, pair.access);
    println!("{:?}: {}", TokenKind::Refresh, pair.refresh);
}
